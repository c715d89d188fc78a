//! Server network layer: connection acceptance, per-player input channels,
//! the simulation and broadcast loops, and the supervisor tying them together.
//!
//! Concurrent activities and the state they share:
//!
//! - one input channel per player writes velocities into the [`World`]
//! - the simulation loop steps the [`World`]
//! - the broadcast loop reads the [`World`] and the [`Roster`] and writes to sockets
//! - the supervisor owns removals from the [`Roster`]
//!
//! Input channels and the broadcast loop never touch the roster on failure.
//! They report a [`ServerMessage::ConnectionFault`] and the supervisor
//! removes the player, so the two failure sites cannot race on removal.
//!
//! The simulation and broadcast loops run on independent timers. A broadcast
//! shows the world as of the moment it is taken; two consecutive broadcasts
//! may show the same tick, or skip one.

use crate::config::{DisconnectPolicy, ServerConfig};
use crate::error::{ConnectionFault, ServerError};
use crate::game::World;
use crate::session::Roster;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Command, PlayerId};
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Ticks (or broadcasts) between periodic debug reports.
const REPORT_INTERVAL: u64 = 300;

/// Longest command line accepted from a client, terminator included.
pub const MAX_COMMAND_LINE: u64 = 64;

/// Messages sent from worker tasks to the supervisor
#[derive(Debug)]
pub enum ServerMessage {
    ConnectionFault {
        player: PlayerId,
        fault: ConnectionFault,
    },
}

/// Reads newline-delimited commands from one player and applies them to
/// that player's body until the connection fails.
///
/// Unknown tokens are skipped. A line longer than [`MAX_COMMAND_LINE`]
/// or one that is not UTF-8 ends the channel with a decode fault. The
/// world lock is held only while a single command is applied, never while
/// waiting on the socket. Returns the fault that ended the channel.
pub async fn run_input_channel<R>(
    player: PlayerId,
    reader: R,
    world: Arc<RwLock<World>>,
) -> ConnectionFault
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(MAX_COMMAND_LINE as usize);

    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_COMMAND_LINE)
            .read_until(b'\n', &mut buf)
            .await;

        match read {
            Ok(0) => return ConnectionFault::Closed,
            Ok(n) => {
                if buf.last() != Some(&b'\n') && n as u64 == MAX_COMMAND_LINE {
                    return ConnectionFault::Decode(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("command line longer than {} bytes", MAX_COMMAND_LINE),
                    ));
                }
                let line = match std::str::from_utf8(&buf) {
                    Ok(line) => line,
                    Err(e) => {
                        return ConnectionFault::Decode(io::Error::new(
                            io::ErrorKind::InvalidData,
                            e,
                        ))
                    }
                };

                match Command::parse(line) {
                    Some(command) => {
                        world.write().await.apply_command(player, command);
                        debug!("{} pressed key: {}", player, command);
                    }
                    None => {
                        if !line.trim().is_empty() {
                            debug!("{} sent unknown token {:?}", player, line.trim_end());
                        }
                    }
                }
            }
            Err(e) => return ConnectionFault::from_read(e),
        }
    }
}

/// Future that resolves on Ctrl+C or, on Unix, SIGTERM.
///
/// The SIGTERM handler is installed before this returns, so a signal sent
/// after the call is never missed.
pub fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            terminate.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C"),
            _ = terminate => info!("Received SIGTERM"),
        }
    })
}

/// Steps the world once per `period` for as long as the task lives.
///
/// A late tick pushes the following ones back. The loop never runs
/// several steps to catch up.
pub async fn run_simulation_loop(world: Arc<RwLock<World>>, period: Duration, mut rng: StdRng) {
    let mut interval_timer = interval(period);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip the first tick since it fires immediately
    interval_timer.tick().await;

    loop {
        interval_timer.tick().await;

        let mut state = world.write().await;
        if state.paused {
            continue;
        }

        let outcome = state.step(&mut rng);

        if let Some(player) = outcome.scored {
            let snapshot = state.snapshot();
            info!(
                "{} scored ({} : {}), target respawned at ({}, {})",
                player, snapshot.scores.0, snapshot.scores.1, snapshot.target.0, snapshot.target.1
            );
        }

        if state.tick % REPORT_INTERVAL == 0 {
            debug!("Tick {}: {}", state.tick, state.snapshot());
        }
    }
}

/// Sends the current world snapshot to every connected player.
///
/// The snapshot is taken and the writers are collected before any I/O, so
/// no lock on the world or roster is held while writing. Each failed write
/// is reported to the supervisor. Returns the number of players that
/// received the line.
pub async fn broadcast_snapshot(
    world: &RwLock<World>,
    roster: &RwLock<Roster>,
    server_tx: &mpsc::UnboundedSender<ServerMessage>,
) -> usize {
    let line = world.read().await.snapshot().encode();
    let writers = roster.read().await.writers();

    let mut delivered = 0;
    for (player, writer) in writers {
        let result = {
            let mut writer = writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };

        match result {
            Ok(()) => delivered += 1,
            Err(e) => {
                let fault = ConnectionFault::Write(e);
                if let Err(e) = server_tx.send(ServerMessage::ConnectionFault { player, fault }) {
                    error!("Failed to report broadcast failure: {}", e);
                }
            }
        }
    }
    delivered
}

/// Broadcasts once per `period` for as long as the task lives.
///
/// There is no timeout on top of the socket's own buffering: a peer that
/// stops reading eventually stalls this loop for everyone.
pub async fn run_broadcast_loop(
    world: Arc<RwLock<World>>,
    roster: Arc<RwLock<Roster>>,
    period: Duration,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let mut interval_timer = interval(period);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut broadcasts: u64 = 0;
    loop {
        interval_timer.tick().await;

        let delivered = broadcast_snapshot(&world, &roster, &server_tx).await;
        broadcasts += 1;

        if broadcasts % REPORT_INTERVAL == 0 {
            debug!("Broadcast {}: delivered to {} players", broadcasts, delivered);
        }
    }
}

/// Two-player game server.
///
/// Lifecycle: [`Server::bind`] validates the configuration, creates the
/// world and binds the listener. [`Server::run_until`] accepts exactly two
/// players, starts all loops and supervises them until shutdown.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    world: Arc<RwLock<World>>,
    roster: Arc<RwLock<Roster>>,
    rng: StdRng,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,

    input_tasks: HashMap<PlayerId, JoinHandle<()>>,
    loop_tasks: Vec<JoinHandle<()>>,
}

impl Server {
    /// Validates the configuration and binds the listening socket. Any
    /// failure here is fatal and happens before any loop starts.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let world = World::from_config(&config.world, &mut rng);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            config,
            world: Arc::new(RwLock::new(world)),
            roster: Arc::new(RwLock::new(Roster::new())),
            rng,
            server_tx,
            server_rx,
            input_tasks: HashMap::new(),
            loop_tasks: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the world, for observers such as tests.
    pub fn world(&self) -> Arc<RwLock<World>> {
        Arc::clone(&self.world)
    }

    /// Shared handle to the session roster.
    pub fn roster(&self) -> Arc<RwLock<Roster>> {
        Arc::clone(&self.roster)
    }

    /// Runs until Ctrl+C or, on Unix, SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let signal = shutdown_signal()?;
        self.run_until(signal).await
    }

    /// Runs until `shutdown` completes.
    ///
    /// Shutdown is abrupt: every task is aborted and every socket dropped
    /// without waiting for in-flight reads or writes.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!("Waiting for 2 players");
        let accepted = tokio::select! {
            result = self.accept_players() => Some(result),
            _ = &mut shutdown => None,
        };
        match accepted {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.shutdown().await;
                return Err(e);
            }
            None => {
                info!("Shutdown requested before both players joined");
                self.shutdown().await;
                return Ok(());
            }
        }

        self.spawn_simulation_loop();
        self.spawn_broadcast_loop();
        info!("Both players connected, game started");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::ConnectionFault { player, fault }) => {
                            self.handle_fault(player, fault).await;
                        }
                        None => {
                            error!("Supervisor channel closed");
                            break;
                        }
                    }
                },
                _ = &mut shutdown => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Accepts exactly two connections. The first becomes Player 1.
    async fn accept_players(&mut self) -> Result<(), ServerError> {
        for player in PlayerId::ALL {
            let (stream, addr) = self.accept_one().await;

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to disable Nagle for {}: {}", addr, e);
            }
            let (reader, writer) = stream.into_split();

            self.roster
                .write()
                .await
                .admit(player, addr, Box::new(writer))?;
            self.spawn_input_channel(player, reader);
        }
        Ok(())
    }

    async fn accept_one(&self) -> (TcpStream, SocketAddr) {
        loop {
            match self.listener.accept().await {
                Ok(accepted) => return accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Spawns the task reading one player's commands
    fn spawn_input_channel<R>(&mut self, player: PlayerId, reader: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let world = Arc::clone(&self.world);
        let server_tx = self.server_tx.clone();

        let handle = tokio::spawn(async move {
            let fault = run_input_channel(player, reader, world).await;
            if let Err(e) = server_tx.send(ServerMessage::ConnectionFault { player, fault }) {
                error!("Failed to report disconnect of {}: {}", player, e);
            }
        });
        self.input_tasks.insert(player, handle);
    }

    /// Spawns the fixed-rate simulation task
    fn spawn_simulation_loop(&mut self) {
        let world = Arc::clone(&self.world);
        let period = self.config.tick_period;
        let rng = StdRng::from_rng(&mut self.rng).unwrap_or_else(|_| StdRng::from_entropy());

        self.loop_tasks.push(tokio::spawn(async move {
            run_simulation_loop(world, period, rng).await;
        }));
    }

    /// Spawns the fixed-rate broadcast task
    fn spawn_broadcast_loop(&mut self) {
        let world = Arc::clone(&self.world);
        let roster = Arc::clone(&self.roster);
        let period = self.config.broadcast_period;
        let server_tx = self.server_tx.clone();

        self.loop_tasks.push(tokio::spawn(async move {
            run_broadcast_loop(world, roster, period, server_tx).await;
        }));
    }

    /// Removes a failed player and applies the disconnect policy. Repeated
    /// reports for a player that is already gone are ignored.
    async fn handle_fault(&mut self, player: PlayerId, fault: ConnectionFault) {
        let (removed, remaining) = {
            let mut roster = self.roster.write().await;
            (roster.remove(player), roster.len())
        };

        let Some(connection) = removed else {
            debug!("Ignoring repeated fault for {}: {}", player, fault);
            return;
        };

        warn!(
            "{} ({}) disconnected after {:.1}s: {}",
            player,
            connection.addr,
            connection.connected_for().as_secs_f32(),
            fault
        );

        if let Some(handle) = self.input_tasks.remove(&player) {
            handle.abort();
        }
        drop(connection);

        match self.config.disconnect_policy {
            DisconnectPolicy::Continue => {}
            DisconnectPolicy::Freeze => self.world.write().await.freeze_player(player),
            DisconnectPolicy::Pause => self.world.write().await.pause(),
        }

        if remaining == 0 {
            info!("All players have left, waiting for shutdown");
        } else {
            info!("{} plays on", player.other());
        }
    }

    async fn shutdown(mut self) {
        for (_, handle) in self.input_tasks.drain() {
            handle.abort();
        }
        for handle in self.loop_tasks.drain(..) {
            handle.abort();
        }

        let closed = self.roster.write().await.clear();
        drop(self.listener);
        info!("Server stopped, closed {} connections", closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::physics::Vector2;
    use crate::session::ConnectionWriter;
    use assert_approx_eq::assert_approx_eq;
    use tokio_test::io::Builder;

    fn test_world() -> Arc<RwLock<World>> {
        Arc::new(RwLock::new(World::new(
            &WorldConfig::default(),
            Vector2::new(250.0, 250.0),
        )))
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:21002".parse().unwrap()
    }

    /// Writer whose every write fails.
    struct BrokenPipe;

    impl tokio::io::AsyncWrite for BrokenPipe {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<io::Result<usize>> {
            std::task::Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_input_channel_applies_commands_until_eof() {
        let world = test_world();
        let reader = Builder::new().read(b"UP\nUP\n").build();

        let fault = run_input_channel(PlayerId::One, reader, Arc::clone(&world)).await;

        assert!(matches!(fault, ConnectionFault::Closed));
        let state = world.read().await;
        assert_approx_eq!(state.player(PlayerId::One).velocity.y, -4.0);
        assert_eq!(state.player(PlayerId::Two).velocity, Vector2::ZERO);
    }

    #[tokio::test]
    async fn test_input_channel_handles_split_and_joined_reads() {
        let world = test_world();
        let reader = Builder::new()
            .read(b"LE")
            .read(b"FT\nRIGHT\nRI")
            .read(b"GHT\r\nDOWN\n")
            .build();

        run_input_channel(PlayerId::Two, reader, Arc::clone(&world)).await;

        let state = world.read().await;
        let body = state.player(PlayerId::Two);
        assert_approx_eq!(body.velocity.x, 2.0);
        assert_approx_eq!(body.velocity.y, 2.0);
    }

    #[tokio::test]
    async fn test_input_channel_ignores_unknown_tokens() {
        let world = test_world();
        let reader = Builder::new()
            .read(b"JUMP\n\nup\nUP DOWN\nLEFT\n")
            .build();

        let fault = run_input_channel(PlayerId::One, reader, Arc::clone(&world)).await;

        assert!(matches!(fault, ConnectionFault::Closed));
        let state = world.read().await;
        let body = state.player(PlayerId::One);
        assert_approx_eq!(body.velocity.x, -2.0);
        assert_approx_eq!(body.velocity.y, 0.0);
    }

    #[tokio::test]
    async fn test_input_channel_clamps_velocity() {
        let world = test_world();
        let flood = "RIGHT\n".repeat(40);
        let reader = Builder::new().read(flood.as_bytes()).build();

        run_input_channel(PlayerId::One, reader, Arc::clone(&world)).await;

        let state = world.read().await;
        assert_approx_eq!(state.player(PlayerId::One).velocity.x, 12.0);
    }

    #[tokio::test]
    async fn test_input_channel_read_error_is_terminal() {
        let world = test_world();
        let reader = Builder::new()
            .read(b"DOWN\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        let fault = run_input_channel(PlayerId::Two, reader, Arc::clone(&world)).await;

        assert!(matches!(fault, ConnectionFault::Read(_)));
        let state = world.read().await;
        assert_approx_eq!(state.player(PlayerId::Two).velocity.y, 2.0);
    }

    #[tokio::test]
    async fn test_input_channel_invalid_utf8_is_decode_fault() {
        let world = test_world();
        let reader = Builder::new().read(b"\xff\xfe\n").build();

        let fault = run_input_channel(PlayerId::One, reader, world).await;

        assert!(matches!(fault, ConnectionFault::Decode(_)));
    }

    #[tokio::test]
    async fn test_input_channel_rejects_oversized_line() {
        let world = test_world();
        let (mut client, server) = tokio::io::duplex(4096);

        let channel = tokio::spawn(run_input_channel(PlayerId::One, server, Arc::clone(&world)));
        client.write_all(b"UP\n").await.unwrap();
        let junk = vec![b'A'; 1 << 20];
        // The write may fail once the channel gives up and drops its end.
        let _ = client.write_all(&junk).await;

        let fault = tokio::time::timeout(Duration::from_secs(5), channel)
            .await
            .expect("channel should end")
            .unwrap();
        assert!(matches!(fault, ConnectionFault::Decode(_)));
        let state = world.read().await;
        assert_approx_eq!(state.player(PlayerId::One).velocity.y, -2.0);
    }

    #[tokio::test]
    async fn test_input_channel_accepts_line_at_limit() {
        let world = test_world();
        let mut line = " ".repeat(MAX_COMMAND_LINE as usize - 3);
        line.push_str("UP\n");
        let reader = Builder::new().read(line.as_bytes()).read(b"DOWN").build();

        let fault = run_input_channel(PlayerId::Two, reader, Arc::clone(&world)).await;

        assert!(matches!(fault, ConnectionFault::Closed));
        let state = world.read().await;
        assert_approx_eq!(state.player(PlayerId::Two).velocity.y, 0.0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_player() {
        let world = test_world();
        let roster = RwLock::new(Roster::new());
        let (server_tx, mut server_rx) = mpsc::unbounded_channel();

        let (p1_server, mut p1_client) = tokio::io::duplex(256);
        let (p2_server, mut p2_client) = tokio::io::duplex(256);
        {
            let mut roster = roster.write().await;
            roster
                .admit(PlayerId::One, test_addr(), Box::new(p1_server))
                .unwrap();
            roster
                .admit(PlayerId::Two, test_addr(), Box::new(p2_server))
                .unwrap();
        }

        let delivered = broadcast_snapshot(&world, &roster, &server_tx).await;
        assert_eq!(delivered, 2);

        let expected = "100,50;400,300;250,250;0,0\n";
        for client in [&mut p1_client, &mut p2_client] {
            let mut buf = vec![0u8; expected.len()];
            client.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, expected.as_bytes());
        }
        assert!(server_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_reported_not_removed() {
        let world = test_world();
        let roster = RwLock::new(Roster::new());
        let (server_tx, mut server_rx) = mpsc::unbounded_channel();

        let (p2_server, mut p2_client) = tokio::io::duplex(256);
        {
            let mut roster = roster.write().await;
            let broken: ConnectionWriter = Box::new(BrokenPipe);
            roster.admit(PlayerId::One, test_addr(), broken).unwrap();
            roster
                .admit(PlayerId::Two, test_addr(), Box::new(p2_server))
                .unwrap();
        }

        let delivered = broadcast_snapshot(&world, &roster, &server_tx).await;
        assert_eq!(delivered, 1);

        match server_rx.try_recv() {
            Ok(ServerMessage::ConnectionFault { player, fault }) => {
                assert_eq!(player, PlayerId::One);
                assert!(matches!(fault, ConnectionFault::Write(_)));
            }
            other => panic!("Unexpected message: {:?}", other),
        }
        // Removal is the supervisor's job
        assert_eq!(roster.read().await.len(), 2);

        let mut line = String::new();
        let mut reader = BufReader::new(&mut p2_client);
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "100,50;400,300;250,250;0,0\n");
    }

    #[tokio::test]
    async fn test_broadcast_skips_departed_player() {
        let world = test_world();
        let roster = RwLock::new(Roster::new());
        let (server_tx, _server_rx) = mpsc::unbounded_channel();

        let (p1_server, p1_client) = tokio::io::duplex(256);
        let (p2_server, mut p2_client) = tokio::io::duplex(256);
        {
            let mut roster = roster.write().await;
            roster
                .admit(PlayerId::One, test_addr(), Box::new(p1_server))
                .unwrap();
            roster
                .admit(PlayerId::Two, test_addr(), Box::new(p2_server))
                .unwrap();
            roster.remove(PlayerId::One);
        }
        drop(p1_client);

        world.write().await.apply_command(PlayerId::Two, Command::Left);
        world.write().await.step(&mut StdRng::seed_from_u64(0));

        let delivered = broadcast_snapshot(&world, &roster, &server_tx).await;
        assert_eq!(delivered, 1);

        let mut line = String::new();
        BufReader::new(&mut p2_client)
            .read_line(&mut line)
            .await
            .unwrap();
        assert_eq!(line, "100,50;398,300;250,250;0,0\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_loop_steps_at_fixed_rate() {
        let world = test_world();
        world.write().await.apply_command(PlayerId::One, Command::Right);

        let task = tokio::spawn(run_simulation_loop(
            Arc::clone(&world),
            Duration::from_millis(33),
            StdRng::seed_from_u64(1),
        ));

        tokio::time::sleep(Duration::from_millis(33 * 10 + 5)).await;
        task.abort();

        let state = world.read().await;
        assert_eq!(state.tick, 10);
        assert_approx_eq!(state.player(PlayerId::One).position.x, 120.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_world_is_not_stepped() {
        let world = test_world();
        {
            let mut state = world.write().await;
            state.apply_command(PlayerId::Two, Command::Up);
            state.pause();
        }

        let task = tokio::spawn(run_simulation_loop(
            Arc::clone(&world),
            Duration::from_millis(33),
            StdRng::seed_from_u64(1),
        ));

        tokio::time::sleep(Duration::from_millis(500)).await;
        task.abort();

        let state = world.read().await;
        assert_eq!(state.tick, 0);
        assert_eq!(state.player(PlayerId::Two).position, Vector2::new(400.0, 300.0));
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let mut config = ServerConfig::default();
        config.bind_addr = "127.0.0.1:0".to_string();
        config.tick_period = Duration::ZERO;

        let result = Server::bind(config).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_bind_reports_address_in_use() {
        let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = ServerConfig::default();
        config.bind_addr = holder.local_addr().unwrap().to_string();

        let result = Server::bind(config).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_resolves_shutdown_signal() {
        let signal = shutdown_signal().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), signal)
            .await
            .expect("SIGTERM should resolve the shutdown future");
    }

    #[tokio::test]
    async fn test_shutdown_before_players_join() {
        let mut config = ServerConfig::default();
        config.bind_addr = "127.0.0.1:0".to_string();

        let server = Server::bind(config).await.unwrap();
        let result = server.run_until(async {}).await;
        assert!(result.is_ok());
    }
}
