//! Session roster: which players are connected and where to send them state.
//!
//! Players are admitted only while the server is starting up and removed
//! one at a time when their connection fails. A seat that has been vacated
//! stays vacated for the rest of the run.

use crate::error::RosterError;
use log::info;
use shared::PlayerId;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

/// Outbound half of a player's connection.
pub type ConnectionWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared handle to a writer. The broadcast loop locks it for the duration
/// of one write; dropping the last handle closes the outbound stream.
pub type SharedWriter = Arc<Mutex<ConnectionWriter>>;

/// A connected player.
pub struct PlayerConnection {
    pub player: PlayerId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    writer: SharedWriter,
}

impl PlayerConnection {
    pub fn new(player: PlayerId, addr: SocketAddr, writer: ConnectionWriter) -> Self {
        Self {
            player,
            addr,
            connected_at: Instant::now(),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn writer(&self) -> SharedWriter {
        Arc::clone(&self.writer)
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for PlayerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerConnection")
            .field("player", &self.player)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// Connected players, at most one per seat.
#[derive(Debug, Default)]
pub struct Roster {
    connections: HashMap<PlayerId, PlayerConnection>,
    departed: HashSet<PlayerId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats a player. Fails if the seat is taken or was vacated earlier.
    pub fn admit(
        &mut self,
        player: PlayerId,
        addr: SocketAddr,
        writer: ConnectionWriter,
    ) -> Result<(), RosterError> {
        if self.departed.contains(&player) {
            return Err(RosterError::Departed(player));
        }
        if self.connections.contains_key(&player) {
            return Err(RosterError::Occupied(player));
        }

        info!("{} connected from {}", player, addr);
        self.connections
            .insert(player, PlayerConnection::new(player, addr, writer));
        Ok(())
    }

    /// Removes a player. Returns the connection the first time only, so
    /// concurrent failure reports for the same player collapse into one
    /// removal.
    pub fn remove(&mut self, player: PlayerId) -> Option<PlayerConnection> {
        let connection = self.connections.remove(&player)?;
        self.departed.insert(player);
        Some(connection)
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.connections.contains_key(&player)
    }

    pub fn has_departed(&self, player: PlayerId) -> bool {
        self.departed.contains(&player)
    }

    /// Connected players in seat order.
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.connections.keys().copied().collect();
        players.sort();
        players
    }

    /// Writers of every connected player in seat order, for broadcasting
    /// without holding the roster lock during I/O.
    pub fn writers(&self) -> Vec<(PlayerId, SharedWriter)> {
        self.players()
            .into_iter()
            .filter_map(|player| {
                self.connections
                    .get(&player)
                    .map(|connection| (player, connection.writer()))
            })
            .collect()
    }

    /// Drops every connection. Used at shutdown.
    pub fn clear(&mut self) -> usize {
        let count = self.connections.len();
        self.departed.extend(self.connections.keys().copied());
        self.connections.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
