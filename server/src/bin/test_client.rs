//! Headless player for trying out the server without a game window.
//!
//! Sends a command script at a fixed cadence and prints every snapshot it
//! receives, either as text or as JSON lines.

use clap::Parser;
use log::{error, info, warn};
use shared::{Command, SnapshotDecoder, DEFAULT_PORT};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::time::interval;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Comma-separated commands, e.g. "UP,UP,LEFT"
    #[clap(short, long, default_value = "")]
    commands: String,
    /// How many times to play the command script
    #[clap(short, long, default_value_t = 1)]
    repeat: u32,
    /// Delay between commands in milliseconds
    #[clap(short, long, default_value_t = 50)]
    interval_ms: u64,
    /// Stop after this many snapshots
    #[clap(short, long)]
    limit: Option<usize>,
    /// Print snapshots as JSON
    #[clap(long)]
    json: bool,
}

fn parse_script(script: &str) -> Vec<Command> {
    script
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .filter_map(|token| {
            let command = Command::parse(token);
            if command.is_none() {
                warn!("Skipping unknown command {:?}", token);
            }
            command
        })
        .collect()
}

async fn send_script(
    mut writer: OwnedWriteHalf,
    script: Vec<Command>,
    repeat: u32,
    period: Duration,
) -> std::io::Result<()> {
    let mut timer = interval(period);
    for _ in 0..repeat {
        for command in &script {
            timer.tick().await;
            writer.write_all(command.to_line().as_bytes()).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let stream = TcpStream::connect(&address).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", address);

    let (mut reader, writer) = stream.into_split();

    let script = parse_script(&args.commands);
    let sender = tokio::spawn(send_script(
        writer,
        script,
        args.repeat,
        Duration::from_millis(args.interval_ms),
    ));

    let mut decoder = SnapshotDecoder::new();
    let mut buffer = [0u8; 1024];
    let mut received = 0;

    'receive: loop {
        let len = reader.read(&mut buffer).await?;
        if len == 0 {
            info!("Disconnected from server");
            break;
        }

        let chunk = String::from_utf8_lossy(&buffer[..len]);
        for result in decoder.push(&chunk) {
            match result {
                Ok(snapshot) if args.json => println!("{}", serde_json::to_string(&snapshot)?),
                Ok(snapshot) => println!("{}", snapshot),
                Err(e) => error!("Bad snapshot line: {}", e),
            }

            received += 1;
            if args.limit.map_or(false, |limit| received >= limit) {
                break 'receive;
            }
        }
    }

    sender.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = parse_script("UP, LEFT,,JUMP,RIGHT");
        assert_eq!(script, vec![Command::Up, Command::Left, Command::Right]);
    }

    #[test]
    fn test_parse_empty_script() {
        assert!(parse_script("").is_empty());
    }
}
