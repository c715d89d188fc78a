//! Wire protocol shared by the duel server and its clients.
//!
//! The protocol is plaintext and newline-delimited over a persistent TCP
//! connection:
//!
//! - client to server: one of `UP`, `DOWN`, `LEFT`, `RIGHT`, each followed by `\n`
//! - server to client: `x1,y1;x2,y2;fx,fy;s1,s2\n`
//!
//! Anything else a client sends is ignored by the server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

pub const WORLD_WIDTH: f32 = 500.0;
pub const WORLD_HEIGHT: f32 = 500.0;
pub const PLAYER_RADIUS: f32 = 15.0;
pub const TARGET_RADIUS: f32 = 10.0;
pub const ACCELERATION_STEP: f32 = 2.0;
pub const MAX_SPEED: f32 = 12.0;
pub const PLAYER1_SPAWN: (f32, f32) = (100.0, 50.0);
pub const PLAYER2_SPAWN: (f32, f32) = (400.0, 300.0);
pub const DEFAULT_PORT: u16 = 21002;
pub const TICK_PERIOD_MS: u64 = 33;
pub const BROADCAST_PERIOD_MS: u64 = 30;

/// Identity of one of the two seats in a match.
///
/// The first accepted connection is always `One`, the second `Two`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// 1-based seat number as used in logs and on screen.
    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    pub fn index(self) -> usize {
        self.number() as usize - 1
    }

    pub fn other(self) -> PlayerId {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Directional command sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Up, Command::Down, Command::Left, Command::Right];

    /// Decodes a single token. Surrounding whitespace (including a trailing
    /// `\r`) is ignored; anything that is not one of the four literals
    /// yields `None`.
    pub fn parse(token: &str) -> Option<Command> {
        match token.trim() {
            "UP" => Some(Command::Up),
            "DOWN" => Some(Command::Down),
            "LEFT" => Some(Command::Left),
            "RIGHT" => Some(Command::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Up => "UP",
            Command::Down => "DOWN",
            Command::Left => "LEFT",
            Command::Right => "RIGHT",
        }
    }

    /// Token plus line terminator, ready to be written to the socket.
    pub fn to_line(self) -> String {
        format!("{}\n", self.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while decoding a snapshot line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("expected 4 groups, found {0}")]
    GroupCount(usize),
    #[error("group {group} has {found} fields, expected 2")]
    FieldCount { group: usize, found: usize },
    #[error("invalid integer in group {group}: {source}")]
    InvalidNumber {
        group: usize,
        #[source]
        source: ParseIntError,
    },
}

/// One broadcast of the world as seen by clients.
///
/// Positions are whole pixels; the server rounds its internal positions
/// when it builds a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub player1: (i32, i32),
    pub player2: (i32, i32),
    pub target: (i32, i32),
    pub scores: (u32, u32),
}

impl Snapshot {
    pub fn position(&self, player: PlayerId) -> (i32, i32) {
        match player {
            PlayerId::One => self.player1,
            PlayerId::Two => self.player2,
        }
    }

    pub fn score(&self, player: PlayerId) -> u32 {
        match player {
            PlayerId::One => self.scores.0,
            PlayerId::Two => self.scores.1,
        }
    }

    /// Encodes the snapshot as a single `\n`-terminated line.
    pub fn encode(&self) -> String {
        format!(
            "{},{};{},{};{},{};{},{}\n",
            self.player1.0,
            self.player1.1,
            self.player2.0,
            self.player2.1,
            self.target.0,
            self.target.1,
            self.scores.0,
            self.scores.1
        )
    }

    /// Decodes one line. The trailing `\n` is optional.
    pub fn decode(line: &str) -> Result<Snapshot, WireError> {
        let groups: Vec<&str> = line.trim().split(';').collect();
        if groups.len() != 4 {
            return Err(WireError::GroupCount(groups.len()));
        }

        let player1 = parse_pair::<i32>(groups[0], 0)?;
        let player2 = parse_pair::<i32>(groups[1], 1)?;
        let target = parse_pair::<i32>(groups[2], 2)?;
        let scores = parse_pair::<u32>(groups[3], 3)?;

        Ok(Snapshot {
            player1,
            player2,
            target,
            scores,
        })
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P1 ({}, {}) | P2 ({}, {}) | target ({}, {}) | score {} : {}",
            self.player1.0,
            self.player1.1,
            self.player2.0,
            self.player2.1,
            self.target.0,
            self.target.1,
            self.scores.0,
            self.scores.1
        )
    }
}

fn parse_pair<T>(group: &str, index: usize) -> Result<(T, T), WireError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    let fields: Vec<&str> = group.split(',').collect();
    if fields.len() != 2 {
        return Err(WireError::FieldCount {
            group: index,
            found: fields.len(),
        });
    }

    let parse = |field: &str| {
        field.trim().parse::<T>().map_err(|source| WireError::InvalidNumber {
            group: index,
            source,
        })
    };

    Ok((parse(fields[0])?, parse(fields[1])?))
}

/// Incremental decoder for the server-to-client stream.
///
/// A single read may contain several lines, or end in the middle of one.
/// `push` returns every complete line decoded so far and keeps the partial
/// tail for the next call.
#[derive(Debug, Default)]
pub struct SnapshotDecoder {
    pending: String,
}

impl SnapshotDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) -> Vec<Result<Snapshot, WireError>> {
        self.pending.push_str(chunk);

        let mut decoded = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].find('\n') {
            let line = &self.pending[consumed..consumed + offset];
            consumed += offset + 1;
            if line.trim().is_empty() {
                continue;
            }
            decoded.push(Snapshot::decode(line));
        }
        self.pending.drain(..consumed);
        decoded
    }

    /// Bytes received after the last complete line.
    pub fn pending(&self) -> &str {
        &self.pending
    }
}
