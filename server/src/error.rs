//! Error types for each failure boundary of the server.

use shared::PlayerId;
use std::io;
use thiserror::Error;

/// Terminal failure of a single player's connection.
///
/// Any of these removes the player from the session. None of them stops
/// the server.
#[derive(Debug, Error)]
pub enum ConnectionFault {
    #[error("connection closed by peer")]
    Closed,
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    #[error("undecodable input: {0}")]
    Decode(#[source] io::Error),
}

impl ConnectionFault {
    /// Classifies an error returned while reading command lines.
    pub fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData => ConnectionFault::Decode(err),
            io::ErrorKind::UnexpectedEof => ConnectionFault::Closed,
            _ => ConnectionFault::Read(err),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("{0} is already connected")]
    Occupied(PlayerId),
    #[error("{0} already left and cannot rejoin")]
    Departed(PlayerId),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} period must be greater than zero")]
    ZeroPeriod(&'static str),
    #[error("{body} with radius {radius} does not fit in a {width}x{height} world")]
    BodyDoesNotFit {
        body: &'static str,
        radius: f32,
        width: f32,
        height: f32,
    },
    #[error("{body} spawn ({x}, {y}) is outside the walls")]
    SpawnOutOfBounds { body: &'static str, x: f32, y: f32 },
    #[error("{0} needs positive acceleration and max speed")]
    NonPositiveSpeed(&'static str),
}

/// Faults that stop the server before or during startup.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("session error: {0}")]
    Roster(#[from] RosterError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
