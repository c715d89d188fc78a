//! # Duel Server Library
//!
//! Authoritative server for a two-player arena game. Two circles chase a
//! target around a walled arena; touching the target scores a point and
//! moves the target somewhere else.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server owns the only real copy of the world. Clients send
//! directional commands and receive position snapshots; they never
//! simulate anything themselves.
//!
//! ### Session Management
//! Exactly two connections are accepted at startup. The first is Player 1,
//! the second Player 2. A player whose connection fails is removed and is
//! never replaced during the run.
//!
//! ### State Broadcasting
//! A snapshot of the world is sent to every connected player roughly 33
//! times per second, independently of the simulation rate.
//!
//! ## Architecture Design
//!
//! Every concurrent activity is its own tokio task:
//!
//! - **Input Channel** (one per player): decodes `UP`/`DOWN`/`LEFT`/`RIGHT`
//!   lines and accelerates that player's body
//! - **Simulation Loop**: steps the world every 33 ms
//! - **Broadcast Loop**: writes the world snapshot to every player every 30 ms
//! - **Supervisor**: accepts players, starts the loops, removes failed
//!   players and handles shutdown
//!
//! The world sits behind one lock and the session roster behind another.
//! Neither lock is ever held across a socket read or write. Worker tasks
//! report connection failures to the supervisor over a channel instead of
//! mutating the roster themselves.
//!
//! ## Module Organization
//!
//! - `config`: server, world and body parameters plus validation
//! - `error`: error types for each failure boundary
//! - `game`: bodies, target and the world model
//! - `physics`: movement, wall bounces and collision rules
//! - `session`: the roster of connected players
//! - `network`: input channels, loops and the supervisor
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = ServerConfig::default();
//!     config.bind_addr = "127.0.0.1:21002".to_string();
//!
//!     // Blocks until two players have joined, then runs until Ctrl+C or SIGTERM
//!     let server = Server::bind(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod physics;
pub mod session;
