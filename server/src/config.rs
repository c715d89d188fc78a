//! Server configuration and its validation.

use crate::error::ConfigError;
use crate::game::Color;
use shared::{
    ACCELERATION_STEP, BROADCAST_PERIOD_MS, DEFAULT_PORT, MAX_SPEED, PLAYER1_SPAWN, PLAYER2_SPAWN,
    PLAYER_RADIUS, TARGET_RADIUS, TICK_PERIOD_MS, WORLD_HEIGHT, WORLD_WIDTH,
};
use std::time::Duration;

/// What happens to a player's body once their connection is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DisconnectPolicy {
    /// The body keeps moving with its last velocity.
    #[default]
    Continue,
    /// The body's velocity is zeroed once. It can still be pushed around.
    Freeze,
    /// The whole simulation stops stepping. Broadcasts continue.
    Pause,
}

/// Physical parameters of one player body.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub spawn: (f32, f32),
    pub radius: f32,
    pub acceleration: (f32, f32),
    pub max_speed: (f32, f32),
    pub color: Color,
}

impl PlayerConfig {
    fn with_spawn(spawn: (f32, f32), color: Color) -> Self {
        PlayerConfig {
            spawn,
            radius: PLAYER_RADIUS,
            acceleration: (ACCELERATION_STEP, ACCELERATION_STEP),
            max_speed: (MAX_SPEED, MAX_SPEED),
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Player 1 first.
    pub players: [PlayerConfig; 2],
    pub target_radius: f32,
    /// Fixed initial target position. Random when `None`.
    pub target_spawn: Option<(f32, f32)>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            players: [
                PlayerConfig::with_spawn(PLAYER1_SPAWN, Color::Red),
                PlayerConfig::with_spawn(PLAYER2_SPAWN, Color::Green),
            ],
            target_radius: TARGET_RADIUS,
            target_spawn: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tick_period: Duration,
    pub broadcast_period: Duration,
    pub world: WorldConfig,
    pub disconnect_policy: DisconnectPolicy,
    /// Seed for target placement. Taken from OS entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            tick_period: Duration::from_millis(TICK_PERIOD_MS),
            broadcast_period: Duration::from_millis(BROADCAST_PERIOD_MS),
            world: WorldConfig::default(),
            disconnect_policy: DisconnectPolicy::default(),
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Checks that every body can exist inside the world and that both
    /// loops have a usable period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroPeriod("tick"));
        }
        if self.broadcast_period.is_zero() {
            return Err(ConfigError::ZeroPeriod("broadcast"));
        }

        let world = &self.world;
        check_fits("target", world.target_radius, world)?;
        if let Some(spawn) = world.target_spawn {
            check_spawn("target", spawn, world.target_radius, world)?;
        }

        for (name, player) in ["Player 1", "Player 2"].into_iter().zip(&world.players) {
            check_fits(name, player.radius, world)?;
            check_spawn(name, player.spawn, player.radius, world)?;

            let (ax, ay) = player.acceleration;
            let (mx, my) = player.max_speed;
            if !(ax > 0.0 && ay > 0.0 && mx > 0.0 && my > 0.0) {
                return Err(ConfigError::NonPositiveSpeed(name));
            }
        }

        Ok(())
    }
}

fn check_fits(name: &'static str, radius: f32, world: &WorldConfig) -> Result<(), ConfigError> {
    if !(radius > 0.0) || 2.0 * radius > world.width || 2.0 * radius > world.height {
        return Err(ConfigError::BodyDoesNotFit {
            body: name,
            radius,
            width: world.width,
            height: world.height,
        });
    }
    Ok(())
}

fn check_spawn(
    name: &'static str,
    (x, y): (f32, f32),
    radius: f32,
    world: &WorldConfig,
) -> Result<(), ConfigError> {
    let inside = |v: f32, extent: f32| v >= radius && v <= extent - radius;
    if !inside(x, world.width) || !inside(y, world.height) {
        return Err(ConfigError::SpawnOutOfBounds { body: name, x, y });
    }
    Ok(())
}
