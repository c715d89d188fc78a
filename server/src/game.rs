//! Authoritative world model: two player bodies, one target and the walls.

use crate::config::{PlayerConfig, WorldConfig};
use crate::physics::{self, StepOutcome, Vector2};
use log::info;
use rand::Rng;
use shared::{Command, PlayerId, Snapshot};

/// Identity tag used by displays to tell bodies apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
}

/// Rectangular extent of the world. The origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

/// A player-controlled circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vector2,
    pub velocity: Vector2,
    pub radius: f32,
    pub color: Color,
    /// Velocity change applied per command, per axis.
    pub acceleration: Vector2,
    /// Largest velocity magnitude allowed per axis.
    pub max_speed: Vector2,
    pub score: u32,
}

impl Body {
    /// Creates a body at its spawn point, at rest and with no score.
    pub fn new(config: &PlayerConfig) -> Self {
        Body {
            position: config.spawn.into(),
            velocity: Vector2::ZERO,
            radius: config.radius,
            color: config.color,
            acceleration: config.acceleration.into(),
            max_speed: config.max_speed.into(),
            score: 0,
        }
    }

    pub fn apply_up(&mut self) {
        self.velocity.y = (self.velocity.y - self.acceleration.y).max(-self.max_speed.y);
    }

    pub fn apply_down(&mut self) {
        self.velocity.y = (self.velocity.y + self.acceleration.y).min(self.max_speed.y);
    }

    pub fn apply_left(&mut self) {
        self.velocity.x = (self.velocity.x - self.acceleration.x).max(-self.max_speed.x);
    }

    pub fn apply_right(&mut self) {
        self.velocity.x = (self.velocity.x + self.acceleration.x).min(self.max_speed.x);
    }

    /// Limits each velocity component to this body's max speed.
    pub fn clamp_velocity(&mut self) {
        self.velocity.x = self.velocity.x.clamp(-self.max_speed.x, self.max_speed.x);
        self.velocity.y = self.velocity.y.clamp(-self.max_speed.y, self.max_speed.y);
    }

    /// Applies one directional command. Repeating a command once the axis
    /// is at its limit leaves the velocity unchanged.
    pub fn accelerate(&mut self, command: Command) {
        match command {
            Command::Up => self.apply_up(),
            Command::Down => self.apply_down(),
            Command::Left => self.apply_left(),
            Command::Right => self.apply_right(),
        }
    }
}

/// The consumable circle players race for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Vector2,
    pub radius: f32,
    pub color: Color,
}

impl Target {
    pub fn new(position: Vector2, radius: f32) -> Self {
        Target {
            position,
            radius,
            color: Color::Yellow,
        }
    }

    /// Moves the target to a uniformly random whole-pixel position that
    /// keeps it fully inside the world.
    pub fn respawn<R: Rng + ?Sized>(&mut self, bounds: Bounds, rng: &mut R) {
        self.position = random_position(bounds, self.radius, rng);
    }
}

/// Picks a whole-pixel position in `[radius, extent - radius]` on both axes.
pub fn random_position<R: Rng + ?Sized>(bounds: Bounds, radius: f32, rng: &mut R) -> Vector2 {
    let axis = |extent: f32, rng: &mut R| {
        let low = radius.ceil() as i32;
        let high = ((extent - radius).floor() as i32).max(low);
        rng.gen_range(low..=high) as f32
    };
    let x = axis(bounds.width, &mut *rng);
    let y = axis(bounds.height, &mut *rng);
    Vector2 { x, y }
}

/// Complete authoritative game state.
#[derive(Debug, Clone)]
pub struct World {
    /// Indexed by [`PlayerId::index`].
    pub players: [Body; 2],
    pub target: Target,
    pub bounds: Bounds,
    /// Number of steps simulated so far. Never sent to clients.
    pub tick: u64,
    /// While set the simulation loop stops stepping the world.
    pub paused: bool,
}

impl World {
    /// Creates the world with both players at their spawn points and the
    /// target at `target_position`.
    pub fn new(config: &WorldConfig, target_position: Vector2) -> Self {
        World {
            players: [Body::new(&config.players[0]), Body::new(&config.players[1])],
            target: Target::new(target_position, config.target_radius),
            bounds: Bounds {
                width: config.width,
                height: config.height,
            },
            tick: 0,
            paused: false,
        }
    }

    /// Creates the world using the configured target spawn, or a random one
    /// when none is configured.
    pub fn from_config<R: Rng + ?Sized>(config: &WorldConfig, rng: &mut R) -> Self {
        let bounds = Bounds {
            width: config.width,
            height: config.height,
        };
        let target = match config.target_spawn {
            Some(spawn) => spawn.into(),
            None => random_position(bounds, config.target_radius, rng),
        };
        World::new(config, target)
    }

    pub fn player(&self, id: PlayerId) -> &Body {
        &self.players[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Body {
        &mut self.players[id.index()]
    }

    /// Applies a player's command. Only the velocity of that player changes.
    pub fn apply_command(&mut self, id: PlayerId, command: Command) {
        self.player_mut(id).accelerate(command);
    }

    /// Advances the simulation by one tick.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StepOutcome {
        physics::step(self, rng)
    }

    /// Stops a departed player's body in place.
    pub fn freeze_player(&mut self, id: PlayerId) {
        let body = self.player_mut(id);
        body.velocity = Vector2::ZERO;
        info!(
            "{} frozen at ({:.0}, {:.0})",
            id, body.position.x, body.position.y
        );
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!("Simulation paused at tick {}", self.tick);
        }
    }

    /// Wire view of the world with positions rounded to whole pixels.
    pub fn snapshot(&self) -> Snapshot {
        let pixel = |v: Vector2| (v.x.round() as i32, v.y.round() as i32);
        Snapshot {
            player1: pixel(self.players[0].position),
            player2: pixel(self.players[1].position),
            target: pixel(self.target.position),
            scores: (self.players[0].score, self.players[1].score),
        }
    }
}
