//! Physics and collision engine.
//!
//! One call to [`step`] advances the world by exactly one tick:
//!
//! 1. every player body moves by its velocity and bounces off the walls
//! 2. overlapping players exchange their velocity vectors
//! 3. the first player (in seat order) touching the target scores and the
//!    target respawns
//!
//! The velocity exchange in (2) is a deliberate simplification of an
//! elastic collision. It ignores mass and contact normal, so a glancing
//! hit transfers the full velocity just like a head-on one.

use crate::game::{Body, Bounds, World};
use rand::Rng;
use shared::PlayerId;

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is down, matching screen coordinates.
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns the Euclidean distance between two points.
    pub fn distance(&self, other: &Vector2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Vector2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vector2 { x, y }
    }
}

/// What happened during a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// The two players overlapped and exchanged velocities.
    pub players_collided: bool,
    /// The player that consumed the target this tick, if any.
    pub scored: Option<PlayerId>,
}

/// Returns true if two circles overlap. Touching circles do not.
pub fn circles_overlap(a: Vector2, a_radius: f32, b: Vector2, b_radius: f32) -> bool {
    a.distance(&b) < a_radius + b_radius
}

/// Moves a body by its velocity and resolves wall contact.
///
/// On an axis where the body pokes out of the world the velocity component
/// is negated and the position clamped back into `[radius, extent - radius]`,
/// so a fast body can never stay stuck outside the walls.
pub fn move_within(body: &mut Body, bounds: Bounds) {
    body.position = body.position.add(&body.velocity);

    if body.position.x - body.radius < 0.0 || body.position.x + body.radius > bounds.width {
        body.velocity.x = -body.velocity.x;
        body.position.x = body
            .position
            .x
            .clamp(body.radius, bounds.width - body.radius);
    }
    if body.position.y - body.radius < 0.0 || body.position.y + body.radius > bounds.height {
        body.velocity.y = -body.velocity.y;
        body.position.y = body
            .position
            .y
            .clamp(body.radius, bounds.height - body.radius);
    }
}

/// Swaps the velocity vectors of two overlapping players.
/// Returns true if they overlapped.
///
/// Each body keeps its own speed limit: a received component above the
/// receiver's max speed is clamped to it.
pub fn resolve_player_collision(a: &mut Body, b: &mut Body) -> bool {
    if !circles_overlap(a.position, a.radius, b.position, b.radius) {
        return false;
    }
    std::mem::swap(&mut a.velocity, &mut b.velocity);
    a.clamp_velocity();
    b.clamp_velocity();
    true
}

/// Advances the world by one tick.
///
/// Only one player can consume the target per tick. Player 1 is checked
/// first, so when both reach the target on the same tick Player 1 scores
/// and the target respawns once.
pub fn step<R: Rng + ?Sized>(world: &mut World, rng: &mut R) -> StepOutcome {
    let bounds = world.bounds;
    for body in world.players.iter_mut() {
        move_within(body, bounds);
    }

    let [player1, player2] = &mut world.players;
    let players_collided = resolve_player_collision(player1, player2);

    let target = world.target;
    let scored = PlayerId::ALL.into_iter().find(|id| {
        let body = &world.players[id.index()];
        circles_overlap(body.position, body.radius, target.position, target.radius)
    });

    if let Some(id) = scored {
        world.players[id.index()].score += 1;
        world.target.respawn(bounds, rng);
    }

    world.tick += 1;

    StepOutcome {
        players_collided,
        scored,
    }
}
