use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::keypoint::{Keypoint, KeypointFrame};

pub type ObjectId = u64;

/// Axis-aligned rectangle, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Hitbox {
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            w,
            h,
        }
    }

    /// Inclusive overlap: boxes that share only an edge still collide
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        self.x <= other.x + other.w
            && other.x <= self.x + self.w
            && self.y <= other.y + other.h
            && other.y <= self.y + self.h
    }
}

/// Arena and ball tuning for catch mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    pub hand_size: f32,
    pub ball_radius: f32,
    /// Fall speed in pixels per second
    pub ball_speed: f32,
    pub spawn_inset: f32,
    /// Seconds between spawns at the start of a match
    pub spawn_interval: f32,
    /// Seconds shaved off the interval per second of match time
    pub spawn_decay: f32,
    /// Lower bound on the interval; never below 1.0
    pub min_spawn_interval: f32,
    pub points_per_catch: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: PLAY_WIDTH,
            height: PLAY_HEIGHT,
            hand_size: HAND_SIZE,
            ball_radius: BALL_RADIUS,
            ball_speed: BALL_SPEED,
            spawn_inset: SPAWN_INSET,
            spawn_interval: SPAWN_INTERVAL,
            spawn_decay: SPAWN_DECAY,
            min_spawn_interval: MIN_SPAWN_INTERVAL,
            points_per_catch: CATCH_POINTS,
        }
    }
}

impl ArenaConfig {
    /// Spawn interval after `elapsed` seconds: linear decay down to the floor
    pub fn spawn_interval_at(&self, elapsed: f32) -> f32 {
        let floor = self.min_spawn_interval.max(MIN_SPAWN_INTERVAL);
        (self.spawn_interval - elapsed * self.spawn_decay).max(floor)
    }
}

/// Both hands with their hit rectangles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandState {
    pub left: Keypoint,
    pub right: Keypoint,
    pub size: f32,
}

impl HandState {
    /// Resting position: both hands centred, three quarters down the arena
    pub fn resting(arena: &ArenaConfig) -> Self {
        let rest = Keypoint::new(arena.width / 2.0, arena.height * 0.75);
        Self {
            left: rest,
            right: rest,
            size: arena.hand_size,
        }
    }

    /// Take the wrists of `frame` as the new hand positions
    pub fn track(&mut self, frame: &KeypointFrame) {
        let (left, right) = frame.wrists();
        self.left = left;
        self.right = right;
    }

    pub fn left_box(&self) -> Hitbox {
        Hitbox::centered(self.left.x, self.left.y, self.size, self.size)
    }

    pub fn right_box(&self) -> Hitbox {
        Hitbox::centered(self.right.x, self.right.y, self.size, self.size)
    }
}

/// A falling ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingObject {
    pub id: ObjectId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub speed: f32,
    pub caught: bool,
    /// Match time (seconds) at spawn
    pub spawned_at: f32,
}

impl MovingObject {
    pub fn bounds(&self) -> Hitbox {
        Hitbox::centered(self.x, self.y, self.radius * 2.0, self.radius * 2.0)
    }
}

/// Owns the live balls and resolves them against the hands
#[derive(Debug, Clone)]
pub struct CollisionEngine {
    arena: ArenaConfig,
    objects: Vec<MovingObject>,
    next_id: ObjectId,
    last_spawn: Option<f32>,
}

impl CollisionEngine {
    pub fn new(arena: ArenaConfig) -> Self {
        Self {
            arena,
            objects: Vec::new(),
            next_id: 0,
            last_spawn: None,
        }
    }

    pub fn arena(&self) -> &ArenaConfig {
        &self.arena
    }

    pub fn objects(&self) -> &[MovingObject] {
        &self.objects
    }

    /// Objects still in play (caught ones are hidden until swept)
    pub fn visible(&self) -> impl Iterator<Item = &MovingObject> {
        self.objects.iter().filter(|o| !o.caught)
    }

    /// Add a ball just above the top edge at a random x inside the inset
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, now: f32) -> MovingObject {
        let lo = self.arena.spawn_inset;
        let hi = (self.arena.width - self.arena.spawn_inset).max(lo);
        let x = if hi > lo { rng.gen_range(lo..=hi) } else { lo };

        let obj = MovingObject {
            id: self.next_id,
            x,
            y: -self.arena.ball_radius,
            radius: self.arena.ball_radius,
            speed: self.arena.ball_speed,
            caught: false,
            spawned_at: now,
        };
        self.next_id += 1;
        self.last_spawn = Some(now);
        self.objects.push(obj);
        obj
    }

    /// Spawn if the cadence allows it at match time `now`
    pub fn maybe_spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, now: f32) -> Option<MovingObject> {
        let due = match self.last_spawn {
            None => true,
            Some(last) => now - last >= self.arena.spawn_interval_at(now),
        };
        if due {
            Some(self.spawn(rng, now))
        } else {
            None
        }
    }

    /// Move live balls down by `speed * dt`; sweep caught balls and drop any
    /// that fell past the bottom edge. Returns the removed ids.
    pub fn advance(&mut self, dt: f32) -> Vec<ObjectId> {
        let bottom = self.arena.height;
        let mut removed = Vec::new();
        self.objects.retain_mut(|o| {
            if o.caught {
                removed.push(o.id);
                return false;
            }
            o.y += o.speed * dt;
            if o.y - o.radius > bottom {
                removed.push(o.id);
                return false;
            }
            true
        });
        removed
    }

    /// Mark every live ball touching a hand as caught; returns how many
    pub fn resolve(&mut self, hands: &HandState) -> u32 {
        let left = hands.left_box();
        let right = hands.right_box();
        let mut caught = 0;
        for o in self.objects.iter_mut().filter(|o| !o.caught) {
            let bounds = o.bounds();
            if left.overlaps(&bounds) || right.overlaps(&bounds) {
                o.caught = true;
                caught += 1;
            }
        }
        caught
    }
}
