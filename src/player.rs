//! the diver: movement, swimming, breath & collision against the physics terrain

use bevy::prelude::*;

use crate::constants::*;
use crate::physics::PhysicsBackend;

/// longest frame the diver integrates in one go
const MAX_FRAME_DT: f32 = 0.1;
const MAX_STEP_HEIGHT: f32 = 1.0;
const PROBE_EPS: f32 = 0.05;

/// What the input collaborator wants the player to do this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// The player entity as seen by the frame loop.
pub trait PlayerSim {
    /// `terrain` is the physics world holding the level's static bodies
    fn update(
        &mut self,
        dt: f32,
        cursor: Vec2,
        water_surface: f32,
        terrain: &dyn PhysicsBackend,
        intent: PlayerIntent,
    );
    fn position(&self) -> Vec2;
    fn is_dead(&self) -> bool;
    /// +1 facing right, −1 facing left
    fn facing(&self) -> f32 {
        1.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diver {
    pub position: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
    pub submerged: bool,
    pub breath: f32,
    pub aim: Vec2,
    facing: f32,
}

/// is the unit cell with lower‑left corner `(cx, cy)` blocked?
fn cell_solid(terrain: &dyn PhysicsBackend, cx: i32, cy: i32) -> bool {
    terrain.is_solid_at(Vec2::new(cx as f32 + 0.5, cy as f32 + 0.5))
}

fn cell(v: f32) -> i32 {
    v.floor() as i32
}

impl Diver {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            grounded: false,
            submerged: false,
            breath: MAX_BREATH,
            aim: position,
            facing: 1.0,
        }
    }

    /// cell rows spanned by the body at height `y`, bottom‑to‑top
    fn rows_at(y: f32, half: Vec2) -> (i32, i32) {
        (cell(y - half.y + PROBE_EPS), cell(y + half.y - PROBE_EPS))
    }

    /* ===========================================================
       stepped collision resolution
       =========================================================== */
    fn integrate(&mut self, terrain: &dyn PhysicsBackend, dt: f32) {
        let step_dt = dt / COLLISION_STEPS as f32;
        let half = Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT) / 2.0;
        let was_grounded = self.grounded;
        self.grounded = false;

        for _ in 0..COLLISION_STEPS {
            /* ---------- horizontal pass ---------- */
            if self.velocity.x != 0.0 {
                let new_x = self.position.x + self.velocity.x * step_dt;
                let probe_x = new_x + self.velocity.x.signum() * half.x;
                let tx = cell(probe_x);
                let (y_min, y_max) = Self::rows_at(self.position.y, half);

                if (y_min..=y_max).any(|ty| cell_solid(terrain, tx, ty)) {
                    /* one‑tile auto‑step before giving up */
                    let lifted = self.position.y + MAX_STEP_HEIGHT;
                    let (s_min, s_max) = Self::rows_at(lifted, half);
                    let can_step = (was_grounded || self.grounded)
                        && self.velocity.y <= 0.0
                        && !self.submerged;
                    if can_step && !(s_min..=s_max).any(|ty| cell_solid(terrain, tx, ty)) {
                        self.position.y = lifted;
                        self.position.x = new_x;
                        self.grounded = true;
                    } else {
                        self.velocity.x = 0.0;
                    }
                } else {
                    self.position.x = new_x;
                }
            }

            /* ---------- vertical pass ---------- */
            if self.velocity.y != 0.0 {
                let new_y = self.position.y + self.velocity.y * step_dt;
                let probe_y = new_y + self.velocity.y.signum() * half.y;
                let ty = cell(probe_y);
                let x_left = cell(self.position.x - half.x + PROBE_EPS);
                let x_right = cell(self.position.x + half.x - PROBE_EPS);

                if (x_left..=x_right).any(|tx| cell_solid(terrain, tx, ty)) {
                    if self.velocity.y < 0.0 {
                        self.grounded = true;
                    }
                    self.velocity.y = 0.0;
                } else {
                    self.position.y = new_y;
                }
            }
        }
    }
}

impl PlayerSim for Diver {
    fn update(
        &mut self,
        dt: f32,
        cursor: Vec2,
        water_surface: f32,
        terrain: &dyn PhysicsBackend,
        intent: PlayerIntent,
    ) {
        if self.is_dead() {
            return;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.submerged = self.position.y < water_surface;

        /* ---- walk / swim ---- */
        let speed = if self.submerged { SWIM_SPEED } else { WALK_SPEED };
        self.velocity.x = match (intent.left, intent.right) {
            (true, false) => -speed,
            (false, true) => speed,
            _ => 0.0,
        };

        /* ---- gravity, buoyancy & jumping ---- */
        if self.submerged {
            self.velocity.y += GRAVITY * (1.0 - BUOYANCY) * dt;
            if intent.up {
                self.velocity.y += SWIM_ACCEL * dt;
            }
            if intent.down {
                self.velocity.y -= SWIM_ACCEL * dt;
            }
            self.velocity.y -= self.velocity.y * (WATER_DRAG * dt).min(1.0);
            self.velocity.y = self.velocity.y.clamp(-SWIM_SPEED, SWIM_SPEED);
        } else {
            self.velocity.y += GRAVITY * dt;
            if intent.up && self.grounded {
                self.velocity.y = JUMP_SPEED;
            }
        }

        /* ---- breath ---- */
        let head = self.position.y + PLAYER_HEIGHT * 0.5;
        if head < water_surface {
            self.breath = (self.breath - dt).max(0.0);
        } else {
            self.breath = (self.breath + BREATH_RECOVERY * dt).min(MAX_BREATH);
        }

        /* ---- aim ---- */
        self.aim = cursor;
        let dx = cursor.x - self.position.x;
        if dx != 0.0 {
            self.facing = dx.signum();
        }

        self.integrate(terrain, dt);
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_dead(&self) -> bool {
        self.breath <= 0.0
    }

    fn facing(&self) -> f32 {
        self.facing
    }
}
