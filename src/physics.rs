//! physics seam, Rapier backend & fixed‑step manager
use bevy::log::{debug, info};
use bevy::prelude::*;
use bevy_rapier2d::rapier::prelude as rp;
use std::collections::HashMap;

use crate::camera::CameraRig;
use crate::collision::{self, CollisionBody};
use crate::constants::MAX_SUBSTEPS;
use crate::tile_grid::TileGrid;

/// Opaque id of a body inside a [`PhysicsBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// Minimal capability the terrain and the frame loop need from a physics
/// engine.
pub trait PhysicsBackend {
    /// fixed, axis‑aligned box covering `shape` (world units)
    fn create_static_body(&mut self, shape: Rect) -> BodyHandle;
    fn remove_body(&mut self, handle: BodyHandle) -> bool;
    fn step(&mut self, dt: f32);
    fn body_count(&self) -> usize;
    fn is_solid_at(&self, point: Vec2) -> bool;
    /// world‑space bounding boxes of every collider
    fn body_outlines(&self) -> Vec<Rect>;
    fn dispose(&mut self);
}

/* ===========================================================
   Rapier
   =========================================================== */
pub struct RapierBackend {
    gravity: rp::Vector<rp::Real>,
    params: rp::IntegrationParameters,
    pipeline: rp::PhysicsPipeline,
    islands: rp::IslandManager,
    broad_phase: rp::DefaultBroadPhase,
    narrow_phase: rp::NarrowPhase,
    bodies: rp::RigidBodySet,
    colliders: rp::ColliderSet,
    impulse_joints: rp::ImpulseJointSet,
    multibody_joints: rp::MultibodyJointSet,
    ccd: rp::CCDSolver,
    handles: HashMap<BodyHandle, rp::RigidBodyHandle>,
    next_handle: u64,
}

impl Default for RapierBackend {
    fn default() -> Self {
        Self {
            gravity: rp::vector![0.0, -9.81],
            params: rp::IntegrationParameters::default(),
            pipeline: rp::PhysicsPipeline::new(),
            islands: rp::IslandManager::new(),
            broad_phase: rp::DefaultBroadPhase::new(),
            narrow_phase: rp::NarrowPhase::new(),
            bodies: rp::RigidBodySet::new(),
            colliders: rp::ColliderSet::new(),
            impulse_joints: rp::ImpulseJointSet::new(),
            multibody_joints: rp::MultibodyJointSet::new(),
            ccd: rp::CCDSolver::new(),
            handles: HashMap::new(),
            next_handle: 0,
        }
    }
}

impl RapierBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhysicsBackend for RapierBackend {
    fn create_static_body(&mut self, shape: Rect) -> BodyHandle {
        let centre = shape.center();
        let half = shape.half_size();
        let body = rp::RigidBodyBuilder::fixed()
            .translation(rp::vector![centre.x, centre.y])
            .build();
        let rapier_handle = self.bodies.insert(body);
        let collider = rp::ColliderBuilder::cuboid(half.x, half.y).build();
        self.colliders
            .insert_with_parent(collider, rapier_handle, &mut self.bodies);

        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(handle, rapier_handle);
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(rapier_handle) = self.handles.remove(&handle) else {
            return false;
        };
        self.bodies
            .remove(
                rapier_handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn step(&mut self, dt: f32) {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn is_solid_at(&self, point: Vec2) -> bool {
        self.colliders.iter().any(|(_, c)| {
            let aabb = c.compute_aabb();
            point.x >= aabb.mins.x
                && point.x <= aabb.maxs.x
                && point.y >= aabb.mins.y
                && point.y <= aabb.maxs.y
        })
    }

    fn body_outlines(&self) -> Vec<Rect> {
        self.colliders
            .iter()
            .map(|(_, c)| {
                let aabb = c.compute_aabb();
                Rect::new(aabb.mins.x, aabb.mins.y, aabb.maxs.x, aabb.maxs.y)
            })
            .collect()
    }

    fn dispose(&mut self) {
        let handles: Vec<BodyHandle> = self.handles.keys().copied().collect();
        for handle in handles {
            self.remove_body(handle);
        }
        self.islands = rp::IslandManager::new();
        self.broad_phase = rp::DefaultBroadPhase::new();
        self.narrow_phase = rp::NarrowPhase::new();
    }
}

/* ===========================================================
   manager
   =========================================================== */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugLine {
    pub start: Vec2,
    pub end: Vec2,
}

/// Owns the backend and the terrain bodies; steps at a fixed rate no matter
/// how long frames take.
pub struct PhysicsManager<B: PhysicsBackend> {
    backend: B,
    terrain: Vec<CollisionBody>,
    fixed_dt: f32,
    accumulator: f32,
    steps: u64,
    debug_view: Option<Rect>,
}

impl<B: PhysicsBackend> PhysicsManager<B> {
    pub fn new(backend: B, fixed_dt: f32) -> Self {
        Self {
            backend,
            terrain: Vec::new(),
            fixed_dt,
            accumulator: 0.0,
            steps: 0,
            debug_view: None,
        }
    }

    /// replace any existing terrain with bodies for `grid`
    pub fn build_terrain(&mut self, grid: &TileGrid) -> &[CollisionBody] {
        self.clear_terrain();
        self.terrain = collision::build(grid, &mut self.backend);
        &self.terrain
    }

    pub fn terrain(&self) -> &[CollisionBody] {
        &self.terrain
    }

    pub fn world(&self) -> &B {
        &self.backend
    }

    pub fn world_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    pub fn total_steps(&self) -> u64 {
        self.steps
    }

    /// Advance by `frame_delta`, returning how many fixed steps ran.
    pub fn update(&mut self, frame_delta: f32) -> u32 {
        self.accumulator += frame_delta.max(0.0);
        let mut n = 0;
        while self.accumulator >= self.fixed_dt && n < MAX_SUBSTEPS {
            self.backend.step(self.fixed_dt);
            self.accumulator -= self.fixed_dt;
            n += 1;
        }
        if self.accumulator >= self.fixed_dt {
            debug!(
                "physics fell behind, dropping {:.3}s after {n} steps",
                self.accumulator
            );
            self.accumulator %= self.fixed_dt;
        }
        self.steps += n as u64;
        n
    }

    /// track the camera's visible area for debug culling
    pub fn resize(&mut self, camera: &CameraRig) {
        self.debug_view = Some(camera.visible_rect());
    }

    /// outline segments of visible bodies, transformed by `matrix`
    pub fn render_debug(&self, matrix: &Mat4) -> Vec<DebugLine> {
        let project = |p: Vec2| matrix.transform_point3(p.extend(0.0)).truncate();
        let mut lines = Vec::new();
        for rect in self.backend.body_outlines() {
            if let Some(view) = self.debug_view {
                if rect.intersect(view).is_empty() {
                    continue;
                }
            }
            let corners = [
                rect.min,
                Vec2::new(rect.max.x, rect.min.y),
                rect.max,
                Vec2::new(rect.min.x, rect.max.y),
            ];
            for i in 0..4 {
                lines.push(DebugLine {
                    start: project(corners[i]),
                    end: project(corners[(i + 1) % 4]),
                });
            }
        }
        lines
    }

    fn clear_terrain(&mut self) {
        for body in self.terrain.drain(..) {
            self.backend.remove_body(body.handle);
        }
    }

    pub fn dispose(&mut self) {
        let count = self.terrain.len();
        self.clear_terrain();
        self.backend.dispose();
        self.accumulator = 0.0;
        info!("physics disposed ({count} terrain bodies released)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_grid::Tile;

    /// records steps without simulating anything
    #[derive(Default)]
    struct CountingBackend {
        steps: Vec<f32>,
        bodies: HashMap<BodyHandle, Rect>,
        next: u64,
        disposed: bool,
    }

    impl PhysicsBackend for CountingBackend {
        fn create_static_body(&mut self, shape: Rect) -> BodyHandle {
            let h = BodyHandle(self.next);
            self.next += 1;
            self.bodies.insert(h, shape);
            h
        }
        fn remove_body(&mut self, handle: BodyHandle) -> bool {
            self.bodies.remove(&handle).is_some()
        }
        fn step(&mut self, dt: f32) {
            self.steps.push(dt);
        }
        fn body_count(&self) -> usize {
            self.bodies.len()
        }
        fn is_solid_at(&self, point: Vec2) -> bool {
            self.bodies.values().any(|r| r.contains(point))
        }
        fn body_outlines(&self) -> Vec<Rect> {
            self.bodies.values().copied().collect()
        }
        fn dispose(&mut self) {
            self.bodies.clear();
            self.disposed = true;
        }
    }

    #[test]
    fn fixed_steps_accumulate() {
        let dt = 1.0 / 60.0;
        let mut physics = PhysicsManager::new(CountingBackend::default(), dt);
        assert_eq!(physics.update(dt * 0.5), 0);
        assert_eq!(physics.update(dt * 0.6), 1);
        assert_eq!(physics.update(dt * 2.0), 2);
        assert_eq!(physics.total_steps(), 3);
        assert!(physics.world().steps.iter().all(|s| *s == dt));
    }

    #[test]
    fn long_frames_are_capped() {
        let mut physics = PhysicsManager::new(CountingBackend::default(), 0.01);
        assert_eq!(physics.update(1.0), MAX_SUBSTEPS);
        // the backlog was dropped, not carried
        assert_eq!(physics.update(0.0), 0);
    }

    #[test]
    fn terrain_rebuild_replaces_bodies() {
        let grid = TileGrid::from_ascii(&["#####", "#...#", "#####"]);
        let mut physics = PhysicsManager::new(CountingBackend::default(), 0.01);
        physics.build_terrain(&grid);
        let first = physics.world().body_count();
        physics.build_terrain(&grid);
        assert_eq!(physics.world().body_count(), first);
        physics.dispose();
        assert_eq!(physics.world().body_count(), 0);
        assert!(physics.world().disposed);
    }

    #[test]
    fn debug_lines_are_culled_and_transformed() {
        let grid = TileGrid::from_ascii(&["#..", "...", "..#"]);
        let mut physics = PhysicsManager::new(CountingBackend::default(), 0.01);
        physics.build_terrain(&grid);
        assert_eq!(physics.render_debug(&Mat4::IDENTITY).len(), 8);

        let mut camera = CameraRig::new(Vec2::new(3.0, 3.0), Vec2::new(8.0, 8.0), 8.0);
        camera.follow(Vec2::new(0.5, 2.5));
        physics.resize(&camera);
        let lines = physics.render_debug(&Mat4::from_scale(Vec3::splat(8.0)));
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().any(|l| l.start == Vec2::new(0.0, 16.0)));
    }

    #[test]
    fn rapier_bodies_match_solid_tiles() {
        let grid = TileGrid::from_ascii(&[
            "######", //
            "#....#", //
            "#.##.#", //
            "######",
        ]);
        let mut physics = PhysicsManager::new(RapierBackend::new(), 1.0 / 60.0);
        let bodies = physics.build_terrain(&grid).len();
        assert_eq!(physics.world().body_count(), bodies);

        let h = grid.height();
        for (x, y, tile) in grid.iter() {
            let centre = crate::tile_grid::tile_center(h, x, y);
            assert_eq!(
                physics.world().is_solid_at(centre),
                tile == Tile::Solid,
                "tile ({x},{y})"
            );
        }
        physics.update(0.1);
        physics.dispose();
        assert_eq!(physics.world().body_count(), 0);
    }
}
