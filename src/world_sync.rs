//! per‑frame orchestration: level state machine, player, camera & physics
use bevy::log::{debug, info};
use bevy::prelude::*;

use crate::camera::CameraRig;
use crate::config::RunContext;
use crate::constants::{TILE_SIZE, ZOOM_STEP};
use crate::level::CaveMap;
use crate::physics::{DebugLine, PhysicsBackend, PhysicsManager};
use crate::player::{PlayerIntent, PlayerSim};
use crate::tile_grid::TileGrid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelState {
    Ready,
    Running,
    Paused,
    LevelEnd,
    GameOver,
}

/// Requests the frame driver has to act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelEvent {
    ReturnToMenu,
    NextLevel,
}

pub trait AssetReadiness {
    fn is_ready(&self) -> bool;
}

/// One frame of input, already polled by the input collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// screen pixels, origin top‑left
    pub cursor: Vec2,
    pub intent: PlayerIntent,
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub pause: bool,
    pub resume: bool,
    pub menu: bool,
    pub new_level: bool,
}

/// Layer hooks called by [`WorldSyncLoop::draw`] in back‑to‑front order.
pub trait LayerRenderer {
    fn render_background_layers(&mut self, map: &CaveMap, camera: &CameraRig);
    fn render_player(&mut self, position: Vec2, facing: f32);
    fn render_foreground_layers(&mut self, map: &CaveMap, camera: &CameraRig);
    fn render_minimap(&mut self, grid: &TileGrid, player: Vec2, water_row: f32);
    fn render_debug(&mut self, lines: &[DebugLine]);
}

pub struct WorldSyncLoop<B: PhysicsBackend, P: PlayerSim> {
    state: LevelState,
    map: CaveMap,
    physics: PhysicsManager<B>,
    player: P,
    camera: CameraRig,
}

impl<B: PhysicsBackend, P: PlayerSim> WorldSyncLoop<B, P> {
    /// Insert the terrain into `backend` and centre the camera on the player.
    pub fn new(map: CaveMap, backend: B, player: P, viewport: Vec2, fixed_dt: f32) -> Self {
        let mut physics = PhysicsManager::new(backend, fixed_dt);
        physics.build_terrain(&map.grid);

        let mut camera = CameraRig::new(map.size(), viewport, TILE_SIZE);
        camera.follow(player.position());
        physics.resize(&camera);

        Self {
            state: LevelState::Ready,
            map,
            physics,
            player,
            camera,
        }
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn map(&self) -> &CaveMap {
        &self.map
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn physics(&self) -> &PhysicsManager<B> {
        &self.physics
    }

    fn set_state(&mut self, next: LevelState) {
        if self.state != next {
            info!("level {:?} → {:?}", self.state, next);
            self.state = next;
        }
    }

    pub fn pause(&mut self) {
        if self.state == LevelState::Running {
            self.set_state(LevelState::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.state == LevelState::Paused {
            self.set_state(LevelState::Running);
        }
    }

    pub fn end_level(&mut self) {
        if matches!(self.state, LevelState::Running | LevelState::Paused) {
            self.set_state(LevelState::LevelEnd);
        }
    }

    pub fn update(
        &mut self,
        delta: f32,
        input: &FrameInput,
        assets: &impl AssetReadiness,
        ctx: &RunContext,
    ) -> Option<LevelEvent> {
        match self.state {
            LevelState::Ready => {
                if assets.is_ready() {
                    self.set_state(LevelState::Running);
                }
                None
            }
            LevelState::Running => self.update_running(delta, input, ctx),
            LevelState::Paused => {
                if input.resume {
                    self.resume();
                }
                None
            }
            LevelState::LevelEnd => Some(LevelEvent::NextLevel),
            LevelState::GameOver => Some(LevelEvent::ReturnToMenu),
        }
    }

    fn update_running(
        &mut self,
        delta: f32,
        input: &FrameInput,
        ctx: &RunContext,
    ) -> Option<LevelEvent> {
        if input.menu {
            return Some(LevelEvent::ReturnToMenu);
        }
        if input.pause {
            self.pause();
            return None;
        }
        if input.new_level {
            self.end_level();
            return None;
        }

        let cursor = self.camera.screen_to_world(input.cursor);
        self.player.update(
            delta,
            cursor,
            self.map.water_surface_y(),
            self.physics.world(),
            input.intent,
        );

        if input.zoom_in {
            self.camera.zoom_by(-ZOOM_STEP);
        }
        if input.zoom_out {
            self.camera.zoom_by(ZOOM_STEP);
        }
        self.camera.follow(self.player.position());

        let steps = self.physics.update(delta);
        if ctx.debug {
            debug!(
                "tick: player {}, camera {}, {steps} physics steps",
                self.player.position(),
                self.camera.position()
            );
        }

        if self.player.is_dead() {
            self.set_state(LevelState::GameOver);
        }
        None
    }

    pub fn draw(&mut self, ctx: &RunContext, renderer: &mut impl LayerRenderer) {
        self.physics.resize(&self.camera);

        renderer.render_background_layers(&self.map, &self.camera);
        renderer.render_player(self.player.position(), self.player.facing());
        renderer.render_foreground_layers(&self.map, &self.camera);

        if !ctx.hide_ui {
            renderer.render_minimap(&self.map.grid, self.player.position(), self.map.water_row);
            if ctx.debug {
                let lines = self
                    .physics
                    .render_debug(&Mat4::from_scale(Vec3::splat(TILE_SIZE)));
                renderer.render_debug(&lines);
            }
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.camera.resize(width, height);
        self.camera.follow(self.player.position());
        self.physics.resize(&self.camera);
    }

    /// release physics; the loop cannot be used afterwards
    pub fn dispose(mut self) -> CaveMap {
        self.physics.dispose();
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLAYER_HEIGHT;
    use crate::physics::{BodyHandle, RapierBackend};
    use crate::player::Diver;
    use crate::tile_grid::Tile;

    struct Ready(bool);
    impl AssetReadiness for Ready {
        fn is_ready(&self) -> bool {
            self.0
        }
    }

    #[derive(Default)]
    struct NullBackend {
        bodies: usize,
        steps: u32,
    }
    impl PhysicsBackend for NullBackend {
        fn create_static_body(&mut self, _shape: Rect) -> BodyHandle {
            self.bodies += 1;
            BodyHandle(self.bodies as u64)
        }
        fn remove_body(&mut self, _handle: BodyHandle) -> bool {
            self.bodies -= 1;
            true
        }
        fn step(&mut self, _dt: f32) {
            self.steps += 1;
        }
        fn body_count(&self) -> usize {
            self.bodies
        }
        fn is_solid_at(&self, _point: Vec2) -> bool {
            false
        }
        fn body_outlines(&self) -> Vec<Rect> {
            Vec::new()
        }
        fn dispose(&mut self) {}
    }

    /// scripted player: follows a fixed path, dies on request
    struct Puppet {
        pos: Vec2,
        dead: bool,
        last_water: f32,
        last_cursor: Vec2,
    }
    impl PlayerSim for Puppet {
        fn update(
            &mut self,
            _dt: f32,
            cursor: Vec2,
            water: f32,
            _terrain: &dyn PhysicsBackend,
            intent: PlayerIntent,
        ) {
            self.last_water = water;
            self.last_cursor = cursor;
            if intent.right {
                self.pos.x += 10.0;
            }
        }
        fn position(&self) -> Vec2 {
            self.pos
        }
        fn is_dead(&self) -> bool {
            self.dead
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        debug_lines: usize,
    }
    impl LayerRenderer for Recorder {
        fn render_background_layers(&mut self, _m: &CaveMap, _c: &CameraRig) {
            self.calls.push("background");
        }
        fn render_player(&mut self, _p: Vec2, _f: f32) {
            self.calls.push("player");
        }
        fn render_foreground_layers(&mut self, _m: &CaveMap, _c: &CameraRig) {
            self.calls.push("foreground");
        }
        fn render_minimap(&mut self, _g: &TileGrid, _p: Vec2, _w: f32) {
            self.calls.push("minimap");
        }
        fn render_debug(&mut self, lines: &[DebugLine]) {
            self.calls.push("debug");
            self.debug_lines += lines.len();
        }
    }

    fn map() -> CaveMap {
        let mut grid = TileGrid::filled(200, 120, Tile::Empty);
        for x in 0..200 {
            grid.set(x, 119, Tile::Solid);
        }
        CaveMap {
            grid,
            water_row: 100.0,
            spawn: UVec2::new(100, 118),
            seed: 1,
        }
    }

    fn sync() -> WorldSyncLoop<NullBackend, Puppet> {
        let puppet = Puppet {
            pos: Vec2::new(100.0, 2.0),
            dead: false,
            last_water: 0.0,
            last_cursor: Vec2::ZERO,
        };
        WorldSyncLoop::new(map(), NullBackend::default(), puppet, Vec2::new(800.0, 480.0), 0.01)
    }

    fn running() -> WorldSyncLoop<NullBackend, Puppet> {
        let mut s = sync();
        s.update(0.0, &FrameInput::default(), &Ready(true), &RunContext::default());
        assert_eq!(s.state(), LevelState::Running);
        s
    }

    #[test]
    fn waits_for_assets() {
        let mut s = sync();
        assert_eq!(s.physics().world().body_count(), 1);
        let none = FrameInput::default();
        let ctx = RunContext::default();
        assert_eq!(s.update(0.1, &none, &Ready(false), &ctx), None);
        assert_eq!(s.state(), LevelState::Ready);
        assert_eq!(s.physics().world().steps, 0);
        s.update(0.1, &none, &Ready(true), &ctx);
        assert_eq!(s.state(), LevelState::Running);
    }

    #[test]
    fn running_tick_feeds_player_and_camera() {
        let mut s = running();
        let input = FrameInput {
            cursor: Vec2::new(400.0, 240.0),
            intent: PlayerIntent {
                right: true,
                ..default()
            },
            ..default()
        };
        s.update(0.055, &input, &Ready(true), &RunContext::default());

        assert_eq!(s.player().last_water, 20.0);
        assert_eq!(s.player().pos.x, 110.0);
        // the cursor at screen centre maps onto the camera centre from before the move
        assert_eq!(s.player().last_cursor.x, 100.0);
        assert_eq!(s.physics().world().steps, 5);
        // 100x60 tile view over a 200x120 map: y clamps to its lower bound
        assert_eq!(s.camera().position(), Vec2::new(110.0, 30.0));
    }

    #[test]
    fn pause_and_resume() {
        let mut s = running();
        let ctx = RunContext::default();
        let pause = FrameInput {
            pause: true,
            ..default()
        };
        s.update(0.1, &pause, &Ready(true), &ctx);
        assert_eq!(s.state(), LevelState::Paused);

        let steps = s.physics().world().steps;
        s.update(1.0, &FrameInput::default(), &Ready(true), &ctx);
        assert_eq!(s.physics().world().steps, steps, "paused physics must not step");

        let resume = FrameInput {
            resume: true,
            ..default()
        };
        s.update(0.1, &resume, &Ready(true), &ctx);
        assert_eq!(s.state(), LevelState::Running);
    }

    #[test]
    fn death_ends_in_menu() {
        let mut s = running();
        s.player.dead = true;
        let ctx = RunContext::default();
        assert_eq!(s.update(0.1, &FrameInput::default(), &Ready(true), &ctx), None);
        assert_eq!(s.state(), LevelState::GameOver);
        assert_eq!(
            s.update(0.1, &FrameInput::default(), &Ready(true), &ctx),
            Some(LevelEvent::ReturnToMenu)
        );
    }

    #[test]
    fn escape_returns_to_menu_and_new_level_ends_level() {
        let mut s = running();
        let ctx = RunContext::default();
        let menu = FrameInput {
            menu: true,
            ..default()
        };
        assert_eq!(
            s.update(0.1, &menu, &Ready(true), &ctx),
            Some(LevelEvent::ReturnToMenu)
        );

        let next = FrameInput {
            new_level: true,
            ..default()
        };
        assert_eq!(s.update(0.1, &next, &Ready(true), &ctx), None);
        assert_eq!(s.state(), LevelState::LevelEnd);
        assert_eq!(
            s.update(0.1, &FrameInput::default(), &Ready(true), &ctx),
            Some(LevelEvent::NextLevel)
        );
    }

    #[test]
    fn zoom_keys_rebound_camera() {
        let mut s = running();
        let before = s.camera().bounds();
        let zoom = FrameInput {
            zoom_out: true,
            ..default()
        };
        for _ in 0..10 {
            s.update(0.0, &zoom, &Ready(true), &RunContext::default());
        }
        assert!(s.camera().zoom() > 1.0);
        assert!(s.camera().bounds().min.y > before.min.y);
    }

    #[test]
    fn draw_order_follows_context() {
        let mut s = running();
        let mut r = Recorder::default();
        s.draw(&RunContext::default(), &mut r);
        assert_eq!(r.calls, ["background", "player", "foreground", "minimap"]);

        let mut r = Recorder::default();
        s.draw(
            &RunContext {
                debug: true,
                hide_ui: false,
            },
            &mut r,
        );
        assert_eq!(r.calls.last(), Some(&"debug"));

        let mut r = Recorder::default();
        s.draw(
            &RunContext {
                debug: true,
                hide_ui: true,
            },
            &mut r,
        );
        assert_eq!(r.calls, ["background", "player", "foreground"]);
    }

    #[test]
    fn resize_keeps_camera_in_bounds() {
        let mut s = running();
        s.resize(0.0, 0.0);
        assert_eq!(s.camera().viewport(), Vec2::ONE);
        assert!(s.camera().bounds().contains(s.camera().position()));
        let map = s.dispose();
        assert_eq!(map.seed, 1);
    }

    #[test]
    fn diver_stands_on_the_physics_terrain() {
        let mut level = map();
        level.water_row = 120.0;
        let start = level.spawn_position(PLAYER_HEIGHT);
        let mut s = WorldSyncLoop::new(
            level,
            RapierBackend::new(),
            Diver::new(start),
            Vec2::new(800.0, 480.0),
            1.0 / 60.0,
        );
        let ctx = RunContext::default();
        let idle = FrameInput::default();
        s.update(0.0, &idle, &Ready(true), &ctx);
        for _ in 0..30 {
            s.update(1.0 / 60.0, &idle, &Ready(true), &ctx);
        }
        assert!((s.player().position().y - start.y).abs() < 1e-3);

        // without the floor body the diver drops out of the map
        s.physics.dispose();
        for _ in 0..30 {
            s.update(1.0 / 60.0, &idle, &Ready(true), &ctx);
        }
        assert!(s.player().position().y < start.y - 1.0);
    }
}
