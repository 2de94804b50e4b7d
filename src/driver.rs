//! frame driver: builds levels, polls input & assets, runs update → draw
use bevy::asset::LoadState;
use bevy::input::ButtonInput;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::components::{ActiveLevel, DiverTexture, LevelSettings, PlayerSprite, RunFlags};
use crate::config::LevelConfig;
use crate::constants::{PLAYER_HEIGHT, PLAYER_WIDTH, TILE_SIZE};
use crate::error::LevelError;
use crate::level::{build_level, reseed};
use crate::physics::RapierBackend;
use crate::player::{Diver, PlayerIntent};
use crate::render::DrawList;
use crate::world_sync::{AssetReadiness, FrameInput, LevelEvent, WorldSyncLoop};

const FALLBACK_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

/// readiness = the diver texture finished loading (or failed for good)
pub struct TextureGate<'a> {
    server: &'a AssetServer,
    handle: &'a Handle<Image>,
}

impl AssetReadiness for TextureGate<'_> {
    fn is_ready(&self) -> bool {
        matches!(
            self.server.load_state(self.handle.id()),
            LoadState::Loaded | LoadState::Failed(_)
        )
    }
}

/// build the pipeline output and wrap it in a fresh frame loop
pub fn start_level(
    config: &LevelConfig,
    seed: u64,
    viewport: Vec2,
) -> Result<WorldSyncLoop<RapierBackend, Diver>, LevelError> {
    let map = build_level(config, seed)?;
    let diver = Diver::new(map.spawn_position(PLAYER_HEIGHT));
    Ok(WorldSyncLoop::new(
        map,
        RapierBackend::new(),
        diver,
        viewport,
        config.fixed_timestep,
    ))
}

fn viewport_of(window_q: &Query<&Window, With<PrimaryWindow>>) -> Vec2 {
    window_q
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()))
        .unwrap_or(FALLBACK_VIEWPORT)
}

/* ------------------------------------------------------------------------ */
/* startup                                                                  */
/* ------------------------------------------------------------------------ */
pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

pub fn setup_level_system(
    mut commands: Commands,
    settings: Res<LevelSettings>,
    asset_server: Res<AssetServer>,
    window_q: Query<&Window, With<PrimaryWindow>>,
    mut exit: EventWriter<AppExit>,
) {
    let texture: Handle<Image> = asset_server.load("textures/diver.png");
    commands.insert_resource(DiverTexture(texture.clone()));
    commands.spawn((
        Sprite {
            image: texture,
            custom_size: Some(Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT) * TILE_SIZE),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 2.0),
        PlayerSprite,
    ));

    match start_level(&settings, settings.seed, viewport_of(&window_q)) {
        Ok(level) => commands.insert_resource(ActiveLevel(level)),
        Err(e) => {
            error!("cannot build level from seed {:#x}: {e}", settings.seed);
            exit.send(AppExit::error());
        }
    }
}

/* ------------------------------------------------------------------------ */
/* input                                                                    */
/* ------------------------------------------------------------------------ */
pub fn read_frame_input(keys: &ButtonInput<KeyCode>, window: Option<&Window>) -> FrameInput {
    let cursor = window
        .and_then(|w| {
            w.cursor_position()
                .or(Some(Vec2::new(w.width(), w.height()) * 0.5))
        })
        .unwrap_or(FALLBACK_VIEWPORT * 0.5);
    let pause = keys.just_pressed(KeyCode::KeyP);

    FrameInput {
        cursor,
        intent: PlayerIntent {
            left: keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]),
            right: keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]),
            up: keys.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp, KeyCode::Space]),
            down: keys.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]),
        },
        zoom_in: keys.pressed(KeyCode::KeyC),
        zoom_out: keys.pressed(KeyCode::KeyX),
        pause,
        resume: pause,
        menu: keys.just_pressed(KeyCode::Escape),
        new_level: keys.just_pressed(KeyCode::KeyN),
    }
}

/// F3 physics debug, F1 hide UI
pub fn toggle_flags_system(keys: Res<ButtonInput<KeyCode>>, mut flags: ResMut<RunFlags>) {
    if keys.just_pressed(KeyCode::F3) {
        flags.debug = !flags.debug;
        info!("debug overlay {}", if flags.debug { "on" } else { "off" });
    }
    if keys.just_pressed(KeyCode::F1) {
        flags.hide_ui = !flags.hide_ui;
    }
}

/* ------------------------------------------------------------------------ */
/* per‑frame                                                                */
/* ------------------------------------------------------------------------ */
pub fn resize_system(mut events: EventReader<WindowResized>, mut level: ResMut<ActiveLevel>) {
    if let Some(ev) = events.read().last() {
        level.resize(ev.width, ev.height);
    }
}

pub fn level_update_system(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    window_q: Query<&Window, With<PrimaryWindow>>,
    asset_server: Res<AssetServer>,
    texture: Res<DiverTexture>,
    flags: Res<RunFlags>,
    settings: Res<LevelSettings>,
    mut level: ResMut<ActiveLevel>,
    mut exit: EventWriter<AppExit>,
) {
    let input = read_frame_input(&keys, window_q.get_single().ok());
    let gate = TextureGate {
        server: &asset_server,
        handle: &texture.0,
    };
    let Some(event) = level.update(time.delta_secs(), &input, &gate, &flags.0) else {
        return;
    };

    let next_seed = reseed(level.map().seed);
    match event {
        LevelEvent::NextLevel => info!("level finished, generating the next one"),
        // no menu screen: a fresh level stands in for "new game"
        LevelEvent::ReturnToMenu => info!("returning to menu, starting a new game"),
    }
    match start_level(&settings, next_seed, viewport_of(&window_q)) {
        Ok(next) => {
            let old = std::mem::replace(&mut level.0, next);
            old.dispose();
        }
        Err(e) => {
            error!("cannot build level from seed {next_seed:#x}: {e}");
            exit.send(AppExit::error());
        }
    }
}

pub fn level_draw_system(
    mut level: ResMut<ActiveLevel>,
    flags: Res<RunFlags>,
    mut draw: ResMut<DrawList>,
) {
    level.draw(&flags.0, &mut *draw);
}
