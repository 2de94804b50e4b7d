//! bootstrap for the cavern demo
//!
//! Reads `cavern.toml` (optional), builds the first level and hands every
//! frame to the world sync loop. Works with **Bevy 0.15**.

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin,
    LogDiagnosticsPlugin,
};
use bevy::input::ButtonInput;
use bevy::prelude::*;
use bevy::window::{MonitorSelection, PrimaryWindow, WindowMode};

use cavern::components::{ActiveLevel, LevelSettings, RunFlags};
use cavern::config::LevelConfig;
use cavern::driver::{
    level_draw_system, level_update_system, resize_system, setup_camera,
    setup_level_system, toggle_flags_system,
};
use cavern::render::{
    apply_camera_system, apply_player_system, diver_texture_fallback_system,
    draw_overlays_system, sync_tile_layers_system, DrawList,
};

const CONFIG_PATH: &str = "cavern.toml";

/* ------------------------------------------------------------------------ */
/* F11 borderless‑fullscreen toggle                                         */
/* ------------------------------------------------------------------------ */
fn toggle_fullscreen(
    keys: Res<ButtonInput<KeyCode>>,
    mut window_q: Query<&mut Window, With<PrimaryWindow>>,
) {
    if keys.just_pressed(KeyCode::F11) {
        let Ok(mut window) = window_q.get_single_mut() else { return };
        window.mode = match window.mode {
            WindowMode::Windowed => {
                WindowMode::BorderlessFullscreen(MonitorSelection::Primary)
            }
            _ => WindowMode::Windowed,
        };
    }
}

/* ------------------------------------------------------------------------ */
/* config                                                                   */
/* ------------------------------------------------------------------------ */
fn load_settings() -> LevelConfig {
    let mut config = match LevelConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cavern: {e}");
            std::process::exit(1);
        }
    };
    // CAVERN_SEED=<u64> overrides the configured seed
    if let Ok(raw) = std::env::var("CAVERN_SEED") {
        match raw.trim().parse() {
            Ok(seed) => config.seed = seed,
            Err(_) => eprintln!("cavern: ignoring CAVERN_SEED={raw:?} (not a u64)"),
        }
    }
    config
}

/* ------------------------------------------------------------------------ */
/* main                                                                     */
/* ------------------------------------------------------------------------ */
fn main() {
    let settings = load_settings();

    App::new()
        /* diagnostics ----------------------------------------------------- */
        .add_plugins((
            LogDiagnosticsPlugin::default(),
            FrameTimeDiagnosticsPlugin::default(),
            EntityCountDiagnosticsPlugin::default(),
        ))

        /* bevy core ------------------------------------------------------- */
        .insert_resource(ClearColor(Color::srgb(0.05, 0.04, 0.06)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "cavern".into(),
                        resolution: (1280., 720.).into(),
                        mode: WindowMode::Windowed,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )

        /* resources ------------------------------------------------------- */
        .insert_resource(LevelSettings(settings))
        .init_resource::<RunFlags>()
        .init_resource::<DrawList>()

        /* startup systems ------------------------------------------------- */
        .add_systems(Startup, setup_camera)
        .add_systems(Startup, setup_level_system.after(setup_camera))

        /* frame‑update systems ------------------------------------------- */
        .add_systems(Update, (toggle_fullscreen, toggle_flags_system))
        .add_systems(
            Update,
            (
                resize_system,                 // window → camera viewport
                level_update_system,           // state machine + fixed steps
                level_draw_system,             // record layers into DrawList
                sync_tile_layers_system,       // tile sprites per level
                apply_camera_system,           // camera transform + zoom
                apply_player_system,           // diver sprite
                draw_overlays_system,          // minimap + physics debug
                diver_texture_fallback_system, // flat sprite if png missing
            )
                .chain()
                .after(toggle_flags_system)
                .run_if(resource_exists::<ActiveLevel>),
        )
        .run();
}
