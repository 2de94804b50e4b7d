//! Bevy side of the layer renderer: tile sprites, camera, diver & gizmos
//!
//! `WorldSyncLoop::draw` records a frame into [`DrawList`]; the systems
//! below apply it to the ECS.

use bevy::asset::LoadState;
use bevy::prelude::*;
use noise::{NoiseFn, Perlin};

use crate::camera::CameraRig;
use crate::components::{ActiveLevel, DiverTexture, PlayerSprite, TileSprite};
use crate::constants::*;
use crate::level::CaveMap;
use crate::physics::DebugLine;
use crate::tile_grid::{tile_center, Tile, TileGrid};
use crate::world_sync::LayerRenderer;

const MINIMAP_MARGIN: f32 = 12.0;
const MINIMAP_SCALE: f32 = 1.0; // screen px per tile

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapFrame {
    pub map_size: Vec2,
    pub player: Vec2,
    pub water_row: f32,
}

/// one frame worth of layer requests
#[derive(Resource, Default)]
pub struct DrawList {
    pub camera: Option<(Vec2, f32)>,
    /// camera view in world pixels
    pub view: Option<Rect>,
    pub background_seed: Option<u64>,
    pub foreground_seed: Option<u64>,
    pub player: Option<(Vec2, f32)>,
    pub minimap: Option<MinimapFrame>,
    pub debug: Vec<DebugLine>,
}

impl LayerRenderer for DrawList {
    fn render_background_layers(&mut self, map: &CaveMap, camera: &CameraRig) {
        self.background_seed = Some(map.seed);
        self.camera = Some((camera.pixel_position(), camera.zoom()));
        let view = camera.visible_rect();
        self.view = Some(Rect::from_corners(view.min * TILE_SIZE, view.max * TILE_SIZE));
        self.minimap = None;
        self.debug.clear();
    }

    fn render_player(&mut self, position: Vec2, facing: f32) {
        self.player = Some((position * TILE_SIZE, facing));
    }

    fn render_foreground_layers(&mut self, map: &CaveMap, _camera: &CameraRig) {
        self.foreground_seed = Some(map.seed);
    }

    fn render_minimap(&mut self, grid: &TileGrid, player: Vec2, water_row: f32) {
        self.minimap = Some(MinimapFrame {
            map_size: Vec2::new(grid.width() as f32, grid.height() as f32),
            player,
            water_row,
        });
    }

    fn render_debug(&mut self, lines: &[DebugLine]) {
        self.debug.extend_from_slice(lines);
    }
}

/* ===========================================================
   tile sprites with quantised colour variation
   =========================================================== */
fn tile_color(noise: &Perlin, tile: Tile, x: usize, y: usize) -> Option<(Color, f32)> {
    let raw = noise.get([x as f64 * COLOR_NOISE_SCALE, y as f64 * COLOR_NOISE_SCALE]) as f32;

    /* bucket‑based colour banding (for pixel‑arty look) */
    let step = (((raw + 1.0) * 0.5) * COLOR_VARIATION_LEVELS as f32)
        .floor()
        .clamp(0.0, (COLOR_VARIATION_LEVELS - 1) as f32);
    let norm = step / (COLOR_VARIATION_LEVELS as f32 - 1.0) * 2.0 - 1.0;
    let factor = 1.0 + norm * COLOR_VARIATION_STRENGTH;

    let (base, alpha, z) = match tile {
        Tile::Solid => (Vec3::new(0.42, 0.36, 0.30), 1.0, 0.0),
        Tile::Water => (Vec3::new(0.10, 0.35, 0.75), 0.55, 3.0),
        Tile::Empty => return None,
    };
    let rgb = (base * factor).clamp(Vec3::ZERO, Vec3::ONE);
    Some((Color::srgba(rgb.x, rgb.y, rgb.z, alpha), z))
}

fn spawn_tile(commands: &mut Commands, noise: &Perlin, map: &CaveMap, x: usize, y: usize) {
    let tile = map.grid.get(x as i32, y as i32);
    let Some((color, z)) = tile_color(noise, tile, x, y) else {
        return;
    };
    let centre = tile_center(map.height(), x, y) * TILE_SIZE;
    commands.spawn((
        Sprite {
            color,
            custom_size: Some(Vec2::splat(TILE_SIZE)),
            ..default()
        },
        Transform::from_xyz(centre.x, centre.y, z),
        TileSprite { seed: map.seed },
    ));
}

/// (re)spawn tile sprites whenever the drawn level changes
pub fn sync_tile_layers_system(
    mut commands: Commands,
    draw: Res<DrawList>,
    level: Res<ActiveLevel>,
    tiles: Query<(Entity, &TileSprite)>,
    mut spawned: Local<Option<u64>>,
) {
    let Some(seed) = draw.background_seed.or(draw.foreground_seed) else {
        return;
    };
    if *spawned == Some(seed) {
        return;
    }

    for (entity, tile) in &tiles {
        if tile.seed != seed {
            commands.entity(entity).despawn();
        }
    }

    let map = level.map();
    let noise = Perlin::new(seed as u32);
    for (x, y, tile) in map.grid.iter() {
        let wanted = match tile {
            Tile::Solid => draw.background_seed == Some(seed),
            Tile::Water => draw.foreground_seed == Some(seed),
            Tile::Empty => false,
        };
        if wanted {
            spawn_tile(&mut commands, &noise, map, x, y);
        }
    }
    info!("spawned tile layers for level {seed:#x}");
    *spawned = Some(seed);
}

pub fn apply_camera_system(
    draw: Res<DrawList>,
    mut cam_q: Query<(&mut Transform, &mut OrthographicProjection), With<Camera2d>>,
) {
    let Some((pos, zoom)) = draw.camera else { return };
    let Ok((mut tf, mut projection)) = cam_q.get_single_mut() else { return };
    tf.translation.x = pos.x;
    tf.translation.y = pos.y;
    projection.scale = zoom;
}

pub fn apply_player_system(
    draw: Res<DrawList>,
    mut q: Query<(&mut Transform, &mut Sprite), With<PlayerSprite>>,
) {
    let Some((pos, facing)) = draw.player else { return };
    let Ok((mut tf, mut sprite)) = q.get_single_mut() else { return };
    tf.translation.x = pos.x;
    tf.translation.y = pos.y;
    sprite.flip_x = facing < 0.0;
}

/// physics outlines and the minimap, both as gizmos
pub fn draw_overlays_system(draw: Res<DrawList>, mut gizmos: Gizmos) {
    let debug_color = Color::srgb(0.2, 1.0, 0.3);
    for line in &draw.debug {
        gizmos.line_2d(line.start, line.end, debug_color);
    }

    let (Some(minimap), Some(view), Some((_, zoom))) = (draw.minimap, draw.view, draw.camera)
    else {
        return;
    };
    let scale = MINIMAP_SCALE * zoom;
    let margin = MINIMAP_MARGIN * zoom;
    let size = minimap.map_size * scale;
    let max = view.max - Vec2::splat(margin);
    let min = max - size;

    let frame = Color::srgba(1.0, 1.0, 1.0, 0.8);
    gizmos.line_2d(min, Vec2::new(max.x, min.y), frame);
    gizmos.line_2d(Vec2::new(max.x, min.y), max, frame);
    gizmos.line_2d(max, Vec2::new(min.x, max.y), frame);
    gizmos.line_2d(Vec2::new(min.x, max.y), min, frame);

    /* water line (rows count down from the top edge) */
    let water_y = max.y - minimap.water_row * scale;
    gizmos.line_2d(
        Vec2::new(min.x, water_y),
        Vec2::new(max.x, water_y),
        Color::srgb(0.2, 0.5, 1.0),
    );

    /* player marker (world is y‑up, so no flip needed) */
    let p = min + minimap.player * scale;
    let r = 2.0 * zoom;
    let marker = Color::srgb(1.0, 0.85, 0.2);
    gizmos.line_2d(p - Vec2::X * r, p + Vec2::X * r, marker);
    gizmos.line_2d(p - Vec2::Y * r, p + Vec2::Y * r, marker);
}

/// a missing diver texture falls back to a flat‑colour quad
pub fn diver_texture_fallback_system(
    asset_server: Res<AssetServer>,
    texture: Option<Res<DiverTexture>>,
    mut q: Query<&mut Sprite, With<PlayerSprite>>,
    mut done: Local<bool>,
) {
    if *done {
        return;
    }
    let Some(texture) = texture else { return };
    match asset_server.load_state(texture.0.id()) {
        LoadState::Loaded => *done = true,
        LoadState::Failed(err) => {
            warn!("diver texture unavailable ({err}), using a flat sprite");
            for mut sprite in &mut q {
                sprite.image = Handle::default();
                sprite.color = Color::srgb(0.95, 0.55, 0.15);
            }
            *done = true;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_solid_and_water_get_colours() {
        let noise = Perlin::new(1);
        assert!(tile_color(&noise, Tile::Empty, 3, 3).is_none());
        let (_, z_solid) = tile_color(&noise, Tile::Solid, 3, 3).unwrap();
        let (water, z_water) = tile_color(&noise, Tile::Water, 3, 3).unwrap();
        assert!(z_water > z_solid, "water is a foreground layer");
        assert!(water.alpha() < 1.0);
    }
}
