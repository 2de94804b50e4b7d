use bevy::prelude::*;

use crate::constants::{MAX_ZOOM, MIN_ZOOM};

/// pixel snapping helper – keeps the camera on whole pixels so sprites never
/// land on half‑pixels and shimmer
#[inline]
pub fn snap(v: f32) -> f32 {
    v.round()
}

/// Allowed range for the camera centre, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl CameraBounds {
    /// Half a view in from each map edge. An axis where the view is wider
    /// than the map collapses to the map centre.
    pub fn new(map_size: Vec2, view_size: Vec2) -> Self {
        let half = view_size * 0.5;
        let mut min = half;
        let mut max = map_size - half;
        if min.x > max.x {
            min.x = map_size.x * 0.5;
            max.x = min.x;
        }
        if min.y > max.y {
            min.y = map_size.y * 0.5;
            max.y = min.y;
        }
        Self { min, max }
    }

    #[inline]
    pub fn clamp(&self, target: Vec2) -> Vec2 {
        Vec2::new(
            target.x.clamp(self.min.x, self.max.x),
            target.y.clamp(self.min.y, self.max.y),
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Camera state owned by a level: centre, viewport, zoom and the bounds
/// derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraRig {
    position: Vec2,
    viewport: Vec2,
    zoom: f32,
    tile_size: f32,
    map_size: Vec2,
    bounds: CameraBounds,
}

impl CameraRig {
    pub fn new(map_size: Vec2, viewport: Vec2, tile_size: f32) -> Self {
        let mut rig = Self {
            position: map_size * 0.5,
            viewport: viewport.max(Vec2::ONE),
            zoom: 1.0,
            tile_size,
            map_size,
            bounds: CameraBounds::new(map_size, Vec2::ZERO),
        };
        rig.recompute_bounds();
        rig
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn bounds(&self) -> CameraBounds {
        self.bounds
    }

    /// visible extent in world units
    pub fn view_size(&self) -> Vec2 {
        self.viewport / self.tile_size * self.zoom
    }

    pub fn visible_rect(&self) -> Rect {
        Rect::from_center_size(self.position, self.view_size())
    }

    /// degenerate sizes are clamped to one pixel
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height).max(Vec2::ONE);
        self.recompute_bounds();
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        self.recompute_bounds();
    }

    /// centre on `target`, clamped into bounds
    pub fn follow(&mut self, target: Vec2) {
        self.position = self.bounds.clamp(target);
    }

    /// screen pixels (origin top‑left, y‑down) → world units (y‑up)
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let scale = self.zoom / self.tile_size;
        let offset = (screen - self.viewport * 0.5) * scale;
        Vec2::new(self.position.x + offset.x, self.position.y - offset.y)
    }

    /// camera centre in pixels, snapped
    pub fn pixel_position(&self) -> Vec2 {
        let p = self.position * self.tile_size;
        Vec2::new(snap(p.x), snap(p.y))
    }

    fn recompute_bounds(&mut self) {
        self.bounds = CameraBounds::new(self.map_size, self.view_size());
        self.position = self.bounds.clamp(self.position);
    }
}
