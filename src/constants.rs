/// -------- tiles & world size --------
pub const TILE_SIZE: f32 = 8.0;
pub const MAP_WIDTH: usize = 150;
pub const MAP_HEIGHT: usize = 150;
pub const MIN_DIMENSION: usize = 10;

/// -------- generation --------
pub const FILL_PROBABILITY: f64 = 0.45;
pub const SMOOTHING_PASSES: usize = 4;
pub const BIRTH_THRESHOLD: usize = 5; // ≥ → solid
pub const DEATH_THRESHOLD: usize = 3; // ≤ → empty
pub const NEIGHBOURHOOD_RADIUS: usize = 1;
pub const MIN_CONNECTIVITY: f64 = 0.5;
pub const MIN_OPEN_FRACTION: f64 = 0.2;
pub const GENERATION_RETRIES: u32 = 16;
pub const LEVEL_ATTEMPTS: u32 = 4;

/// -------- water bands (inclusive rows, row‑0 = top) --------
pub const WATER_LOW: (u32, u32) = (105, 125);
pub const WATER_MEDIUM: (u32, u32) = (60, 90);
pub const WATER_HIGH: (u32, u32) = (30, 55);

/// -------- physics --------
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
pub const MAX_SUBSTEPS: u32 = 5;

/// -------- camera --------
pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;
pub const ZOOM_STEP: f32 = 0.02;

/// -------- player phys (world units = tiles) --------
pub const PLAYER_WIDTH: f32 = 0.8;
pub const PLAYER_HEIGHT: f32 = 1.6;
pub const PLAYER_HEIGHT_TILES: usize = 2;
pub const GRAVITY: f32 = -40.0;
pub const JUMP_SPEED: f32 = 16.0;
pub const WALK_SPEED: f32 = 8.0;
pub const SWIM_SPEED: f32 = 5.0;
pub const SWIM_ACCEL: f32 = 30.0;
pub const WATER_DRAG: f32 = 3.0;
pub const BUOYANCY: f32 = 0.85; // share of gravity cancelled underwater
pub const MAX_BREATH: f32 = 12.0;
pub const BREATH_RECOVERY: f32 = 4.0;
pub const COLLISION_STEPS: i32 = 4;

/// -------- colour‑variation --------
pub const COLOR_NOISE_SCALE: f64 = 0.08;
pub const COLOR_VARIATION_LEVELS: i32 = 4;
pub const COLOR_VARIATION_STRENGTH: f32 = 0.2;
