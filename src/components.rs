use bevy::prelude::*;

use crate::config::{LevelConfig, RunContext};
use crate::physics::RapierBackend;
use crate::player::Diver;
use crate::world_sync::WorldSyncLoop;

/* ===========================================================
   resources
   =========================================================== */
#[derive(Resource, Clone, Deref)]
pub struct LevelSettings(pub LevelConfig);

/// the level currently driven by the frame loop
#[derive(Resource, Deref, DerefMut)]
pub struct ActiveLevel(pub WorldSyncLoop<RapierBackend, Diver>);

#[derive(Resource, Default, Clone, Copy, Deref, DerefMut)]
pub struct RunFlags(pub RunContext);

#[derive(Resource, Clone)]
pub struct DiverTexture(pub Handle<Image>);

/* ===========================================================
   components
   =========================================================== */
#[derive(Component)]
pub struct PlayerSprite;

/// solid or water tile sprite, tagged with the seed of its level
#[derive(Component)]
pub struct TileSprite {
    pub seed: u64,
}
