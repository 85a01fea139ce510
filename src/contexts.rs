//! Capability bundles handed to waves and the player
//!
//! The coordinator rebuilds these per call from its own fields. Consumers
//! act through the references but never store the bundle; requests that
//! would re-enter the coordinator (wave retirement, damage) are recorded on
//! the bundle and read back after the call returns.

use crate::actions::ActionRunner;
use crate::consts;
use crate::pool::Pools;
use crate::stage::{GroupId, SpriteId, Stage};

/// Accumulated damage feedback, clamped to 1.0, fading over time
#[derive(Debug, Default)]
pub struct DamageMeter {
    level: f32,
}

impl DamageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add damage, saturating at full flash
    pub fn register(&mut self, amount: f32) {
        self.level = (self.level + amount).min(1.0);
        log::debug!("damage registered: {:.2} -> {:.2}", amount, self.level);
    }

    /// Fade toward zero
    pub fn decay(&mut self, dt: f32) {
        self.level = (self.level - consts::DAMAGE_FLASH_DECAY * dt).max(0.0);
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }
}

/// Everything a wave may touch during build/update/cleanup
pub struct WaveCtx<'w> {
    pub stage: &'w mut Stage,
    pub actions: &'w mut ActionRunner,
    pub pools: &'w mut Pools,
    /// Live player shots (at most one)
    pub shots: GroupId,
    pub player: SpriteId,
    /// Current authoritative scroll velocity (px/s, negative = leftward)
    pub scroll_velocity: f32,
    pub damage: &'w mut DamageMeter,
    finished: bool,
}

impl<'w> WaveCtx<'w> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stage: &'w mut Stage,
        actions: &'w mut ActionRunner,
        pools: &'w mut Pools,
        shots: GroupId,
        player: SpriteId,
        scroll_velocity: f32,
        damage: &'w mut DamageMeter,
    ) -> Self {
        Self { stage, actions, pools, shots, player, scroll_velocity, damage, finished: false }
    }

    /// Ask the coordinator to retire the wave once this call returns
    pub fn finish_wave(&mut self) {
        self.finished = true;
    }

    pub fn finish_requested(&self) -> bool {
        self.finished
    }

    /// Take a shot out of play: cancel its move action and free the sprite
    pub fn remove_shot(&mut self, id: SpriteId) {
        self.actions.stop_tag(consts::TAG_PLAYER_SHOT);
        self.stage.despawn(id);
    }
}

/// Everything the player controller may touch during its move
pub struct PlayerCtx<'w> {
    pub stage: &'w mut Stage,
    pub actions: &'w mut ActionRunner,
    pub hill_tops: GroupId,
    pub hill_bottoms: GroupId,
    pub tunnel_walls: GroupId,
    pub shots: GroupId,
    pub damage: &'w mut DamageMeter,
}
