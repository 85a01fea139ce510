//! Dense shield packs
//!
//! A rectangular wall of small blocks drawn from the shared block pool,
//! scrolled left as one rigid body. Shots carve out every block they
//! overlap and are spent doing it; ship contact ends the wave on the
//! spot.

use glam::{Vec2, vec2};

use crate::actions::{ActionEvent, ActionId, BoundsPolicy, BoundsSpec, EventKind, MoveCfg};
use crate::collision::hits_in_group;
use crate::consts;
use crate::contexts::WaveCtx;
use crate::pool::PoolError;
use crate::stage::{GroupId, Sprite, SpriteId, Stage};
use crate::waves::{Wave, WaveActions, travel_bounds};

/// Pool factory for one shield block
pub fn shield_block() -> Sprite {
    let (w, h) = consts::DENSE_PACK_CELL;
    Sprite::solid(w, h, consts::SHIELD_BLOCK_COLOR)
}

pub struct DensePackWave {
    columns: u32,
    group: Option<GroupId>,
    move_action: Option<ActionId>,
    acts: WaveActions,
}

impl DensePackWave {
    pub fn thin() -> Self {
        Self::with_columns(consts::THIN_PACK_COLUMNS)
    }

    pub fn thick() -> Self {
        Self::with_columns(consts::THICK_PACK_COLUMNS)
    }

    pub fn with_columns(columns: u32) -> Self {
        Self { columns, group: None, move_action: None, acts: WaveActions::new() }
    }
}

impl Wave for DensePackWave {
    fn build(&mut self, ctx: &mut WaveCtx<'_>) -> Result<(), PoolError> {
        let count = (self.columns * consts::DENSE_PACK_ROWS) as usize;
        let ids = ctx.pools.shield_blocks.acquire(ctx.stage, count)?;

        let group = ctx.stage.group();
        for id in &ids {
            ctx.stage.group_push(group, *id);
        }
        let origin =
            vec2(consts::WINDOW_WIDTH + consts::WALL_WIDTH, consts::TUNNEL_WALL_HEIGHT);
        arrange_grid(ctx.stage, &ids, self.columns, origin);

        let right = consts::WINDOW_WIDTH + 2.0 * consts::WALL_WIDTH;
        let action = ctx.actions.start_move(
            group,
            consts::TAG_WAVE,
            MoveCfg {
                velocity: vec2(ctx.scroll_velocity, 0.0),
                bounds: Some(BoundsSpec {
                    rect: travel_bounds(right),
                    policy: BoundsPolicy::Limit,
                }),
                ..MoveCfg::default()
            },
        );
        self.move_action = Some(self.acts.track_scroll(action));
        self.group = Some(group);
        log::info!("dense pack built: {} columns, {} blocks", self.columns, count);
        Ok(())
    }

    fn update(&mut self, ctx: &mut WaveCtx<'_>) {
        let Some(group) = self.group else { return };

        // every pack block is gone: nothing left to cross the travel limit
        if ctx.stage.members(group).is_empty() {
            ctx.finish_wave();
            return;
        }

        let shots: Vec<SpriteId> = ctx.stage.members(ctx.shots).to_vec();
        let mut struck: Vec<SpriteId> = Vec::new();
        for shot in shots {
            let hits = hits_in_group(ctx.stage, shot, group);
            if !hits.is_empty() {
                ctx.remove_shot(shot);
                struck.extend(hits);
            }
        }
        if !struck.is_empty() {
            log::debug!("shot carved {} blocks", struck.len());
            ctx.pools.shield_blocks.release(ctx.stage, &struck);
        }

        if !hits_in_group(ctx.stage, ctx.player, group).is_empty() {
            ctx.damage.register(consts::DENSE_PACK_DAMAGE);
            ctx.finish_wave();
        }
    }

    fn cleanup(&mut self, ctx: &mut WaveCtx<'_>) {
        self.acts.stop_all(ctx.actions);
        ctx.pools.shield_blocks.release_all(ctx.stage);
        if let Some(group) = self.group.take() {
            ctx.stage.group_free(group);
        }
        self.move_action = None;
    }

    fn handle_event(&mut self, event: &ActionEvent, _stage: &mut Stage) -> bool {
        matches!(event.kind, EventKind::BoundaryEnter { .. })
            && Some(event.action) == self.move_action
    }

    fn scroll_actions(&self) -> &[ActionId] {
        self.acts.scroll()
    }

    fn layers(&self) -> Vec<(i32, GroupId)> {
        self.group.map(|g| vec![(5, g)]).unwrap_or_default()
    }
}

/// Lay out pooled blocks row-major: index i lands (i % columns, i / columns)
/// cells from `origin`
fn arrange_grid(stage: &mut Stage, ids: &[SpriteId], columns: u32, origin: Vec2) {
    let (cw, ch) = consts::DENSE_PACK_CELL;
    for (i, id) in ids.iter().enumerate() {
        let col = (i as u32 % columns) as f32;
        let row = (i as u32 / columns) as f32;
        stage.sprite_mut(*id).pos = origin + vec2(col * cw, row * ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionRunner, Edge, SteerInputs};
    use crate::contexts::DamageMeter;
    use crate::pool::{Pools, SpritePool};

    struct Harness {
        stage: Stage,
        actions: ActionRunner,
        pools: Pools,
        shots: GroupId,
        player: SpriteId,
        damage: DamageMeter,
    }

    impl Harness {
        fn new() -> Self {
            let mut stage = Stage::new();
            let pool =
                SpritePool::new(&mut stage, shield_block, consts::SHIELD_POOL_SIZE);
            let shots = stage.group();
            let (sw, sh) = consts::SHIP_SIZE;
            let player = stage.spawn(Sprite::solid(sw, sh, consts::SHIP_COLOR));
            Self {
                stage,
                actions: ActionRunner::new(),
                pools: Pools { shield_blocks: pool },
                shots,
                player,
                damage: DamageMeter::new(),
            }
        }

        fn ctx(&mut self) -> WaveCtx<'_> {
            WaveCtx::new(
                &mut self.stage,
                &mut self.actions,
                &mut self.pools,
                self.shots,
                self.player,
                consts::TUNNEL_VELOCITY,
                &mut self.damage,
            )
        }
    }

    #[test]
    fn test_build_acquires_and_arranges() {
        let mut h = Harness::new();
        let mut wave = DensePackWave::thin();
        wave.build(&mut h.ctx()).unwrap();

        let expected = (consts::THIN_PACK_COLUMNS * consts::DENSE_PACK_ROWS) as usize;
        assert_eq!(h.pools.shield_blocks.active().len(), expected);

        let group = wave.group.unwrap();
        let members = h.stage.members(group).to_vec();
        assert_eq!(members.len(), expected);

        // first block sits at the grid origin, its row/column neighbors one
        // cell away
        let first = h.stage.sprite(members[0]).pos;
        assert_eq!(
            first,
            vec2(consts::WINDOW_WIDTH + consts::WALL_WIDTH, consts::TUNNEL_WALL_HEIGHT)
        );
        let right_neighbor = h.stage.sprite(members[1]).pos;
        assert_eq!(right_neighbor - first, vec2(consts::DENSE_PACK_CELL.0, 0.0));
        let up_neighbor =
            h.stage.sprite(members[consts::THIN_PACK_COLUMNS as usize]).pos;
        assert_eq!(up_neighbor - first, vec2(0.0, consts::DENSE_PACK_CELL.1));

        assert_eq!(
            h.actions.velocity_of(wave.scroll_actions()[0]),
            Some(vec2(consts::TUNNEL_VELOCITY, 0.0))
        );
    }

    #[test]
    fn test_shot_carves_overlapped_blocks_and_is_spent() {
        let mut h = Harness::new();
        let mut wave = DensePackWave::thin();
        wave.build(&mut h.ctx()).unwrap();
        let group = wave.group.unwrap();

        // park a shot on top of the first column's lowest blocks
        let target = h.stage.members(group)[0];
        let target_pos = h.stage.sprite(target).pos;
        let (sw, sh) = consts::SHOT_SIZE;
        let shot = h.stage.spawn(Sprite::solid(sw, sh, consts::SHOT_COLOR));
        h.stage.sprite_mut(shot).pos = target_pos;
        h.stage.group_push(h.shots, shot);

        let active_before = h.pools.shield_blocks.active().len();
        wave.update(&mut h.ctx());

        assert!(!h.stage.is_alive(shot));
        assert!(h.stage.members(h.shots).is_empty());
        assert!(h.pools.shield_blocks.active().len() < active_before);
        assert!(!h.stage.members(group).contains(&target));
        assert_eq!(h.damage.level(), 0.0);
    }

    #[test]
    fn test_player_contact_registers_damage_and_finishes() {
        let mut h = Harness::new();
        let mut wave = DensePackWave::thick();
        wave.build(&mut h.ctx()).unwrap();
        let group = wave.group.unwrap();

        let block_pos = h.stage.sprite(h.stage.members(group)[0]).pos;
        h.stage.sprite_mut(h.player).pos = block_pos;

        let mut ctx = h.ctx();
        wave.update(&mut ctx);
        assert!(ctx.finish_requested());
        assert!((h.damage.level() - consts::DENSE_PACK_DAMAGE).abs() < 1e-6);
    }

    #[test]
    fn test_travel_limit_requests_retirement() {
        let mut h = Harness::new();
        let mut wave = DensePackWave::thin();
        wave.build(&mut h.ctx()).unwrap();
        let group = wave.group.unwrap();

        // shove the whole pack to just right of the left travel edge and
        // let one frame of scrolling carry it across
        let members = h.stage.members(group).to_vec();
        for id in &members {
            h.stage.sprite_mut(*id).pos.x -= consts::WINDOW_WIDTH
                + 2.0 * consts::WALL_WIDTH
                - 2.0;
        }
        let events =
            h.actions.update(consts::STEP_DT, &mut h.stage, &SteerInputs::default());
        let entry = events
            .iter()
            .find(|e| matches!(e.kind, EventKind::BoundaryEnter { edge: Edge::Left, .. }))
            .expect("pack should cross the travel limit");
        assert!(wave.handle_event(entry, &mut h.stage));
    }

    #[test]
    fn test_empty_pack_finishes() {
        let mut h = Harness::new();
        let mut wave = DensePackWave::thin();
        wave.build(&mut h.ctx()).unwrap();
        let group = wave.group.unwrap();

        let members = h.stage.members(group).to_vec();
        h.pools.shield_blocks.release(&mut h.stage, &members);

        let mut ctx = h.ctx();
        wave.update(&mut ctx);
        assert!(ctx.finish_requested());
    }

    #[test]
    fn test_cleanup_returns_blocks_and_stops_actions() {
        let mut h = Harness::new();
        let mut wave = DensePackWave::thick();
        wave.build(&mut h.ctx()).unwrap();
        let action = wave.scroll_actions()[0];

        wave.cleanup(&mut h.ctx());
        assert_eq!(h.pools.shield_blocks.available(), consts::SHIELD_POOL_SIZE);
        assert!(h.pools.shield_blocks.active().is_empty());
        assert!(!h.actions.is_running(action));
        assert!(wave.scroll_actions().is_empty());
    }
}
