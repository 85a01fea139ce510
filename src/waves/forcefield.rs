//! Forcefield barriers
//!
//! A run of floor-to-ceiling barrier units spaced across the tunnel, each
//! a stack of two solid caps around two shimmering cores. The flashing
//! variant blinks the whole run and only bites while lit; the flexing
//! variant stays lit and oscillates its cores vertically instead. Shots
//! never destroy a barrier, they are simply absorbed.

use glam::vec2;

use crate::actions::{
    ActionEvent, ActionId, AxisMask, Bounds, BoundsPolicy, BoundsSpec, Edge, EventKind,
    MoveCfg,
};
use crate::collision::hits_any;
use crate::consts;
use crate::contexts::WaveCtx;
use crate::pool::PoolError;
use crate::stage::{GroupId, Sprite, SpriteId, Stage};
use crate::waves::{Wave, WaveActions, travel_bounds};

/// Shared barrier geometry: sprites, draw groups, cap palette state
struct ForcefieldRig {
    /// Units before the last one
    trail: GroupId,
    /// The last (rightmost) unit; its travel decides retirement
    lead: GroupId,
    top_cores: GroupId,
    bottom_cores: GroupId,
    caps: Vec<SpriteId>,
    sprites: Vec<SpriteId>,
    color_index: usize,
}

impl ForcefieldRig {
    /// Spawn `count` units just past the right viewport edge, one spacing
    /// apart
    fn new(stage: &mut Stage, count: usize) -> Self {
        let trail = stage.group();
        let lead = stage.group();
        let top_cores = stage.group();
        let bottom_cores = stage.group();
        let mut caps = Vec::new();
        let mut sprites = Vec::new();

        let (cap_w, cap_h) = consts::FORCEFIELD_CAP_SIZE;
        let (core_w, core_h) = consts::FORCEFIELD_CORE_SIZE;
        let cap_color = consts::FORCEFIELD_SOLID_COLORS[0];
        let floor = consts::TUNNEL_WALL_HEIGHT;

        for i in 0..count {
            let left = consts::WINDOW_WIDTH
                + consts::WALL_WIDTH
                + i as f32 * consts::FORCEFIELD_SPACING;
            let unit = if i + 1 == count { lead } else { trail };

            // stack from the tunnel floor up: cap, core, core, cap
            let bottom_cap =
                place(stage, Sprite::solid(cap_w, cap_h, cap_color), left, floor);
            let bottom_core = place(
                stage,
                Sprite::solid(core_w, core_h, consts::FORCEFIELD_CORE_COLOR),
                left,
                floor + cap_h,
            );
            let top_core = place(
                stage,
                Sprite::solid(core_w, core_h, consts::FORCEFIELD_CORE_COLOR),
                left,
                floor + cap_h + core_h,
            );
            let top_cap = place(
                stage,
                Sprite::solid(cap_w, cap_h, cap_color),
                left,
                floor + cap_h + 2.0 * core_h,
            );

            for id in [bottom_cap, bottom_core, top_core, top_cap] {
                stage.group_push(unit, id);
                sprites.push(id);
            }
            stage.group_push(top_cores, top_core);
            stage.group_push(bottom_cores, bottom_core);
            caps.push(bottom_cap);
            caps.push(top_cap);
        }

        Self { trail, lead, top_cores, bottom_cores, caps, sprites, color_index: 0 }
    }

    /// Advance the cap palette one step and repaint
    fn cycle_caps(&mut self, stage: &mut Stage) {
        self.color_index = (self.color_index + 1) % consts::FORCEFIELD_SOLID_COLORS.len();
        let color = consts::FORCEFIELD_SOLID_COLORS[self.color_index];
        for id in &self.caps {
            stage.sprite_mut(*id).color = color;
        }
    }

    /// Free every sprite and group
    fn dispose(&mut self, stage: &mut Stage) {
        for id in self.sprites.drain(..) {
            stage.despawn(id);
        }
        self.caps.clear();
        for group in [self.trail, self.lead, self.top_cores, self.bottom_cores] {
            stage.group_free(group);
        }
    }

    fn barrier_groups(&self) -> [GroupId; 2] {
        [self.trail, self.lead]
    }
}

fn place(stage: &mut Stage, sprite: Sprite, left: f32, bottom: f32) -> SpriteId {
    let id = stage.spawn(sprite);
    let s = stage.sprite_mut(id);
    s.set_left(left);
    s.set_bottom(bottom);
    id
}

/// Shot absorption and hull contact, shared by both variants
fn barrier_combat(rig: &ForcefieldRig, ctx: &mut WaveCtx<'_>) {
    let shots: Vec<SpriteId> = ctx.stage.members(ctx.shots).to_vec();
    for shot in shots {
        if hits_any(ctx.stage, shot, &rig.barrier_groups()) {
            ctx.remove_shot(shot);
        }
    }
    if hits_any(ctx.stage, ctx.player, &rig.barrier_groups()) {
        ctx.damage.register(consts::FORCEFIELD_DAMAGE);
        ctx.finish_wave();
    }
}

/// Right extent of a run's travel rect: room for every unit to spawn
/// inside it
fn run_right_extent(count: usize) -> f32 {
    consts::WINDOW_WIDTH + consts::WALL_WIDTH + count as f32 * consts::FORCEFIELD_SPACING
}

pub struct FlashingForcefieldWave {
    rig: ForcefieldRig,
    limit_action: Option<ActionId>,
    acts: WaveActions,
    /// Lit right now; collision only counts while true
    active: bool,
}

impl FlashingForcefieldWave {
    pub fn new(stage: &mut Stage, count: usize) -> Self {
        Self {
            rig: ForcefieldRig::new(stage, count),
            limit_action: None,
            acts: WaveActions::new(),
            active: true,
        }
    }
}

impl Wave for FlashingForcefieldWave {
    fn build(&mut self, ctx: &mut WaveCtx<'_>) -> Result<(), PoolError> {
        let velocity = vec2(ctx.scroll_velocity, 0.0);
        let count = self.rig.sprites.len() / 4;
        let bounds = Some(BoundsSpec {
            rect: travel_bounds(run_right_extent(count)),
            policy: BoundsPolicy::Limit,
        });

        self.acts.track_scroll(ctx.actions.start_move(
            self.rig.trail,
            consts::TAG_WAVE,
            MoveCfg { velocity, bounds, ..MoveCfg::default() },
        ));
        let lead = ctx.actions.start_move(
            self.rig.lead,
            consts::TAG_WAVE,
            MoveCfg { velocity, bounds, ..MoveCfg::default() },
        );
        self.limit_action = Some(self.acts.track_scroll(lead));

        for group in self.rig.barrier_groups() {
            self.acts.track(ctx.actions.blink(
                group,
                consts::TAG_WAVE,
                consts::FORCEFIELD_BLINK_PERIOD,
            ));
        }
        start_shimmer(&self.rig, &mut self.acts, ctx);

        self.active = true;
        log::info!("flashing forcefield built: {count} units");
        Ok(())
    }

    fn update(&mut self, ctx: &mut WaveCtx<'_>) {
        // a dark barrier has no presence at all
        if self.active {
            barrier_combat(&self.rig, ctx);
        }
    }

    fn cleanup(&mut self, ctx: &mut WaveCtx<'_>) {
        self.acts.stop_all(ctx.actions);
        self.rig.dispose(ctx.stage);
        self.limit_action = None;
    }

    fn handle_event(&mut self, event: &ActionEvent, stage: &mut Stage) -> bool {
        match event.kind {
            EventKind::BlinkOn => {
                self.active = true;
                false
            }
            EventKind::BlinkOff => {
                self.active = false;
                false
            }
            EventKind::Pulse => {
                self.rig.cycle_caps(stage);
                false
            }
            EventKind::BoundaryEnter { .. } => Some(event.action) == self.limit_action,
            _ => false,
        }
    }

    fn scroll_actions(&self) -> &[ActionId] {
        self.acts.scroll()
    }

    fn layers(&self) -> Vec<(i32, GroupId)> {
        vec![(5, self.rig.trail), (6, self.rig.lead)]
    }
}

pub struct FlexingForcefieldWave {
    rig: ForcefieldRig,
    limit_action: Option<ActionId>,
    acts: WaveActions,
}

impl FlexingForcefieldWave {
    pub fn new(stage: &mut Stage, count: usize) -> Self {
        Self {
            rig: ForcefieldRig::new(stage, count),
            limit_action: None,
            acts: WaveActions::new(),
        }
    }
}

impl Wave for FlexingForcefieldWave {
    fn build(&mut self, ctx: &mut WaveCtx<'_>) -> Result<(), PoolError> {
        let velocity = vec2(ctx.scroll_velocity, 0.0);
        let count = self.rig.sprites.len() / 4;
        let bounds = Some(BoundsSpec {
            rect: travel_bounds(run_right_extent(count)),
            policy: BoundsPolicy::Limit,
        });

        self.acts.track_scroll(ctx.actions.start_move(
            self.rig.trail,
            consts::TAG_WAVE,
            MoveCfg { velocity, axis: AxisMask::X, bounds, ..MoveCfg::default() },
        ));
        let lead = ctx.actions.start_move(
            self.rig.lead,
            consts::TAG_WAVE,
            MoveCfg { velocity, axis: AxisMask::X, bounds, ..MoveCfg::default() },
        );
        self.limit_action = Some(self.acts.track_scroll(lead));

        // cores oscillate one core-height away from their seats and back
        let (_, core_h) = consts::FORCEFIELD_CORE_SIZE;
        let floor = consts::TUNNEL_WALL_HEIGHT + consts::FORCEFIELD_CAP_SIZE.1;
        let top_rest = floor + core_h + core_h / 2.0;
        let bottom_rest = floor + core_h / 2.0;
        let flex = |bottom: f32, top: f32| {
            Some(BoundsSpec {
                rect: Bounds {
                    left: -consts::WALL_WIDTH,
                    bottom,
                    right: run_right_extent(count),
                    top,
                },
                policy: BoundsPolicy::Bounce,
            })
        };
        self.acts.track(ctx.actions.start_move(
            self.rig.top_cores,
            consts::TAG_WAVE,
            MoveCfg {
                velocity: vec2(0.0, -consts::FORCEFIELD_FLEX_SPEED),
                axis: AxisMask::Y,
                bounds: flex(top_rest, top_rest + core_h),
                ..MoveCfg::default()
            },
        ));
        self.acts.track(ctx.actions.start_move(
            self.rig.bottom_cores,
            consts::TAG_WAVE,
            MoveCfg {
                velocity: vec2(0.0, consts::FORCEFIELD_FLEX_SPEED),
                axis: AxisMask::Y,
                bounds: flex(bottom_rest - core_h, bottom_rest),
                ..MoveCfg::default()
            },
        ));

        start_shimmer(&self.rig, &mut self.acts, ctx);
        log::info!("flexing forcefield built: {count} units");
        Ok(())
    }

    fn update(&mut self, ctx: &mut WaveCtx<'_>) {
        barrier_combat(&self.rig, ctx);
    }

    fn cleanup(&mut self, ctx: &mut WaveCtx<'_>) {
        self.acts.stop_all(ctx.actions);
        self.rig.dispose(ctx.stage);
        self.limit_action = None;
    }

    fn handle_event(&mut self, event: &ActionEvent, stage: &mut Stage) -> bool {
        match event.kind {
            EventKind::Pulse => {
                self.rig.cycle_caps(stage);
                false
            }
            // only leaving past the left edge retires the run; the flex
            // bounces report nothing here
            EventKind::BoundaryEnter { edge: Edge::Left, .. } => {
                Some(event.action) == self.limit_action
            }
            _ => false,
        }
    }

    fn scroll_actions(&self) -> &[ActionId] {
        self.acts.scroll()
    }

    fn layers(&self) -> Vec<(i32, GroupId)> {
        vec![(5, self.rig.trail), (6, self.rig.lead)]
    }
}

/// Cap palette pulse plus counter-rotating core frame cycles
fn start_shimmer(rig: &ForcefieldRig, acts: &mut WaveActions, ctx: &mut WaveCtx<'_>) {
    acts.track(ctx.actions.pulse(
        rig.lead,
        consts::TAG_WAVE,
        consts::FORCEFIELD_COLOR_INTERVAL,
    ));
    acts.track(ctx.actions.cycle_frames(
        rig.top_cores,
        consts::TAG_WAVE,
        consts::FORCEFIELD_CYCLE_FPS,
        consts::FORCEFIELD_CORE_FRAMES,
        -1,
    ));
    acts.track(ctx.actions.cycle_frames(
        rig.bottom_cores,
        consts::TAG_WAVE,
        consts::FORCEFIELD_CYCLE_FPS,
        consts::FORCEFIELD_CORE_FRAMES,
        1,
    ));
}
