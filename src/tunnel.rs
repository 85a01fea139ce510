//! Tunnel coordination: terrain scroll, wave rotation, frame ordering
//!
//! `Tunnel` owns the stage, the action runner, the shared pools and the
//! one active wave, and fixes the per-step order:
//!
//! 1. integrate actions and collect their events
//! 2. dispatch events (boost, terrain wraps, wave notifications)
//! 3. update the active wave, retiring and replacing it synchronously
//! 4. move the player (terrain pushes, firing, shot retirement)
//! 5. decay the damage flash
//!
//! The authoritative scroll velocity lives here; changing it retargets the
//! terrain actions and the wave's scroll actions in place.

use glam::vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::actions::{
    ActionId, ActionRunner, AxisMask, Bounds, BoundsPolicy, BoundsSpec, EventKind, MoveCfg,
    SteerInputs,
};
use crate::consts;
use crate::contexts::{DamageMeter, PlayerCtx, WaveCtx};
use crate::player::ShipController;
use crate::pool::{Pools, SpritePool};
use crate::stage::{GroupId, Sprite, Stage};
use crate::waves::{self, Wave, densepack};

/// One frame of player input
#[derive(Debug, Clone, Copy, Default)]
pub struct StepInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
}

pub struct Tunnel {
    stage: Stage,
    actions: ActionRunner,
    pools: Pools,
    damage: DamageMeter,
    ship: ShipController,
    tunnel_walls: GroupId,
    hill_tops: GroupId,
    hill_bottoms: GroupId,
    shots: GroupId,
    scroll_velocity: f32,
    terrain_actions: Vec<ActionId>,
    wave: Option<Box<dyn Wave>>,
    rng: Pcg32,
}

impl Tunnel {
    /// Build the tunnel: walls, both terrain bands, the ship, the shared
    /// block pool, then start scrolling and the first wave
    pub fn new(seed: u64) -> Self {
        let mut stage = Stage::new();

        let tunnel_walls = stage.group();
        for ceiling in [false, true] {
            let mut wall = Sprite::solid(
                consts::WINDOW_WIDTH,
                consts::TUNNEL_WALL_HEIGHT,
                consts::TUNNEL_WALL_COLOR,
            );
            wall.pos.x = consts::WINDOW_WIDTH / 2.0;
            wall.pos.y = if ceiling {
                consts::WINDOW_HEIGHT - consts::TUNNEL_WALL_HEIGHT / 2.0
            } else {
                consts::TUNNEL_WALL_HEIGHT / 2.0
            };
            let id = stage.spawn(wall);
            stage.group_push(tunnel_walls, id);
        }

        let hill_tops = stage.group();
        let hill_bottoms = stage.group();
        spawn_hill_band(&mut stage, hill_tops, true);
        spawn_hill_band(&mut stage, hill_bottoms, false);

        let mut actions = ActionRunner::new();
        let ship = ShipController::new(&mut stage, &mut actions);
        let shots = stage.group();
        let pools = Pools {
            shield_blocks: SpritePool::new(
                &mut stage,
                densepack::shield_block,
                consts::SHIELD_POOL_SIZE,
            ),
        };

        let mut tunnel = Self {
            stage,
            actions,
            pools,
            damage: DamageMeter::new(),
            ship,
            tunnel_walls,
            hill_tops,
            hill_bottoms,
            shots,
            scroll_velocity: 0.0,
            terrain_actions: Vec::new(),
            wave: None,
            rng: Pcg32::seed_from_u64(seed),
        };
        tunnel.set_scroll_velocity(consts::TUNNEL_VELOCITY);
        tunnel.start_next_wave();
        tunnel
    }

    /// Change the authoritative scroll velocity. Terrain actions are
    /// retargeted in place (created on first call), and the active wave's
    /// scroll actions follow.
    pub fn set_scroll_velocity(&mut self, velocity: f32) {
        self.scroll_velocity = velocity;
        if self.terrain_actions.is_empty() {
            // a mound re-enters one full wrap period to the right, so the
            // two mounds of a band stay evenly phased
            let rect = Bounds {
                left: -consts::HILL_WIDTH / 2.0,
                bottom: 0.0,
                right: consts::HILL_REENTRY_X + consts::HILL_WIDTH / 2.0,
                top: consts::WINDOW_HEIGHT,
            };
            for band in [self.hill_tops, self.hill_bottoms] {
                let id = self.actions.start_move(
                    band,
                    consts::TAG_TUNNEL_SCROLL,
                    MoveCfg {
                        velocity: vec2(velocity, 0.0),
                        axis: AxisMask::X,
                        bounds: Some(BoundsSpec { rect, policy: BoundsPolicy::Wrap }),
                        ..MoveCfg::default()
                    },
                );
                self.terrain_actions.push(id);
            }
        } else {
            for id in &self.terrain_actions {
                self.actions.set_velocity(*id, vec2(velocity, 0.0));
            }
        }
        if let Some(wave) = &self.wave {
            wave.retarget_scroll(&mut self.actions, velocity);
        }
        log::debug!("scroll velocity set to {velocity}");
    }

    /// Advance the simulation one fixed step
    pub fn step(&mut self, input: &StepInput, dt: f32) {
        // a failed wave build (pool exhaustion) is retried here
        if self.wave.is_none() {
            self.start_next_wave();
        }

        let steer = SteerInputs {
            left: input.left,
            right: input.right,
            up: input.up,
            down: input.down,
            scroll_velocity: self.scroll_velocity,
        };
        let events = self.actions.update(dt, &mut self.stage, &steer);

        let mut retire = false;
        for ev in &events {
            if ev.tag == consts::TAG_TUNNEL_SCROLL {
                if let EventKind::BoundaryEnter { sprite, .. } = ev.kind {
                    log::trace!("terrain sprite {sprite:?} wrapped");
                }
                continue;
            }
            if ev.action == self.ship.move_action() {
                if let Some(velocity) = self.ship.travel_edge_event(&ev.kind) {
                    self.set_scroll_velocity(velocity);
                }
                continue;
            }
            if let Some(wave) = self.wave.as_mut()
                && wave.handle_event(ev, &mut self.stage)
            {
                retire = true;
            }
        }
        if retire {
            self.finish_wave();
        }

        let mut finished = false;
        if let Some(wave) = self.wave.as_mut() {
            let mut ctx = WaveCtx::new(
                &mut self.stage,
                &mut self.actions,
                &mut self.pools,
                self.shots,
                self.ship.sprite(),
                self.scroll_velocity,
                &mut self.damage,
            );
            wave.update(&mut ctx);
            finished = ctx.finish_requested();
        }
        if finished {
            self.finish_wave();
        }

        let mut ctx = PlayerCtx {
            stage: &mut self.stage,
            actions: &mut self.actions,
            hill_tops: self.hill_tops,
            hill_bottoms: self.hill_bottoms,
            tunnel_walls: self.tunnel_walls,
            shots: self.shots,
            damage: &mut self.damage,
        };
        self.ship.update(input, &mut ctx);

        self.damage.decay(dt);
    }

    /// Clean up the active wave and start its successor immediately
    fn finish_wave(&mut self) {
        if let Some(mut wave) = self.wave.take() {
            let mut ctx = WaveCtx::new(
                &mut self.stage,
                &mut self.actions,
                &mut self.pools,
                self.shots,
                self.ship.sprite(),
                self.scroll_velocity,
                &mut self.damage,
            );
            wave.cleanup(&mut ctx);
        }
        self.start_next_wave();
    }

    fn start_next_wave(&mut self) {
        let kind = waves::WAVE_ROTATION[self.rng.random_range(0..waves::WAVE_ROTATION.len())];
        let mut wave = waves::spawn_wave(kind, &mut self.stage);
        let mut ctx = WaveCtx::new(
            &mut self.stage,
            &mut self.actions,
            &mut self.pools,
            self.shots,
            self.ship.sprite(),
            self.scroll_velocity,
            &mut self.damage,
        );
        match wave.build(&mut ctx) {
            Ok(()) => {
                log::info!("wave started: {kind:?}");
                self.wave = Some(wave);
            }
            Err(err) => {
                log::error!("wave build failed, retrying next step: {err}");
            }
        }
    }

    #[inline]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[inline]
    pub fn ship(&self) -> &ShipController {
        &self.ship
    }

    #[inline]
    pub fn damage_level(&self) -> f32 {
        self.damage.level()
    }

    #[inline]
    pub fn scroll_velocity(&self) -> f32 {
        self.scroll_velocity
    }

    #[inline]
    pub fn tunnel_walls(&self) -> GroupId {
        self.tunnel_walls
    }

    #[inline]
    pub fn hill_tops(&self) -> GroupId {
        self.hill_tops
    }

    #[inline]
    pub fn hill_bottoms(&self) -> GroupId {
        self.hill_bottoms
    }

    #[inline]
    pub fn shots(&self) -> GroupId {
        self.shots
    }

    /// Active wave's draw groups, ascending layer order
    pub fn wave_layers(&self) -> Vec<(i32, GroupId)> {
        self.wave.as_ref().map(|w| w.layers()).unwrap_or_default()
    }
}

/// Spawn one band's two terrain mounds, each a concentric stack of slices
/// one wrap period apart. The ceiling band hangs down from the upper wall,
/// the floor band is offset half a period and rises from the lower wall.
fn spawn_hill_band(stage: &mut Stage, band: GroupId, ceiling: bool) {
    let offset = if ceiling { 0.0 } else { consts::HILL_WIDTH };
    for mound in 0..2 {
        let center_x =
            offset + mound as f32 * 2.0 * consts::HILL_WIDTH + consts::HILL_WIDTH / 2.0;
        let mut run = 0.0;
        for (w, h) in consts::HILL_SLICE_SIZES {
            let mut slice = Sprite::solid(w, h, consts::HILL_COLOR);
            slice.pos.x = center_x;
            slice.pos.y = if ceiling {
                consts::WINDOW_HEIGHT - consts::TUNNEL_WALL_HEIGHT - run - h / 2.0
            } else {
                consts::TUNNEL_WALL_HEIGHT + run + h / 2.0
            };
            run += h;
            let id = stage.spawn(slice);
            stage.group_push(band, id);
        }
    }
}
