//! Ship control: steering, travel-edge boost, firing, terrain collision
//!
//! Steering is a pure function handed to the move action, so velocity is
//! derived at integration time from the frame's input snapshot. Three
//! regimes: manual (opposing inputs cancel), manual clamped at the left
//! bound, and ambient drift at the authoritative scroll velocity when no
//! input is held.

use glam::Vec2;

use crate::actions::{
    ActionId, ActionRunner, Bounds, BoundsPolicy, BoundsSpec, Edge, EventKind, MoveCfg,
    SteerInputs,
};
use crate::collision::{hits_any, resolve_push};
use crate::consts;
use crate::contexts::PlayerCtx;
use crate::stage::{GroupId, Sprite, SpriteId, Stage};
use crate::tunnel::StepInput;

/// Horizontal facing; decides shot direction and spawn edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Velocity for the ship's move action.
///
/// Manual input wins even when it cancels to zero; only a frame with no
/// directional input at all drifts with the tunnel, and a ship resting at
/// the left bound holds still instead of drifting.
pub fn ship_steering(steer: &SteerInputs, sprite: &Sprite) -> Vec2 {
    let mut h = 0.0;
    if steer.right {
        h += consts::PLAYER_SHIP_HORIZ;
    }
    if steer.left {
        h -= consts::PLAYER_SHIP_HORIZ;
    }
    let mut v = 0.0;
    if steer.up {
        v += consts::PLAYER_SHIP_VERT;
    }
    if steer.down {
        v -= consts::PLAYER_SHIP_VERT;
    }

    if h != 0.0 || v != 0.0 {
        if h < 0.0 && sprite.left() <= consts::SHIP_LEFT_BOUND {
            h = 0.0;
        }
        return Vec2::new(h, v);
    }
    if sprite.left() <= consts::SHIP_LEFT_BOUND {
        Vec2::ZERO
    } else {
        Vec2::new(steer.scroll_velocity, 0.0)
    }
}

/// The player ship and its single shot
#[derive(Debug)]
pub struct ShipController {
    sprite: SpriteId,
    group: GroupId,
    facing: Facing,
    boosted: bool,
    move_action: ActionId,
}

impl ShipController {
    /// Spawn the ship and start its steered, travel-bounded move action
    pub fn new(stage: &mut Stage, actions: &mut ActionRunner) -> Self {
        let mut ship = Sprite::solid(consts::SHIP_SIZE.0, consts::SHIP_SIZE.1, consts::SHIP_COLOR);
        ship.pos = Vec2::new(consts::SHIP_START.0, consts::SHIP_START.1);
        let sprite = stage.spawn(ship);
        let group = stage.group();
        stage.group_push(group, sprite);

        let travel = Bounds {
            left: consts::SHIP_LEFT_BOUND,
            bottom: consts::TUNNEL_WALL_HEIGHT,
            right: consts::SHIP_RIGHT_BOUND,
            top: consts::WINDOW_HEIGHT - consts::TUNNEL_WALL_HEIGHT,
        };
        let move_action = actions.start_move(
            group,
            consts::TAG_PLAYER_MOVE,
            MoveCfg {
                steer: Some(ship_steering),
                bounds: Some(BoundsSpec { rect: travel, policy: BoundsPolicy::Limit }),
                ..Default::default()
            },
        );
        Self { sprite, group, facing: Facing::Right, boosted: false, move_action }
    }

    #[inline]
    pub fn sprite(&self) -> SpriteId {
        self.sprite
    }

    #[inline]
    pub fn group(&self) -> GroupId {
        self.group
    }

    #[inline]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// The ship's bounded move action; its boundary events drive the boost
    #[inline]
    pub fn move_action(&self) -> ActionId {
        self.move_action
    }

    #[inline]
    pub fn boosted(&self) -> bool {
        self.boosted
    }

    /// React to a boundary event on the ship's own move action. Crossing
    /// the right travel edge boosts the scroll; leaving it restores the
    /// base. Returns the scroll velocity the coordinator should apply.
    pub fn travel_edge_event(&mut self, kind: &EventKind) -> Option<f32> {
        match kind {
            EventKind::BoundaryEnter { edge: Edge::Right, .. } => {
                self.boosted = true;
                log::debug!("ship pressing right travel edge, scroll boosted");
                Some(consts::TUNNEL_VELOCITY * consts::BOOST_FACTOR)
            }
            EventKind::BoundaryExit { edge: Edge::Right, .. } => {
                self.boosted = false;
                log::debug!("ship left right travel edge, scroll restored");
                Some(consts::TUNNEL_VELOCITY)
            }
            _ => None,
        }
    }

    /// Per-frame move: facing, terrain resolution, firing, shot upkeep
    pub fn update(&mut self, input: &StepInput, ctx: &mut PlayerCtx) {
        if input.right && !input.left {
            self.facing = Facing::Right;
        } else if input.left && !input.right {
            self.facing = Facing::Left;
        }

        let obstacles = [ctx.hill_tops, ctx.hill_bottoms, ctx.tunnel_walls];
        if resolve_push(ctx.stage, self.sprite, &obstacles, ctx.damage) {
            // Halt the current motion on top of the resolver's push
            ctx.stage.sprite_mut(self.sprite).vel = Vec2::ZERO;
        }

        if input.fire {
            self.fire_when_ready(ctx);
        }
        self.retire_spent_shot(ctx);
    }

    /// Fire unless a shot is already live
    pub fn fire_when_ready(&self, ctx: &mut PlayerCtx) -> bool {
        if !ctx.stage.members(ctx.shots).is_empty() {
            return false;
        }
        let ship = ctx.stage.sprite(self.sprite).clone();
        let mut shot = Sprite::solid(consts::SHOT_SIZE.0, consts::SHOT_SIZE.1, consts::SHOT_COLOR);
        shot.pos.y = ship.pos.y;
        match self.facing {
            Facing::Right => shot.set_left(ship.right()),
            Facing::Left => shot.set_right(ship.left()),
        }
        let id = ctx.stage.spawn(shot);
        ctx.stage.group_push(ctx.shots, id);
        ctx.actions.start_move(
            ctx.shots,
            consts::TAG_PLAYER_SHOT,
            MoveCfg {
                velocity: Vec2::new(self.facing.sign() * consts::PLAYER_SHIP_FIRE_SPEED, 0.0),
                ..Default::default()
            },
        );
        true
    }

    /// Retire the live shot once it leaves the viewport or strikes terrain
    fn retire_spent_shot(&self, ctx: &mut PlayerCtx) {
        let Some(shot) = ctx.stage.members(ctx.shots).first().copied() else {
            return;
        };
        let body = ctx.stage.sprite(shot);
        let gone = crate::shot_off_screen(body.left(), body.right())
            || hits_any(ctx.stage, shot, &[ctx.hill_tops, ctx.hill_bottoms]);
        if gone {
            ctx.actions.stop_tag(consts::TAG_PLAYER_SHOT);
            ctx.stage.despawn(shot);
        }
    }
}
