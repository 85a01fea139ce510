//! Per-frame movement and timing primitives
//!
//! Actions are the only thing that moves sprites. Each one targets a live
//! sprite group and carries a tag for bulk cancellation:
//! - `Move`: velocity application with an axis mask, an optional steering
//!   function evaluated every frame, and optional bounds with a
//!   limit/wrap/bounce policy
//! - `Blink`: visibility toggling on a fixed half-period
//! - `Pulse`: a bare interval tick
//! - `CycleFrames`: animation frame advance at a fixed rate
//!
//! Boundary and blink transitions are not callbacks; `update` returns them
//! as an ordered event list the coordinator dispatches in the same frame,
//! before anything else runs.

use glam::Vec2;

use crate::stage::{GroupId, Sprite, SpriteId, Stage};

/// Handle to a running action. Ids are never reused, so a stale handle can
/// only miss, never hit the wrong action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionId(u32);

/// Axes a move action integrates (and checks bounds on)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMask {
    Both,
    X,
    Y,
}

impl AxisMask {
    #[inline]
    fn has_x(self) -> bool {
        matches!(self, AxisMask::Both | AxisMask::X)
    }

    #[inline]
    fn has_y(self) -> bool {
        matches!(self, AxisMask::Both | AxisMask::Y)
    }
}

/// Edge of a bound rect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Bottom,
    Top,
}

impl Edge {
    #[inline]
    fn index(self) -> usize {
        match self {
            Edge::Left => 0,
            Edge::Right => 1,
            Edge::Bottom => 2,
            Edge::Top => 3,
        }
    }
}

/// What happens when a sprite center crosses a bound edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// Clamp at the edge; fires enter once on crossing, exit once on
    /// moving away
    Limit,
    /// Teleport to the opposite edge; fires enter on every wrap
    Wrap,
    /// Reflect the velocity component at the edge
    Bounce,
}

/// Axis-aligned bound rect, compared against sprite centers
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct BoundsSpec {
    pub rect: Bounds,
    pub policy: BoundsPolicy,
}

/// Inputs a steering function may read, snapshotted once per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct SteerInputs {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Current authoritative scroll velocity (px/s)
    pub scroll_velocity: f32,
}

/// Velocity override, evaluated lazily during integration
pub type SteerFn = fn(&SteerInputs, &Sprite) -> Vec2;

/// Configuration of a move action
#[derive(Clone, Copy)]
pub struct MoveCfg {
    pub velocity: Vec2,
    pub axis: AxisMask,
    pub steer: Option<SteerFn>,
    pub bounds: Option<BoundsSpec>,
}

impl Default for MoveCfg {
    fn default() -> Self {
        Self { velocity: Vec2::ZERO, axis: AxisMask::Both, steer: None, bounds: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    BoundaryEnter { sprite: SpriteId, edge: Edge },
    BoundaryExit { sprite: SpriteId, edge: Edge },
    BlinkOn,
    BlinkOff,
    Pulse,
}

/// One boundary/blink/pulse transition from this frame's integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionEvent {
    pub action: ActionId,
    pub tag: &'static str,
    pub kind: EventKind,
}

enum Kind {
    Move {
        velocity: Vec2,
        axis: AxisMask,
        steer: Option<SteerFn>,
        bounds: Option<BoundsSpec>,
        entered: [bool; 4],
    },
    Blink {
        interval: f32,
        timer: f32,
        on: bool,
    },
    Pulse {
        interval: f32,
        timer: f32,
    },
    CycleFrames {
        fps: f32,
        carry: f32,
        frames: u32,
        step: i32,
    },
}

struct Action {
    id: ActionId,
    tag: &'static str,
    target: GroupId,
    kind: Kind,
}

/// Runs every active action once per frame, in start order
#[derive(Default)]
pub struct ActionRunner {
    actions: Vec<Action>,
    next_id: u32,
}

impl ActionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, tag: &'static str, target: GroupId, kind: Kind) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        log::debug!("start action {:?} tag={} target={:?}", id, tag, target);
        self.actions.push(Action { id, tag, target, kind });
        id
    }

    pub fn start_move(&mut self, target: GroupId, tag: &'static str, cfg: MoveCfg) -> ActionId {
        self.push(
            tag,
            target,
            Kind::Move {
                velocity: cfg.velocity,
                axis: cfg.axis,
                steer: cfg.steer,
                bounds: cfg.bounds,
                entered: [false; 4],
            },
        )
    }

    pub fn blink(&mut self, target: GroupId, tag: &'static str, interval: f32) -> ActionId {
        self.push(tag, target, Kind::Blink { interval, timer: 0.0, on: true })
    }

    pub fn pulse(&mut self, target: GroupId, tag: &'static str, interval: f32) -> ActionId {
        self.push(tag, target, Kind::Pulse { interval, timer: 0.0 })
    }

    pub fn cycle_frames(
        &mut self,
        target: GroupId,
        tag: &'static str,
        fps: f32,
        frames: u32,
        step: i32,
    ) -> ActionId {
        self.push(tag, target, Kind::CycleFrames { fps, carry: 0.0, frames, step })
    }

    pub fn stop(&mut self, id: ActionId) {
        self.actions.retain(|a| a.id != id);
    }

    /// Cancel every action carrying the tag
    pub fn stop_tag(&mut self, tag: &str) {
        self.actions.retain(|a| a.tag != tag);
    }

    pub fn is_running(&self, id: ActionId) -> bool {
        self.actions.iter().any(|a| a.id == id)
    }

    /// Retarget a move action's stored velocity without restarting it
    pub fn set_velocity(&mut self, id: ActionId, v: Vec2) {
        if let Some(action) = self.actions.iter_mut().find(|a| a.id == id)
            && let Kind::Move { velocity, .. } = &mut action.kind
        {
            *velocity = v;
        }
    }

    pub fn velocity_of(&self, id: ActionId) -> Option<Vec2> {
        self.actions.iter().find(|a| a.id == id).and_then(|a| match &a.kind {
            Kind::Move { velocity, .. } => Some(*velocity),
            _ => None,
        })
    }

    /// Integrate one frame. Returns the boundary/blink/pulse transitions in
    /// the order they occurred.
    pub fn update(&mut self, dt: f32, stage: &mut Stage, steer: &SteerInputs) -> Vec<ActionEvent> {
        let mut events = Vec::new();
        for action in &mut self.actions {
            let members: Vec<SpriteId> = stage.members(action.target).to_vec();
            match &mut action.kind {
                Kind::Move { velocity, axis, steer: steer_fn, bounds, entered } => {
                    for id in members {
                        let chosen = match steer_fn {
                            Some(f) => f(steer, stage.sprite(id)),
                            None => *velocity,
                        };
                        let sprite = stage.sprite_mut(id);
                        if axis.has_x() {
                            sprite.vel.x = chosen.x;
                            sprite.pos.x += sprite.vel.x * dt;
                        }
                        if axis.has_y() {
                            sprite.vel.y = chosen.y;
                            sprite.pos.y += sprite.vel.y * dt;
                        }
                        if let Some(spec) = bounds {
                            apply_bounds(
                                stage, id, *axis, spec, velocity, entered, action.id, action.tag,
                                &mut events,
                            );
                        }
                    }
                }
                Kind::Blink { interval, timer, on } => {
                    *timer += dt;
                    while *timer >= *interval {
                        *timer -= *interval;
                        *on = !*on;
                        stage.set_group_visible(action.target, *on);
                        events.push(ActionEvent {
                            action: action.id,
                            tag: action.tag,
                            kind: if *on { EventKind::BlinkOn } else { EventKind::BlinkOff },
                        });
                    }
                }
                Kind::Pulse { interval, timer } => {
                    *timer += dt;
                    while *timer >= *interval {
                        *timer -= *interval;
                        events.push(ActionEvent {
                            action: action.id,
                            tag: action.tag,
                            kind: EventKind::Pulse,
                        });
                    }
                }
                Kind::CycleFrames { fps, carry, frames, step } => {
                    *carry += *fps * dt;
                    let whole = carry.floor();
                    *carry -= whole;
                    let advance = whole as i64 * *step as i64;
                    if advance != 0 && *frames > 0 {
                        for id in members {
                            let sprite = stage.sprite_mut(id);
                            sprite.frame = (sprite.frame as i64 + advance)
                                .rem_euclid(*frames as i64)
                                as u32;
                        }
                    }
                }
            }
        }
        events
    }
}

/// Boundary handling for one sprite of a move action. Only the edge the
/// sprite is moving toward is checked, so a sprite spawned outside the far
/// edge scrolls in without triggering it.
#[allow(clippy::too_many_arguments)]
fn apply_bounds(
    stage: &mut Stage,
    id: SpriteId,
    axis: AxisMask,
    spec: &BoundsSpec,
    velocity: &mut Vec2,
    entered: &mut [bool; 4],
    action: ActionId,
    tag: &'static str,
    events: &mut Vec<ActionEvent>,
) {
    let rect = spec.rect;
    if axis.has_x() {
        apply_edge_pair(
            stage, id, spec.policy, rect.left, rect.right, AxisSel::X, velocity, entered, action,
            tag, events,
        );
    }
    if axis.has_y() {
        apply_edge_pair(
            stage, id, spec.policy, rect.bottom, rect.top, AxisSel::Y, velocity, entered, action,
            tag, events,
        );
    }
}

#[derive(Clone, Copy)]
enum AxisSel {
    X,
    Y,
}

impl AxisSel {
    fn edges(self) -> (Edge, Edge) {
        match self {
            AxisSel::X => (Edge::Left, Edge::Right),
            AxisSel::Y => (Edge::Bottom, Edge::Top),
        }
    }

    fn get(self, v: Vec2) -> f32 {
        match self {
            AxisSel::X => v.x,
            AxisSel::Y => v.y,
        }
    }

    fn pos_mut(self, sprite: &mut Sprite) -> &mut f32 {
        match self {
            AxisSel::X => &mut sprite.pos.x,
            AxisSel::Y => &mut sprite.pos.y,
        }
    }

    fn vel_mut(self, sprite: &mut Sprite) -> &mut f32 {
        match self {
            AxisSel::X => &mut sprite.vel.x,
            AxisSel::Y => &mut sprite.vel.y,
        }
    }

    fn stored_mut(self, v: &mut Vec2) -> &mut f32 {
        match self {
            AxisSel::X => &mut v.x,
            AxisSel::Y => &mut v.y,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_edge_pair(
    stage: &mut Stage,
    id: SpriteId,
    policy: BoundsPolicy,
    min: f32,
    max: f32,
    sel: AxisSel,
    velocity: &mut Vec2,
    entered: &mut [bool; 4],
    action: ActionId,
    tag: &'static str,
    events: &mut Vec<ActionEvent>,
) {
    let (min_edge, max_edge) = sel.edges();
    let sprite = stage.sprite_mut(id);
    let v = sel.get(sprite.vel);
    let pos = *sel.pos_mut(sprite);

    // Crossing check against the direction of motion only
    let crossing = if v < 0.0 && pos < min {
        Some((min_edge, min, max))
    } else if v > 0.0 && pos > max {
        Some((max_edge, max, min))
    } else {
        None
    };

    match policy {
        BoundsPolicy::Limit => {
            if let Some((edge, at, _)) = crossing {
                *sel.pos_mut(sprite) = at;
                if !entered[edge.index()] {
                    entered[edge.index()] = true;
                    events.push(ActionEvent {
                        action,
                        tag,
                        kind: EventKind::BoundaryEnter { sprite: id, edge },
                    });
                }
            } else {
                for (edge, at) in [(min_edge, min), (max_edge, max)] {
                    let away = match edge {
                        Edge::Left | Edge::Bottom => pos > at,
                        Edge::Right | Edge::Top => pos < at,
                    };
                    if entered[edge.index()] && away {
                        entered[edge.index()] = false;
                        events.push(ActionEvent {
                            action,
                            tag,
                            kind: EventKind::BoundaryExit { sprite: id, edge },
                        });
                    }
                }
            }
        }
        BoundsPolicy::Wrap => {
            if let Some((edge, _, opposite)) = crossing {
                *sel.pos_mut(sprite) = opposite;
                events.push(ActionEvent {
                    action,
                    tag,
                    kind: EventKind::BoundaryEnter { sprite: id, edge },
                });
            }
        }
        BoundsPolicy::Bounce => {
            if let Some((_, at, _)) = crossing {
                *sel.pos_mut(sprite) = at;
                *sel.vel_mut(sprite) = -v;
                *sel.stored_mut(velocity) = -sel.get(*velocity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STEP_DT;

    fn world() -> (Stage, ActionRunner, GroupId, SpriteId) {
        let mut stage = Stage::new();
        let group = stage.group();
        let id = stage.spawn(Sprite::solid(10.0, 10.0, [255, 255, 255]));
        stage.group_push(group, id);
        (stage, ActionRunner::new(), group, id)
    }

    fn run(runner: &mut ActionRunner, stage: &mut Stage, frames: u32) -> Vec<ActionEvent> {
        let steer = SteerInputs::default();
        let mut events = Vec::new();
        for _ in 0..frames {
            events.extend(runner.update(STEP_DT, stage, &steer));
        }
        events
    }

    #[test]
    fn test_move_integrates_velocity_over_steps() {
        let (mut stage, mut runner, group, id) = world();
        stage.sprite_mut(id).pos = Vec2::new(100.0, 100.0);
        runner.start_move(group, "t", MoveCfg { velocity: Vec2::new(60.0, -120.0), ..Default::default() });
        run(&mut runner, &mut stage, 60);
        let pos = stage.sprite(id).pos;
        assert!((pos.x - 160.0).abs() < 1e-3);
        assert!((pos.y + 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_axis_masked_move_leaves_other_axis_alone() {
        let (mut stage, mut runner, group, id) = world();
        stage.sprite_mut(id).pos = Vec2::new(0.0, 50.0);
        runner.start_move(
            group,
            "t",
            MoveCfg { velocity: Vec2::new(60.0, 60.0), axis: AxisMask::X, ..Default::default() },
        );
        run(&mut runner, &mut stage, 60);
        let s = stage.sprite(id);
        assert!((s.pos.x - 60.0).abs() < 1e-3);
        assert_eq!(s.pos.y, 50.0);
        assert_eq!(s.vel.y, 0.0);
    }

    #[test]
    fn test_limit_clamps_and_fires_enter_once_then_exit() {
        let (mut stage, mut runner, group, id) = world();
        stage.sprite_mut(id).pos = Vec2::new(98.0, 50.0);
        let bounds = Bounds { left: 0.0, bottom: 0.0, right: 100.0, top: 100.0 };
        let action = runner.start_move(
            group,
            "t",
            MoveCfg {
                velocity: Vec2::new(300.0, 0.0),
                bounds: Some(BoundsSpec { rect: bounds, policy: BoundsPolicy::Limit }),
                ..Default::default()
            },
        );
        let events = run(&mut runner, &mut stage, 5);
        assert_eq!(stage.sprite(id).pos.x, 100.0);
        let enters: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::BoundaryEnter { edge: Edge::Right, .. }))
            .collect();
        assert_eq!(enters.len(), 1);

        // Move away again: exactly one exit
        runner.set_velocity(action, Vec2::new(-300.0, 0.0));
        let events = run(&mut runner, &mut stage, 3);
        let exits: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::BoundaryExit { edge: Edge::Right, .. }))
            .collect();
        assert_eq!(exits.len(), 1);
    }

    #[test]
    fn test_far_edge_is_ignored_when_moving_away_from_it() {
        // Spawned beyond the right edge, scrolling left: no right enter
        let (mut stage, mut runner, group, id) = world();
        stage.sprite_mut(id).pos = Vec2::new(500.0, 50.0);
        let bounds = Bounds { left: 0.0, bottom: 0.0, right: 400.0, top: 100.0 };
        runner.start_move(
            group,
            "t",
            MoveCfg {
                velocity: Vec2::new(-180.0, 0.0),
                bounds: Some(BoundsSpec { rect: bounds, policy: BoundsPolicy::Limit }),
                ..Default::default()
            },
        );
        let events = run(&mut runner, &mut stage, 10);
        assert!(events.is_empty());
        assert!(stage.sprite(id).pos.x < 500.0);
    }

    #[test]
    fn test_wrap_teleports_to_opposite_edge_and_reports_it() {
        let (mut stage, mut runner, group, id) = world();
        stage.sprite_mut(id).pos = Vec2::new(10.0, 50.0);
        let bounds = Bounds { left: 0.0, bottom: 0.0, right: 800.0, top: 100.0 };
        runner.start_move(
            group,
            "t",
            MoveCfg {
                velocity: Vec2::new(-900.0, 0.0),
                bounds: Some(BoundsSpec { rect: bounds, policy: BoundsPolicy::Wrap }),
                ..Default::default()
            },
        );
        let events = run(&mut runner, &mut stage, 1);
        assert_eq!(stage.sprite(id).pos.x, 800.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].kind, EventKind::BoundaryEnter { edge: Edge::Left, .. }));
    }

    #[test]
    fn test_bounce_reflects_velocity_at_band_edges() {
        let (mut stage, mut runner, group, id) = world();
        stage.sprite_mut(id).pos = Vec2::new(50.0, 30.0);
        let bounds = Bounds { left: -1000.0, bottom: 20.0, right: 1000.0, top: 40.0 };
        let action = runner.start_move(
            group,
            "t",
            MoveCfg {
                velocity: Vec2::new(0.0, -120.0),
                axis: AxisMask::Y,
                bounds: Some(BoundsSpec { rect: bounds, policy: BoundsPolicy::Bounce }),
                ..Default::default()
            },
        );
        // 30 -> 20 takes about 5 frames at 120 px/s; the crossing frame
        // clamps to the band edge and reflects
        run(&mut runner, &mut stage, 6);
        assert!(stage.sprite(id).pos.y >= 20.0 - 1e-3);
        assert_eq!(runner.velocity_of(action).unwrap().y, 120.0);
        run(&mut runner, &mut stage, 3);
        assert!(stage.sprite(id).pos.y > 21.0);
    }

    #[test]
    fn test_blink_toggles_visibility_and_reports_phases() {
        let (mut stage, mut runner, group, id) = world();
        runner.blink(group, "t", 0.5);
        let steer = SteerInputs::default();
        let events = runner.update(0.5, &mut stage, &steer);
        assert!(matches!(events[0].kind, EventKind::BlinkOff));
        assert!(!stage.sprite(id).visible);
        let events = runner.update(0.5, &mut stage, &steer);
        assert!(matches!(events[0].kind, EventKind::BlinkOn));
        assert!(stage.sprite(id).visible);
    }

    #[test]
    fn test_pulse_fires_on_its_interval() {
        let (mut stage, mut runner, group, _) = world();
        runner.pulse(group, "t", 0.1);
        let steer = SteerInputs::default();
        let mut count = 0;
        for _ in 0..30 {
            count += runner.update(STEP_DT, &mut stage, &steer).len();
        }
        // 0.5 s at 0.1 s intervals
        assert_eq!(count, 5);
    }

    #[test]
    fn test_cycle_frames_advances_and_wraps_backward() {
        let (mut stage, mut runner, group, id) = world();
        runner.cycle_frames(group, "t", 100.0, 109, -1);
        let steer = SteerInputs::default();
        // 0.25 s at 100 fps is exactly 25 frames backward from 0
        runner.update(0.25, &mut stage, &steer);
        assert_eq!(stage.sprite(id).frame, 84);
        runner.update(0.25, &mut stage, &steer);
        assert_eq!(stage.sprite(id).frame, 59);
    }

    #[test]
    fn test_stopped_actions_go_silent() {
        let (mut stage, mut runner, group, id) = world();
        stage.sprite_mut(id).pos = Vec2::new(10.0, 50.0);
        let bounds = Bounds { left: 0.0, bottom: 0.0, right: 800.0, top: 100.0 };
        runner.start_move(
            group,
            "halted",
            MoveCfg {
                velocity: Vec2::new(-900.0, 0.0),
                bounds: Some(BoundsSpec { rect: bounds, policy: BoundsPolicy::Wrap }),
                ..Default::default()
            },
        );
        runner.stop_tag("halted");
        let events = run(&mut runner, &mut stage, 10);
        assert!(events.is_empty());
        assert_eq!(stage.sprite(id).pos.x, 10.0);
    }

    #[test]
    fn test_set_velocity_retargets_without_restarting() {
        let (mut stage, mut runner, group, id) = world();
        let action =
            runner.start_move(group, "t", MoveCfg { velocity: Vec2::new(-60.0, 0.0), ..Default::default() });
        run(&mut runner, &mut stage, 30);
        runner.set_velocity(action, Vec2::new(-120.0, 0.0));
        assert!(runner.is_running(action));
        assert_eq!(runner.velocity_of(action).unwrap(), Vec2::new(-120.0, 0.0));
        run(&mut runner, &mut stage, 30);
        assert!((stage.sprite(id).pos.x + 90.0).abs() < 1e-3);
    }

    fn toward_scroll(steer: &SteerInputs, _sprite: &Sprite) -> Vec2 {
        if steer.right { Vec2::new(60.0, 0.0) } else { Vec2::new(steer.scroll_velocity, 0.0) }
    }

    #[test]
    fn test_steering_is_evaluated_every_frame() {
        let (mut stage, mut runner, group, id) = world();
        runner.start_move(group, "t", MoveCfg { steer: Some(toward_scroll), ..Default::default() });
        let mut steer = SteerInputs { scroll_velocity: -60.0, ..Default::default() };
        runner.update(1.0, &mut stage, &steer);
        assert!((stage.sprite(id).pos.x + 60.0).abs() < 1e-3);
        steer.right = true;
        runner.update(1.0, &mut stage, &steer);
        assert!(stage.sprite(id).pos.x.abs() < 1e-3);
    }
}
