//! Enemy wave family
//!
//! Exactly one wave is active at a time. The coordinator builds it at the
//! current scroll velocity, updates it between integration and the player
//! move, forwards action events to it, and retires it synchronously when
//! it asks. Wave kinds share the `WaveActions` tracker instead of a base
//! type: build registers every started action there, cleanup stops them.

pub mod densepack;
pub mod forcefield;

pub use densepack::DensePackWave;
pub use forcefield::{FlashingForcefieldWave, FlexingForcefieldWave};

use glam::Vec2;

use crate::actions::{ActionEvent, ActionId, ActionRunner, Bounds};
use crate::consts;
use crate::contexts::WaveCtx;
use crate::pool::PoolError;
use crate::stage::{GroupId, Stage};

/// The rotation the coordinator draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveKind {
    ThinDensePack,
    ThickDensePack,
    FlashingForcefield,
    FlexingForcefield,
}

pub const WAVE_ROTATION: [WaveKind; 4] = [
    WaveKind::ThinDensePack,
    WaveKind::ThickDensePack,
    WaveKind::FlashingForcefield,
    WaveKind::FlexingForcefield,
];

/// Construct a wave of the given kind (unbuilt)
pub fn spawn_wave(kind: WaveKind, stage: &mut Stage) -> Box<dyn Wave> {
    match kind {
        WaveKind::ThinDensePack => Box::new(DensePackWave::thin()),
        WaveKind::ThickDensePack => Box::new(DensePackWave::thick()),
        WaveKind::FlashingForcefield => {
            Box::new(FlashingForcefieldWave::new(stage, consts::FORCEFIELD_RUN_LENGTH))
        }
        WaveKind::FlexingForcefield => {
            Box::new(FlexingForcefieldWave::new(stage, consts::FORCEFIELD_RUN_LENGTH))
        }
    }
}

/// One enemy wave's lifecycle
pub trait Wave {
    /// Place entities and start actions at the current scroll velocity
    fn build(&mut self, ctx: &mut WaveCtx<'_>) -> Result<(), PoolError>;

    /// Per-frame combat checks; may register damage or request retirement
    fn update(&mut self, ctx: &mut WaveCtx<'_>);

    /// Stop actions and return/dispose entities. The wave object is
    /// discarded right after.
    fn cleanup(&mut self, ctx: &mut WaveCtx<'_>);

    /// React to one of this frame's action events; `true` requests
    /// retirement
    fn handle_event(&mut self, event: &ActionEvent, stage: &mut Stage) -> bool {
        let _ = (event, stage);
        false
    }

    /// Actions that mirror the authoritative scroll velocity
    fn scroll_actions(&self) -> &[ActionId];

    /// Forward a new scroll velocity to every tracked action
    fn retarget_scroll(&self, actions: &mut ActionRunner, velocity: f32) {
        for id in self.scroll_actions() {
            actions.set_velocity(*id, Vec2::new(velocity, 0.0));
        }
    }

    /// Draw groups, ascending layer order
    fn layers(&self) -> Vec<(i32, GroupId)>;
}

/// Bookkeeping for a wave's running actions
#[derive(Debug, Default)]
pub struct WaveActions {
    all: Vec<ActionId>,
    scroll: Vec<ActionId>,
}

impl WaveActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an action for cleanup
    pub fn track(&mut self, id: ActionId) -> ActionId {
        self.all.push(id);
        id
    }

    /// Track an action that also mirrors the scroll velocity
    pub fn track_scroll(&mut self, id: ActionId) -> ActionId {
        self.all.push(id);
        self.scroll.push(id);
        id
    }

    #[inline]
    pub fn scroll(&self) -> &[ActionId] {
        &self.scroll
    }

    /// Stop everything tracked and forget it
    pub fn stop_all(&mut self, actions: &mut ActionRunner) {
        for id in self.all.drain(..) {
            actions.stop(id);
        }
        self.scroll.clear();
    }
}

/// Travel rect shared by wave move actions: a `WALL_WIDTH` margin past the
/// left viewport edge, a configurable right extent
pub(crate) fn travel_bounds(right: f32) -> Bounds {
    Bounds { left: -consts::WALL_WIDTH, bottom: 0.0, right, top: consts::WINDOW_HEIGHT }
}
