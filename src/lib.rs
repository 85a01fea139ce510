//! Laser Gates - a side-scrolling tunnel shooter
//!
//! Core modules:
//! - `stage`: Entity arena and live sprite groups
//! - `actions`: Per-frame movement and timing primitives with boundary events
//! - `pool`: Fixed-capacity sprite pool with all-or-nothing acquisition
//! - `collision`: AABB overlap tests and vertical push-out resolution
//! - `contexts`: Borrowed views threaded through waves and the player
//! - `player`: Ship steering, firing and terrain collision
//! - `waves`: Enemy wave family (dense packs, forcefields)
//! - `tunnel`: Scroll coordination, wave rotation and the per-frame order
//! - `render`: Immediate-mode drawing of the world
//!
//! Everything outside `render` and `main` is headless: deterministic,
//! frame-stepped, and free of windowing dependencies.

pub mod actions;
pub mod collision;
pub mod contexts;
pub mod player;
pub mod pool;
pub mod render;
pub mod stage;
pub mod tunnel;
pub mod waves;

pub use stage::{GroupId, Sprite, SpriteId, Stage};
pub use tunnel::{StepInput, Tunnel};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the scroll tuning)
    pub const STEP_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Viewport dimensions
    pub const WINDOW_WIDTH: f32 = 1024.0;
    pub const WINDOW_HEIGHT: f32 = 432.0;
    /// Half the viewport height; collision pushes resolve away from it
    pub const VIEWPORT_MIDLINE: f32 = WINDOW_HEIGHT / 2.0;

    /// Horizontal period of one terrain mound
    pub const HILL_WIDTH: f32 = 512.0;
    /// Total height of one stacked terrain mound
    pub const HILL_HEIGHT: f32 = 57.0;
    /// Fixed x where a wrapped terrain tile re-enters the scroll band
    pub const HILL_REENTRY_X: f32 = HILL_WIDTH * 3.0;
    /// Widths and heights of the four stacked mound slices, base first
    pub const HILL_SLICE_SIZES: [(f32, f32); 4] =
        [(512.0, 15.0), (416.0, 15.0), (320.0, 14.0), (224.0, 13.0)];

    /// Solid wall strips along the top and bottom of the viewport
    pub const TUNNEL_WALL_HEIGHT: f32 = 50.0;
    /// Horizontal margin past the viewport where waves travel and retire
    pub const WALL_WIDTH: f32 = 200.0;

    /// Base leftward scroll velocity of the tunnel (px/s)
    pub const TUNNEL_VELOCITY: f32 = -180.0;
    /// Scroll multiplier while the ship presses the right travel edge
    pub const BOOST_FACTOR: f32 = 2.0;

    /// Ship speeds (px/s)
    pub const PLAYER_SHIP_HORIZ: f32 = 480.0;
    pub const PLAYER_SHIP_VERT: f32 = 300.0;
    /// Shot speed (px/s)
    pub const PLAYER_SHIP_FIRE_SPEED: f32 = 900.0;
    /// Ship and shot body sizes
    pub const SHIP_SIZE: (f32, f32) = (64.0, 24.0);
    pub const SHOT_SIZE: (f32, f32) = (36.0, 9.0);
    /// Leftmost x the ship's left edge may reach
    pub const SHIP_LEFT_BOUND: f32 = HILL_WIDTH / 4.0;
    /// Rightmost x the ship's center may reach
    pub const SHIP_RIGHT_BOUND: f32 = WINDOW_WIDTH - HILL_WIDTH / 1.5;
    /// Ship spawn center
    pub const SHIP_START: (f32, f32) = (HILL_WIDTH / 4.0, WINDOW_HEIGHT / 2.0);

    /// Damage registered per collision kind
    pub const TERRAIN_HIT_DAMAGE: f32 = 0.3;
    pub const DENSE_PACK_DAMAGE: f32 = 0.8;
    pub const FORCEFIELD_DAMAGE: f32 = 1.0;
    /// Damage flash fade rate (units/s)
    pub const DAMAGE_FLASH_DECAY: f32 = 5.0;

    /// Shared block pool capacity (covers the widest dense pack)
    pub const SHIELD_POOL_SIZE: usize = 300;
    /// Dense pack grid geometry
    pub const DENSE_PACK_ROWS: u32 = 30;
    pub const DENSE_PACK_CELL: (f32, f32) = (10.0, 12.0);
    pub const THIN_PACK_COLUMNS: u32 = 5;
    pub const THICK_PACK_COLUMNS: u32 = 10;

    /// Horizontal spacing between forcefield units
    pub const FORCEFIELD_SPACING: f32 = 220.0;
    /// Units per forcefield wave
    pub const FORCEFIELD_RUN_LENGTH: usize = 3;
    /// Cap and core body sizes
    pub const FORCEFIELD_CAP_SIZE: (f32, f32) = (53.0, HILL_HEIGHT);
    pub const FORCEFIELD_CORE_SIZE: (f32, f32) = (53.0, 109.0);
    /// Animation frame count for the rolled core pattern
    pub const FORCEFIELD_CORE_FRAMES: u32 = 109;
    /// Core frame cycling rate (frames/s)
    pub const FORCEFIELD_CYCLE_FPS: f32 = 100.0;
    /// Flashing forcefield on/off half-period (s)
    pub const FORCEFIELD_BLINK_PERIOD: f32 = 0.5;
    /// Cap palette rotation interval (s)
    pub const FORCEFIELD_COLOR_INTERVAL: f32 = 0.1;
    /// Vertical speed of flexing cores (px/s)
    pub const FORCEFIELD_FLEX_SPEED: f32 = 120.0;

    /// Solid color palette the forcefield caps rotate through
    pub const FORCEFIELD_SOLID_COLORS: [[u8; 3]; 6] = [
        [0, 255, 255],
        [255, 0, 255],
        [255, 255, 0],
        [0, 255, 0],
        [255, 128, 0],
        [255, 255, 255],
    ];
    /// Base tint of the animated forcefield cores
    pub const FORCEFIELD_CORE_COLOR: [u8; 3] = [120, 200, 255];
    /// Action tags, used for event routing and bulk cancellation
    pub const TAG_PLAYER_MOVE: &str = "player_move";
    pub const TAG_PLAYER_SHOT: &str = "player_shot";
    pub const TAG_TUNNEL_SCROLL: &str = "tunnel_scroll";
    pub const TAG_WAVE: &str = "wave";
    pub const TUNNEL_WALL_COLOR: [u8; 3] = [141, 65, 8];
    pub const HILL_COLOR: [u8; 3] = [160, 82, 45];
    pub const SHIELD_BLOCK_COLOR: [u8; 3] = [176, 176, 176];
    pub const SHIP_COLOR: [u8; 3] = [72, 160, 255];
    pub const SHOT_COLOR: [u8; 3] = [255, 64, 64];
}

/// Push direction for a vertical collision resolution: strictly below the
/// viewport midline pushes up, at or above it pushes down.
#[inline]
pub fn vertical_push_direction(center_y: f32) -> f32 {
    if center_y < consts::VIEWPORT_MIDLINE { 1.0 } else { -1.0 }
}

/// True once a shot has fully left the viewport on either side
#[inline]
pub fn shot_off_screen(left: f32, right: f32) -> bool {
    right < 0.0 || left > consts::WINDOW_WIDTH
}
