pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const BOARD_WIDTH: i32 = 19;
pub const BOARD_HEIGHT: i32 = 21;

// Cells per tick. The player outruns the ghosts 10:9; both stay well under
// one cell per tick so every traversed cell is seen by the rounded lookups.
pub const PLAYER_SPEED: f32 = 0.2;
pub const GHOST_SPEED: f32 = 0.18;

pub const PELLET_POINTS: i32 = 10;
pub const POWER_PELLET_POINTS: i32 = 50;
pub const POWER_PELLET_DURATION_TICKS: u32 = 300;
pub const FRIGHTENED_BASE_SCORE: i32 = 200;

pub const STARTING_LIVES: i32 = 3;
pub const GHOST_COLLISION_RADIUS: f32 = 1.0;

// Chase/scatter alternation: 5 seconds per phase at the 60 Hz cadence.
pub const MODE_PHASE_TICKS: u64 = 300;
