// Capacity
pub const MAX_ENTRIES: usize = 2048;
pub const MAX_PLAYERS: usize = 2048;
pub const RACE_HISTORY: usize = 20;
pub const MAX_SPLITS: usize = 5;

// Season points
pub const MAX_POINTS_PLACES: u32 = 10;
pub const MAX_RACER_POINTS: usize = 20;
pub const MIN_POINTS: u32 = 0;

// Divisions
pub const DIV_IN_USE: u32 = 4;
pub const DIV_COUNT: u32 = 8;
pub const CURVE_POINTS: usize = 10;
pub const ROOKIE_TIME: f64 = 3.0;
pub const SUB_DIVISION_RANGE: f64 = 1.0 / 3.0;
pub const THRESHOLD_EPSILON: f64 = 0.001;
pub const RATING_CEILING: f64 = (DIV_IN_USE + 1) as f64 - 0.001;
pub const QUALITY_MIN_COUNT: u32 = 3;

// Curve tuning
pub const DEFAULT_SQUEEZE: f64 = 1.2;
pub const DEFAULT_SCOOT: f64 = 0.0;
pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const AUTO_CYCLE_COUNT: usize = 10;
pub const AUTO_SCOOT_FRACTION: usize = 5;
pub const AUTO_SCOOT_DAMPING: f64 = 0.75;
pub const MAX_TROPHY_ADJUST: f64 = 2.0 / 3.0;

// Player rating
pub const RATING_WEIGHT_CAP: f64 = 5.0;
pub const MIN_PROMOTION_EVENT_COUNT: f64 = 4.0;
pub const NO_HARM_HANDICAP: bool = true;
pub const QUALIFIER_REBUILD_WEIGHT: f64 = 2.0;

pub const EVENT_QUALIFIER: u32 = 0;
pub const DEFAULT_DB_NAME: &str = "gt7wrs.wdb";
