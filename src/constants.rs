//! Default values for annotation sessions

/// Default brush radius in pixels
pub const DEFAULT_CIRCLE_SIZE: u32 = 3;

/// Default number of undo snapshots kept in memory
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 15;

/// Default minimum mean channel value for instance colors
pub const DEFAULT_BRIGHTNESS_THRESHOLD: u8 = 80;

/// Default key that reverts the last stroke
pub const DEFAULT_UNDO_KEY: &str = "z";

/// Default CLAHE clip limit
pub const DEFAULT_CLAHE_CLIP_LIMIT: f32 = 2.0;

/// Default CLAHE tile grid (tiles per axis)
pub const DEFAULT_CLAHE_TILE_GRID: u32 = 8;

/// Directory name under the platform config dir
pub const APP_DIR: &str = "mask-annotator";

/// Config file name inside [`APP_DIR`]
pub const CONFIG_FILE: &str = "config.json";
