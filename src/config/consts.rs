// src/config/consts.rs

// Output layout
pub const DEFAULT_OUT_DIR: &str = "scraped_data";
pub const DEFAULT_FAILED_GAMES_FILE: &str = "failed_games.json";

// Companion files of a results table during a retry pass
pub const EXISTING_SUFFIX: &str = ".existing";
pub const MERGED_SUFFIX: &str = ".merged";

// Logging
pub const LOG_ENV: &str = "NCAA_LOG";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Game pass
pub const DRIVER_RECYCLE_EVERY: usize = 20;
pub const SOFT_FAILURE_TYPE: &str = "timeout";
pub const SOFT_FAILURE_MESSAGE: &str = "Game failed to scrape";
pub const HARD_FAILURE_TYPE: &str = "exception";
