use chrono::{DateTime, Local};

/// Second-resolution local timestamp, 24-hour clock.
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

pub const ASSET_EXTENSION: &str = "jpg";

/// Upper bound on `_N` suffixes tried for one timestamp.
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

pub fn timestamp_stem(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// File name for the `attempt`-th candidate: `stem.jpg`, then `stem_1.jpg`, `stem_2.jpg`, …
pub fn asset_file_name(stem: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}.{}", stem, ASSET_EXTENSION)
    } else {
        format!("{}_{}.{}", stem, attempt, ASSET_EXTENSION)
    }
}
