pub mod format;
pub mod hash;

pub use format::{format_duration, format_timestamp, shell_quote};
pub use hash::{compute_blake3_hash, verify_unchanged};
