//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (wall clock, fixed-step frame driver)
//! - Storage (LocalStorage on web, in-memory elsewhere)

pub mod storage;
pub mod time;

pub use storage::{MemoryStorage, Storage};
pub use time::{Clock, FrameDriver, ManualClock, WallClock};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
