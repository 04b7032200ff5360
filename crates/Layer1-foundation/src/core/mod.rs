//! Core types shared by every layer
//!
//! - `placement.rs` - placement identity (chip x, chip y, processor)
//! - `progress.rs` - progress indicator contract and a thread-safe counter

mod placement;
mod progress;

pub use placement::Placement;
pub use progress::{Progress, ProgressCounter};
