//! Background Tasks Module
//!
//! Contains background tasks owned by the cache engine.
//!
//! # Tasks
//! - Expiry Sweep: Removes expired cache entries at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
