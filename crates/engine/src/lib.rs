//! Dashboard monitoring engine.
//!
//! Ties the dashboard fetcher, the diff engines, the notifier and the cursor
//! store into one serialized poll pipeline, and exposes the manual checks the
//! command surface triggers.

pub mod config;
pub mod error;
pub mod monitor;
pub mod scheduler;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use monitor::*;
pub use scheduler::run_scheduler;
