//! Core data types and change detection for the dashboard monitor.

pub mod alert;
pub mod cursor;
pub mod diff;
pub mod sale;

pub use alert::*;
pub use cursor::*;
pub use diff::*;
pub use sale::*;
