//! Dashboard access for the monitor.
//!
//! ## Architecture
//!
//! - `fetcher` - the `PageFetcher` trait the monitor polls through
//! - `client` - HTTP implementation with form login and a session cookie
//! - `extract` - sales table and terminal warning extraction
//! - `html` - tag slicing helpers used by `extract`

pub mod client;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod html;

pub use client::{DashboardClient, DashboardConfig};
pub use error::*;
pub use extract::{parse_alerts, parse_sales};
pub use fetcher::*;
