//! The page-fetcher seam between the monitor and the dashboard.

use crate::FetchError;
use async_trait::async_trait;
use watermon_core::{Alert, Sale};

/// One fetch of both dashboard pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Newest first, as the sales page lists them.
    pub sales: Vec<Sale>,
    /// Presence only; order carries no meaning.
    pub alerts: Vec<Alert>,
}

/// Source of dashboard state.
///
/// Implementations authenticate on their own and map every failure onto
/// [`FetchError`]. A page that loads but lists nothing yields an empty vector,
/// not an error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Sales currently visible, newest first.
    async fn fetch_sales(&self) -> Result<Vec<Sale>, FetchError>;

    /// Terminals currently flagged with a warning.
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, FetchError>;

    /// Both pages within one session. The first failure aborts the snapshot.
    async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
        let sales = self.fetch_sales().await?;
        let alerts = self.fetch_alerts().await?;
        Ok(Snapshot { sales, alerts })
    }
}
