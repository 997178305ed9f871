//! Sale records as listed on the dashboard's sales page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a sale was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    Card,
    Bills,
    Coins,
    #[default]
    Unknown,
}

impl PaymentMethod {
    /// Path fragments unique to each payment icon on the sales table.
    const CARD_SIGNATURE: &'static str = "v8c0 6.6-5.4 12-12 12";
    const BILLS_SIGNATURE: &'static str = "c-53.02 0-96 50.14-96 112";
    const COINS_SIGNATURE: &'static str = "c-48.6 0-92.6 9-124.5 23.4";

    /// Classify a single SVG `<path d="...">` attribute.
    /// Returns `Unknown` for anything that is not a known icon.
    pub fn from_svg_path(d: &str) -> Self {
        if d.contains(Self::CARD_SIGNATURE) {
            PaymentMethod::Card
        } else if d.contains(Self::BILLS_SIGNATURE) {
            PaymentMethod::Bills
        } else if d.contains(Self::COINS_SIGNATURE) {
            PaymentMethod::Coins
        } else {
            PaymentMethod::Unknown
        }
    }

    /// Classify a cell holding several icon paths. The first recognised path wins.
    pub fn from_svg_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        paths
            .into_iter()
            .map(Self::from_svg_path)
            .find(|m| *m != PaymentMethod::Unknown)
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_known(self) -> bool {
        self != PaymentMethod::Unknown
    }

    /// Human-readable label with icon, as shown in notifications.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Card => "💳 Card",
            PaymentMethod::Bills => "💵 Bills",
            PaymentMethod::Coins => "🪙 Coins",
            PaymentMethod::Unknown => "Not specified",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the sales table.
///
/// All numeric-looking fields are kept as the dashboard displays them; the
/// monitor never does arithmetic on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Display identifier. Stable for a transaction while it stays on the page,
    /// not guaranteed to be numeric or globally unique.
    pub id: String,
    pub address: String,
    pub time: String,
    pub liters: String,
    pub total: String,
    pub payment_method: PaymentMethod,
}

impl Sale {
    /// Create a sale with an unknown payment method.
    pub fn new(
        id: impl Into<String>,
        address: impl Into<String>,
        time: impl Into<String>,
        liters: impl Into<String>,
        total: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            time: time.into(),
            liters: liters.into(),
            total: total.into(),
            payment_method: PaymentMethod::Unknown,
        }
    }

    pub fn with_payment(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    /// A row without an id cannot be tracked by the cursor.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
