//! Turns the dashboard pages into domain records.

use crate::html::{attr, attr_values, elements, elements_with_offsets, enclosing_element, strip_tags};
use crate::FetchError;
use tracing::debug;
use url::Url;
use watermon_core::{Alert, PaymentMethod, Sale};

/// Marker of the warning icon next to a faulty terminal.
const WARNING_ICON: &str = r#"data-icon="exclamation-circle""#;

/// Link prefix of a terminal's detail page.
const TERMINAL_LINK_PREFIX: &str = "/terminal/";

/// Cells per sales row: number, address, time, liters, total, payment icons.
const SALE_MIN_CELLS: usize = 5;

/// Parse the sales table. Rows are returned in page order (newest first).
///
/// A page without any table is a layout or session problem and fails; a table
/// with no data rows yields an empty list.
pub fn parse_sales(html: &str) -> Result<Vec<Sale>, FetchError> {
    let tables = elements(html, "table");
    if tables.is_empty() {
        return Err(FetchError::Parse("sales table not found".to_string()));
    }

    let mut sales = Vec::new();
    for table in tables {
        for body in elements(table, "tbody") {
            for row in elements(body, "tr") {
                let cells = elements(row, "td");
                if cells.len() < SALE_MIN_CELLS {
                    debug!(cells = cells.len(), "Skipping sales row without enough cells");
                    continue;
                }

                let payment_method = cells
                    .get(5)
                    .map(|cell| PaymentMethod::from_svg_paths(attr_values(cell, "path", "d")))
                    .unwrap_or_default();

                sales.push(
                    Sale::new(
                        strip_tags(cells[0]),
                        strip_tags(cells[1]),
                        strip_tags(cells[2]),
                        strip_tags(cells[3]),
                        strip_tags(cells[4]),
                    )
                    .with_payment(payment_method),
                );
            }
        }
    }

    Ok(sales)
}

/// Parse the terminals page into the terminals whose link sits next to a
/// warning icon. Links are resolved against `base`.
pub fn parse_alerts(html: &str, base: &Url) -> Result<Vec<Alert>, FetchError> {
    if !html.to_ascii_lowercase().contains(WARNING_ICON) {
        return Ok(Vec::new());
    }

    let mut alerts = Vec::new();
    for (offset, link) in elements_with_offsets(html, "a") {
        let Some(href) = attr(link, "href") else {
            continue;
        };
        if !href.starts_with(TERMINAL_LINK_PREFIX) {
            continue;
        }

        let flagged = enclosing_element(html, offset)
            .is_some_and(|parent| parent.to_ascii_lowercase().contains(WARNING_ICON));
        if !flagged {
            continue;
        }

        let url = base.join(href)?;
        alerts.push(Alert::new(strip_tags(link), url.to_string()));
    }

    Ok(alerts)
}
