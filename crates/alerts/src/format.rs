//! Notification text for sales and terminal alerts (Telegram HTML).

use crate::Batcher;
use chrono::NaiveTime;
use teloxide::utils::html::escape;
use watermon_core::{Alert, Sale};

/// Closing line of every record block.
pub const SEPARATOR: &str = "────────────────────\n";

pub const NO_NEW_SALES: &str = "🛍️ No new sales";
pub const NO_SALES_DATA: &str = "🛍️ No sales data";
pub const NO_TERMINAL_PROBLEMS: &str = "✅ No terminal problems detected";

/// Shows `HH:MM:SS` as `HH:MM`; anything else is passed through.
pub fn format_sale_time(time: &str) -> String {
    match NaiveTime::parse_from_str(time.trim(), "%H:%M:%S") {
        Ok(t) => t.format("%H:%M").to_string(),
        Err(_) => time.to_string(),
    }
}

pub fn sales_header(total: usize, cap: usize) -> String {
    if total > cap {
        format!("💰 <b>LAST {} OF {} SALES</b> 💰\n\n", cap, total)
    } else {
        "💰 <b>NEW SALES</b> 💰\n\n".to_string()
    }
}

pub fn sale_block(sale: &Sale) -> String {
    format!(
        "🔹 <b>Sale #{}</b>\n\
         📍 <b>Address:</b> {}\n\
         🕒 <b>Time:</b> {}\n\
         💧 <b>Liters:</b> {}\n\
         💸 <b>Total:</b> {} RUB\n\
         🧾 <b>Payment:</b> {}\n\
         {}",
        escape(&sale.id),
        escape(&sale.address),
        escape(&format_sale_time(&sale.time)),
        escape(&sale.liters),
        escape(&sale.total),
        sale.payment_method,
        SEPARATOR
    )
}

pub const ALERTS_HEADER: &str = "⚠️ <b>TERMINAL PROBLEMS</b> ⚠️\n\n";

pub fn alert_block(alert: &Alert) -> String {
    format!(
        "🔴 <b>Terminal:</b> {}\n\
         🔗 <b>Link:</b> {}\n\
         {}",
        escape(&alert.terminal_id),
        escape(&alert.url),
        SEPARATOR
    )
}

pub fn alerts_footer(count: usize) -> String {
    format!("\nTotal problem terminals: <b>{}</b>", count)
}

/// Messages announcing `sales` (newest first). At most `cap` sales are
/// rendered; the header states the total when some are left out.
pub fn sales_messages(sales: &[Sale], cap: usize, batcher: &Batcher) -> Vec<String> {
    if sales.is_empty() {
        return Vec::new();
    }
    let shown = &sales[..sales.len().min(cap)];
    batcher.batch(
        &sales_header(sales.len(), cap),
        shown.iter().map(sale_block),
        "",
    )
}

/// Messages listing the most recent sales on request, regardless of the
/// cursor.
pub fn recent_sales_messages(sales: &[Sale], batcher: &Batcher) -> Vec<String> {
    if sales.is_empty() {
        return Vec::new();
    }
    batcher.batch(
        &format!("📋 <b>LAST {} SALES</b>\n\n", sales.len()),
        sales.iter().map(sale_block),
        "",
    )
}

/// Messages announcing newly flagged terminals.
pub fn alert_messages(alerts: &[Alert], batcher: &Batcher) -> Vec<String> {
    if alerts.is_empty() {
        return Vec::new();
    }
    batcher.batch(
        ALERTS_HEADER,
        alerts.iter().map(alert_block),
        &alerts_footer(alerts.len()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watermon_core::PaymentMethod;

    fn sale(id: &str) -> Sale {
        Sale::new(id, "Lenina 1", "14:05:33", "19", "95").with_payment(PaymentMethod::Card)
    }

    #[test]
    fn test_format_sale_time() {
        assert_eq!(format_sale_time("14:05:33"), "14:05");
        assert_eq!(format_sale_time("yesterday"), "yesterday");
        assert_eq!(format_sale_time("14:05"), "14:05");
    }

    #[test]
    fn test_sale_block() {
        assert_eq!(
            sale_block(&sale("105")),
            "🔹 <b>Sale #105</b>\n\
             📍 <b>Address:</b> Lenina 1\n\
             🕒 <b>Time:</b> 14:05\n\
             💧 <b>Liters:</b> 19\n\
             💸 <b>Total:</b> 95 RUB\n\
             🧾 <b>Payment:</b> 💳 Card\n\
             ────────────────────\n"
        );
    }

    #[test]
    fn test_blocks_escape_html() {
        let mut s = sale("1");
        s.address = "Mira <7> & Co".to_string();
        assert!(sale_block(&s).contains("Mira &lt;7&gt; &amp; Co"));

        let alert = Alert::new("T<1>", "https://d/terminal/1?a=1&b=2");
        assert!(alert_block(&alert).contains("T&lt;1&gt;"));
        assert!(alert_block(&alert).contains("a=1&amp;b=2"));
    }

    #[test]
    fn test_sales_header_states_truncation() {
        assert_eq!(sales_header(5, 20), "💰 <b>NEW SALES</b> 💰\n\n");
        assert_eq!(sales_header(35, 20), "💰 <b>LAST 20 OF 35 SALES</b> 💰\n\n");
    }

    #[test]
    fn test_sales_messages_cap() {
        let sales: Vec<Sale> = (0..35).rev().map(|i| sale(&i.to_string())).collect();
        let messages = sales_messages(&sales, 20, &Batcher::default());

        let all = messages.concat();
        assert!(all.starts_with("💰 <b>LAST 20 OF 35 SALES</b>"));
        assert_eq!(all.matches(SEPARATOR).count(), 20);
        assert!(all.contains("Sale #34</b>"));
        assert!(all.contains("Sale #15</b>"));
        assert!(!all.contains("Sale #14</b>"));
    }

    #[test]
    fn test_sales_messages_respect_limit() {
        let sales: Vec<Sale> = (0..20).map(|i| sale(&i.to_string())).collect();
        let batcher = Batcher::new(600, 100);
        let messages = sales_messages(&sales, 20, &batcher);

        assert!(messages.len() > 1);
        for message in &messages {
            assert!(batcher.unit.measure(message) <= 600);
            assert!(message.ends_with(SEPARATOR));
        }
        assert_eq!(messages.concat().matches(SEPARATOR).count(), 20);
    }

    #[test]
    fn test_alert_messages_footer() {
        let alerts = vec![
            Alert::new("T-1", "https://d/terminal/1"),
            Alert::new("T-2", "https://d/terminal/2"),
        ];
        let messages = alert_messages(&alerts, &Batcher::default());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with(ALERTS_HEADER));
        assert!(messages[0].ends_with("\nTotal problem terminals: <b>2</b>"));
    }

    #[test]
    fn test_recent_sales_messages() {
        let sales: Vec<Sale> = (1..=3).rev().map(|i| sale(&i.to_string())).collect();
        let messages = recent_sales_messages(&sales, &Batcher::default());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("📋 <b>LAST 3 SALES</b>\n\n🔹 <b>Sale #3</b>"));
    }

    #[test]
    fn test_empty_inputs_produce_no_messages() {
        assert!(recent_sales_messages(&[], &Batcher::default()).is_empty());
        assert!(sales_messages(&[], 20, &Batcher::default()).is_empty());
        assert!(alert_messages(&[], &Batcher::default()).is_empty());
    }
}
