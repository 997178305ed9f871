//! Telegram command surface.

use chrono::FixedOffset;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use tracing::{error, info};
use watermon_alerts::format::{NO_SALES_DATA, NO_TERMINAL_PROBLEMS};
use watermon_alerts::DeliveryReport;
use watermon_engine::{Monitor, MonitorStatus, SalesCheckReport, TerminalsCheckReport};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "show the menu")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "send the latest sales")]
    CheckSales,
    #[command(description = "check terminals for problems")]
    CheckTerminals,
    #[command(description = "show monitoring status")]
    Status,
}

/// Shared state for command handlers.
pub struct CommandContext {
    pub monitor: Arc<Monitor>,
    /// Zone used when showing timestamps.
    pub display_offset: FixedOffset,
}

pub fn start_text() -> String {
    "💧 <b>Water terminal monitor</b>\n\n\
     /check_sales - latest sales\n\
     /check_terminals - terminal problems\n\
     /status - monitoring status\n\
     /help - help"
        .to_string()
}

fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} s", secs)
    }
}

/// What is monitored, how often, and the command list.
pub fn help_text(interval: Duration) -> String {
    format!(
        "ℹ️ <b>Help</b>\n\n\
         The bot watches the dashboard and reports:\n\
         💰 new sales\n\
         ⚠️ terminals with problems\n\n\
         ⏱ Automatic check every {}.\n\n\
         {}",
        format_interval(interval),
        escape(&Command::descriptions().to_string())
    )
}

fn delivery_note(delivery: &DeliveryReport) -> String {
    if delivery.all_delivered() {
        String::new()
    } else {
        format!(
            "\n⚠️ Not delivered to {} chat(s)",
            delivery.failed_destinations.len()
        )
    }
}

pub fn sales_reply(report: &SalesCheckReport) -> String {
    if report.shown == 0 {
        return NO_SALES_DATA.to_string();
    }
    format!(
        "✅ Sent the last {} of {} sales{}",
        report.shown,
        report.total,
        delivery_note(&report.delivery)
    )
}

pub fn terminals_reply(report: &TerminalsCheckReport) -> String {
    let mut reply = match (report.new_alerts, report.active) {
        (0, 0) => NO_TERMINAL_PROBLEMS.to_string(),
        (0, active) => format!("✅ No new terminal problems ({} already reported)", active),
        (new, _) => format!("⚠️ Found {} new terminal problem(s)", new),
    };
    reply.push_str(&delivery_note(&report.delivery));
    if !report.persisted {
        reply.push_str("\n⚠️ State was not saved");
    }
    reply
}

pub fn status_text(status: &MonitorStatus, offset: FixedOffset) -> String {
    let last_check = match status.last_check {
        Some(at) => at
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "never".to_string(),
    };

    let mut text = format!(
        "📊 <b>Monitoring status</b>\n\n\
         🕒 <b>Last check:</b> {} (UTC{})\n\
         ⚙️ <b>Phase:</b> {}\n\
         ⏱ <b>Interval:</b> {} s\n\
         📨 <b>Chats:</b> {}",
        last_check,
        offset,
        status.phase.as_str(),
        status.interval.as_secs(),
        status.destinations
    );
    if let Some(err) = &status.last_error {
        text.push_str(&format!("\n❌ <b>Last error:</b> {}", escape(err)));
    }
    text
}

/// Reply text for `cmd` sent by `requester`.
pub async fn respond(ctx: &CommandContext, cmd: Command, requester: i64) -> String {
    let result = match cmd {
        Command::Start => return start_text(),
        Command::Help => return help_text(ctx.monitor.config().interval),
        Command::CheckSales => ctx
            .monitor
            .trigger_sales_check(requester)
            .await
            .map(|report| sales_reply(&report)),
        Command::CheckTerminals => ctx
            .monitor
            .trigger_terminals_check(requester)
            .await
            .map(|report| terminals_reply(&report)),
        Command::Status => ctx
            .monitor
            .status(requester)
            .await
            .map(|status| status_text(&status, ctx.display_offset)),
    };

    result.unwrap_or_else(|e| escape(&e.reply_text()))
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<CommandContext>,
) -> ResponseResult<()> {
    let requester = msg.from.as_ref().map(|user| user.id.0 as i64).unwrap_or_default();
    info!(user_id = requester, command = ?cmd, "Command received");

    let reply = respond(&ctx, cmd, requester).await;
    if let Err(e) = bot
        .send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await
    {
        error!(chat_id = msg.chat.id.0, error = %e, "Failed to send reply");
        return Err(e);
    }
    Ok(())
}
