//! Chat message rendering
//!
//! Messages use Telegram's HTML parse mode, so every provider-supplied string
//! is escaped before it is embedded.

use crate::detection::{Alert, AlertDetails};

/// Longest market question shown in an alert, in characters
pub const MARKET_DISPLAY_CHARS: usize = 100;

/// Sent once when monitoring starts
pub const STARTUP_MESSAGE: &str = "🤖 <b>Polymarket Sentinel Started</b>

Monitoring for:
• Fresh wallets with large bets
• Unusual position sizing
• Repeat niche market players
• High win rate traders
• Pre-move positioning
• Coordinated entries

Use /help to see available commands";

/// Sent once on shutdown
pub const STOP_MESSAGE: &str = "🛑 Sentinel stopped by user";

/// Escape text for HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// First 8 and last 6 characters of a wallet address
///
/// Addresses too short to abbreviate are returned whole.
pub fn shorten_wallet(wallet: &str) -> String {
    let chars: Vec<char> = wallet.chars().collect();
    if chars.len() <= 14 {
        return wallet.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Truncate to at most `max` characters, never splitting a character
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Render an alert as an HTML chat message
pub fn render_alert(alert: &Alert) -> String {
    let wallet = escape_html(&shorten_wallet(&alert.wallet));
    let market = escape_html(truncate_chars(&alert.market_question, MARKET_DISPLAY_CHARS));

    match &alert.details {
        AlertDetails::FreshWalletLargeBet { age_days, value } => format!(
            "🚨 <b>FRESH WALLET LARGE BET</b>\n\n\
             Wallet: <code>{wallet}</code>\n\
             Age: {age_days} days\n\
             Value: ${value:.2}\n\n\
             Market: {market}"
        ),
        AlertDetails::UnusualSize { size, avg_size } => {
            let multiplier = if *avg_size > 0.0 { size / avg_size } else { 0.0 };
            format!(
                "📊 <b>UNUSUAL POSITION SIZE</b>\n\n\
                 Wallet: <code>{wallet}</code>\n\
                 Size: {size:.2} (avg: {avg_size:.2})\n\
                 Multiplier: {multiplier:.1}x\n\n\
                 Market: {market}"
            )
        }
        AlertDetails::RepeatNichePlayer {
            trades_count,
            market_volume,
        } => format!(
            "🎯 <b>REPEAT NICHE PLAYER</b>\n\n\
             Wallet: <code>{wallet}</code>\n\
             Trades: {trades_count} in this market\n\
             Volume: ${market_volume:.2}\n\n\
             Market: {market}"
        ),
        AlertDetails::HighWinRateTrader {
            conviction_trades,
            total_trades,
            current_price,
            value,
        } => format!(
            "🏆 <b>HIGH WIN RATE TRADER</b>\n\n\
             Wallet: <code>{wallet}</code>\n\
             Track record: {conviction_trades}/{total_trades} conviction trades\n\
             Entry: {current_price:.3}\n\
             Value: ${value:.2}\n\n\
             Market: {market}"
        ),
        AlertDetails::PreMovePositioning {
            value,
            old_price,
            new_price,
            price_change_pct,
        } => format!(
            "⚡ <b>PRE-MOVE POSITIONING</b>\n\n\
             Wallet: <code>{wallet}</code>\n\
             Value: ${value:.2}\n\
             Price move: {old_price:.3} → {new_price:.3}\n\
             Change: {price_change_pct:.1}%\n\n\
             Market: {market}"
        ),
        AlertDetails::CoordinatedEntry {
            wallets,
            outcome,
            value,
        } => format!(
            "🤝 <b>COORDINATED ENTRY</b>\n\n\
             Wallets: {wallets} trading together\n\
             Lead: <code>{wallet}</code>\n\
             Value: ${value:.2}\n\
             Outcome: {outcome}\n\n\
             Market: {market}",
            outcome = escape_html(outcome)
        ),
    }
}
