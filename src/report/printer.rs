//! Plain-text tables for terminal output
//!
//! Every writer targets `fmt::Write`, so the binaries print to stdout and
//! tests render into a `String`.

use crate::analysis::{CorrelationMatrix, EtfFlowRecord, ExchangeFlowRecord, PortfolioFlowSummary, VolumeAnalysis};
use crate::data::{ExchangeInfo, GlobalMarket, Horizon, TokenSnapshot, TrendingCoin};
use crate::monitor::{CycleReport, TokenFlow};
use crate::report::formatter::{format_currency, format_flow_compact, format_number, format_percentage};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt::{self, Write};

const NO_DATA: &str = "no data available";
const RULE_WIDTH: usize = 48;

fn write_header<W: Write>(out: &mut W, title: &str) -> fmt::Result {
    writeln!(out, "╔{}╗", "═".repeat(RULE_WIDTH))?;
    writeln!(out, "║ {:<width$} ║", title, width = RULE_WIDTH - 2)?;
    writeln!(out, "╚{}╝", "═".repeat(RULE_WIDTH))
}

fn short_name(name: &str) -> String {
    if name.chars().count() > 14 {
        let truncated: String = name.chars().take(13).collect();
        format!("{}…", truncated)
    } else {
        name.to_string()
    }
}

/// Per-token flow table: one column per horizon plus sentiment
pub fn write_flow_table<W: Write>(out: &mut W, tokens: &[TokenFlow]) -> fmt::Result {
    if tokens.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    writeln!(
        out,
        "{:<4} {:<14} {:>12} {:>12} {:>12} {:>9} {:>6}",
        "#", "Token", "1h", "24h", "7d", "Sentiment", "Conf"
    )?;
    for (i, entry) in tokens.iter().enumerate() {
        let rank = entry.token.rank.map(|r| r.to_string()).unwrap_or_else(|| (i + 1).to_string());
        writeln!(
            out,
            "{:<4} {:<14} {:>12} {:>12} {:>12} {:>9} {:>6.2}",
            rank,
            short_name(&entry.token.name),
            format_flow_compact(entry.flow.one_hour.flow_amount, 2),
            format_flow_compact(entry.flow.one_day.flow_amount, 2),
            format_flow_compact(entry.flow.seven_days.flow_amount, 2),
            entry.flow.overall_sentiment,
            entry.flow.one_day.confidence,
        )?;
    }
    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, summary: &PortfolioFlowSummary) -> fmt::Result {
    writeln!(out, "Total inflow:   {}", format_currency(summary.total_inflow, 2))?;
    writeln!(out, "Total outflow:  {}", format_currency(summary.total_outflow, 2))?;
    writeln!(out, "Net flow:       {}", format_flow_compact(summary.net_flow, 2))?;
    writeln!(out, "Inflow ratio:   {:.1}%", summary.flow_ratio * 100.0)?;
    writeln!(out, "Inflow tokens:  {}", join_or_none(&summary.inflow_tokens))?;
    writeln!(out, "Outflow tokens: {}", join_or_none(&summary.outflow_tokens))
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

pub fn write_venues<W: Write>(
    out: &mut W,
    exchanges: &BTreeMap<String, ExchangeFlowRecord>,
    etfs: &BTreeMap<String, EtfFlowRecord>,
) -> fmt::Result {
    if exchanges.is_empty() && etfs.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    for (venue, record) in exchanges {
        writeln!(
            out,
            "{:<10} {:<8} buy {:>5.1}%  conf {:.2}  vol {}",
            venue,
            record.direction.label(),
            record.buy_ratio * 100.0,
            record.confidence,
            format_currency(record.volume, 2),
        )?;
    }
    for (ticker, record) in etfs {
        writeln!(
            out,
            "{:<10} {:<8} flow {:>10}  conf {:.2}  premium {}",
            ticker,
            record.direction.label(),
            format_flow_compact(record.amount, 2),
            record.confidence,
            format_percentage(record.premium, 2),
        )?;
    }
    Ok(())
}

/// Full monitor cycle: tokens, portfolio summary and venues
pub fn write_cycle_report<W: Write>(out: &mut W, report: &CycleReport) -> fmt::Result {
    write_header(
        out,
        &format!("Token flows @ {} ({})", report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"), report.source),
    )?;
    write_flow_table(out, &report.tokens)?;
    writeln!(out)?;

    write_header(out, "Portfolio")?;
    write_summary(out, &report.summary)?;
    writeln!(out)?;

    write_header(out, "Venues")?;
    write_venues(out, &report.exchanges, &report.etfs)
}

/// Ranked token list showing the change for one horizon
pub fn write_token_list<W: Write>(
    out: &mut W,
    title: &str,
    tokens: &[&TokenSnapshot],
    horizon: Horizon,
) -> fmt::Result {
    write_header(out, title)?;
    if tokens.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    writeln!(
        out,
        "{:<4} {:<14} {:<6} {:>14} {:>10} {:>12}",
        "#", "Token", "Symbol", "Price", horizon.key(), "Volume"
    )?;
    for (i, token) in tokens.iter().enumerate() {
        writeln!(
            out,
            "{:<4} {:<14} {:<6} {:>14} {:>10} {:>12}",
            i + 1,
            short_name(&token.name),
            token.symbol,
            format!("${}", token.price.round_dp(4)),
            format_percentage(token.change(horizon), 2),
            format_currency(token.volume_24h, 2),
        )?;
    }
    Ok(())
}

/// Market table with every horizon and the volume/market-cap ratio
pub fn write_market_table<W: Write>(out: &mut W, tokens: &[TokenSnapshot]) -> fmt::Result {
    write_header(out, &format!("Top {} by market cap", tokens.len()))?;
    if tokens.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    writeln!(
        out,
        "{:<4} {:<14} {:<6} {:>14} {:>9} {:>9} {:>9} {:>10} {:>10} {:>7}",
        "#", "Token", "Symbol", "Price", "1h", "24h", "7d", "Volume", "Mkt cap", "Vol/MC"
    )?;
    for (i, token) in tokens.iter().enumerate() {
        let rank = token.rank.map(|r| r.to_string()).unwrap_or_else(|| (i + 1).to_string());
        writeln!(
            out,
            "{:<4} {:<14} {:<6} {:>14} {:>9} {:>9} {:>9} {:>10} {:>10} {:>7}",
            rank,
            short_name(&token.name),
            token.symbol,
            format!("${}", token.price.round_dp(4)),
            format_percentage(token.change_1h, 2),
            format_percentage(token.change_24h, 2),
            format_percentage(token.change_7d, 2),
            format_currency(token.volume_24h, 2),
            format_currency(token.market_cap, 2),
            format!("{:.3}", token.volume_market_cap_ratio().round_dp(3)),
        )?;
    }
    Ok(())
}

/// Detail view of one token
pub fn write_token_detail<W: Write>(out: &mut W, token: &TokenSnapshot) -> fmt::Result {
    write_header(out, &format!("{} ({})", token.name, token.symbol))?;
    let rank = token.rank.map(|r| format!("#{}", r)).unwrap_or_else(|| "-".to_string());

    writeln!(out, "Id:            {}", token.id)?;
    writeln!(out, "Rank:          {}", rank)?;
    writeln!(out, "Price:         ${}", token.price.round_dp(6))?;
    writeln!(out, "Market cap:    {}", format_currency(token.market_cap, 2))?;
    writeln!(out, "24h volume:    {}", format_currency(token.volume_24h, 2))?;
    writeln!(out, "Volume/cap:    {:.4}", token.volume_market_cap_ratio().round_dp(4))?;
    for horizon in Horizon::ALL {
        writeln!(out, "{:<14} {}", format!("{} change:", horizon), format_percentage(token.change(horizon), 2))?;
    }
    Ok(())
}

/// Exchange volume table with each venue's share of the listed total
pub fn write_exchanges<W: Write>(out: &mut W, exchanges: &[ExchangeInfo]) -> fmt::Result {
    write_header(out, "Exchange volume (24h, BTC)")?;
    if exchanges.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    let total = exchanges
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.volume_24h_btc));

    writeln!(
        out,
        "{:<16} {:>5} {:>12} {:>7} {:>5} {:<16}",
        "Exchange", "Trust", "Volume", "Share", "Year", "Country"
    )?;
    for exchange in exchanges {
        let share = if total.is_zero() {
            Decimal::ZERO
        } else {
            exchange.volume_24h_btc / total * Decimal::ONE_HUNDRED
        };
        writeln!(
            out,
            "{:<16} {:>5} {:>12} {:>6.1}% {:>5} {:<16}",
            short_name(&exchange.name),
            exchange.trust_score.map(|t| t.to_string()).unwrap_or_else(|| "N/A".to_string()),
            format_number(exchange.volume_24h_btc, 2),
            share.round_dp(1),
            exchange.year_established.map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string()),
            exchange.country.as_deref().unwrap_or("N/A"),
        )?;
    }
    Ok(())
}

pub fn write_global<W: Write>(out: &mut W, global: &GlobalMarket) -> fmt::Result {
    write_header(out, "Global market")?;
    writeln!(out, "Market cap:      {}", format_currency(global.total_market_cap, 2))?;
    writeln!(out, "24h volume:      {}", format_currency(global.total_volume, 2))?;
    writeln!(out, "24h cap change:  {:+.2}%", global.market_cap_change_24h)?;
    writeln!(out, "BTC dominance:   {:.2}%", global.btc_dominance)?;
    writeln!(out, "ETH dominance:   {:.2}%", global.eth_dominance)?;
    writeln!(out, "Cryptocurrencies: {}", global.active_cryptocurrencies)?;
    writeln!(out, "Markets:         {}", global.active_exchanges)
}

pub fn write_trending<W: Write>(out: &mut W, coins: &[TrendingCoin]) -> fmt::Result {
    write_header(out, "Trending searches")?;
    if coins.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    for (i, coin) in coins.iter().enumerate() {
        let rank = coin.market_cap_rank.map(|r| format!("#{}", r)).unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<3} {:<18} {:<8} rank {:<6} {:.8} BTC",
            i + 1,
            short_name(&coin.name),
            coin.symbol.to_uppercase(),
            rank,
            coin.price_btc,
        )?;
    }
    Ok(())
}

pub fn write_volume_analysis<W: Write>(out: &mut W, analyses: &[VolumeAnalysis]) -> fmt::Result {
    write_header(out, "Volume trends")?;
    if analyses.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    writeln!(out, "{:<16} {:>12} {:>12} {:>10} {:<10}", "Coin", "Current", "Average", "24h", "Trend")?;
    for analysis in analyses {
        writeln!(
            out,
            "{:<16} {:>12} {:>12} {:>10} {:<10}",
            short_name(&analysis.coin_id),
            format_number(analysis.current_volume, 2),
            format_number(analysis.avg_volume, 2),
            format_percentage(analysis.volume_change_24h, 1),
            analysis.trend,
        )?;
    }
    Ok(())
}

/// Correlation grid; undefined pairs print as N/A
pub fn write_correlation<W: Write>(out: &mut W, matrix: &CorrelationMatrix) -> fmt::Result {
    write_header(out, "Price correlation")?;
    if matrix.symbols.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    write!(out, "{:<10}", "")?;
    for symbol in &matrix.symbols {
        write!(out, "{:>10}", symbol)?;
    }
    writeln!(out)?;

    for (symbol, row) in matrix.symbols.iter().zip(&matrix.values) {
        write!(out, "{:<10}", symbol)?;
        for value in row {
            if value.is_nan() {
                write!(out, "{:>10}", "N/A")?;
            } else {
                write!(out, "{:>10.3}", value)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
