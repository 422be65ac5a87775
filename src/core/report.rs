//! Report presentation helpers.
//!
//! This module ranks summary rows for display and formats amounts, transaction
//! lines and summary tables. All functions are framework-agnostic and return
//! plain strings that the bot layer sends as-is.

use crate::core::{
    accounting::{LedgerTotals, PersonSummary, SummaryFilter},
    transaction::{Direction, Transaction},
};
use std::fmt::Write as _;

/// Summary rows plus grand totals for one filtered view of the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReport {
    /// The filter the report was built with
    pub filter: SummaryFilter,
    /// Per-person rows, ranked for display
    pub rows: Vec<PersonSummary>,
    /// Totals over the same filtered set
    pub totals: LedgerTotals,
}

/// Column a summary is ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    /// Total inflow, used when only inflows are shown
    Inflow,
    /// Total outflow, used when only outflows are shown
    Outflow,
    /// Net balance, used when both directions are shown
    NetBalance,
}

impl RankMetric {
    /// Metric that fits a direction filter.
    #[must_use]
    pub const fn for_direction(direction: Option<Direction>) -> Self {
        match direction {
            Some(Direction::Inflow) => Self::Inflow,
            Some(Direction::Outflow) => Self::Outflow,
            None => Self::NetBalance,
        }
    }

    const fn value(self, row: &PersonSummary) -> f64 {
        match self {
            Self::Inflow => row.total_inflow,
            Self::Outflow => row.total_outflow,
            Self::NetBalance => row.net_balance,
        }
    }
}

/// Sorts rows descending by `metric`, breaking ties by name.
pub fn rank(rows: &mut [PersonSummary], metric: RankMetric) {
    rows.sort_by(|a, b| {
        metric
            .value(b)
            .total_cmp(&metric.value(a))
            .then_with(|| a.person.cmp(&b.person))
    });
}

/// Formats an amount with thousands separators, e.g. `Rp 1,234.50` or `-Rp 30.00`.
#[must_use]
pub fn format_amount(currency: &str, amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{currency} {grouped}.{fraction}")
}

/// Formats an amount with the sign of its direction, e.g. `+Rp 300.00`.
#[must_use]
pub fn format_signed_amount(currency: &str, direction: Direction, amount: f64) -> String {
    let sign = match direction {
        Direction::Inflow => '+',
        Direction::Outflow => '-',
    };
    format!("{sign}{}", format_amount(currency, amount.abs()))
}

/// One-line description of a transaction:
/// `#12 | Alice | +Rp 300.00 | Payment`
#[must_use]
pub fn format_transaction_line(currency: &str, transaction: &Transaction) -> String {
    format!(
        "#{} | {} | {} | {}",
        transaction.id,
        transaction.person,
        format_signed_amount(currency, transaction.direction, transaction.amount),
        transaction.purpose
    )
}

/// Longest message Discord accepts, in characters
pub const MESSAGE_LIMIT: usize = 2000;

/// Characters added by the code fence around each page
const FENCE_OVERHEAD: usize = 8;

fn render_page(lead: &str, body: &str) -> String {
    if lead.is_empty() {
        format!("```\n{body}\n```")
    } else {
        format!("{lead}\n```\n{body}\n```")
    }
}

fn truncate_chars(line: &str, max: usize) -> String {
    if line.chars().count() <= max {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Packs lines into code-block messages of at most `limit` characters.
///
/// The header leads the first message only. A line too long to fit on its own
/// is truncated with `…`. Line order is kept.
#[must_use]
pub fn paginate_lines(header: &str, lines: &[String], limit: usize) -> Vec<String> {
    if lines.is_empty() {
        return vec![header.to_string()];
    }

    let header_len = header.chars().count();
    let max_line = limit.saturating_sub(FENCE_OVERHEAD + header_len + 1).max(1);

    let mut pages = Vec::new();
    let mut lead = header;
    let mut body = String::new();
    let mut page_len = header_len + usize::from(!header.is_empty()) + FENCE_OVERHEAD;

    for line in lines {
        let line = truncate_chars(line, max_line);
        let line_len = line.chars().count();
        let added = line_len + usize::from(!body.is_empty());

        if !body.is_empty() && page_len + added > limit {
            pages.push(render_page(lead, &body));
            lead = "";
            body.clear();
            page_len = FENCE_OVERHEAD;
            body.push_str(&line);
            page_len += line_len;
            continue;
        }

        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&line);
        page_len += added;
    }
    pages.push(render_page(lead, &body));
    pages
}

/// Multi-line detail block of a transaction, used next to proof images.
#[must_use]
pub fn format_transaction_details(currency: &str, transaction: &Transaction) -> String {
    let mut details = format_transaction_line(currency, transaction);
    let _ = write!(
        details,
        "\nTime: {}",
        transaction.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(note) = &transaction.note {
        let _ = write!(details, "\nNote: {note}");
    }
    details
}

/// Renders the per-person table and grand totals of a report.
///
/// The columns follow the direction filter: only inflows, only outflows, or
/// inflow, outflow and balance when both directions are included.
#[must_use]
pub fn format_report(currency: &str, report: &LedgerReport) -> String {
    if report.rows.is_empty() {
        return "No transactions yet.".to_string();
    }

    let mut out = String::from("```\n");
    for row in &report.rows {
        let line = match report.filter.direction {
            Some(Direction::Inflow) => format!(
                "{:<12} in {:>18}  ({} tx)",
                row.person,
                format_amount(currency, row.total_inflow),
                row.transaction_count
            ),
            Some(Direction::Outflow) => format!(
                "{:<12} out {:>17}  ({} tx)",
                row.person,
                format_amount(currency, row.total_outflow),
                row.transaction_count
            ),
            None => format!(
                "{:<12} in {:>16} | out {:>16} | balance {:>17}  ({} tx)",
                row.person,
                format_amount(currency, row.total_inflow),
                format_amount(currency, row.total_outflow),
                format_amount(currency, row.net_balance),
                row.transaction_count
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("```\n");

    let _ = write!(
        out,
        "**Total inflow:** {}\n**Total outflow:** {}\n**Balance:** {}",
        format_amount(currency, report.totals.total_inflow),
        format_amount(currency, report.totals.total_outflow),
        format_amount(currency, report.totals.net_balance)
    );
    out
}
