//! Normalized projections of dynamic-array records.
//!
//! A projection flattens the positional attribute layout into named fields
//! (client name, balance history, transaction dates) and pairs balances
//! with dates into transaction entries. Numeric and date coercion are both
//! best-effort: a value that fails to parse is carried through verbatim
//! instead of failing the whole projection.

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::pick::{Record, VALUE_MARK};

/// Provenance tag stamped on every projection.
pub const DATA_SOURCE: &str = "Simulated Universe/Pick Flat File";

/// Strict `YYYY-MM-DD` wire format used for transaction dates and for the
/// date fields of the document collections.
pub const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Which end of the balance history counts as the current balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatestPolicy {
    /// The first (oldest) balance.
    First,
    /// The last (most recent) balance.
    #[default]
    Last,
}

impl LatestPolicy {
    /// Parse the query-string form. Only the literal `first` selects
    /// [`LatestPolicy::First`]; every other value falls back to `Last`.
    pub fn from_query(raw: &str) -> Self {
        if raw == "first" { Self::First } else { Self::Last }
    }
}

/// Coercion knobs for [`project`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectionOptions {
    /// Parse balances as exact decimals, keeping the raw string on failure.
    pub parse_numbers: bool,
    /// Parse dates as `YYYY-MM-DD`, keeping the raw string on failure.
    pub parse_dates: bool,
    /// Which balance counts as current.
    pub latest: LatestPolicy,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            parse_numbers: true,
            parse_dates: true,
            latest: LatestPolicy::Last,
        }
    }
}

/// Wire-ready view of one record.
///
/// Every amount and date is a string regardless of whether coercion
/// succeeded; parsing normalizes the text (decimals keep their scale,
/// dates stay `YYYY-MM-DD`) while failed values pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    /// Key the record was read with.
    pub client_id: String,
    /// Attribute 1, the display name.
    pub client_name: String,
    /// First or last balance per [`LatestPolicy`]; omitted when the record
    /// has no balances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<String>,
    /// All balances in file order.
    pub legacy_balances_history: Vec<String>,
    /// All transaction dates in file order.
    pub transaction_dates: Vec<String>,
    /// Balances and dates paired by index.
    pub transactions: Vec<Transaction>,
    /// Fixed provenance tag ([`DATA_SOURCE`]).
    pub data_source: &'static str,
}

/// One balance/date pair.
///
/// The lists can have different lengths; the missing side is omitted from
/// the serialized entry rather than padded with null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Balance at this index, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Date at this index, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Balance entry after optional numeric coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BalanceEntry {
    Parsed(Decimal),
    Raw(String),
}

impl BalanceEntry {
    fn wire(&self) -> String {
        match self {
            Self::Parsed(amount) => amount.to_string(),
            Self::Raw(text) => text.clone(),
        }
    }
}

/// Date entry after optional coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DateEntry {
    Parsed(Date),
    Raw(String),
}

impl DateEntry {
    fn wire(&self) -> String {
        match self {
            Self::Parsed(date) => date
                .format(DATE_FORMAT)
                .unwrap_or_else(|_| date.to_string()),
            Self::Raw(text) => text.clone(),
        }
    }
}

/// Build the normalized projection of `record`.
///
/// Returns `None` when the record carries no raw data, which callers treat
/// as not found. Attribute 1 supplies the name, attribute 2 the balance
/// multivalue, attribute 3 the date multivalue; empty entries produced by
/// the multivalue split are discarded.
pub fn project(record: &Record, options: &ProjectionOptions) -> Option<Projection> {
    if !record.is_found() {
        return None;
    }

    let balances = balance_entries(record.extract(2), options.parse_numbers);
    let dates = date_entries(record.extract(3), options.parse_dates);

    let current_balance = match options.latest {
        LatestPolicy::First => balances.first(),
        LatestPolicy::Last => balances.last(),
    }
    .map(BalanceEntry::wire);

    let paired = balances.len().max(dates.len());
    let transactions = (0..paired)
        .map(|index| Transaction {
            amount: balances.get(index).map(BalanceEntry::wire),
            date: dates.get(index).map(DateEntry::wire),
        })
        .collect();

    Some(Projection {
        client_id: record.key().to_string(),
        client_name: record.extract(1).to_string(),
        current_balance,
        legacy_balances_history: balances.iter().map(BalanceEntry::wire).collect(),
        transaction_dates: dates.iter().map(DateEntry::wire).collect(),
        transactions,
        data_source: DATA_SOURCE,
    })
}

fn split_multivalue(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(VALUE_MARK).filter(|part| !part.is_empty())
}

fn balance_entries(raw: &str, parse_numbers: bool) -> Vec<BalanceEntry> {
    split_multivalue(raw)
        .map(|part| {
            if parse_numbers {
                part.parse::<Decimal>()
                    .map(BalanceEntry::Parsed)
                    .unwrap_or_else(|_| BalanceEntry::Raw(part.to_string()))
            } else {
                BalanceEntry::Raw(part.to_string())
            }
        })
        .collect()
}

fn date_entries(raw: &str, parse_dates: bool) -> Vec<DateEntry> {
    split_multivalue(raw)
        .map(|part| {
            if parse_dates {
                Date::parse(part, DATE_FORMAT)
                    .map(DateEntry::Parsed)
                    .unwrap_or_else(|_| DateEntry::Raw(part.to_string()))
            } else {
                DateEntry::Raw(part.to_string())
            }
        })
        .collect()
}
