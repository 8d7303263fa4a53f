//! Month keys and the date-normalization cascade.
//!
//! Every aggregation groups by a canonical "YYYY-MM" key. The normalizer
//! accepts the formats seen in real sheets: Portuguese or English month
//! names, day-first or year-first numeric dates, bare month/year cells, and
//! free text that still contains a recognizable date.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::{alpha_runs, digit_runs, normalize_text};

/// Canonical "YYYY-MM" grouping identifier. Lexicographic order equals
/// chronological order, so a `BTreeMap<MonthKey, _>` iterates months in
/// calendar order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    /// Builds a key from calendar parts. Months outside [1,12] are refused.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self(format!("{:04}-{:02}", year, month)))
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    /// Parses a caller-supplied "YYYY-MM" string.
    pub fn parse(text: &str) -> Option<Self> {
        let (year, month) = text.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> i32 {
        self.0[..4].parse().unwrap_or(0)
    }

    pub fn month(&self) -> u32 {
        self.0[5..].parse().unwrap_or(0)
    }

    /// First calendar day of the month, the reference point for contract
    /// range checks.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1)
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Month names and abbreviations, Portuguese and English, matched against
/// normalized (lowercased, diacritics-folded) text.
const MONTH_NAMES: &[(&str, u32)] = &[
    ("janeiro", 1),
    ("fevereiro", 2),
    ("marco", 3),
    ("abril", 4),
    ("maio", 5),
    ("junho", 6),
    ("julho", 7),
    ("agosto", 8),
    ("setembro", 9),
    ("outubro", 10),
    ("novembro", 11),
    ("dezembro", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("fev", 2),
    ("feb", 2),
    ("mar", 3),
    ("abr", 4),
    ("apr", 4),
    ("mai", 5),
    ("jun", 6),
    ("jul", 7),
    ("ago", 8),
    ("aug", 8),
    ("set", 9),
    ("sep", 9),
    ("sept", 9),
    ("out", 10),
    ("oct", 10),
    ("nov", 11),
    ("dez", 12),
    ("dec", 12),
];

fn month_from_name(word: &str) -> Option<u32> {
    let hit = MONTH_NAMES.iter().find(|(name, _)| *name == word);
    if let Some((_, month)) = hit {
        return Some(*month);
    }
    // Sheets abbreviate freely ("julh/2025"); fall back to the 3-letter stem.
    if word.len() > 3 {
        let stem = &word[..3];
        return MONTH_NAMES
            .iter()
            .find(|(name, _)| *name == stem)
            .map(|(_, month)| *month);
    }
    None
}

/// Normalizes a raw date cell to its month key. Attempts, first match wins:
/// month name + 4-digit year in either order; numeric date with a day
/// (day/month/year or year/month/day, the month is the middle run either
/// way, so this also covers dates buried in loose text); bare month/year in
/// either order. Returns `None` for anything else, which excludes the row
/// from aggregation.
pub fn month_key_from_text(raw: &str) -> Option<MonthKey> {
    let text = normalize_text(raw);
    if text.is_empty() {
        return None;
    }

    if let Some(key) = match_month_name(&text) {
        return Some(key);
    }
    if let Some(key) = match_numeric_with_day(&text) {
        return Some(key);
    }
    match_month_year(&text)
}

fn match_month_name(text: &str) -> Option<MonthKey> {
    let month = alpha_runs(text)
        .into_iter()
        .filter(|word| word.len() >= 3)
        .find_map(month_from_name)?;
    let year = digit_runs(text)
        .into_iter()
        .find(|run| run.len() == 4)?;
    MonthKey::new(year.parse().ok()?, month)
}

fn match_numeric_with_day(text: &str) -> Option<MonthKey> {
    let runs = digit_runs(text);
    if runs.len() < 3 {
        return None;
    }
    // Year-first (2025-07-15) or day-first (15/07/2025); the month sits in
    // the middle either way.
    let year = if runs[0].len() == 4 {
        runs[0]
    } else if runs[2].len() == 4 {
        runs[2]
    } else {
        return None;
    };
    let month: u32 = runs[1].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    MonthKey::new(year.parse().ok()?, month)
}

/// Month/year with no day ("07/2025", "2025-07"). Anchored: the whole cell
/// must be the two numbers and one separator, otherwise loose text like
/// "2 parcelas ate 2025" would group under a bogus February.
fn match_month_year(text: &str) -> Option<MonthKey> {
    let (a, b) = text.split_once(['/', '-'])?;
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty()
        || b.is_empty()
        || !a.bytes().all(|c| c.is_ascii_digit())
        || !b.bytes().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let (year, month) = if a.len() == 4 {
        (a, b)
    } else if b.len() == 4 {
        (b, a)
    } else {
        return None;
    };
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    MonthKey::new(year.parse().ok()?, month)
}

/// Full-date formats accepted on the contracts sheet, tried in order.
const CONTRACT_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];

pub fn parse_contract_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    CONTRACT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// The `count` month keys following `from` (exclusive), used to pick
/// projection targets. The reference date is a parameter so the pipeline
/// stays a pure function of its inputs.
pub fn upcoming_months(from: NaiveDate, count: usize) -> Vec<MonthKey> {
    (1..=count as u32)
        .filter_map(|offset| from.checked_add_months(Months::new(offset)))
        .map(MonthKey::from_date)
        .collect()
}
