use crate::error::{IngestError, Result};
use crate::workbook::Cell;
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A `YY-MM` period code, e.g. `25-03`.
///
/// Lexical order is chronological order as long as every key shares a
/// century, which is why keys are compared as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Wraps a period header as-is. Header detection only checks the prefix,
    /// so this performs no further validation.
    pub fn from_header(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Parses a strict `YY-MM` code.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || IngestError::InvalidPeriod(text.to_string());
        let (year, month) = text.split_once('-').ok_or_else(invalid)?;

        if year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if month.len() != 2 || !month.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let month_num: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month_num) {
            return Err(invalid());
        }

        Ok(Self(text.to_string()))
    }

    /// `YY-MM` for a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!(
            "{:02}-{:02}",
            date.year().rem_euclid(100),
            date.month()
        ))
    }

    /// The configured year prefix (e.g. `"25-"`) followed by a zero-padded
    /// month.
    pub fn with_prefix(prefix: &str, month: u32) -> Self {
        Self(format!("{}{:02}", prefix, month))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PeriodKey {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The twelve month labels used to name dividend-history columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MonthTable(Vec<String>);

impl Default for MonthTable {
    fn default() -> Self {
        Self(
            [
                "Janeiro",
                "Fevereiro",
                "Março",
                "Abril",
                "Maio",
                "Junho",
                "Julho",
                "Agosto",
                "Setembro",
                "Outubro",
                "Novembro",
                "Dezembro",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }
}

impl MonthTable {
    pub fn new(names: Vec<String>) -> Result<Self> {
        let table = Self(names);
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.len() != 12 {
            return Err(IngestError::InvalidConfig(format!(
                "month table needs 12 names, got {}",
                self.0.len()
            )));
        }
        if self.0.iter().any(|name| name.trim().is_empty()) {
            return Err(IngestError::InvalidConfig(
                "month names must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Name for a 0-based month index.
    pub fn name(&self, month0: usize) -> &str {
        self.0.get(month0).map(String::as_str).unwrap_or_default()
    }

    /// First month name, in table order, contained in `text`.
    pub fn find_in(&self, text: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|name| text.contains(name.as_str()))
            .map(|name| name.as_str())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// A header recognised as a period, together with its physical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodColumn {
    pub index: usize,
    pub key: PeriodKey,
}

/// Period columns of the consolidated ledger: text headers starting with
/// `prefix`, sorted lexically. A repeated header keeps its first column.
pub fn detect_period_columns(headers: &[Cell], prefix: &str) -> Vec<PeriodColumn> {
    let candidates = headers.iter().enumerate().filter_map(|(index, header)| {
        header
            .as_text()
            .filter(|text| text.starts_with(prefix))
            .map(|text| PeriodColumn {
                index,
                key: PeriodKey::from_header(text),
            })
    });
    sorted_unique(candidates)
}

/// Period columns of the card-statement sheet. Besides prefix-coded text
/// headers, date-typed headers count as the `YY-MM` of their date, and are
/// kept only when that key carries the same prefix. The first column is
/// the group label and is never a period.
pub fn detect_card_period_columns(headers: &[Cell], prefix: &str) -> Vec<PeriodColumn> {
    let candidates = headers
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, header)| match header {
            Cell::Text(text) if text.starts_with(prefix) => Some(PeriodColumn {
                index,
                key: PeriodKey::from_header(text.as_str()),
            }),
            Cell::Date(date) => {
                let key = PeriodKey::from_date(date.date());
                key.as_str()
                    .starts_with(prefix)
                    .then_some(PeriodColumn { index, key })
            }
            _ => None,
        });
    sorted_unique(candidates)
}

fn sorted_unique(candidates: impl Iterator<Item = PeriodColumn>) -> Vec<PeriodColumn> {
    let mut seen = BTreeSet::new();
    let mut columns: Vec<PeriodColumn> = candidates
        .filter(|col| seen.insert(col.key.clone()))
        .collect();
    columns.sort_by(|a, b| a.key.cmp(&b.key));
    columns
}

/// Month labels for the dividend-history sheet, in header order.
///
/// The first header is the year key and is skipped. Each remaining header
/// is tried in turn as a date (month of the date), as a numeric-looking
/// value (no month component, so it maps to the first month), and as text
/// containing a month name. Headers matching none of these are dropped.
///
/// The result is positional: entry `i` labels physical column `i + 1` of
/// every data row, even when dropped headers sit between month columns.
pub fn detect_month_columns(headers: &[Cell], months: &MonthTable) -> Vec<String> {
    headers
        .iter()
        .skip(1)
        .filter_map(|header| classify_month_header(header, months))
        .map(str::to_string)
        .collect()
}

fn classify_month_header<'m>(header: &Cell, months: &'m MonthTable) -> Option<&'m str> {
    match header {
        Cell::Empty => None,
        Cell::Date(date) => Some(months.name(date.month0() as usize)),
        other => {
            let text = crate::coerce::cell_text(other);
            if is_numeric_looking(&text) {
                Some(months.name(0))
            } else {
                months.find_in(&text)
            }
        }
    }
}

fn is_numeric_looking(text: &str) -> bool {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '-' | ':' | ' ' | '.'))
        .collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}
