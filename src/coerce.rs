use crate::error::CellWarning;
use crate::workbook::Cell;

const CURRENCY_SYMBOL: &str = "R$";

/// Reads a cell as a number.
///
/// Numeric cells pass through. Text cells are read as currency: the `R$`
/// symbol and whitespace are dropped, and when a decimal comma is present
/// the dots before it are thousands separators (`"R$ 1.234,56"` is
/// `1234.56`). Text with a dot after the comma or several commas, such as
/// `"1,234.56"`, is not read. Booleans read as `1`/`0`.
pub fn try_coerce_number(cell: &Cell) -> Result<f64, CellWarning> {
    match cell {
        Cell::Empty => Err(CellWarning::Empty),
        Cell::Number(value) if value.is_finite() => Ok(*value),
        Cell::Number(value) => Err(CellWarning::NotNumeric(value.to_string())),
        Cell::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Cell::Text(text) => parse_currency_text(text),
        Cell::Date(_) => Err(CellWarning::NotNumeric(cell_text(cell))),
        Cell::Error(err) => Err(CellWarning::ErrorValue(err.clone())),
    }
}

pub fn coerce_number(cell: &Cell, default: f64) -> f64 {
    try_coerce_number(cell).unwrap_or(default)
}

pub fn parse_currency_text(text: &str) -> Result<f64, CellWarning> {
    let cleaned: String = text
        .replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(CellWarning::Empty);
    }

    let normalized = match cleaned.find(',') {
        // A single decimal comma with only thousands dots before it.
        Some(comma) => {
            if cleaned.matches(',').count() > 1 || cleaned[comma..].contains('.') {
                return Err(CellWarning::NotNumeric(text.to_string()));
            }
            cleaned.replace('.', "").replace(',', ".")
        }
        None => cleaned,
    };

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CellWarning::NotNumeric(text.to_string())),
    }
}

/// Reads a cell as a whole number, truncating any fraction. The
/// placeholders `-` and `N/A` count as empty.
pub fn try_coerce_integer(cell: &Cell) -> Result<i64, CellWarning> {
    if let Cell::Text(text) = cell {
        if matches!(text.trim(), "" | "-" | "N/A") {
            return Err(CellWarning::Empty);
        }
    }
    try_coerce_number(cell).map(|value| value.trunc() as i64)
}

pub fn coerce_integer(cell: &Cell, default: i64) -> i64 {
    try_coerce_integer(cell).unwrap_or(default)
}

/// Plain-text rendering of a cell. Whole numbers print without a
/// fractional part, so an `Id` of `42` reads `"42"`.
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(text) => text.clone(),
        Cell::Number(value) => format_number(*value),
        Cell::Bool(flag) => flag.to_string(),
        Cell::Date(date) => date.format("%Y-%m-%d %H:%M:%S").to_string(),
        Cell::Error(err) => err.clone(),
    }
}

/// Date fields: date-typed cells render as `DD/MM/YYYY`, anything else is
/// copied as text, and an empty cell is empty text.
pub fn format_date_cell(cell: &Cell) -> String {
    match cell {
        Cell::Date(date) => date.format("%d/%m/%Y").to_string(),
        other => cell_text(other),
    }
}

/// A year key is accepted only when its text is made of ASCII digits.
pub fn year_key(cell: &Cell) -> Option<i32> {
    let text = cell_text(cell);
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
