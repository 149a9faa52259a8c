use crate::error::{IngestError, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDateTime;
use log::debug;
use std::path::Path;

/// A single worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// A spreadsheet error value such as `#DIV/0!`.
    Error(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Empty, or text made only of whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Date(date) => Some(*date),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(text) => Cell::Text(text.clone()),
            Data::Float(value) => Cell::Number(*value),
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Bool(value) => Cell::Bool(*value),
            Data::DateTime(_) | Data::DateTimeIso(_) => match data.as_datetime() {
                Some(date) => Cell::Date(date),
                None => Cell::Text(data.to_string()),
            },
            Data::DurationIso(text) => Cell::Text(text.clone()),
            Data::Error(err) => Cell::Error(err.to_string()),
        }
    }
}

/// One worksheet: a header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    headers: Vec<Cell>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<Cell>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Builds a sheet whose header row is all text, which is what most test
    /// fixtures and hand-made sheets look like.
    pub fn with_text_headers(
        name: impl Into<String>,
        headers: &[&str],
        rows: Vec<Vec<Cell>>,
    ) -> Self {
        let headers = headers.iter().map(|h| Cell::text(*h)).collect();
        Self::new(name, headers, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[Cell] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = SheetRow<'_>> {
        self.rows.iter().enumerate().map(move |(idx, cells)| SheetRow {
            sheet: self,
            cells,
            line: idx + 2,
        })
    }

    /// Position of the first header whose text equals `label` exactly.
    /// Accents and embedded line breaks are significant.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.as_text() == Some(label))
    }

    pub fn require_column(&self, label: &str) -> Result<usize> {
        self.column_index(label)
            .ok_or_else(|| IngestError::MissingColumn {
                sheet: self.name.clone(),
                column: label.to_string(),
            })
    }

    fn from_range(name: &str, range: &calamine::Range<Data>) -> Self {
        // Ranges start at the first used cell; pad so column indexes match
        // the worksheet's own columns.
        let leading_columns = range.start().map(|(_, col)| col as usize).unwrap_or(0);
        let mut rows = range.rows().map(|row| {
            let mut cells = vec![Cell::Empty; leading_columns];
            cells.extend(row.iter().map(Cell::from));
            cells
        });

        let headers = rows.next().unwrap_or_default();
        let rows: Vec<Vec<Cell>> = rows.collect();
        Self::new(name, headers, rows)
    }
}

/// A borrowed data row of a [`Sheet`].
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'s> {
    sheet: &'s Sheet,
    cells: &'s [Cell],
    line: usize,
}

impl<'s> SheetRow<'s> {
    /// Cell at a column position; positions past the end read as empty.
    pub fn cell(&self, idx: usize) -> &'s Cell {
        self.cells.get(idx).unwrap_or(&EMPTY_CELL)
    }

    /// Cell under the header labelled `label`, or empty when the sheet has
    /// no such column.
    pub fn get(&self, label: &str) -> &'s Cell {
        match self.sheet.column_index(label) {
            Some(idx) => self.cell(idx),
            None => &EMPTY_CELL,
        }
    }

    /// 1-based worksheet line of this row (the header is line 1).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn sheet_name(&self) -> &'s str {
        self.sheet.name()
    }
}

/// Every worksheet of a spreadsheet file, in workbook order, read eagerly.
///
/// The first row of each worksheet is its header row. Cells keep the type
/// the file stored, so a date-typed header stays distinct from text that
/// looks like a date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Reads every worksheet of an `.xlsx`/`.xls`/`.ods` file.
    ///
    /// Any failure to open or decode the file is a
    /// [`IngestError::MalformedFile`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let malformed = |details: String| IngestError::MalformedFile {
            path: path.display().to_string(),
            details,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| malformed(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| malformed(format!("worksheet '{}': {}", name, e)))?;
            let sheet = Sheet::from_range(&name, &range);
            debug!(
                "Loaded worksheet '{}' with {} columns and {} data rows",
                name,
                sheet.headers().len(),
                sheet.row_count()
            );
            sheets.push(sheet);
        }

        Ok(Self { sheets })
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name() == name)
    }

    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| IngestError::MissingSheet(name.to_string()))
    }
}
