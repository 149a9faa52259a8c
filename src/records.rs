use crate::coerce::{cell_text, format_date_cell, try_coerce_integer, try_coerce_number, year_key};
use crate::error::{CellIssue, CellWarning, Result};
use crate::periods::{
    detect_card_period_columns, detect_month_columns, detect_period_columns, MonthTable, PeriodKey,
};
use crate::schema::{
    AnnualTotalRow, CardGroupRow, CardTransactionRow, DividendPaymentRow, HoldingRow, LedgerRow,
    OrderedMap, ProjectionRow, StockTargetRow,
};
use crate::workbook::{Cell, Sheet, SheetRow};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Records extracted from one sheet, plus the cell failures that were
/// tolerated along the way.
///
/// Rows whose identifying cell is blank are skipped. Every other field is
/// read on its own: an unreadable cell takes the field default, and unless
/// the cell was simply empty the failure is kept as a [`CellIssue`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub issues: Vec<CellIssue>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl<T> Normalized<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Logs the tolerated issues and hands back the records.
    pub fn into_records(self, sheet: &str) -> Vec<T> {
        if !self.issues.is_empty() {
            warn!(
                "Worksheet '{}': {} cell(s) could not be read and took their default",
                sheet,
                self.issues.len()
            );
            for issue in &self.issues {
                debug!("{}", issue);
            }
        }
        self.records
    }
}

/// Field access for one row, collecting issues into the sheet's list.
struct FieldReader<'r, 's> {
    row: SheetRow<'s>,
    issues: &'r mut Vec<CellIssue>,
}

impl<'r, 's> FieldReader<'r, 's> {
    fn new(row: SheetRow<'s>, issues: &'r mut Vec<CellIssue>) -> Self {
        Self { row, issues }
    }

    fn number(&mut self, column: &str) -> f64 {
        let cell = self.row.get(column);
        self.number_cell(cell, column)
    }

    fn number_at(&mut self, idx: usize, column: &str) -> f64 {
        let cell = self.row.cell(idx);
        self.number_cell(cell, column)
    }

    fn number_cell(&mut self, cell: &Cell, column: &str) -> f64 {
        match try_coerce_number(cell) {
            Ok(value) => value,
            Err(warning) => {
                self.note(column, warning);
                0.0
            }
        }
    }

    /// A fraction stored in the sheet, scaled to percent.
    fn percent(&mut self, column: &str) -> f64 {
        self.number(column) * 100.0
    }

    fn integer(&mut self, column: &str) -> i64 {
        match try_coerce_integer(self.row.get(column)) {
            Ok(value) => value,
            Err(warning) => {
                self.note(column, warning);
                0
            }
        }
    }

    fn text(&self, column: &str) -> String {
        cell_text(self.row.get(column))
    }

    fn date(&self, column: &str) -> String {
        format_date_cell(self.row.get(column))
    }

    fn note(&mut self, column: &str, warning: CellWarning) {
        if warning == CellWarning::Empty {
            return;
        }
        self.issues.push(CellIssue {
            sheet: self.row.sheet_name().to_string(),
            row: self.row.line(),
            column: column.to_string(),
            warning,
        });
    }
}

/// Checks that each identifying column exists, but only when there are data
/// rows to identify.
fn require_key_columns(sheet: &Sheet, columns: &[&str]) -> Result<()> {
    if sheet.is_empty() {
        return Ok(());
    }
    for column in columns {
        sheet.require_column(column)?;
    }
    Ok(())
}

/// Consolidated ledger. Returns the detected periods (sorted, unique) with
/// the rows; every row carries an amount for every period.
pub fn normalize_ledger(sheet: &Sheet, prefix: &str) -> Result<(Vec<PeriodKey>, Normalized<LedgerRow>)> {
    require_key_columns(sheet, &["Alias", "Id"])?;

    let columns = detect_period_columns(sheet.headers(), prefix);
    let periods: Vec<PeriodKey> = columns.iter().map(|c| c.key.clone()).collect();

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let alias = row.get("Alias");
        if alias.is_blank() {
            continue;
        }

        let mut fields = FieldReader::new(row, &mut out.issues);
        let mut amounts = BTreeMap::new();
        for column in &columns {
            let value = fields.number_at(column.index, column.key.as_str());
            amounts.insert(column.key.clone(), value);
        }

        out.records.push(LedgerRow {
            alias: cell_text(alias),
            id: fields.text("Id"),
            amounts,
        });
    }

    Ok((periods, out))
}

/// Dividend history by year. The first column holds the year; rows whose
/// year cell is not a plain digit string are skipped. Variation is left at
/// zero for [`crate::variance::apply_year_over_year`] to fill in.
pub fn normalize_annual_totals(sheet: &Sheet, months: &MonthTable) -> Normalized<AnnualTotalRow> {
    let labels = detect_month_columns(sheet.headers(), months);

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let Some(year) = year_key(row.cell(0)) else {
            continue;
        };

        let mut fields = FieldReader::new(row, &mut out.issues);
        let mut amounts = OrderedMap::new();
        for (i, label) in labels.iter().enumerate() {
            let value = fields.number_at(i + 1, label);
            amounts.insert(label.as_str(), value);
        }
        let total: f64 = amounts.values().sum();

        out.records.push(AnnualTotalRow {
            year,
            amounts,
            total,
            variation_pct: 0.0,
        });
    }
    out
}

/// Card statement, one row per spending group.
pub fn normalize_card_groups(sheet: &Sheet, prefix: &str) -> Result<Normalized<CardGroupRow>> {
    require_key_columns(sheet, &["Grupo"])?;
    let columns = detect_card_period_columns(sheet.headers(), prefix);

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let group = row.get("Grupo");
        if group.is_blank() {
            continue;
        }

        let mut fields = FieldReader::new(row, &mut out.issues);
        let amounts = columns
            .iter()
            .map(|column| {
                let value = fields.number_at(column.index, column.key.as_str());
                (column.key.clone(), value)
            })
            .collect();

        out.records.push(CardGroupRow {
            group: cell_text(group),
            amounts,
        });
    }
    Ok(out)
}

pub fn normalize_card_transactions(sheet: &Sheet) -> Result<Normalized<CardTransactionRow>> {
    require_key_columns(sheet, &["Fatura"])?;

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let invoice = row.get("Fatura");
        if invoice.is_blank() {
            continue;
        }

        let mut fields = FieldReader::new(row, &mut out.issues);
        out.records.push(CardTransactionRow {
            invoice: cell_text(invoice),
            date: fields.date("Data"),
            merchant: fields.text("Estabelecimento"),
            amount: fields.number("Valor"),
            card: fields.text("Cartão"),
            merchant_formatted: fields.text("Estabelecimento Fmt"),
            category: fields.text("Grupo"),
        });
    }
    Ok(out)
}

pub fn normalize_holdings(sheet: &Sheet) -> Result<Normalized<HoldingRow>> {
    require_key_columns(sheet, &["Ticker"])?;

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let ticker = row.get("Ticker");
        if ticker.is_blank() {
            continue;
        }

        let mut fields = FieldReader::new(row, &mut out.issues);
        out.records.push(HoldingRow {
            ticker: cell_text(ticker),
            amount: fields.number("Amount"),
            average_price: fields.number("Average Price"),
            score: fields.number("Nota\n0-7"),
            target_price: fields.number("R$ Alvo"),
            base_price: fields.number("R$ Base\np/ PT"),
            last_update: fields.date("Última Atual."),
            pe_projection_deviation: fields.number("Desvio PL Proj."),
            earnings_cagr_5y: fields.number("CAGR LCR (5A)"),
            net_debt_to_ebitda: fields.number("Div. L/\nEBITDA"),
            projected_dividend: fields.number("Div. Proj."),
            projected_dividend_pct: fields.percent("% Div. Proj."),
        });
    }
    Ok(out)
}

/// Received and receivable dividends share one layout.
pub fn normalize_dividend_payments(sheet: &Sheet) -> Result<Normalized<DividendPaymentRow>> {
    require_key_columns(sheet, &["Ticker"])?;

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let ticker = row.get("Ticker");
        if ticker.is_blank() {
            continue;
        }

        let mut fields = FieldReader::new(row, &mut out.issues);
        out.records.push(DividendPaymentRow {
            ticker: cell_text(ticker),
            payment_date: fields.date("Pagamento"),
            month: fields.integer("Mês"),
            reference: fields.integer("Referencia"),
            amount: fields.number("Valor"),
            total_amount: fields.number("Valor Total"),
        });
    }
    Ok(out)
}

/// Income projection. A row needs both a ticker and a year.
pub fn normalize_projections(sheet: &Sheet) -> Result<Normalized<ProjectionRow>> {
    require_key_columns(sheet, &["Ticker", "Ano"])?;

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let ticker = row.get("Ticker");
        if ticker.is_blank() || row.get("Ano").is_blank() {
            continue;
        }

        let mut fields = FieldReader::new(row, &mut out.issues);
        out.records.push(ProjectionRow {
            ticker: cell_text(ticker),
            share_count: fields.number("Qtd. de ações"),
            dividend_per_share: fields.number("Dividendo por ação"),
            expected_annual_income: fields.number("Renda anual esperada"),
            allocated_capital: fields.number("Capital alocado"),
            dividend_yield: fields.number("Dividend Yield"),
            year: fields.integer("Ano"),
            annual_income: fields.number("Renda Anual"),
            monthly_income: fields.number("Renda Mensal"),
            growth_rate_pct: fields.percent("Taxa de crescimento (vs ano anterior)"),
        });
    }
    Ok(out)
}

/// Stock targets from the single-sheet holdings layout.
pub fn normalize_stock_targets(sheet: &Sheet) -> Result<Normalized<StockTargetRow>> {
    require_key_columns(sheet, &["Ticker"])?;

    let mut out = Normalized::default();
    for row in sheet.rows() {
        let ticker = row.get("Ticker");
        if ticker.is_blank() {
            continue;
        }

        let mut fields = FieldReader::new(row, &mut out.issues);
        out.records.push(StockTargetRow {
            ticker: cell_text(ticker),
            quantity: fields.number("Qtd"),
            expected_dividend: fields.number("Div. Esperado"),
            expected_income: fields.number("Renda Esperada"),
            current_capital: fields.number("Capital Atual"),
            expected_yield_pct: fields.percent("DY Esperado"),
            paid_yield: fields.number("DY Pago"),
            remaining_yield_pct: fields.percent("DY Restante"),
            current_share: fields.number("Proporção Hoje"),
            goal_28k: fields.number("Meta 28k"),
            goal_one_year: fields.number("Meta 1 Ano"),
            goal_quantity_2033: fields.number("Meta Qtd 2033"),
        });
    }
    Ok(out)
}
