use crate::classify::{CREDIT_REALIZED, DEBIT_FORECAST, DEBIT_REALIZED};
use crate::config::{IngestConfig, WorkbookVariant};
use crate::error::Result;
use crate::periods::PeriodKey;
use crate::records::{
    normalize_annual_totals, normalize_card_groups, normalize_card_transactions,
    normalize_dividend_payments, normalize_holdings, normalize_ledger, normalize_projections,
    normalize_stock_targets,
};
use crate::schema::{ChartData, DashboardData, LedgerRow, SeriesGroup};
use crate::temporal::TemporalPartitioner;
use crate::variance::apply_year_over_year;
use crate::workbook::Workbook;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

/// Name of the net-balance series in `chart_data.consolidated`.
pub const NET_BALANCE: &str = "consolidado";

/// What the dashboard receives: the full document on success, only the error
/// text on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<DashboardData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DashboardResponse {
    pub fn ok(data: DashboardData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<Result<DashboardData>> for DashboardResponse {
    fn from(result: Result<DashboardData>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

/// Workbook in, dashboard document out.
///
/// [`run`](Self::run) aborts on any [`crate::IngestError`] from loading or
/// structural parsing; [`process_path`](Self::process_path) turns that into a
/// `success: false` response with no partial data.
#[derive(Debug, Clone)]
pub struct DashboardPipeline {
    config: IngestConfig,
    partitioner: TemporalPartitioner,
}

impl DashboardPipeline {
    /// Validates the configuration and fixes the reference period, taken
    /// from the configuration or else from today's local date.
    pub fn new(config: IngestConfig) -> Result<Self> {
        Self::new_at(config, Local::now().date_naive())
    }

    /// Like [`new`](Self::new) with an explicit "today".
    pub fn new_at(config: IngestConfig, today: NaiveDate) -> Result<Self> {
        config.validate()?;
        let partitioner = config.partitioner_for(today);
        debug!("Reference period: {}", partitioner.reference());
        Ok(Self {
            config,
            partitioner,
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn reference_period(&self) -> &PeriodKey {
        self.partitioner.reference()
    }

    pub fn run(&self, workbook: &Workbook) -> Result<DashboardData> {
        let config = &self.config;
        let names = &config.sheets;

        info!("Building dashboard from {:?} workbook", config.variant);

        // Fail fast before any normalization work.
        for name in names.required(config.variant) {
            workbook.sheet(name)?;
        }

        let (periods, ledger) = normalize_ledger(workbook.sheet(&names.ledger)?, &config.period_prefix)?;
        let table_data = ledger.into_records(&names.ledger);
        debug!(
            "Ledger: {} rows across {} periods",
            table_data.len(),
            periods.len()
        );

        let mut proventos_data =
            normalize_annual_totals(workbook.sheet(&names.dividends)?, &config.month_names)
                .into_records(&names.dividends);
        apply_year_over_year(&mut proventos_data);
        debug!("Dividend history: {} years", proventos_data.len());

        let chart_data = self.chart_data(&table_data, periods);

        let mut data = DashboardData {
            table_data,
            chart_data,
            proventos_data,
            cartao_data: None,
            cartao_detalhe_data: None,
            acoes_carteira_data: None,
            proventos_recebidos_data: None,
            renda_projetiva_data: None,
            proventos_a_receber_data: None,
            acoes_data: None,
        };

        match config.variant {
            WorkbookVariant::Full => {
                data.cartao_data = Some(
                    normalize_card_groups(workbook.sheet(&names.card_groups)?, &config.period_prefix)?
                        .into_records(&names.card_groups),
                );
                data.cartao_detalhe_data = Some(
                    normalize_card_transactions(workbook.sheet(&names.card_transactions)?)?
                        .into_records(&names.card_transactions),
                );
                data.acoes_carteira_data = Some(
                    normalize_holdings(workbook.sheet(&names.holdings)?)?
                        .into_records(&names.holdings),
                );
                data.proventos_recebidos_data = Some(
                    normalize_dividend_payments(workbook.sheet(&names.received_dividends)?)?
                        .into_records(&names.received_dividends),
                );
                data.renda_projetiva_data = Some(
                    normalize_projections(workbook.sheet(&names.income_projection)?)?
                        .into_records(&names.income_projection),
                );
                data.proventos_a_receber_data = Some(
                    normalize_dividend_payments(workbook.sheet(&names.receivable_dividends)?)?
                        .into_records(&names.receivable_dividends),
                );
            }
            WorkbookVariant::Legacy => {
                data.acoes_data = Some(
                    normalize_stock_targets(workbook.sheet(&names.stock_targets)?)?
                        .into_records(&names.stock_targets),
                );
            }
        }

        info!(
            "Dashboard built: {} ledger rows, {} periods, {} dividend years",
            data.table_data.len(),
            data.chart_data.months.len(),
            data.proventos_data.len()
        );
        Ok(data)
    }

    /// Opens the file and runs the pipeline, folding any failure into the
    /// response.
    pub fn process_path(&self, path: impl AsRef<Path>) -> DashboardResponse {
        let path = path.as_ref();
        info!("Processing workbook {}", path.display());

        let result = Workbook::open(path).and_then(|workbook| self.run(&workbook));
        if let Err(err) = &result {
            warn!("Failed to process {}: {}", path.display(), err);
        }
        result.into()
    }

    fn chart_data(&self, rows: &[LedgerRow], periods: Vec<PeriodKey>) -> ChartData {
        let rules = &self.config.rules;
        let partitioner = &self.partitioner;

        let mut consolidated = rules.consolidated.aggregate(rows, &periods, partitioner);
        let net = partitioner.net_series(
            &periods,
            series(&consolidated, CREDIT_REALIZED),
            series(&consolidated, DEBIT_REALIZED),
            series(&consolidated, DEBIT_FORECAST),
        );
        consolidated.insert(NET_BALANCE, net);

        let cartao = rules.cards.aggregate(rows, &periods, partitioner);
        let investimento = rules.investments.aggregate(rows, &periods, partitioner);

        ChartData {
            months: periods,
            consolidated,
            cartao,
            investimento,
        }
    }
}

fn series<'g>(group: &'g SeriesGroup, name: &str) -> &'g [f64] {
    group.get(name).map(Vec::as_slice).unwrap_or_default()
}

/// Runs a freshly built pipeline over an in-memory workbook.
pub fn build_dashboard(workbook: &Workbook, config: IngestConfig) -> Result<DashboardData> {
    DashboardPipeline::new(config)?.run(workbook)
}

/// Opens and processes a workbook file, never failing: errors, including an
/// invalid configuration, come back as a `success: false` response.
pub fn process_workbook_file(path: impl AsRef<Path>, config: IngestConfig) -> DashboardResponse {
    match DashboardPipeline::new(config) {
        Ok(pipeline) => pipeline.process_path(path),
        Err(err) => {
            warn!("Rejected configuration: {}", err);
            DashboardResponse::failure(err.to_string())
        }
    }
}
