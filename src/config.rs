use crate::classify::ChartRules;
use crate::error::{IngestError, Result};
use crate::periods::{MonthTable, PeriodKey};
use crate::temporal::TemporalPartitioner;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which set of worksheets a workbook export carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkbookVariant {
    /// Ledger, dividends, card statement and detail, holdings, received
    /// dividends, income projection and receivables.
    #[default]
    Full,
    /// Ledger, dividends and the single stock-target sheet.
    Legacy,
}

/// Worksheet name for each sheet kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SheetNames {
    pub ledger: String,
    pub dividends: String,
    pub card_groups: String,
    pub card_transactions: String,
    pub holdings: String,
    pub received_dividends: String,
    pub income_projection: String,
    pub receivable_dividends: String,
    pub stock_targets: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            ledger: "Consolidado".to_string(),
            dividends: "Proventos".to_string(),
            card_groups: "Cartão".to_string(),
            card_transactions: "Cartão-Detalhe".to_string(),
            holdings: "Ações-Carteira".to_string(),
            received_dividends: "Proventos-Recebidos".to_string(),
            income_projection: "Renda-Projetiva".to_string(),
            receivable_dividends: "Proventos-A-Receber".to_string(),
            stock_targets: "Ações".to_string(),
        }
    }
}

impl SheetNames {
    /// Every sheet the variant needs, in the order they are read.
    pub fn required(&self, variant: WorkbookVariant) -> Vec<&str> {
        match variant {
            WorkbookVariant::Full => vec![
                &self.ledger,
                &self.dividends,
                &self.card_groups,
                &self.card_transactions,
                &self.holdings,
                &self.received_dividends,
                &self.income_projection,
                &self.receivable_dividends,
            ],
            WorkbookVariant::Legacy => vec![&self.ledger, &self.dividends, &self.stock_targets],
        }
        .into_iter()
        .map(String::as_str)
        .collect()
    }
}

fn default_period_prefix() -> String {
    "25-".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IngestConfig {
    #[serde(default)]
    #[schemars(description = "Sheet layout of the workbook export")]
    pub variant: WorkbookVariant,

    #[serde(default = "default_period_prefix")]
    #[schemars(
        description = "Literal prefix of period column headers (e.g. '25-'); also the year part of the derived reference period"
    )]
    pub period_prefix: String,

    #[serde(default)]
    #[schemars(
        description = "Current period as YY-MM. When absent it is derived from the local date when the pipeline is built"
    )]
    pub reference_period: Option<PeriodKey>,

    #[serde(default)]
    #[schemars(description = "Twelve month labels matched against dividend-history headers")]
    pub month_names: MonthTable,

    #[serde(default)]
    pub sheets: SheetNames,

    #[serde(default)]
    #[schemars(description = "Ordered first-match-wins rules feeding the chart series")]
    pub rules: ChartRules,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            variant: WorkbookVariant::default(),
            period_prefix: default_period_prefix(),
            reference_period: None,
            month_names: MonthTable::default(),
            sheets: SheetNames::default(),
            rules: ChartRules::default(),
        }
    }
}

impl IngestConfig {
    pub fn legacy() -> Self {
        Self {
            variant: WorkbookVariant::Legacy,
            ..Self::default()
        }
    }

    pub fn with_reference_period(mut self, period: PeriodKey) -> Self {
        self.reference_period = Some(period);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_prefix.is_empty() {
            return Err(IngestError::InvalidConfig(
                "period_prefix must not be empty".to_string(),
            ));
        }
        self.month_names.validate()?;
        if let Some(period) = &self.reference_period {
            PeriodKey::parse(period.as_str())?;
        }
        Ok(())
    }

    /// The configured reference period, or the prefix plus `today`'s month.
    pub fn reference_period_for(&self, today: NaiveDate) -> PeriodKey {
        match &self.reference_period {
            Some(period) => period.clone(),
            None => TemporalPartitioner::from_date(&self.period_prefix, today)
                .reference()
                .clone(),
        }
    }

    pub fn partitioner_for(&self, today: NaiveDate) -> TemporalPartitioner {
        TemporalPartitioner::new(self.reference_period_for(today))
    }
}
