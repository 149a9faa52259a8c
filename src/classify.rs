use crate::periods::PeriodKey;
use crate::schema::{LedgerRow, SeriesGroup};
use crate::temporal::{PeriodPhase, TemporalPartitioner};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CREDIT_REALIZED: &str = "credito_realizado";
pub const DEBIT_REALIZED: &str = "debitos_realizado";
pub const DEBIT_FORECAST: &str = "debitos_previsto";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelPredicate {
    /// Alias contains every term (case-sensitive substring match).
    ContainsAll { terms: Vec<String> },
    /// Alias equals the label exactly.
    Equals { label: String },
}

impl LabelPredicate {
    pub fn contains_all(terms: &[&str]) -> Self {
        Self::ContainsAll {
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn equals(label: &str) -> Self {
        Self::Equals {
            label: label.to_string(),
        }
    }

    pub fn matches(&self, alias: &str) -> bool {
        match self {
            Self::ContainsAll { terms } => terms.iter().all(|t| alias.contains(t.as_str())),
            Self::Equals { label } => alias == label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BucketTarget {
    Bucket(String),
    /// Routed by the period's phase relative to the reference period.
    ByPhase { realized: String, forecast: String },
}

impl BucketTarget {
    pub fn resolve(&self, phase: PeriodPhase) -> &str {
        match (self, phase) {
            (Self::Bucket(name), _) => name.as_str(),
            (Self::ByPhase { realized, .. }, PeriodPhase::Realized) => realized.as_str(),
            (Self::ByPhase { forecast, .. }, PeriodPhase::Forecast) => forecast.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueTransform {
    /// Negative values count as zero; they are dropped, not negated.
    PositiveOnly,
    Absolute,
}

impl ValueTransform {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::PositiveOnly => value.max(0.0),
            Self::Absolute => value.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Accumulation {
    /// Every matching row adds to the bucket.
    Sum,
    /// The last matching row in sheet order replaces the bucket value.
    LastValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryRule {
    pub id: String,
    pub predicate: LabelPredicate,
    pub target: BucketTarget,
    pub transform: ValueTransform,
}

impl CategoryRule {
    pub fn new(
        id: &str,
        predicate: LabelPredicate,
        target: BucketTarget,
        transform: ValueTransform,
    ) -> Self {
        Self {
            id: id.to_string(),
            predicate,
            target,
            transform,
        }
    }

    fn to_bucket(id: &str, predicate: LabelPredicate, bucket: &str) -> Self {
        Self::new(
            id,
            predicate,
            BucketTarget::Bucket(bucket.to_string()),
            ValueTransform::Absolute,
        )
    }
}

/// Ordered `(predicate, bucket)` rules matched against a row's alias. The
/// first matching rule wins, so a row feeds at most one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleTable {
    /// Output series, in display order. Buckets named by rules but missing
    /// here are appended after these.
    pub buckets: Vec<String>,
    pub accumulation: Accumulation,
    pub rules: Vec<CategoryRule>,
}

impl RuleTable {
    /// Credits and debits of the consolidated ledger.
    pub fn consolidated() -> Self {
        Self {
            buckets: vec![
                CREDIT_REALIZED.to_string(),
                DEBIT_REALIZED.to_string(),
                DEBIT_FORECAST.to_string(),
            ],
            accumulation: Accumulation::Sum,
            rules: vec![
                CategoryRule::new(
                    "credit_realized",
                    LabelPredicate::contains_all(&["Créditos", "Realizado"]),
                    BucketTarget::Bucket(CREDIT_REALIZED.to_string()),
                    ValueTransform::PositiveOnly,
                ),
                CategoryRule::to_bucket(
                    "debit_realized",
                    LabelPredicate::contains_all(&["Débitos", "Realizado"]),
                    DEBIT_REALIZED,
                ),
                CategoryRule::to_bucket(
                    "debit_forecast",
                    LabelPredicate::contains_all(&["Débitos", "Previsto"]),
                    DEBIT_FORECAST,
                ),
                CategoryRule::new(
                    "debit_unqualified",
                    LabelPredicate::equals("Débitos"),
                    BucketTarget::ByPhase {
                        realized: DEBIT_REALIZED.to_string(),
                        forecast: DEBIT_FORECAST.to_string(),
                    },
                    ValueTransform::Absolute,
                ),
            ],
        }
    }

    /// Credit-card issuers plus the all-cards line.
    pub fn cards() -> Self {
        Self {
            buckets: ["cartao_dti", "sicredi", "porto_bank", "btg", "cartao_consolidado"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            accumulation: Accumulation::LastValue,
            rules: vec![
                CategoryRule::to_bucket(
                    "card_dti",
                    LabelPredicate::contains_all(&["Cartão dti", "Realizado"]),
                    "cartao_dti",
                ),
                CategoryRule::to_bucket(
                    "card_sicredi",
                    LabelPredicate::contains_all(&["Sicredi", "Realizado"]),
                    "sicredi",
                ),
                CategoryRule::to_bucket(
                    "card_porto_bank",
                    LabelPredicate::contains_all(&["Porto Bank", "Realizado"]),
                    "porto_bank",
                ),
                CategoryRule::to_bucket(
                    "card_btg",
                    LabelPredicate::contains_all(&["BTG", "Realizado"]),
                    "btg",
                ),
                CategoryRule::to_bucket(
                    "card_total",
                    LabelPredicate::contains_all(&["[C] Cartão"]),
                    "cartao_consolidado",
                ),
            ],
        }
    }

    /// Investment classes. Each class is expected once per period.
    pub fn investments() -> Self {
        Self {
            buckets: ["acoes", "renda_fixa", "previdencia_privada", "cripto"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            accumulation: Accumulation::LastValue,
            rules: vec![
                CategoryRule::to_bucket(
                    "investment_stocks",
                    LabelPredicate::contains_all(&["Investimento", "Ações"]),
                    "acoes",
                ),
                CategoryRule::to_bucket(
                    "investment_fixed_income",
                    LabelPredicate::contains_all(&["Investimento", "Renda Fixa"]),
                    "renda_fixa",
                ),
                CategoryRule::to_bucket(
                    "investment_crypto",
                    LabelPredicate::contains_all(&["Investimento", "Cripto"]),
                    "cripto",
                ),
                CategoryRule::to_bucket(
                    "investment_pension",
                    LabelPredicate::contains_all(&["Previdência Privada"]),
                    "previdencia_privada",
                ),
            ],
        }
    }

    /// First rule whose predicate matches the alias.
    pub fn classify(&self, alias: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.predicate.matches(alias))
    }

    /// Buckets every matching row into one series per bucket, aligned with
    /// `periods`. Buckets with no matches are all zeros.
    pub fn aggregate(
        &self,
        rows: &[LedgerRow],
        periods: &[PeriodKey],
        partitioner: &TemporalPartitioner,
    ) -> SeriesGroup {
        let mut group = SeriesGroup::new();
        for bucket in &self.buckets {
            group.insert(bucket.as_str(), vec![0.0; periods.len()]);
        }

        let matched: Vec<(&LedgerRow, &CategoryRule)> = rows
            .iter()
            .filter_map(|row| self.classify(&row.alias).map(|rule| (row, rule)))
            .collect();

        for (idx, period) in periods.iter().enumerate() {
            let phase = partitioner.phase(period);

            for (row, rule) in &matched {
                let value = rule.transform.apply(row.amount(period));
                let bucket = rule.target.resolve(phase);

                if !group.contains_key(bucket) {
                    group.insert(bucket, vec![0.0; periods.len()]);
                }
                if let Some(series) = group.get_mut(bucket) {
                    match self.accumulation {
                        Accumulation::Sum => series[idx] += value,
                        Accumulation::LastValue => series[idx] = value,
                    }
                }
            }
        }

        group
    }
}

/// The three rule tables feeding the dashboard charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChartRules {
    #[serde(default = "RuleTable::consolidated")]
    pub consolidated: RuleTable,
    #[serde(default = "RuleTable::cards")]
    pub cards: RuleTable,
    #[serde(default = "RuleTable::investments")]
    pub investments: RuleTable,
}

impl Default for ChartRules {
    fn default() -> Self {
        Self {
            consolidated: RuleTable::consolidated(),
            cards: RuleTable::cards(),
            investments: RuleTable::investments(),
        }
    }
}
