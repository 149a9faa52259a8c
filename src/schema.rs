use crate::periods::PeriodKey;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// String-keyed map that serializes in insertion order.
///
/// Used where the order of keys carries meaning for the dashboard: month
/// columns in header order, and chart series in bucket order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites. An existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl<V: JsonSchema> JsonSchema for OrderedMap<V> {
    fn schema_name() -> String {
        format!("OrderedMap_of_{}", V::schema_name())
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <BTreeMap<String, V>>::json_schema(gen)
    }
}

/// Named numeric series, index-aligned with [`ChartData::months`].
pub type SeriesGroup = OrderedMap<Vec<f64>>;

/// One row of the consolidated ledger sheet.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct LedgerRow {
    #[schemars(description = "Free-text category label; the sole input to classification")]
    pub alias: String,

    pub id: String,

    #[serde(rename = "months")]
    #[schemars(description = "Amount per YY-MM period; every detected period is present")]
    pub amounts: BTreeMap<PeriodKey, f64>,
}

impl LedgerRow {
    pub fn amount(&self, period: &PeriodKey) -> f64 {
        self.amounts.get(period).copied().unwrap_or(0.0)
    }
}

/// Dividends received in one year, by month.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct AnnualTotalRow {
    pub year: i32,

    #[serde(rename = "months")]
    #[schemars(description = "Amount per month name, in sheet header order")]
    pub amounts: OrderedMap<f64>,

    pub total: f64,

    #[serde(rename = "variacao")]
    #[schemars(description = "Percent change of total against the previous year")]
    pub variation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CardGroupRow {
    #[serde(rename = "grupo")]
    pub group: String,

    #[serde(rename = "months")]
    pub amounts: BTreeMap<PeriodKey, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CardTransactionRow {
    #[serde(rename = "fatura")]
    pub invoice: String,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "estabelecimento")]
    pub merchant: String,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "cartao")]
    pub card: String,
    #[serde(rename = "estabelecimento_fmt")]
    pub merchant_formatted: String,
    #[serde(rename = "grupo")]
    pub category: String,
}

/// An equity position from the holdings sheet.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct HoldingRow {
    pub ticker: String,
    pub amount: f64,
    pub average_price: f64,
    #[serde(rename = "nota")]
    pub score: f64,
    #[serde(rename = "r_alvo")]
    pub target_price: f64,
    #[serde(rename = "r_base_pt")]
    pub base_price: f64,
    #[serde(rename = "ultima_atualizacao")]
    pub last_update: String,
    #[serde(rename = "desvio_pl_proj")]
    pub pe_projection_deviation: f64,
    #[serde(rename = "cagr_lcr_5a")]
    pub earnings_cagr_5y: f64,
    #[serde(rename = "div_l_ebitda")]
    pub net_debt_to_ebitda: f64,
    #[serde(rename = "div_proj")]
    pub projected_dividend: f64,
    #[serde(rename = "pct_div_proj")]
    #[schemars(description = "Projected dividend yield, scaled to percent (fraction x 100)")]
    pub projected_dividend_pct: f64,
}

/// A dividend payment, either already received or still to be received.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct DividendPaymentRow {
    pub ticker: String,
    #[serde(rename = "pagamento")]
    pub payment_date: String,
    #[serde(rename = "mes")]
    pub month: i64,
    #[serde(rename = "referencia")]
    pub reference: i64,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "valor_total")]
    pub total_amount: f64,
}

/// Projected dividend income for a ticker in a given year.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ProjectionRow {
    pub ticker: String,
    #[serde(rename = "qtd_acoes")]
    pub share_count: f64,
    #[serde(rename = "dividendo_por_acao")]
    pub dividend_per_share: f64,
    #[serde(rename = "renda_anual_esperada")]
    pub expected_annual_income: f64,
    #[serde(rename = "capital_alocado")]
    pub allocated_capital: f64,
    #[schemars(description = "Dividend yield exactly as stored in the sheet (not scaled)")]
    pub dividend_yield: f64,
    #[serde(rename = "ano")]
    pub year: i64,
    #[serde(rename = "renda_anual")]
    pub annual_income: f64,
    #[serde(rename = "renda_mensal")]
    pub monthly_income: f64,
    #[serde(rename = "taxa_crescimento")]
    #[schemars(description = "Growth against the previous year, scaled to percent (fraction x 100)")]
    pub growth_rate_pct: f64,
}

/// Stock income target from the older single-sheet holdings layout.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct StockTargetRow {
    pub ticker: String,
    #[serde(rename = "qtd")]
    pub quantity: f64,
    #[serde(rename = "div_esperado_2025")]
    pub expected_dividend: f64,
    #[serde(rename = "renda_esperada")]
    pub expected_income: f64,
    #[serde(rename = "capital_atual")]
    pub current_capital: f64,
    #[serde(rename = "dividend_yield_esperado")]
    #[schemars(description = "Expected dividend yield, scaled to percent (fraction x 100)")]
    pub expected_yield_pct: f64,
    #[serde(rename = "dividend_yield_pago")]
    #[schemars(description = "Paid dividend yield exactly as stored in the sheet (not scaled)")]
    pub paid_yield: f64,
    #[serde(rename = "dividend_yield_restante")]
    #[schemars(description = "Remaining dividend yield, scaled to percent (fraction x 100)")]
    pub remaining_yield_pct: f64,
    #[serde(rename = "proporcao_hoje")]
    pub current_share: f64,
    #[serde(rename = "meta_28k")]
    pub goal_28k: f64,
    #[serde(rename = "meta_1_ano")]
    pub goal_one_year: f64,
    #[serde(rename = "meta_qtd_2033")]
    pub goal_quantity_2033: f64,
}

/// Chart-ready series for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ChartData {
    pub months: Vec<PeriodKey>,
    pub consolidated: SeriesGroup,
    pub cartao: SeriesGroup,
    pub investimento: SeriesGroup,
}

/// Everything extracted from one workbook. Sheets absent from the
/// configured workbook variant are left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct DashboardData {
    pub table_data: Vec<LedgerRow>,
    pub chart_data: ChartData,
    pub proventos_data: Vec<AnnualTotalRow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cartao_data: Option<Vec<CardGroupRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cartao_detalhe_data: Option<Vec<CardTransactionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acoes_carteira_data: Option<Vec<HoldingRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proventos_recebidos_data: Option<Vec<DividendPaymentRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renda_projetiva_data: Option<Vec<ProjectionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proventos_a_receber_data: Option<Vec<DividendPaymentRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acoes_data: Option<Vec<StockTargetRow>>,
}

impl DashboardData {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardData)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = DashboardData::schema_as_json().unwrap();
        assert!(schema_json.contains("table_data"));
        assert!(schema_json.contains("chart_data"));
        assert!(schema_json.contains("variacao"));
        assert!(schema_json.contains("pct_div_proj"));
    }

    #[test]
    fn test_ordered_map_keeps_insertion_order() {
        let mut months = OrderedMap::new();
        months.insert("Março", 3.0);
        months.insert("Janeiro", 1.0);
        months.insert("Março", 30.0);

        assert_eq!(months.len(), 2);
        assert_eq!(months.keys().collect::<Vec<_>>(), vec!["Março", "Janeiro"]);

        let json = serde_json::to_string(&months).unwrap();
        assert_eq!(json, r#"{"Março":30.0,"Janeiro":1.0}"#);
    }

    #[test]
    fn test_ledger_row_serialization() {
        let mut amounts = BTreeMap::new();
        amounts.insert(PeriodKey::from_header("25-02"), -10.0);
        amounts.insert(PeriodKey::from_header("25-01"), 5.5);
        let row = LedgerRow {
            alias: "Débitos".to_string(),
            id: "7".to_string(),
            amounts,
        };

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"alias":"Débitos","id":"7","months":{"25-01":5.5,"25-02":-10.0}}"#
        );
        assert_eq!(row.amount(&PeriodKey::from_header("25-03")), 0.0);
    }
}
