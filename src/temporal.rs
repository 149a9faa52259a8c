use crate::periods::PeriodKey;
use chrono::{Datelike, NaiveDate};

/// Whether a period's figures are settled or still projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPhase {
    Realized,
    Forecast,
}

/// Splits periods around a reference "current period".
///
/// A period is a forecast iff its key sorts strictly after the reference
/// key; the reference period itself is realized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalPartitioner {
    reference: PeriodKey,
}

impl TemporalPartitioner {
    pub fn new(reference: PeriodKey) -> Self {
        Self { reference }
    }

    /// Reference period for `today`: the fixed year prefix followed by
    /// today's month. The calendar year of `today` is not used.
    pub fn from_date(prefix: &str, today: NaiveDate) -> Self {
        Self::new(PeriodKey::with_prefix(prefix, today.month()))
    }

    pub fn reference(&self) -> &PeriodKey {
        &self.reference
    }

    pub fn is_future(&self, period: &PeriodKey) -> bool {
        period.as_str() > self.reference.as_str()
    }

    pub fn phase(&self, period: &PeriodKey) -> PeriodPhase {
        if self.is_future(period) {
            PeriodPhase::Forecast
        } else {
            PeriodPhase::Realized
        }
    }

    /// Net balance of one period: realized credit minus the debit figure
    /// that applies to the period's phase.
    pub fn net_value(
        &self,
        period: &PeriodKey,
        credit_realized: f64,
        debit_realized: f64,
        debit_forecast: f64,
    ) -> f64 {
        match self.phase(period) {
            PeriodPhase::Realized => credit_realized - debit_realized,
            PeriodPhase::Forecast => credit_realized - debit_forecast,
        }
    }

    /// [`net_value`](Self::net_value) for aligned series.
    pub fn net_series(
        &self,
        periods: &[PeriodKey],
        credit_realized: &[f64],
        debit_realized: &[f64],
        debit_forecast: &[f64],
    ) -> Vec<f64> {
        periods
            .iter()
            .enumerate()
            .map(|(idx, period)| {
                let at = |series: &[f64]| series.get(idx).copied().unwrap_or(0.0);
                self.net_value(
                    period,
                    at(credit_realized),
                    at(debit_realized),
                    at(debit_forecast),
                )
            })
            .collect()
    }

    /// `(realized, forecast)` periods, each in input order.
    pub fn partition<'p>(&self, periods: &'p [PeriodKey]) -> (Vec<&'p PeriodKey>, Vec<&'p PeriodKey>) {
        periods.iter().partition(|p| !self.is_future(p))
    }
}
