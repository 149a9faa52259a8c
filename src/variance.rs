use crate::schema::AnnualTotalRow;

/// Year-over-year change of `current` against `previous`, in percent,
/// rounded to two decimals.
///
/// When `previous` is zero the result is a placeholder step rather than a
/// percentage: `0` if `current` is also zero, `100` otherwise.
pub fn year_over_year_pct(previous: f64, current: f64) -> f64 {
    if previous != 0.0 {
        round_to_cents((current - previous) / previous * 100.0)
    } else if current == 0.0 {
        0.0
    } else {
        100.0
    }
}

/// Two-decimal rounding with exact halves going to the even cent.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Sorts rows by year ascending and fills in each row's variation against
/// the row before it. The first row's variation is zero.
pub fn apply_year_over_year(rows: &mut [AnnualTotalRow]) {
    rows.sort_by_key(|row| row.year);

    let mut previous_total: Option<f64> = None;
    for row in rows.iter_mut() {
        row.variation_pct = match previous_total {
            Some(previous) => year_over_year_pct(previous, row.total),
            None => 0.0,
        };
        previous_total = Some(row.total);
    }
}
