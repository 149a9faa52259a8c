//! Prints a dashboard summary and writes the chart series to CSV.
//!
//! Usage: `cargo run --example dashboard_report [-- path/to/workbook.xlsx]`.
//! Without a path a small legacy-layout workbook is built in memory.

use household_finance_ingest::*;

fn sample_workbook() -> Workbook {
    let number = Cell::Number;
    Workbook::from_sheets(vec![
        Sheet::with_text_headers(
            "Consolidado",
            &["Alias", "Id", "25-01", "25-02", "25-03"],
            vec![
                vec![Cell::text("[R] Créditos Realizado"), Cell::text("1"), number(8200.0), number(8200.0), number(8450.0)],
                vec![Cell::text("[D] Débitos Realizado"), Cell::text("2"), number(-6100.0), number(-5900.0), number(0.0)],
                vec![Cell::text("[D] Débitos Previsto"), Cell::text("3"), number(-6000.0), number(-6000.0), number(-6200.0)],
                vec![Cell::text("[C] Cartão"), Cell::text("4"), number(-1850.4), number(-1720.9), number(-1900.0)],
                vec![Cell::text("Investimento Ações"), Cell::text("5"), number(1500.0), number(1500.0), number(1500.0)],
            ],
        ),
        Sheet::with_text_headers(
            "Proventos",
            &["Ano", "Janeiro", "Fevereiro", "Março", "Total"],
            vec![
                vec![number(2023.0), number(120.0), number(95.5), number(140.0)],
                vec![number(2024.0), number(180.0), Cell::text("R$ 110,25"), number(150.0)],
            ],
        ),
        Sheet::with_text_headers(
            "Ações",
            &["Ticker", "Qtd", "Div. Esperado", "DY Esperado", "DY Pago"],
            vec![vec![Cell::text("TAEE11"), number(200.0), number(3.6), number(0.094), number(0.041)]],
        ),
    ])
}

fn write_chart_csv(chart: &ChartData, path: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let groups = [
        ("consolidated", &chart.consolidated),
        ("cartao", &chart.cartao),
        ("investimento", &chart.investimento),
    ];

    let mut header = vec!["period".to_string()];
    for (group, series) in &groups {
        header.extend(series.keys().map(|name| format!("{}.{}", group, name)));
    }
    writer.write_record(&header)?;

    for (i, period) in chart.months.iter().enumerate() {
        let mut record = vec![period.to_string()];
        for (_, series) in &groups {
            record.extend(series.values().map(|values| format!("{:.2}", values[i])));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let response = match std::env::args().nth(1) {
        Some(path) => process_workbook_file(path, IngestConfig::default()),
        None => {
            let config = IngestConfig::legacy().with_reference_period(PeriodKey::parse("25-02")?);
            DashboardResponse::from(build_dashboard(&sample_workbook(), config))
        }
    };

    let Some(data) = response.data.as_ref() else {
        println!("❌ {}", response.error.as_deref().unwrap_or("unknown error"));
        return Ok(());
    };

    println!("✅ {} ledger rows over {} periods", data.table_data.len(), data.chart_data.months.len());

    if let Some(net) = data.chart_data.consolidated.get("consolidado") {
        for (period, value) in data.chart_data.months.iter().zip(net) {
            println!("  {}  net {:>10.2}", period, value);
        }
    }

    println!("\nDividends by year:");
    for year in &data.proventos_data {
        println!("  {}  total {:>8.2}  ({:+.2}%)", year.year, year.total, year.variation_pct);
    }

    write_chart_csv(&data.chart_data, "dashboard_chart.csv")?;
    println!("\nChart series written to dashboard_chart.csv");
    Ok(())
}
