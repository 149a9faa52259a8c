use chrono::NaiveDate;
use household_finance_ingest::*;

fn date_cell(year: i32, month: u32, day: u32) -> Cell {
    Cell::Date(
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )
}

fn ledger_sheet(rows: Vec<Vec<Cell>>) -> Sheet {
    Sheet::with_text_headers(
        "Consolidado",
        &["Alias", "Id", "25-03", "25-01", "25-02", "25-04", "25-01", "Observações"],
        rows,
    )
}

fn ledger_row(alias: &str, id: &str, values: [f64; 4]) -> Vec<Cell> {
    // Physical column order is 25-03, 25-01, 25-02, 25-04.
    let [jan, feb, mar, apr] = values;
    vec![
        Cell::text(alias),
        Cell::text(id),
        Cell::Number(mar),
        Cell::Number(jan),
        Cell::Number(feb),
        Cell::Number(apr),
    ]
}

fn default_ledger() -> Sheet {
    ledger_sheet(vec![
        ledger_row("[R] Créditos Realizado", "1", [5000.0, 5200.0, 5100.0, 0.0]),
        ledger_row("[R] Créditos Realizado Extra", "2", [-50.0, 300.0, 0.0, 0.0]),
        ledger_row("[D] Débitos Realizado", "3", [-3200.0, -3000.0, 0.0, 0.0]),
        ledger_row("[D] Débitos Previsto", "4", [-3500.0, -3400.0, -3300.0, -3600.0]),
        ledger_row("Débitos", "5", [-200.0, -200.0, -200.0, -200.0]),
        ledger_row("[C] Cartão", "6", [-75.5, -80.0, -90.0, -100.0]),
        ledger_row("Sicredi Realizado", "7", [-40.0, -45.0, 0.0, 0.0]),
        ledger_row("Investimento Ações", "8", [1000.0, 1000.0, 1000.0, 1000.0]),
        ledger_row("Previdência Privada", "9", [250.0, 250.0, 250.0, 250.0]),
        vec![Cell::Empty, Cell::text("10"), Cell::Number(999.0)],
    ])
}

fn dividends_sheet() -> Sheet {
    Sheet::new(
        "Proventos",
        vec![
            Cell::text("Ano"),
            date_cell(2024, 1, 1),
            date_cell(2024, 2, 1),
            Cell::text("Março"),
            Cell::text("Total"),
        ],
        vec![
            vec![Cell::Number(2025.0), Cell::Number(0.0), Cell::Number(0.0), Cell::Number(0.0)],
            vec![Cell::Number(2023.0), Cell::Number(400.0), Cell::Number(300.0), Cell::Number(300.0)],
            vec![Cell::text("2024"), Cell::Number(500.0), Cell::text("R$ 500,00"), Cell::Number(500.0)],
            vec![Cell::text("Média"), Cell::Number(1.0)],
        ],
    )
}

fn full_workbook(ledger: Sheet) -> Workbook {
    Workbook::from_sheets(vec![
        ledger,
        dividends_sheet(),
        Sheet::new(
            "Cartão",
            vec![Cell::text("Grupo"), date_cell(2025, 1, 1), date_cell(2025, 2, 1)],
            vec![
                vec![Cell::text("Mercado"), Cell::Number(-410.0), Cell::text("R$ -380,20")],
                vec![Cell::text("Transporte"), Cell::Number(-120.0), Cell::Empty],
            ],
        ),
        Sheet::with_text_headers(
            "Cartão-Detalhe",
            &["Fatura", "Data", "Estabelecimento", "Valor", "Cartão", "Estabelecimento Fmt", "Grupo"],
            vec![vec![
                Cell::text("2025-02"),
                date_cell(2025, 1, 28),
                Cell::text("SUPERMERCADO BOM*123"),
                Cell::Number(-152.3),
                Cell::text("Sicredi"),
                Cell::text("Supermercado Bom"),
                Cell::text("Mercado"),
            ]],
        ),
        Sheet::with_text_headers(
            "Ações-Carteira",
            &["Ticker", "Amount", "Average Price", "Nota\n0-7", "% Div. Proj."],
            vec![vec![
                Cell::text("TAEE11"),
                Cell::Number(200.0),
                Cell::text("R$ 34,10"),
                Cell::Number(6.0),
                Cell::Number(0.095),
            ]],
        ),
        Sheet::with_text_headers(
            "Proventos-Recebidos",
            &["Ticker", "Pagamento", "Mês", "Referencia", "Valor", "Valor Total"],
            vec![vec![
                Cell::text("TAEE11"),
                date_cell(2025, 2, 14),
                Cell::Number(2.0),
                Cell::Number(2024.0),
                Cell::Number(0.82),
                Cell::Number(164.0),
            ]],
        ),
        Sheet::with_text_headers(
            "Renda-Projetiva",
            &["Ticker", "Ano", "Renda Anual", "Renda Mensal", "Taxa de crescimento (vs ano anterior)"],
            vec![vec![
                Cell::text("TAEE11"),
                Cell::Number(2026.0),
                Cell::Number(1800.0),
                Cell::Number(150.0),
                Cell::Number(0.12),
            ]],
        ),
        Sheet::with_text_headers(
            "Proventos-A-Receber",
            &["Ticker", "Pagamento", "Mês", "Referencia", "Valor", "Valor Total"],
            vec![vec![
                Cell::text("BBAS3"),
                Cell::text("-"),
                Cell::text("N/A"),
                Cell::text("-"),
                Cell::text("R$ 0,45"),
                Cell::text("R$ 90,00"),
            ]],
        ),
    ])
}

/// Reference period 25-02: January and February are realized, March and
/// April are forecasts.
fn pipeline(config: IngestConfig) -> DashboardPipeline {
    let config = config.with_reference_period(PeriodKey::parse("25-02").unwrap());
    DashboardPipeline::new(config).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_full_workbook_dashboard() {
    let data = pipeline(IngestConfig::default())
        .run(&full_workbook(default_ledger()))
        .unwrap();

    assert_eq!(data.table_data.len(), 9);
    assert_eq!(data.proventos_data.len(), 3);
    assert_eq!(data.cartao_data.as_ref().unwrap().len(), 2);
    assert_eq!(data.cartao_detalhe_data.as_ref().unwrap().len(), 1);
    assert_eq!(data.acoes_carteira_data.as_ref().unwrap().len(), 1);
    assert_eq!(data.proventos_recebidos_data.as_ref().unwrap().len(), 1);
    assert_eq!(data.renda_projetiva_data.as_ref().unwrap().len(), 1);
    assert_eq!(data.proventos_a_receber_data.as_ref().unwrap().len(), 1);
    assert!(data.acoes_data.is_none());

    let holding = &data.acoes_carteira_data.as_ref().unwrap()[0];
    assert_close(holding.average_price, 34.1);
    assert_close(holding.projected_dividend_pct, 9.5);

    let received = &data.proventos_recebidos_data.as_ref().unwrap()[0];
    assert_eq!(received.payment_date, "14/02/2025");
    assert_eq!(received.month, 2);

    let receivable = &data.proventos_a_receber_data.as_ref().unwrap()[0];
    assert_eq!(receivable.payment_date, "-");
    assert_eq!(receivable.month, 0);
    assert_eq!(receivable.reference, 0);
    assert_close(receivable.total_amount, 90.0);

    let projection = &data.renda_projetiva_data.as_ref().unwrap()[0];
    assert_close(projection.growth_rate_pct, 12.0);

    let card = &data.cartao_data.as_ref().unwrap()[0];
    assert_close(card.amounts[&PeriodKey::from_header("25-02")], -380.2);
}

#[test]
fn test_periods_sorted_and_unique() {
    let data = pipeline(IngestConfig::default())
        .run(&full_workbook(default_ledger()))
        .unwrap();

    let months: Vec<&str> = data.chart_data.months.iter().map(|p| p.as_str()).collect();
    assert_eq!(months, vec!["25-01", "25-02", "25-03", "25-04"]);

    for row in &data.table_data {
        let keys: Vec<&PeriodKey> = row.amounts.keys().collect();
        assert_eq!(keys, data.chart_data.months.iter().collect::<Vec<_>>());
    }

    let len = months.len();
    for group in [
        &data.chart_data.consolidated,
        &data.chart_data.cartao,
        &data.chart_data.investimento,
    ] {
        assert!(group.values().all(|series| series.len() == len));
    }
}

#[test]
fn test_net_balance_formula_holds_for_every_period() {
    let pipeline = pipeline(IngestConfig::default());
    let data = pipeline.run(&full_workbook(default_ledger())).unwrap();
    let consolidated = &data.chart_data.consolidated;
    let partitioner = TemporalPartitioner::new(pipeline.reference_period().clone());

    let credit = consolidated.get("credito_realizado").unwrap();
    let realized = consolidated.get("debitos_realizado").unwrap();
    let forecast = consolidated.get("debitos_previsto").unwrap();
    let net = consolidated.get("consolidado").unwrap();

    for (i, period) in data.chart_data.months.iter().enumerate() {
        let debit = if partitioner.is_future(period) {
            forecast[i]
        } else {
            realized[i]
        };
        assert_close(net[i], credit[i] - debit);
    }

    // Negative credit entries are dropped; the unqualified "Débitos" row
    // lands on the realized side for 25-01/25-02 and the forecast side after.
    assert_eq!(credit, &vec![5000.0, 5500.0, 5100.0, 0.0]);
    assert_eq!(realized, &vec![3400.0, 3200.0, 0.0, 0.0]);
    assert_eq!(forecast, &vec![3500.0, 3400.0, 3500.0, 3800.0]);
    assert_eq!(net, &vec![1600.0, 2300.0, 1600.0, -3800.0]);
}

#[test]
fn test_unqualified_debit_contribution() {
    let ledger = ledger_sheet(vec![ledger_row("Débitos", "1", [0.0, -200.0, -200.0, 0.0])]);
    let data = pipeline(IngestConfig::default())
        .run(&full_workbook(ledger))
        .unwrap();
    let consolidated = &data.chart_data.consolidated;

    // 25-02 is past (realized), 25-03 is future (forecast).
    assert_eq!(consolidated.get("debitos_realizado").unwrap()[1], 200.0);
    assert_eq!(consolidated.get("debitos_previsto").unwrap()[1], 0.0);
    assert_eq!(consolidated.get("debitos_realizado").unwrap()[2], 0.0);
    assert_eq!(consolidated.get("debitos_previsto").unwrap()[2], 200.0);
}

#[test]
fn test_card_total_line() {
    let data = pipeline(IngestConfig::default())
        .run(&full_workbook(default_ledger()))
        .unwrap();
    let cards = &data.chart_data.cartao;

    assert_eq!(cards.get("cartao_consolidado").unwrap()[0], 75.5);
    assert_eq!(cards.get("sicredi").unwrap(), &vec![40.0, 45.0, 0.0, 0.0]);
    assert_eq!(cards.get("btg").unwrap(), &vec![0.0; 4]);
    assert_eq!(
        cards.keys().collect::<Vec<_>>(),
        vec!["cartao_dti", "sicredi", "porto_bank", "btg", "cartao_consolidado"]
    );

    let investments = &data.chart_data.investimento;
    assert_eq!(investments.get("acoes").unwrap()[3], 1000.0);
    assert_eq!(investments.get("previdencia_privada").unwrap()[0], 250.0);
    assert_eq!(investments.get("cripto").unwrap(), &vec![0.0; 4]);
}

#[test]
fn test_currency_text_matches_numeric_ledger() {
    let numeric = ledger_sheet(vec![ledger_row("Créditos Realizado", "1", [1234.56, 10.5, 0.0, -75.0])]);
    let text = ledger_sheet(vec![vec![
        Cell::text("Créditos Realizado"),
        Cell::text("1"),
        Cell::text("R$ 0,00"),
        Cell::text("R$ 1.234,56"),
        Cell::text("10,5"),
        Cell::text("R$ -75,00"),
    ]]);

    let pipeline = pipeline(IngestConfig::default());
    let from_numeric = pipeline.run(&full_workbook(numeric)).unwrap();
    let from_text = pipeline.run(&full_workbook(text)).unwrap();

    assert_eq!(from_numeric.table_data, from_text.table_data);
    assert_eq!(
        from_text.table_data[0].amount(&PeriodKey::from_header("25-01")),
        1234.56
    );
}

#[test]
fn test_dividend_variance() {
    let data = pipeline(IngestConfig::default())
        .run(&full_workbook(default_ledger()))
        .unwrap();

    let years: Vec<i32> = data.proventos_data.iter().map(|r| r.year).collect();
    let totals: Vec<f64> = data.proventos_data.iter().map(|r| r.total).collect();
    let variations: Vec<f64> = data.proventos_data.iter().map(|r| r.variation_pct).collect();

    assert_eq!(years, vec![2023, 2024, 2025]);
    assert_eq!(totals, vec![1000.0, 1500.0, 0.0]);
    assert_eq!(variations, vec![0.0, 50.0, -100.0]);

    let months: Vec<&str> = data.proventos_data[0].amounts.keys().collect();
    assert_eq!(months, vec!["Janeiro", "Fevereiro", "Março"]);
}

#[test]
fn test_missing_sheet_fails_without_partial_data() {
    let workbook = Workbook::from_sheets(vec![default_ledger(), dividends_sheet()]);
    let response = DashboardResponse::from(pipeline(IngestConfig::default()).run(&workbook));

    assert!(!response.success);
    assert!(response.data.is_none());
    let error = response.error.clone().unwrap();
    assert!(!error.is_empty());
    assert!(error.contains("Cartão"));

    let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
    assert_eq!(json["success"], false);
    assert!(json.get("table_data").is_none());
    assert!(json.get("chart_data").is_none());
}

#[test]
fn test_missing_identifying_column_is_fatal() {
    let ledger = Sheet::with_text_headers(
        "Consolidado",
        &["Alias", "25-01"],
        vec![vec![Cell::text("Débitos"), Cell::Number(-1.0)]],
    );
    let err = pipeline(IngestConfig::default())
        .run(&full_workbook(ledger))
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingColumn { .. }));
}

#[test]
fn test_output_is_deterministic() {
    let pipeline = pipeline(IngestConfig::default());
    let workbook = full_workbook(default_ledger());

    let first = DashboardResponse::from(pipeline.run(&workbook)).to_json().unwrap();
    let second = DashboardResponse::from(pipeline.run(&workbook)).to_json().unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with(r#"{"success":true,"table_data":"#));
}

#[test]
fn test_legacy_workbook() {
    let workbook = Workbook::from_sheets(vec![
        default_ledger(),
        dividends_sheet(),
        Sheet::with_text_headers(
            "Ações",
            &["Ticker", "Qtd", "Div. Esperado", "DY Esperado", "DY Pago", "Meta 28k"],
            vec![
                vec![
                    Cell::text("BBSE3"),
                    Cell::Number(300.0),
                    Cell::text("R$ 2,40"),
                    Cell::Number(0.08),
                    Cell::Number(0.03),
                    Cell::Number(900.0),
                ],
                vec![Cell::Empty, Cell::Number(1.0)],
            ],
        ),
    ]);

    let data = pipeline(IngestConfig::legacy()).run(&workbook).unwrap();
    let targets = data.acoes_data.as_ref().unwrap();
    assert_eq!(targets.len(), 1);
    assert_close(targets[0].expected_dividend, 2.4);
    assert_close(targets[0].expected_yield_pct, 8.0);
    assert_close(targets[0].paid_yield, 0.03);

    let json = serde_json::to_value(&data).unwrap();
    assert!(json.get("acoes_data").is_some());
    assert!(json.get("cartao_data").is_none());
    assert!(json.get("renda_projetiva_data").is_none());
}

#[test]
fn test_rule_tables_are_configurable() {
    let config = IngestConfig::from_json_str(
        r#"{
            "rules": {
                "investments": {
                    "buckets": ["acoes", "poupanca"],
                    "accumulation": "sum",
                    "rules": [
                        {
                            "id": "stocks",
                            "predicate": {"kind": "contains_all", "terms": ["Investimento", "Ações"]},
                            "target": {"bucket": "acoes"},
                            "transform": "absolute"
                        },
                        {
                            "id": "savings",
                            "predicate": {"kind": "equals", "label": "Poupança"},
                            "target": {"bucket": "poupanca"},
                            "transform": "positive_only"
                        }
                    ]
                }
            }
        }"#,
    )
    .unwrap();

    let ledger = ledger_sheet(vec![
        ledger_row("Investimento Ações", "1", [100.0, 0.0, 0.0, 0.0]),
        ledger_row("Investimento Ações B", "2", [-50.0, 0.0, 0.0, 0.0]),
        ledger_row("Poupança", "3", [20.0, -20.0, 0.0, 0.0]),
    ]);
    let data = pipeline(config).run(&full_workbook(ledger)).unwrap();
    let investments = &data.chart_data.investimento;

    assert_eq!(investments.keys().collect::<Vec<_>>(), vec!["acoes", "poupanca"]);
    assert_eq!(investments.get("acoes").unwrap()[0], 150.0);
    assert_eq!(investments.get("poupanca").unwrap(), &vec![20.0, 0.0, 0.0, 0.0]);
    // Untouched tables keep their defaults.
    assert!(data.chart_data.cartao.contains_key("cartao_consolidado"));
}

#[test]
fn test_unreadable_file_is_failure_response() {
    let response = process_workbook_file("/no/such/dir/financas.xlsx", IngestConfig::default());
    assert!(!response.success);
    assert!(response.error.unwrap().contains("financas.xlsx"));
}

#[test]
fn test_schema_export() {
    let schema = DashboardData::schema_as_json().unwrap();
    for field in ["table_data", "chart_data", "proventos_data", "cartao_detalhe_data", "acoes_data"] {
        assert!(schema.contains(field), "schema is missing {}", field);
    }
}
