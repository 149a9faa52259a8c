//! # Household Finance Ingest
//!
//! A library for turning a multi-sheet household finance workbook (bank
//! ledger, credit-card statements, equity holdings, dividend history and
//! forecasts) into normalized records and chart-ready series for a dashboard.
//!
//! ## Core Concepts
//!
//! - **Periods**: ledger columns coded `YY-MM`, kept in lexical (= chronological) order
//! - **Normalization**: every sheet kind becomes typed records; unreadable cells default instead of failing
//! - **Classification**: ordered first-match-wins rules bucket ledger rows by their alias
//! - **Realized vs Forecast**: periods after the reference period use forecast debits in the net balance
//! - **Two failure tiers**: tolerated cell issues are logged, structural errors abort the whole run
//!
//! ## Example
//!
//! ```rust,ignore
//! use household_finance_ingest::*;
//!
//! let config = IngestConfig::default()
//!     .with_reference_period(PeriodKey::parse("25-06")?);
//! let response = process_workbook_file("uploads/financas.xlsx", config);
//!
//! if response.success {
//!     println!("{}", response.to_json()?);
//! }
//! ```

pub mod assembler;
pub mod classify;
pub mod coerce;
pub mod config;
pub mod error;
pub mod periods;
pub mod records;
pub mod schema;
pub mod temporal;
pub mod uploads;
pub mod variance;
pub mod workbook;

pub use assembler::{build_dashboard, process_workbook_file, DashboardPipeline, DashboardResponse};
pub use classify::{
    Accumulation, BucketTarget, CategoryRule, ChartRules, LabelPredicate, RuleTable,
    ValueTransform,
};
pub use coerce::{cell_text, coerce_integer, coerce_number, format_date_cell, try_coerce_number};
pub use config::{IngestConfig, SheetNames, WorkbookVariant};
pub use error::{CellIssue, CellWarning, IngestError, Result};
pub use periods::{MonthTable, PeriodColumn, PeriodKey};
pub use records::Normalized;
pub use schema::*;
pub use temporal::{PeriodPhase, TemporalPartitioner};
pub use uploads::{is_supported_workbook, latest_workbook, process_latest_upload};
pub use variance::{apply_year_over_year, year_over_year_pct};
pub use workbook::{Cell, Sheet, SheetRow, Workbook};
