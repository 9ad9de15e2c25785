//! Spreadsheet (CSV) renditions of the ledger, the monthly rollup, wash
//! listings and period summaries.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppError;
use crate::model::financial::FinancialEntry;
use crate::model::wash::{CargoWasherEntry, CarretaWash, DirtyWasherEntry};
use crate::service::aggregation::{MonthlyRollupRow, PeriodSummary};

#[derive(Serialize)]
struct LedgerRow {
    date: String,
    year: i32,
    month: u32,
    salary_total: String,
    freight: String,
    breakfast_meals: String,
    lunch_meals: String,
    accounting_fee: String,
    inss_fee: String,
    total: String,
}

impl From<&FinancialEntry> for LedgerRow {
    fn from(e: &FinancialEntry) -> Self {
        Self {
            date: e.date.format("%Y-%m-%d").to_string(),
            year: e.year,
            month: e.month,
            salary_total: e.expenses.salary_total.to_string(),
            freight: e.expenses.freight.to_string(),
            breakfast_meals: e.expenses.breakfast_meals.to_string(),
            lunch_meals: e.expenses.lunch_meals.to_string(),
            accounting_fee: e.expenses.accounting_fee.to_string(),
            inss_fee: e.expenses.inss_fee.to_string(),
            total: e.total.to_string(),
        }
    }
}

#[derive(Serialize)]
struct RollupRow {
    year: i32,
    month: u32,
    sum: String,
    cumulative: String,
}

/// Wash line; `source` names the table it came from.
#[derive(Serialize)]
struct WashRow {
    source: &'static str,
    date: String,
    client_id: Option<u64>,
    wash_kind: String,
    box_quantity: Option<u32>,
    unit_price: String,
    revenue: String,
}

impl WashRow {
    fn total(revenue: Decimal) -> Self {
        Self {
            source: "total",
            date: String::new(),
            client_id: None,
            wash_kind: String::new(),
            box_quantity: None,
            unit_price: String::new(),
            revenue: revenue.to_string(),
        }
    }
}

impl From<&CarretaWash> for WashRow {
    fn from(w: &CarretaWash) -> Self {
        Self {
            source: "carreta",
            date: w.date.format("%Y-%m-%d").to_string(),
            client_id: w.client_id,
            wash_kind: w.wash_kind.to_string(),
            box_quantity: Some(w.box_quantity),
            unit_price: w.unit_price.to_string(),
            revenue: w.revenue().to_string(),
        }
    }
}

impl From<&DirtyWasherEntry> for WashRow {
    fn from(w: &DirtyWasherEntry) -> Self {
        Self {
            source: "dirty_washer",
            date: w.date.format("%Y-%m-%d").to_string(),
            client_id: w.client_id,
            wash_kind: w.wash_kind.to_string(),
            box_quantity: Some(w.box_quantity),
            unit_price: w.unit_price.to_string(),
            revenue: w.revenue().to_string(),
        }
    }
}

impl From<&CargoWasherEntry> for WashRow {
    fn from(w: &CargoWasherEntry) -> Self {
        Self {
            source: "cargo_washer",
            date: w.date.format("%Y-%m-%d").to_string(),
            client_id: w.client_id,
            wash_kind: w.wash_kind.to_string(),
            box_quantity: Some(w.box_quantity),
            // billed per load, no unit price
            unit_price: String::new(),
            revenue: w.revenue().to_string(),
        }
    }
}

#[derive(Serialize)]
struct SummaryRow {
    start: String,
    end: String,
    carreta: String,
    dirty_washer: String,
    cargo_washer: String,
    revenue: String,
    expenses: String,
    profit: String,
}

fn export_error(e: impl std::fmt::Display) -> AppError {
    AppError::Export(e.to_string())
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(export_error)?;
    }
    writer.into_inner().map_err(export_error)
}

/// One line per ledger entry, header first.
pub fn ledger_csv(entries: &[FinancialEntry]) -> Result<Vec<u8>, AppError> {
    write_rows(entries.iter().map(LedgerRow::from))
}

pub fn rollup_csv(rows: &[MonthlyRollupRow]) -> Result<Vec<u8>, AppError> {
    write_rows(rows.iter().map(|r| RollupRow {
        year: r.year,
        month: r.month,
        sum: r.sum.to_string(),
        cumulative: r.cumulative.to_string(),
    }))
}

/// Every wash line of the three sources followed by a grand total line.
pub fn wash_csv(
    carreta: &[CarretaWash],
    dirty: &[DirtyWasherEntry],
    cargo: &[CargoWasherEntry],
) -> Result<Vec<u8>, AppError> {
    let rows: Vec<WashRow> = carreta
        .iter()
        .map(WashRow::from)
        .chain(dirty.iter().map(WashRow::from))
        .chain(cargo.iter().map(WashRow::from))
        .collect();

    let total = carreta.iter().map(|w| w.revenue()).sum::<Decimal>()
        + dirty.iter().map(|w| w.revenue()).sum::<Decimal>()
        + cargo.iter().map(|w| w.revenue()).sum::<Decimal>();

    write_rows(rows.into_iter().chain(std::iter::once(WashRow::total(total))))
}

pub fn summary_csv(summary: &PeriodSummary) -> Result<Vec<u8>, AppError> {
    write_rows(std::iter::once(SummaryRow {
        start: summary.range.start.format("%Y-%m-%d").to_string(),
        end: summary.range.end.format("%Y-%m-%d").to_string(),
        carreta: summary.revenue.carreta.to_string(),
        dirty_washer: summary.revenue.dirty_washer.to_string(),
        cargo_washer: summary.revenue.cargo_washer.to_string(),
        revenue: summary.revenue.total.to_string(),
        expenses: summary.expenses.to_string(),
        profit: summary.profit.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::financial::{ExpenseBreakdown, FinancialInput};
    use crate::model::wash::WashKind;
    use crate::service::aggregation::RevenueBreakdown;
    use crate::service::window::DateRange;
    use chrono::{NaiveDate, Utc};

    fn entry(date: NaiveDate, freight: Decimal) -> FinancialEntry {
        let values = FinancialInput {
            date,
            expenses: ExpenseBreakdown {
                freight,
                ..ExpenseBreakdown::default()
            },
        }
        .ledger_values();

        FinancialEntry {
            id: 1,
            date: values.date,
            year: values.year,
            month: values.month,
            expenses: values.expenses,
            total: values.total,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    #[test]
    fn ledger_export_has_header_and_one_line_per_entry() {
        let entries = [entry(
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            Decimal::new(80050, 2),
        )];

        let csv = String::from_utf8(ledger_csv(&entries).unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "date,year,month,salary_total,freight,breakfast_meals,lunch_meals,accounting_fee,inss_fee,total"
        );
        assert_eq!(lines[1], "2026-03-31,2026,3,0,800.50,0,0,0,0,800.50");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn rollup_export_keeps_running_totals() {
        let rows = [
            MonthlyRollupRow {
                year: 2026,
                month: 1,
                sum: Decimal::new(100, 0),
                cumulative: Decimal::new(100, 0),
            },
            MonthlyRollupRow {
                year: 2026,
                month: 2,
                sum: Decimal::new(200, 0),
                cumulative: Decimal::new(300, 0),
            },
        ];

        let csv = String::from_utf8(rollup_csv(&rows).unwrap()).unwrap();
        assert_eq!(csv, "year,month,sum,cumulative\n2026,1,100,100\n2026,2,200,300\n");
    }

    #[test]
    fn empty_ledger_exports_nothing() {
        assert!(ledger_csv(&[]).unwrap().is_empty());
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn wash_export_lists_every_source_and_a_total() {
        let carreta = [CarretaWash {
            id: 1,
            date: day(2),
            trailer_ident: "ABC-1234".into(),
            client_id: Some(3),
            wash_kind: WashKind::Dirty,
            box_type_id: 1,
            product_type_id: 1,
            box_quantity: 10,
            unit_price: Decimal::new(500, 2),
            created_by: None,
        }];
        let dirty = [DirtyWasherEntry {
            id: 2,
            date: day(3),
            client_id: None,
            wash_kind: WashKind::Dirty,
            box_quantity: 6,
            box_size: "G".into(),
            product_type_id: 1,
            unit_price: Decimal::new(250, 2),
            created_by: None,
        }];
        let cargo = [CargoWasherEntry {
            id: 3,
            date: day(4),
            client_id: None,
            wash_kind: WashKind::PerLoad,
            box_quantity: 40,
            q_3a: 10,
            q_2a: 10,
            q_1a: 10,
            q_g: 10,
            rendered_value: Decimal::new(78000, 2),
            created_by: None,
        }];

        let csv = String::from_utf8(wash_csv(&carreta, &dirty, &cargo).unwrap()).unwrap();
        assert_eq!(
            csv,
            "source,date,client_id,wash_kind,box_quantity,unit_price,revenue\n\
             carreta,2026-03-02,3,sujo,10,5.00,50.00\n\
             dirty_washer,2026-03-03,,sujo,6,2.50,15.00\n\
             cargo_washer,2026-03-04,,carga,40,,780.00\n\
             total,,,,,,845.00\n"
        );
    }

    #[test]
    fn empty_wash_export_still_has_a_zero_total() {
        let csv = String::from_utf8(wash_csv(&[], &[], &[]).unwrap()).unwrap();
        assert_eq!(
            csv,
            "source,date,client_id,wash_kind,box_quantity,unit_price,revenue\ntotal,,,,,,0\n"
        );
    }

    #[test]
    fn summary_export_is_one_line_per_period() {
        let summary = PeriodSummary {
            range: DateRange::new(day(1), day(31)).unwrap(),
            revenue: RevenueBreakdown {
                carreta: Decimal::new(5000, 2),
                dirty_washer: Decimal::ZERO,
                cargo_washer: Decimal::new(78000, 2),
                total: Decimal::new(83000, 2),
            },
            expenses: Decimal::new(80, 0),
            profit: Decimal::new(75000, 2),
        };

        let csv = String::from_utf8(summary_csv(&summary).unwrap()).unwrap();
        assert_eq!(
            csv,
            "start,end,carreta,dirty_washer,cargo_washer,revenue,expenses,profit\n\
             2026-03-01,2026-03-31,50.00,0,780.00,830.00,80,750.00\n"
        );
    }
}
