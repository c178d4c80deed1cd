//! End-to-end tests for the funnel pipeline
//!
//! CSV text goes through the real tokenizer, engine and DuckDB note
//! store. Only the spreadsheet download is replaced (demo source or
//! inline CSV).

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use funnel_core::adapters::csv_text::parse_records;
use funnel_core::adapters::demo::DemoSheetSource;
use funnel_core::adapters::duckdb::DuckDbNoteStore;
use funnel_core::config::{DateOrder, FieldMap, FunnelSettings};
use funnel_core::domain::ServiceDate;
use funnel_core::services::funnel::{index_notes, NoteBook};
use funnel_core::services::{NoteService, Refresh, ReportService};
use funnel_core::{compute_report, CustomerIdentity, DateWindow, FollowUpNote, NoteRef};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

const HEADER: &str =
    "\"วันที่\",\"ชื่อลูกค้า\",\"เบอร์ติดต่อ\",\"หมายเหตุ\",\"ยอดอัพ P1\",\"ยอดอัพ P2\",\"Sale\",\"รายการที่สนใจ\",\"วันที่เข้าใช้บริการ\"\n";

fn sheet(rows: &[&str]) -> String {
    let mut text = HEADER.to_string();
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

fn march_2025() -> DateWindow {
    DateWindow::between(d(2025, 3, 1), d(2025, 3, 31))
}

#[test]
fn test_funnel_entry_converts_on_later_visit() {
    let text = sheet(&[
        "\"3/1/2568\",\"Somchai\",\"0811111111\",\"P2\",\"\",\"\",\"Anna\",\"Laser\",\"\"",
        "\"3/10/2568\",\"Somchai\",\"0811111111\",\"P1\",\"500\",\"\",\"Beam\",\"Laser, 10 sessions\",\"\"",
    ]);
    let rows = parse_records(&text).unwrap();
    let report = compute_report(&rows, march_2025(), &NoteBook::new(), &FunnelSettings::default());

    assert_eq!(report.stats.target_count, 1);
    assert_eq!(report.stats.primary_conversion_count, 1);
    assert_eq!(report.stats.pending_count, 0);

    let conversion = &report.primary_conversions[0];
    assert_eq!(conversion.date, d(2025, 3, 10));
    assert_eq!(conversion.funnel_entry_date, d(2025, 3, 1));
    assert_eq!(conversion.amount, Decimal::new(500, 0));
    assert_eq!(conversion.salesperson, "Beam");
    assert_eq!(conversion.interest, "Laser, 10 sessions");
}

#[test]
fn test_lone_funnel_entry_is_pending() {
    let text = sheet(&["\"3/1/2568\",\"Somchai\",\"0811111111\",\"P2\",\"\",\"\",\"\",\"\",\"3/5/2568\""]);
    let rows = parse_records(&text).unwrap();

    let notes = index_notes(vec![FollowUpNote {
        identity: CustomerIdentity::new("0811111111", "Somchai"),
        text: "Asked to call after payday".to_string(),
        record_ref: NoteRef::new("note-1"),
    }]);
    let report = compute_report(&rows, march_2025(), &notes, &FunnelSettings::default());

    assert_eq!(report.stats.pending_count, 1);
    let pending = &report.pending[0];
    assert_eq!(pending.funnel_entry_date, d(2025, 3, 1));
    assert_eq!(pending.salesperson, "-");
    assert_eq!(pending.service_date, ServiceDate::Date(d(2025, 3, 5)));
    assert_eq!(pending.note, "Asked to call after payday");
    assert_eq!(pending.note_ref, Some(NoteRef::new("note-1")));
}

#[test]
fn test_configured_labels_and_day_first_dates() {
    let text = "Date,Customer,Phone,Status,P1,P2\n\
                15/03/2025,Malee,0822222222,p2,,\n\
                20/03/2025,Malee,0822222222,,\"1,200\",\n";
    let settings = FunnelSettings {
        fields: FieldMap {
            name: "customer".to_string(),
            phone: "PHONE".to_string(),
            date: "Date".to_string(),
            status: "Status".to_string(),
            primary_amount: "P1".to_string(),
            upgrade_amount: "P2".to_string(),
            ..FieldMap::default()
        },
        date_order: DateOrder::DayFirst,
        ..FunnelSettings::default()
    };

    let rows = parse_records(text).unwrap();
    let report = compute_report(&rows, march_2025(), &NoteBook::new(), &settings);

    assert_eq!(report.stats.target_count, 1);
    assert_eq!(report.stats.primary_conversion_count, 1);
    assert_eq!(report.primary_conversions[0].amount, Decimal::new(1200, 0));
    assert_eq!(report.skipped_rows, 0);
}

#[test]
fn test_report_serializes_for_json_consumers() {
    let text = sheet(&["\"3/2/2568\",\"Nok\",\"0833333333\",\"UP P2\",\"\",\"2,500.50\",\"Cake\",\"Mask\",\"\""]);
    let rows = parse_records(&text).unwrap();
    let report = compute_report(&rows, march_2025(), &NoteBook::new(), &FunnelSettings::default());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["total_upgrade_bill_count"], 1);
    assert_eq!(json["upgrade_bills"][0]["phone"], "0833333333");
    assert_eq!(json["upgrade_bills"][0]["date"], "2025-03-02");
}

// ============================================================================
// Services over the demo source and a real notes database
// ============================================================================

struct Harness {
    _dir: TempDir,
    reports: ReportService,
    notes: NoteService,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DuckDbNoteStore::new(&dir.path().join("notes.duckdb")).unwrap());
    let source = Arc::new(DemoSheetSource::with_today(d(2025, 6, 20), FieldMap::default()));

    Harness {
        reports: ReportService::new(source, store.clone(), FunnelSettings::default()),
        notes: NoteService::new(store),
        _dir: dir,
    }
}

async fn current(reports: &ReportService, window: DateWindow) -> funnel_core::services::BranchReport {
    match reports.refresh("demo-bangkok", window).await.unwrap() {
        Refresh::Current(result) => result,
        Refresh::Superseded => panic!("no other refresh was running"),
    }
}

#[tokio::test]
async fn test_demo_branch_month_to_date() {
    let h = harness();
    let result = current(&h.reports, DateWindow::month_to_date(d(2025, 6, 20))).await;
    let stats = &result.report.stats;

    assert_eq!(stats.target_count, 7);
    assert_eq!(stats.primary_conversion_count, 2);
    assert_eq!(stats.secondary_conversion_count, 1);
    assert_eq!(stats.pending_count, 4);
    assert_eq!(stats.total_upgrade_bill_count, 2);
    assert_eq!(stats.total_revenue, Decimal::new(7700, 0));
    assert_eq!(stats.format_rate(stats.primary_conversion_count), "28.6%");

    assert_eq!(result.report.skipped_rows, 1);
    assert_eq!(result.warnings.len(), 1);

    let walk_in = result
        .report
        .pending
        .iter()
        .find(|p| p.identity.name == "Walk-in")
        .unwrap();
    assert_eq!(walk_in.identity.phone, "NoPhone");
}

#[tokio::test]
async fn test_note_saved_for_pending_row_shows_on_next_refresh() {
    let h = harness();
    let window = DateWindow::month_to_date(d(2025, 6, 20));

    let first = current(&h.reports, window).await;
    let row = first.report.pending[0].clone();
    assert!(row.note.is_empty());

    let note_ref = h
        .notes
        .save_for_row("demo-bangkok", &row, "Booked for Saturday")
        .await
        .unwrap();

    let second = current(&h.reports, window).await;
    let same = second
        .report
        .pending
        .iter()
        .find(|p| p.identity == row.identity)
        .unwrap();
    assert_eq!(same.note, "Booked for Saturday");
    assert_eq!(same.note_ref.as_ref(), Some(&note_ref));
    assert_eq!(h.reports.latest(), Some(second));
}

#[tokio::test]
async fn test_search_projection() {
    let h = harness();
    let result = current(&h.reports, DateWindow::month_to_date(d(2025, 6, 20))).await;

    let anna = result.report.search("anna");
    assert!(anna.pending.iter().all(|p| p.salesperson == "Anna"));
    assert!(!anna.pending.is_empty());
    assert_eq!(anna.stats, result.report.stats);

    let by_phone = result.report.search("0812345005");
    assert_eq!(by_phone.pending.len(), 1);
    assert!(by_phone.upgrade_bills.is_empty());
}
