//! Demo spreadsheet source
//!
//! Two made-up branches whose sheets look like real exports: Thai
//! headers, Buddhist-era month/day/year dates, quoted cells with
//! thousands separators. Dates are relative to `today`, so the default
//! month-to-date window always has something to show.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};

use crate::config::{BranchSheet, FieldMap};
use crate::domain::local_today;
use crate::domain::result::{Error, Result};
use crate::ports::SheetSource;

pub const DEMO_BRANCHES: &[(&str, &str)] = &[
    ("demo-bangkok", "Demo Bangkok"),
    ("demo-chiangmai", "Demo Chiang Mai"),
];

/// One demo sheet row; `days_ago` anchors the date to today
struct DemoRow {
    days_ago: i64,
    name: &'static str,
    phone: &'static str,
    status: &'static str,
    primary_amount: &'static str,
    upgrade_amount: &'static str,
    salesperson: &'static str,
    interest: &'static str,
    /// Days from the row date to the service date, or literal text
    service: Service,
}

enum Service {
    None,
    InDays(i64),
    Text(&'static str),
}

#[allow(clippy::too_many_arguments)]
const fn row(
    days_ago: i64,
    name: &'static str,
    phone: &'static str,
    status: &'static str,
    primary_amount: &'static str,
    upgrade_amount: &'static str,
    salesperson: &'static str,
    interest: &'static str,
    service: Service,
) -> DemoRow {
    DemoRow {
        days_ago,
        name,
        phone,
        status,
        primary_amount,
        upgrade_amount,
        salesperson,
        interest,
        service,
    }
}

const BANGKOK: &[DemoRow] = &[
    row(40, "ธนา ใจดี", "0812345001", "P2", "", "", "Anna", "Facial", Service::None),
    row(14, "สมชาย รักดี", "0812345002", "P2", "", "", "Anna", "Laser", Service::InDays(3)),
    row(10, "มาลี ศรีสุข", "0812345003", "P2", "9,000", "", "Beam", "Laser", Service::None),
    row(9, "สมชาย รักดี", "0812345002", "P1", "15,000", "", "Anna", "Laser package", Service::None),
    row(8, "อนันต์ มั่นคง", "0812345004", "P2", "", "", "Beam", "Body", Service::None),
    row(6, "พลอย แสงทอง", "0812345005", "P2", "", "", "Cake", "Facial", Service::Text("สัปดาห์หน้า")),
    row(5, "นก บินสูง", "0812345006", "UP P2", "", "3,200", "Cake", "Add-on mask", Service::None),
    row(4, "อนันต์ มั่นคง", "0812345004", "UP P2", "", "4,500", "Beam", "Body upgrade", Service::None),
    row(3, "ดาว ประกาย", "0812345007", "P2", "", "", "Anna", "", Service::InDays(7)),
    row(3, "ดาว ประกาย", "0812345007", "p2", "", "", "Anna", "", Service::None),
    row(2, "กฤต เก่งงาน", "0812345008", "P2", "", "", "", "Laser", Service::InDays(5)),
    row(1, "Walk-in", "", "P2", "", "", "Beam", "Consult", Service::None),
    row(0, "ธนา ใจดี", "0812345001", "P1", "6,000", "", "Anna", "Facial course", Service::None),
];

const CHIANGMAI: &[DemoRow] = &[
    row(12, "ปิติ ยิ้มแย้ม", "0899990001", "P2", "", "", "Dew", "Hair", Service::InDays(2)),
    row(11, "ปิติ ยิ้มแย้ม", "0899990001", "", "", "2,750", "Dew", "Hair spa", Service::None),
    row(7, "วิไล งามตา", "0899990002", "P2", "", "", "Fon", "Nail", Service::None),
    row(5, "ชัย ชนะ", "0899990003", "P2", "12,500", "", "Dew", "Hair course", Service::None),
    row(2, "วิไล งามตา", "0899990002", "P1", "8,800", "", "Fon", "Nail course", Service::None),
    row(1, "ส้ม หวาน", "0899990004", "P2", "", "", "Fon", "Nail", Service::Text("รอโทรยืนยัน")),
];

/// Demo branch configuration, as `funnel demo on` registers it
pub fn demo_branches() -> Vec<(String, BranchSheet)> {
    DEMO_BRANCHES
        .iter()
        .map(|(id, display)| {
            let mut sheet = BranchSheet::new(format!("{}-sheet", id));
            sheet.display_name = Some(display.to_string());
            (id.to_string(), sheet)
        })
        .collect()
}

/// Sheet date as branches type it: month/day/Buddhist year
fn sheet_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year() + 543)
}

/// Render a branch's demo sheet as CSV text
pub fn generate_demo_csv(branch: &str, today: NaiveDate, fields: &FieldMap) -> Result<String> {
    let rows = match branch {
        "demo-bangkok" => BANGKOK,
        "demo-chiangmai" => CHIANGMAI,
        other => return Err(Error::config(format!("Unknown demo branch '{}'", other))),
    };

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record([
        fields.date.as_str(),
        fields.name.as_str(),
        fields.phone.as_str(),
        fields.status.as_str(),
        fields.primary_amount.as_str(),
        fields.upgrade_amount.as_str(),
        fields.salesperson.as_str(),
        fields.interest.as_str(),
        fields.service_date.as_str(),
    ])?;

    for demo in rows {
        let date = today - Duration::days(demo.days_ago);
        let service = match demo.service {
            Service::None => String::new(),
            Service::InDays(days) => sheet_date(date + Duration::days(days)),
            Service::Text(text) => text.to_string(),
        };
        writer.write_record([
            sheet_date(date).as_str(),
            demo.name,
            demo.phone,
            demo.status,
            demo.primary_amount,
            demo.upgrade_amount,
            demo.salesperson,
            demo.interest,
            service.as_str(),
        ])?;
    }
    // A row someone forgot to date
    writer.write_record(["TBD", "ไม่ระบุวันที่", "0800000000", "P2", "", "", "", "", ""])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::sheet(format!("Failed to render demo sheet: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::sheet(format!("Demo sheet is not UTF-8: {}", e)))
}

/// Sheet source serving generated demo data
#[derive(Debug, Clone)]
pub struct DemoSheetSource {
    today: NaiveDate,
    fields: FieldMap,
}

impl DemoSheetSource {
    pub fn new(fields: FieldMap) -> Self {
        Self::with_today(local_today(), fields)
    }

    /// Pin "today", for reproducible output
    pub fn with_today(today: NaiveDate, fields: FieldMap) -> Self {
        Self { today, fields }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }
}

#[async_trait]
impl SheetSource for DemoSheetSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn fetch_csv(&self, branch: &str) -> Result<String> {
        generate_demo_csv(branch, self.today, &self.fields)
    }
}
