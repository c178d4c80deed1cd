//! Row normalizer - tolerant field lookup, local dates and amounts
//!
//! None of these functions fail: a missing field reads as `""`, an
//! unreadable amount as zero and an unreadable date as `None`.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::DateOrder;
use crate::domain::RawRecord;

/// Buddhist-era years above this are converted to Gregorian
const BUDDHIST_ERA_THRESHOLD: i32 = 2500;
const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Resolve a logical field name against a record's column labels
///
/// Exact label match first, then a match ignoring all whitespace and
/// case. The first matching column wins. Returns `""` when nothing
/// matches.
pub fn resolve_field<'r>(record: &'r RawRecord, logical_name: &str) -> &'r str {
    if let Some(value) = record.get(logical_name) {
        return value;
    }
    let target = squash(logical_name);
    record
        .iter()
        .find(|(label, _)| squash(label) == target)
        .map(|(_, value)| value)
        .unwrap_or("")
}

fn squash(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse a sheet date like `1/15/2568`, `15-01-25` or `2025.01.15`
///
/// Components are split on `/`, `-` or `.` and read from their leading
/// digits, so a trailing time of day is ignored. A four-digit first
/// component means year-month-day; otherwise `order` decides between
/// month/day/year and day/month/year. Buddhist years (> 2500) lose 543,
/// two-digit years gain 2000.
pub fn parse_local_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let parts: Vec<&str> = s
        .trim()
        .split(|c| matches!(c, '/' | '-' | '.'))
        .collect();
    if parts.len() < 3 {
        return None;
    }

    let first = parts[0].trim();
    let p0 = leading_int(first)?;
    let p1 = leading_int(parts[1])?;
    let p2 = leading_int(parts[2])?;

    let (mut year, month, day) = if first.len() == 4 && first.chars().all(|c| c.is_ascii_digit()) {
        (p0, p1, p2)
    } else {
        match order {
            DateOrder::MonthFirst => (p2, p0, p1),
            DateOrder::DayFirst => (p2, p1, p0),
        }
    };

    if year > BUDDHIST_ERA_THRESHOLD {
        year -= BUDDHIST_ERA_OFFSET;
    }
    if year < 100 {
        year += 2000;
    }

    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

fn leading_int(part: &str) -> Option<i32> {
    let digits: String = part
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse an amount cell like `1,234.50`, `฿ 500` or `15,000.-`
///
/// Everything except ASCII digits, `.` and `-` is dropped, then the
/// longest leading number is read (sign, digits, optional fraction).
/// Blank or unreadable input is zero.
pub fn parse_amount(s: &str) -> Decimal {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let (sign, rest) = match cleaned.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", cleaned.as_str()),
    };
    let whole_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (whole, tail) = rest.split_at(whole_len);
    let fraction = tail
        .strip_prefix('.')
        .map(|f| &f[..f.bytes().take_while(u8::is_ascii_digit).count()])
        .unwrap_or("");

    if whole.is_empty() && fraction.is_empty() {
        return Decimal::ZERO;
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let number = if fraction.is_empty() {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}.{}", sign, whole, fraction)
    };
    number.parse().unwrap_or(Decimal::ZERO)
}
