use crate::record::{StudentRecord, UNKNOWN};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Number of students shown in the fee chart unless the caller asks otherwise.
pub const DEFAULT_TOP_FEES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeePoint {
    pub name: String,
    pub deposited: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_students: usize,
    pub program_count: usize,
    pub total_fee_collected: i64,
}

/// Leading integer of `s`, or 0 when there is none.
///
/// Leading whitespace and one sign are accepted; everything from the first
/// non-digit on is ignored, so `"1500.75"` reads as 1500 and `"Nil"` as 0.
/// Out-of-range values saturate.
pub fn parse_leading_int(s: &str) -> i64 {
    let t = s.trim_start();
    let (negative, digits) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let mut out: i64 = 0;
    for b in digits.bytes().take_while(|b| b.is_ascii_digit()) {
        let d = i64::from(b - b'0');
        out = if negative {
            out.saturating_mul(10).saturating_sub(d)
        } else {
            out.saturating_mul(10).saturating_add(d)
        };
    }
    out
}

fn key_or_unknown(v: Option<&str>) -> String {
    match v {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Counts records per key, in order of first occurrence.
///
/// A missing or empty key is counted under `"Unknown"`.
pub fn group_count<F>(records: &[StudentRecord], key_fn: F) -> Vec<(String, usize)>
where
    F: Fn(&StudentRecord) -> Option<&str>,
{
    let mut out: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for r in records {
        let key = key_or_unknown(key_fn(r));
        match index.get(&key) {
            Some(&i) => out[i].1 += 1,
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, 1));
            }
        }
    }
    out
}

fn chart_points(groups: Vec<(String, usize)>) -> Vec<ChartPoint> {
    groups
        .into_iter()
        .map(|(name, value)| ChartPoint { name, value })
        .collect()
}

pub fn program_distribution(records: &[StudentRecord]) -> Vec<ChartPoint> {
    chart_points(group_count(records, |r| r.fields.program.as_deref()))
}

pub fn gender_distribution(records: &[StudentRecord]) -> Vec<ChartPoint> {
    chart_points(group_count(records, |r| r.fields.gender.as_deref()))
}

fn numeric_key(key: &str) -> Option<f64> {
    key.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Semester counts, ascending by semester number.
///
/// Keys that are not numbers, `"Unknown"` included, go last in the order
/// they were first seen.
pub fn semester_distribution(records: &[StudentRecord]) -> Vec<ChartPoint> {
    let mut groups = group_count(records, |r| r.fields.semester.as_deref());
    groups.sort_by(|(a, _), (b, _)| match (numeric_key(a), numeric_key(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    groups
        .into_iter()
        .map(|(key, value)| {
            let name = if key == UNKNOWN {
                key
            } else {
                format!("Semester {}", key)
            };
            ChartPoint { name, value }
        })
        .collect()
}

/// The `n` largest deposits, largest first. Equal deposits keep input order.
pub fn top_fee_records(records: &[StudentRecord], n: usize) -> Vec<FeePoint> {
    let mut out: Vec<FeePoint> = records
        .iter()
        .map(|r| FeePoint {
            name: key_or_unknown(r.fields.full_name.as_deref()),
            deposited: parse_leading_int(r.fields.fee_deposited.as_deref().unwrap_or("")),
            pending: parse_leading_int(r.fields.pending_fee.as_deref().unwrap_or("")),
        })
        .collect();
    // sort_by is stable
    out.sort_by(|a, b| b.deposited.cmp(&a.deposited));
    out.truncate(n);
    out
}

pub fn total_fee_collected(records: &[StudentRecord]) -> i64 {
    records
        .iter()
        .map(|r| parse_leading_int(r.fields.fee_deposited.as_deref().unwrap_or("")))
        .fold(0i64, |acc, v| acc.saturating_add(v))
}

/// Distinct programs, with missing and empty programs folded into `"Unknown"`.
pub fn distinct_program_count(records: &[StudentRecord]) -> usize {
    records
        .iter()
        .map(|r| key_or_unknown(r.fields.program.as_deref()))
        .collect::<HashSet<_>>()
        .len()
}

pub fn dashboard_summary(records: &[StudentRecord]) -> Summary {
    Summary {
        total_students: records.len(),
        program_count: distinct_program_count(records),
        total_fee_collected: total_fee_collected(records),
    }
}
