use crate::record::{StudentRecord, STORE_FIELDS};
use anyhow::Context;
use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::collections::HashSet;

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// `student_records_<YYYY-MM-DD>.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("student_records_{}.csv", date.format("%Y-%m-%d"))
}

/// Every field name seen across `records`, in first-seen order, without the
/// store-owned `id` and `createdAt`.
pub fn discover_columns(records: &[StudentRecord]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for r in records {
        for name in r.fields.field_names() {
            if STORE_FIELDS.contains(&name) {
                continue;
            }
            if seen.insert(name) {
                out.push(name.to_string());
            }
        }
    }
    out
}

/// Renders `records` as CSV, or `None` when there is nothing to export.
///
/// The header row is written bare. Every data field is quoted, with embedded
/// quotes doubled, and absent fields come out as `""`.
pub fn export_csv(records: &[StudentRecord]) -> anyhow::Result<Option<String>> {
    if records.is_empty() {
        return Ok(None);
    }
    let columns = discover_columns(records);

    let mut buf = columns.join(",").into_bytes();
    buf.push(b'\n');
    // csv writes a lone `""` for an empty record; a row with no columns is blank.
    if columns.is_empty() {
        buf.extend(std::iter::repeat(b'\n').take(records.len()));
        return Ok(Some(String::from_utf8(buf).context("csv is not utf-8")?));
    }

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(buf);
    for r in records {
        let row = columns
            .iter()
            .map(|c| r.fields.text(c).map(|v| v.into_owned()).unwrap_or_default());
        wtr.write_record(row)
            .with_context(|| format!("failed to encode record {}", r.id))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush csv: {}", e.error()))?;
    Ok(Some(String::from_utf8(bytes).context("csv is not utf-8")?))
}
