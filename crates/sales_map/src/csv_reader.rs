use crate::constants::{PRODUCT_HEADER, QTY_HEADER, REGION_HEADER, VALUE_HEADER};
use crate::error::{Result, SalesMapError};

use csv::{ReaderBuilder, StringRecord, Trim};
use itertools::Itertools;
use std::io::Read;
use std::path::Path;

/// One row of the sales export: a (region, product) pair with its measures.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub region: String,
    pub product: String,
    pub qty: f64,
    pub value: f64,
}

/// Column positions of the required headers
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    region: usize,
    product: usize,
    qty: usize,
    value: usize,
}

/// Reads sales records from a CSV file
///
/// # Errors
/// Returns error if file cannot be read or CSV format is invalid
pub fn read_sales_csv<P: AsRef<Path>>(path: P) -> Result<Vec<SalesRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| SalesMapError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let records = read_sales_from_reader(file)?;
    log::info!("loaded {} sales rows from {}", records.len(), path.display());
    Ok(records)
}

/// Read CSV with `Geolevel 1,Product,Somme de QTY,Somme de Value` headers.
/// - Headers are located by name, so column order and extra columns don't matter
/// - Blank lines are skipped
/// - Empty numeric cells count as 0
pub fn read_sales_from_reader<R: Read>(reader: R) -> Result<Vec<SalesRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = locate_columns(&mut rdr)?;

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 2; // CSV rows are 1-indexed, +1 for header

        if let Some(record) = parse_record(&rec, row, columns)? {
            records.push(record);
        }
    }

    Ok(records)
}

/// Products in order of first appearance
pub fn product_order(records: &[SalesRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.product.as_str())
        .unique()
        .map(str::to_string)
        .collect()
}

fn locate_columns<R: Read>(csv_reader: &mut csv::Reader<R>) -> Result<ColumnIndex> {
    let headers = csv_reader
        .headers()
        .map_err(|e| SalesMapError::CsvHeader(format!("Failed to read headers: {}", e)))?;

    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| SalesMapError::CsvHeader(format!("Missing '{}' column", name)))
    };

    Ok(ColumnIndex {
        region: find(REGION_HEADER)?,
        product: find(PRODUCT_HEADER)?,
        qty: find(QTY_HEADER)?,
        value: find(VALUE_HEADER)?,
    })
}

fn parse_record(rec: &StringRecord, row: usize, cols: ColumnIndex) -> Result<Option<SalesRecord>> {
    if rec.iter().all(|f| f.trim().is_empty()) {
        return Ok(None);
    }

    let region = rec.get(cols.region).unwrap_or("");
    let product = rec.get(cols.product).unwrap_or("");
    if region.is_empty() || product.is_empty() {
        log::debug!("row {}: missing region or product, skipped", row);
        return Ok(None);
    }

    let qty = parse_number(rec.get(cols.qty).unwrap_or(""), row, QTY_HEADER)?;
    let value = parse_number(rec.get(cols.value).unwrap_or(""), row, VALUE_HEADER)?;

    Ok(Some(SalesRecord {
        region: region.to_string(),
        product: product.to_string(),
        qty,
        value,
    }))
}

/// Parses a measure cell. Accepts `,` as decimal separator and
/// spaces as thousands separators (French exports).
fn parse_number(raw: &str, row: usize, column: &str) -> Result<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        log::debug!("row {}: empty '{}' treated as 0", row, column);
        return Ok(0.0);
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SalesMapError::NumberParse {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}
