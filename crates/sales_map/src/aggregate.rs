//! Region/product aggregation: totals, pivot and the centroid join.

use crate::constants::{QTY_HEADER, VALUE_HEADER};
use crate::csv_reader::{SalesRecord, product_order};
use crate::error::{Result, SalesMapError};
use crate::topology::RegionCentroid;

use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Measures carried by the pivot, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Measure {
    #[strum(serialize = "Somme de QTY")]
    Qty,
    #[strum(serialize = "Somme de Value")]
    Value,
}

impl Measure {
    pub fn header(self) -> &'static str {
        match self {
            Measure::Qty => QTY_HEADER,
            Measure::Value => VALUE_HEADER,
        }
    }
}

/// Measures of one (region, product) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotCell {
    pub qty: f64,
    pub value: f64,
}

impl PivotCell {
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Qty => self.qty,
            Measure::Value => self.value,
        }
    }
}

/// One pivot row: a region and its cells aligned with [`PivotTable::products`]
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub region: String,
    pub cells: Vec<Option<PivotCell>>,
}

impl PivotRow {
    /// `Sum of QTY`; missing cells are skipped
    pub fn sum_of_qty(&self) -> f64 {
        self.cells.iter().flatten().map(|c| c.qty).sum()
    }

    pub fn quantities(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(|c| c.map(|c| c.qty)).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(|c| c.map(|c| c.value)).collect()
    }
}

/// Region x product table. Rows are sorted by region key,
/// columns follow the first appearance of each product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    products: Vec<String>,
    rows: Vec<PivotRow>,
}

impl PivotTable {
    /// Builds the pivot. Each (region, product) pair must appear at most once.
    pub fn build(records: &[SalesRecord]) -> Result<Self> {
        let products = product_order(records);
        let column_of: BTreeMap<&str, usize> = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut by_region: BTreeMap<&str, Vec<Option<PivotCell>>> = BTreeMap::new();
        for rec in records {
            let cells = by_region
                .entry(rec.region.as_str())
                .or_insert_with(|| vec![None; products.len()]);
            let col = column_of[rec.product.as_str()];
            if cells[col].is_some() {
                return Err(SalesMapError::DuplicateEntry {
                    region: rec.region.clone(),
                    product: rec.product.clone(),
                });
            }
            cells[col] = Some(PivotCell {
                qty: rec.qty,
                value: rec.value,
            });
        }

        let rows = by_region
            .into_iter()
            .map(|(region, cells)| PivotRow {
                region: region.to_string(),
                cells,
            })
            .collect();

        Ok(Self { products, rows })
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flattened column labels, `<measure>_<product>`, measure-major
    pub fn flat_columns(&self) -> Vec<String> {
        Measure::iter()
            .flat_map(|m| self.products.iter().map(move |p| format!("{}_{}", m, p)))
            .collect()
    }

    /// Looks up a cell by flattened label
    pub fn value_at(&self, region: &str, column: &str) -> Option<f64> {
        let row = self.rows.iter().find(|r| r.region == region)?;
        Measure::iter().find_map(|m| {
            let product = column.strip_prefix(m.header())?.strip_prefix('_')?;
            let idx = self.products.iter().position(|p| p == product)?;
            row.cells[idx].map(|c| c.get(m))
        })
    }
}

/// Sum of value per region, sorted by region key
pub fn total_value_by_region(records: &[SalesRecord]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for rec in records {
        *totals.entry(rec.region.clone()).or_insert(0.0) += rec.value;
    }
    totals
}

/// A pivot row joined with its region's representative point
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: String,
    pub quantities: Vec<Option<f64>>,
    pub values: Vec<Option<f64>>,
    pub sum_of_qty: f64,
    pub coordinates: Option<(f64, f64)>,
}

impl RegionSummary {
    /// Quantities with missing cells as 0, for the pie
    pub fn pie_values(&self) -> Vec<f64> {
        self.quantities.iter().map(|q| q.unwrap_or(0.0)).collect()
    }
}

/// Left join of the pivot with centroids on region key
pub fn merge_centroids(
    pivot: &PivotTable,
    centroids: &BTreeMap<String, RegionCentroid>,
) -> Vec<RegionSummary> {
    pivot
        .rows()
        .iter()
        .map(|row| {
            let coordinates = centroids.get(&row.region).map(|c| (c.lat, c.lon));
            if coordinates.is_none() {
                log::debug!("region '{}' has no matching boundary", row.region);
            }
            RegionSummary {
                region: row.region.clone(),
                quantities: row.quantities(),
                values: row.values(),
                sum_of_qty: row.sum_of_qty(),
                coordinates,
            }
        })
        .collect()
}
