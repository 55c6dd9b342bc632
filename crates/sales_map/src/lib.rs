pub mod aggregate;
pub mod config;
pub mod constants;
pub mod csv_reader;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod topology;

#[cfg(test)]
mod test_support;

pub use aggregate::{PivotTable, RegionSummary, merge_centroids, total_value_by_region};
pub use config::Config;
pub use csv_reader::{SalesRecord, read_sales_csv};
pub use error::SalesMapError;
pub use pipeline::{PipelineReport, build_document, run};
pub use render::{MapDocument, PieGlyph};
pub use topology::{Region, RegionCentroid, Topology, centroid_table};
