//! Runs the whole map generation: boundaries, aggregation, pies, document.

use std::path::PathBuf;

use chrono::Local;
use itertools::Itertools;

use crate::aggregate::{PivotTable, RegionSummary, merge_centroids, total_value_by_region};
use crate::config::Config;
use crate::csv_reader::{SalesRecord, read_sales_csv};
use crate::error::{Result, SalesMapError};
use crate::render::{
    ChoroplethLayer, ChoroplethScale, ChoroplethStyle, MapDocument, Marker, PieGlyph, PieOptions,
    svg_utils::{fmt_number, html_encode},
};
use crate::topology::{Topology, centroid_table};

/// Summary of one run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub regions: usize,
    pub markers: usize,
    pub skipped_markers: Vec<String>,
    pub unmatched_features: usize,
    pub products: Vec<String>,
    pub output: PathBuf,
}

/// Loads the configured inputs, builds the map and writes it.
pub fn run(config: &Config) -> Result<PipelineReport> {
    log::info!("reading boundaries from {}", config.input.geo_path.display());
    let topology = Topology::load(&config.input.geo_path)?;

    log::info!("reading sales from {}", config.input.data_path.display());
    let records = read_sales_csv(&config.input.data_path)?;

    let (document, mut report) = build_document(config, &topology, &records)?;
    document.save(&config.output.path)?;
    report.output = config.output.path.clone();
    Ok(report)
}

/// Builds the document from already loaded inputs.
pub fn build_document(
    config: &Config,
    topology: &Topology,
    records: &[SalesRecord],
) -> Result<(MapDocument, PipelineReport)> {
    if records.is_empty() {
        return Err(SalesMapError::EmptyData);
    }
    let object = config.input.topojson_object.as_str();
    let key_property = config.input.key_property.as_str();

    // 1. centroids
    let regions = topology.regions(object, key_property)?;
    let centroids = centroid_table(&regions);
    log::info!("{} regions, {} with a centroid", regions.len(), centroids.len());

    // 2. aggregation
    let totals = total_value_by_region(records);
    let pivot = PivotTable::build(records)?;
    log::debug!("pivot columns: {}", pivot.flat_columns().iter().join(", "));
    let summaries = merge_centroids(&pivot, &centroids);

    // 3. pies -> markers
    let opts = PieOptions {
        size_scale: config.glyph.size_scale,
        colors: &config.glyph.colors,
    };
    let mut markers = Vec::with_capacity(summaries.len());
    let mut skipped = Vec::new();
    for summary in &summaries {
        let Some((lat, lon)) = summary.coordinates else {
            log::warn!("no boundary for region '{}', marker skipped", summary.region);
            skipped.push(summary.region.clone());
            continue;
        };
        let glyph = PieGlyph::render(&summary.pie_values(), summary.sum_of_qty, &opts);
        log::debug!(
            "region '{}': sum of qty {}, pie {:.2}pt",
            summary.region,
            summary.sum_of_qty,
            glyph.size_pt
        );
        markers.push(Marker {
            lat,
            lon,
            icon: glyph.svg,
            icon_size: config.glyph.icon_size_px,
            popup: popup_html(pivot.products(), summary),
            popup_width: config.glyph.popup_width_px,
        });
    }

    // 4. choropleth + document
    let scale = ChoroplethScale::new(
        totals.values().copied(),
        config.color_scheme()?,
        config.map.bins,
    );
    let layer = ChoroplethLayer::build(
        topology.to_geojson(object)?,
        &totals,
        key_property,
        &scale,
        ChoroplethStyle {
            fill_opacity: config.map.fill_opacity,
            line_opacity: config.map.line_opacity,
        },
    );
    if layer.unmatched > 0 {
        log::info!("{} boundaries have no sales value", layer.unmatched);
    }

    let report = PipelineReport {
        regions: summaries.len(),
        markers: markers.len(),
        skipped_markers: skipped,
        unmatched_features: layer.unmatched,
        products: pivot.products().to_vec(),
        output: PathBuf::new(),
    };

    let document = MapDocument {
        title: config.map.title.clone(),
        center: config.map.center,
        zoom: config.map.zoom,
        choropleth: layer.geojson,
        scale,
        legend_name: config.map.legend_name.clone(),
        markers,
        pie_legend_title: config.legend.title.clone(),
        products: pivot.products().to_vec(),
        palette: config.glyph.colors.clone(),
        generated_at: Local::now(),
    };

    Ok((document, report))
}

/// `<product>: <qty>` per product, one per line
pub fn popup_html(products: &[String], summary: &RegionSummary) -> String {
    products
        .iter()
        .zip(&summary.quantities)
        .map(|(name, qty)| {
            let qty = qty.map(fmt_number).unwrap_or_else(|| "n/a".to_string());
            format!("{}: {}", html_encode(name), qty)
        })
        .join("<br>\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::read_sales_from_reader;
    use crate::test_support::{SALES_CSV, TWO_SQUARES_TOPOJSON};
    use tempfile::TempDir;

    fn inputs() -> (Topology, Vec<SalesRecord>) {
        (
            Topology::from_reader(TWO_SQUARES_TOPOJSON.as_bytes()).unwrap(),
            read_sales_from_reader(SALES_CSV.as_bytes()).unwrap(),
        )
    }

    #[test]
    fn test_build_document() {
        let (topo, records) = inputs();
        let (doc, report) = build_document(&Config::default(), &topo, &records).unwrap();

        assert_eq!(report.regions, 3);
        assert_eq!(report.markers, 2);
        assert_eq!(report.skipped_markers, vec!["C"]);
        assert_eq!(report.unmatched_features, 0);
        assert_eq!(report.products, vec!["Product 1", "Product 2", "Product 3"]);

        let a = &doc.markers[0];
        assert!((a.lat - 41.0).abs() < 1e-9);
        assert!((a.lon - 10.25).abs() < 1e-9);
        assert_eq!(a.popup, "Product 1: 10<br>\nProduct 2: 30<br>\nProduct 3: 60");
        assert_eq!(a.icon_size, 70);
        assert_eq!(doc.markers[1].popup, "Product 1: 15<br>\nProduct 2: 5<br>\nProduct 3: n/a");

        // totals: A 10000 (max), B 2000, C 10 (min) -> class width 1665
        let features = doc.choropleth["features"].as_array().unwrap();
        assert_eq!(features[0]["properties"]["fill"], "#006837");
        assert_eq!(features[1]["properties"]["fill"], "#d9f0a3");
    }

    #[test]
    fn test_boundary_without_sales_is_unmatched() {
        let (topo, records) = inputs();
        let records: Vec<_> = records.into_iter().filter(|r| r.region != "B").collect();
        let (doc, report) = build_document(&Config::default(), &topo, &records).unwrap();

        // A has sales, B has none; C has no boundary and is not a feature
        assert_eq!(report.unmatched_features, 1);
        assert_eq!(report.skipped_markers, vec!["C"]);
        let features = doc.choropleth["features"].as_array().unwrap();
        assert_eq!(features[1]["properties"]["fill"], "black");
    }

    #[test]
    fn test_empty_records() {
        let (topo, _) = inputs();
        let err = build_document(&Config::default(), &topo, &[]).unwrap_err();
        assert!(matches!(err, SalesMapError::EmptyData));
    }

    #[test]
    fn test_wrong_object_name() {
        let (topo, records) = inputs();
        let mut config = Config::default();
        config.input.topojson_object = "regions".to_string();
        assert!(matches!(
            build_document(&config, &topo, &records),
            Err(SalesMapError::UnknownObject(_))
        ));
    }

    #[test]
    fn test_run_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let geo_path = temp_dir.path().join("Geolevel.json");
        let data_path = temp_dir.path().join("data.csv");
        std::fs::write(&geo_path, TWO_SQUARES_TOPOJSON).unwrap();
        std::fs::write(&data_path, SALES_CSV).unwrap();

        let mut config = Config::default();
        config.input.geo_path = geo_path;
        config.input.data_path = data_path;
        config.output.path = temp_dir.path().join("index.html");

        let report = run(&config).unwrap();
        assert_eq!(report.output, config.output.path);
        assert_eq!(report.markers, 2);

        let html = std::fs::read_to_string(&config.output.path).unwrap();
        assert!(html.contains("Sales Distribution by Regions"));
        assert!(html.contains("Product 3"));
        assert_eq!(html.matches("\"popup_width\":100").count(), 2);
        assert!(html.contains("\"fill\":\"#006837\""));
    }

    #[test]
    fn test_run_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.input.geo_path = temp_dir.path().join("missing.json");
        config.output.path = temp_dir.path().join("index.html");
        assert!(matches!(run(&config), Err(SalesMapError::ReadFile { .. })));
        assert!(!config.output.path.exists());
    }
}
