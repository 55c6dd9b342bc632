/// Default input/output paths
pub const JSON_FILE_PATH: &str = "Geolevel.json";
pub const DATA_FILE_PATH: &str = "data.csv";
pub const OUTPUT_FILE_PATH: &str = "index.html";

/// TopoJSON object holding the regions, and the property used as region key
pub const TOPOJSON_OBJECT: &str = "test2";
pub const REGION_KEY_PROPERTY: &str = "KAM8";

/// Expected headers in the sales CSV
pub const REGION_HEADER: &str = "Geolevel 1";
pub const PRODUCT_HEADER: &str = "Product";
pub const QTY_HEADER: &str = "Somme de QTY";
pub const VALUE_HEADER: &str = "Somme de Value";

/// Titles
pub const MAP_TITLE: &str = "Sales Distribution by Regions";
pub const PIE_LEGEND_TITLE: &str = "Products";
pub const MAP_LEGEND_TITLE: &str = "Sum of Value";

/// Pie colors (cycled by product position)
pub const PRODUCT_COLORS: [&str; 3] = ["#e6194b", "#19e6b4", "#318CE7"];
pub const MAP_LEGEND_COLOR: &str = "YlGn";

/// The smaller the value, the bigger the pie gets.
pub const PIE_CHART_SIZE_SCALE: f64 = 9.0;
/// SVG points per inch
pub const POINTS_PER_INCH: f64 = 72.0;
/// divIcon size [px]
pub const ICON_SIZE_PX: u32 = 70;
pub const POPUP_WIDTH_PX: u32 = 100;

/// Map view
pub const MAP_CENTER: (f64, f64) = (46.475066, 2.415322);
pub const MAP_ZOOM: u8 = 6;

/// Choropleth styling
pub const CHOROPLETH_BINS: usize = 6;
pub const FILL_OPACITY: f64 = 0.7;
pub const LINE_OPACITY: f64 = 0.1;
pub const NAN_FILL_COLOR: &str = "black";

/// Pie legend box heights per product [px]
pub const LEGEND_CONTENT_HEIGHT: u32 = 27;
pub const LEGEND_BACKGROUND_HEIGHT: u32 = 54;

/// Leaflet assets
pub const LEAFLET_JS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js";
pub const LEAFLET_CSS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.css";
