pub mod choropleth;
pub mod colors;
pub mod document;
pub mod legend;
pub mod pie;
pub mod svg_utils;

pub use choropleth::{ChoroplethLayer, ChoroplethScale, ChoroplethStyle};
pub use colors::{ColorScheme, product_color};
pub use document::{MapDocument, Marker};
pub use pie::{PieGlyph, PieOptions, digit_count, glyph_size_inches};
