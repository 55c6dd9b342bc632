use crate::{
    constants::{
        CHOROPLETH_BINS, DATA_FILE_PATH, FILL_OPACITY, ICON_SIZE_PX, JSON_FILE_PATH, LINE_OPACITY,
        MAP_CENTER, MAP_LEGEND_COLOR, MAP_LEGEND_TITLE, MAP_TITLE, MAP_ZOOM, OUTPUT_FILE_PATH,
        PIE_CHART_SIZE_SCALE, PIE_LEGEND_TITLE, POPUP_WIDTH_PX, PRODUCT_COLORS,
        REGION_KEY_PROPERTY, TOPOJSON_OBJECT,
    },
    error::{Result, SalesMapError},
    render::colors::ColorScheme,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// メイン設定構造体
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub map: MapConfig,
    pub glyph: GlyphConfig,
    pub legend: LegendConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub data_path: PathBuf,
    pub geo_path: PathBuf,
    pub topojson_object: String,
    pub key_property: String, // 地域キーとして使うプロパティ名
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DATA_FILE_PATH),
            geo_path: PathBuf::from(JSON_FILE_PATH),
            topojson_object: TOPOJSON_OBJECT.to_string(),
            key_property: REGION_KEY_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(OUTPUT_FILE_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    pub center: [f64; 2], // [lat, lon]
    pub zoom: u8,
    pub legend_name: String,
    pub color_scheme: String, // "YlGn" | "YlOrRd" | "Blues" | ...
    pub bins: usize,
    pub fill_opacity: f64,
    pub line_opacity: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: MAP_TITLE.to_string(),
            center: [MAP_CENTER.0, MAP_CENTER.1],
            zoom: MAP_ZOOM,
            legend_name: MAP_LEGEND_TITLE.to_string(),
            color_scheme: MAP_LEGEND_COLOR.to_string(),
            bins: CHOROPLETH_BINS,
            fill_opacity: FILL_OPACITY,
            line_opacity: LINE_OPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GlyphConfig {
    /// 小さいほど円グラフが大きくなる（1 以下だと桁数で縮まないので 1 より大きいこと）
    pub size_scale: f64,
    pub colors: Vec<String>,
    pub icon_size_px: u32,
    pub popup_width_px: u32,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            size_scale: PIE_CHART_SIZE_SCALE,
            colors: PRODUCT_COLORS.iter().map(|c| c.to_string()).collect(),
            icon_size_px: ICON_SIZE_PX,
            popup_width_px: POPUP_WIDTH_PX,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LegendConfig {
    pub title: String,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            title: PIE_LEGEND_TITLE.to_string(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SalesMapError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            SalesMapError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<()> {
        let glyph = &self.glyph;
        if !(glyph.size_scale.is_finite() && glyph.size_scale > 1.0) {
            return Err(SalesMapError::Config(format!(
                "glyph.size_scale must be greater than 1, got {}",
                glyph.size_scale
            )));
        }
        if glyph.colors.is_empty() {
            return Err(SalesMapError::Config(
                "glyph.colors cannot be empty".to_string(),
            ));
        }
        if glyph.icon_size_px == 0 {
            return Err(SalesMapError::Config(
                "glyph.icon_size_px must be positive".to_string(),
            ));
        }

        let map = &self.map;
        if !(2..=9).contains(&map.bins) {
            return Err(SalesMapError::Config(format!(
                "map.bins must be between 2 and 9, got {}",
                map.bins
            )));
        }
        if map.color_scheme.parse::<ColorScheme>().is_err() {
            return Err(SalesMapError::Config(format!(
                "Unknown color scheme: {}",
                map.color_scheme
            )));
        }
        for (name, v) in [
            ("map.fill_opacity", map.fill_opacity),
            ("map.line_opacity", map.line_opacity),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(SalesMapError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, v
                )));
            }
        }

        // 入力オブジェクト名
        if self.input.topojson_object.trim().is_empty() || self.input.key_property.trim().is_empty() {
            return Err(SalesMapError::Config(
                "input.topojson_object and input.key_property cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// 地図の配色
    pub fn color_scheme(&self) -> Result<ColorScheme> {
        self.map
            .color_scheme
            .parse()
            .map_err(|_| SalesMapError::Config(format!("Unknown color scheme: {}", self.map.color_scheme)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input.data_path, PathBuf::from("data.csv"));
        assert_eq!(config.input.geo_path, PathBuf::from("Geolevel.json"));
        assert_eq!(config.output.path, PathBuf::from("index.html"));
        assert_eq!(config.glyph.colors.len(), 3);
        assert_eq!(config.map.zoom, 6);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[glyph]
size_scale = 8.5

[map]
title = "Ventes"
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.glyph.size_scale, 8.5);
        assert_eq!(config.map.title, "Ventes");
        assert_eq!(config.map.bins, 6);
        assert_eq!(config.input.key_property, "KAM8");
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let mut config = Config::default();
        for scale in [1.0, 0.5, 0.0, -9.0, f64::NAN] {
            config.glyph.size_scale = scale;
            assert!(matches!(config.validate(), Err(SalesMapError::Config(_))));
        }
        config.glyph.size_scale = 1.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let mut config = Config::default();
        config.map.color_scheme = "Rainbow".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bins_out_of_range() {
        let mut config = Config::default();
        config.map.bins = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_broken_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[glyph\nsize_scale = ").unwrap();
        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load_from_file("no/such/config.toml");
        assert!(result.is_err());
    }
}
