use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;

use super::choropleth::ChoroplethScale;
use super::legend::{write_colorbar, write_pie_legend, write_title};
use super::svg_utils::{html_encode, script_json};
use crate::constants::{LEAFLET_CSS, LEAFLET_JS};
use crate::error::{Result, SalesMapError};

/// 円グラフアイコン付きマーカー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    /// divIcon に入れる SVG
    pub icon: String,
    pub icon_size: u32,
    /// ポップアップ HTML
    pub popup: String,
    pub popup_width: u32,
}

/// 出力HTML一式
#[derive(Debug, Clone)]
pub struct MapDocument {
    pub title: String,
    pub center: [f64; 2],
    pub zoom: u8,
    /// 塗り色を書き込み済みの FeatureCollection
    pub choropleth: Value,
    pub scale: ChoroplethScale,
    pub legend_name: String,
    pub markers: Vec<Marker>,
    pub pie_legend_title: String,
    pub products: Vec<String>,
    pub palette: Vec<String>,
    pub generated_at: DateTime<Local>,
}

impl MapDocument {
    /// HTML を書き出す
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let geojson = script_json(&self.choropleth)?;
        let markers = script_json(&self.markers)?;

        writeln!(
            w,
            r##"<!DOCTYPE html>
<html>
<head>
<meta http-equiv="content-type" content="text/html; charset=UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no" />
<meta name="generated" content="{generated}" />
<title>{title}</title>
<link rel="stylesheet" href="{css}"/>
<script src="{js}"></script>
<style>
    html, body {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
    #map {{ position: absolute; top: 0; bottom: 0; right: 0; left: 0; }}
    .leaflet-div-icon.pie-icon {{ background: transparent; border: none; }}
    .pie-icon svg {{ display: block; margin: auto; }}
</style>
</head>
<body>
<div class="folium-map" id="map"></div>"##,
            generated = self.generated_at.to_rfc3339(),
            title = html_encode(&self.title),
            css = LEAFLET_CSS,
            js = LEAFLET_JS
        )?;

        write_colorbar(w, &self.scale, &self.legend_name)?;
        write_title(w, &self.title)?;
        write_pie_legend(w, &self.pie_legend_title, &self.products, &self.palette)?;

        writeln!(
            w,
            r##"<script>
var map = L.map("map", {{ center: [{lat}, {lon}], zoom: {zoom}, zoomControl: true, preferCanvas: false }});

var choropleth = L.geoJson({geojson}, {{
    style: function(feature) {{
        var p = feature.properties;
        return {{ fillColor: p.fill, color: "black", weight: 1, opacity: p.line_opacity, fillOpacity: p.fill_opacity }};
    }}
}}).addTo(map);

var markers = {markers};
markers.forEach(function(m) {{
    var icon = L.divIcon({{ html: m.icon, iconSize: [m.icon_size, m.icon_size], className: "pie-icon" }});
    L.marker([m.lat, m.lon], {{ icon: icon }})
        .bindPopup(m.popup, {{ minWidth: m.popup_width, maxWidth: m.popup_width }})
        .addTo(map);
}});
</script>
</body>
</html>"##,
            lat = self.center[0],
            lon = self.center[1],
            zoom = self.zoom,
            geojson = geojson,
            markers = markers
        )?;
        Ok(())
    }

    /// HTML 文字列として生成
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// 指定パスに保存
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| SalesMapError::WriteFile {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(path).map_err(|e| SalesMapError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut f = BufWriter::new(file);
        self.write_to(&mut f)?;
        f.flush()?;
        log::info!("map written to {}", path.display());
        Ok(())
    }
}
