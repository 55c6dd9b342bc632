use std::collections::BTreeMap;

use serde_json::{Value, json};

use super::colors::ColorScheme;
use crate::constants::NAN_FILL_COLOR;
use crate::topology::property_key;

/// 階級区分（最小値〜最大値を等間隔に bins 分割）
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethScale {
    /// bins + 1 個の境界値
    pub thresholds: Vec<f64>,
    pub colors: Vec<String>,
}

impl ChoroplethScale {
    pub fn new<I>(values: I, scheme: ColorScheme, bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let bins = bins.max(1);
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        let thresholds = if min.is_finite() {
            (0..=bins)
                .map(|i| min + (max - min) * i as f64 / bins as f64)
                .collect()
        } else {
            Vec::new()
        };

        Self {
            thresholds,
            colors: scheme.colors(bins),
        }
    }

    /// 値に対応する色。階級は (下限, 上限] で、最小値は第1階級
    pub fn color_for(&self, value: Option<f64>) -> &str {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return NAN_FILL_COLOR;
        };
        if self.thresholds.len() < 2 {
            return NAN_FILL_COLOR;
        }
        let idx = self.thresholds[1..]
            .iter()
            .position(|&upper| v <= upper)
            .unwrap_or(self.colors.len() - 1);
        &self.colors[idx.min(self.colors.len() - 1)]
    }

    pub fn min(&self) -> Option<f64> {
        self.thresholds.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.thresholds.last().copied()
    }
}

/// 塗りのスタイル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChoroplethStyle {
    pub fill_opacity: f64,
    pub line_opacity: f64,
}

/// 塗り色を書き込んだ choropleth レイヤー
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethLayer {
    pub geojson: Value,
    /// 集計値を持つ Feature の数
    pub matched: usize,
    /// 集計値を持たない Feature の数（キーなしを含む）
    pub unmatched: usize,
}

impl ChoroplethLayer {
    /// 各 Feature の properties に塗り色・不透明度・集計値を書き込む
    pub fn build(
        mut geojson: Value,
        totals: &BTreeMap<String, f64>,
        key_property: &str,
        scale: &ChoroplethScale,
        style: ChoroplethStyle,
    ) -> Self {
        let (mut matched, mut unmatched) = (0, 0);
        if let Some(features) = geojson.get_mut("features").and_then(Value::as_array_mut) {
            for feature in features.iter_mut() {
                let key = feature
                    .get("properties")
                    .and_then(|p| p.get(key_property))
                    .and_then(property_key);
                let total = key.as_ref().and_then(|k| totals.get(k)).copied();
                if total.is_some() {
                    matched += 1;
                } else {
                    unmatched += 1;
                    log::debug!("no sales value for feature {:?}", key);
                }

                let fill = scale.color_for(total).to_string();
                if !feature.get("properties").is_some_and(Value::is_object) {
                    feature["properties"] = json!({});
                }
                let props = &mut feature["properties"];
                props["fill"] = json!(fill);
                props["fill_opacity"] = json!(style.fill_opacity);
                props["line_opacity"] = json!(style.line_opacity);
                props["total_value"] = json!(total);
            }
        }
        Self {
            geojson,
            matched,
            unmatched,
        }
    }
}
