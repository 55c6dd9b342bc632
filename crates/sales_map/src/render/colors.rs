use strum_macros::{Display, EnumIter, EnumString};

/// ColorBrewer 逐次配色（6クラス）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum ColorScheme {
    YlGn,
    YlOrRd,
    Blues,
    Greens,
    PuBu,
    BuGn,
}

impl ColorScheme {
    /// 基準となる6色（薄い色→濃い色）
    pub fn anchors(self) -> [&'static str; 6] {
        use ColorScheme::*;
        match self {
            YlGn => ["#ffffcc", "#d9f0a3", "#addd8e", "#78c679", "#31a354", "#006837"],
            YlOrRd => ["#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#f03b20", "#bd0026"],
            Blues => ["#eff3ff", "#c6dbef", "#9ecae1", "#6baed6", "#3182bd", "#08519c"],
            Greens => ["#edf8e9", "#c7e9c0", "#a1d99b", "#74c476", "#31a354", "#006d2c"],
            PuBu => ["#f1eef6", "#d0d1e6", "#a6bddb", "#74a9cf", "#2b8cbe", "#045a8d"],
            BuGn => ["#edf8fb", "#ccece6", "#99d8c9", "#66c2a4", "#2ca25f", "#006d2c"],
        }
    }

    /// n色のパレット。6色以外は基準色を線形補間する
    pub fn colors(self, n: usize) -> Vec<String> {
        let anchors = self.anchors();
        if n == anchors.len() {
            return anchors.iter().map(|c| c.to_string()).collect();
        }
        if n == 1 {
            return vec![anchors[anchors.len() - 1].to_string()];
        }
        let rgb: Vec<[u8; 3]> = anchors.iter().filter_map(|c| parse_hex(c)).collect();
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64 * (rgb.len() - 1) as f64;
                let lo = t.floor() as usize;
                let hi = (lo + 1).min(rgb.len() - 1);
                let f = t - lo as f64;
                let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
                to_hex([
                    mix(rgb[lo][0], rgb[hi][0]),
                    mix(rgb[lo][1], rgb[hi][1]),
                    mix(rgb[lo][2], rgb[hi][2]),
                ])
            })
            .collect()
    }
}

/// 製品の色（パレットを循環）
pub fn product_color(index: usize, palette: &[String]) -> &str {
    if palette.is_empty() {
        return "#808080";
    }
    &palette[index % palette.len()]
}

/// "#rrggbb" → [r, g, b]
pub fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}
