use std::f64::consts::PI;
use std::fmt::Write;

use super::colors::product_color;
use crate::constants::POINTS_PER_INCH;

/// 円の半径 / 描画領域の半辺（軸範囲 ±1.25 に半径 1 の円を描く）
const RADIUS_RATIO: f64 = 1.0 / 1.25;

/// 整数部の桁数（0 は 1 桁）
pub fn digit_count(total: f64) -> u32 {
    let int = total.abs().trunc();
    if !int.is_finite() || int < 1.0 {
        return 1;
    }
    format!("{:.0}", int).len() as u32
}

/// 合計値から円グラフの一辺 [inch] を求める
///
/// `total / scale^digits` なので、同じ桁数の中では合計に比例し、
/// 桁が上がるたびに `scale` 分の 1 に縮む
pub fn glyph_size_inches(total: f64, scale: f64) -> f64 {
    total * (1.0 / scale.powi(digit_count(total) as i32))
}

/// 円グラフ描画オプション
#[derive(Debug, Clone)]
pub struct PieOptions<'a> {
    pub size_scale: f64,
    pub colors: &'a [String],
}

/// 1地域分の円グラフSVG
#[derive(Debug, Clone, PartialEq)]
pub struct PieGlyph {
    pub svg: String,
    pub size_pt: f64,
}

impl PieGlyph {
    /// 製品別数量から円グラフを作成
    ///
    /// 3時方向から反時計回りに、割合 q/Σq の扇形を並べる。
    /// 出力に改行は含めない
    pub fn render(quantities: &[f64], total: f64, opt: &PieOptions) -> Self {
        let size_pt = (glyph_size_inches(total, opt.size_scale) * POINTS_PER_INCH).max(0.0);
        let half = size_pt / 2.0;
        let r = half * RADIUS_RATIO;

        let mut svg = String::new();
        // String への write! は失敗しない
        let _ = write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{s:.2}pt" height="{s:.2}pt" viewBox="0 0 {s:.2} {s:.2}">"##,
            s = size_pt
        );

        let slices: Vec<f64> = quantities
            .iter()
            .map(|&q| if q.is_finite() && q > 0.0 { q } else { 0.0 })
            .collect();
        let sum: f64 = slices.iter().sum();

        if sum > 0.0 && r > 0.0 {
            let _ = write!(svg, r##"<g id="pie">"##);
            let mut start = 0.0f64;
            for (i, &q) in slices.iter().enumerate() {
                if q == 0.0 {
                    continue;
                }
                let frac = q / sum;
                let color = product_color(i, opt.colors);
                if frac >= 1.0 - 1e-12 {
                    let _ = write!(
                        svg,
                        r##"<circle cx="{c:.2}" cy="{c:.2}" r="{r:.2}" fill="{color}"/>"##,
                        c = half,
                        r = r,
                        color = color
                    );
                    break;
                }
                let end = start + frac * 2.0 * PI;
                let (x0, y0) = polar(half, r, start);
                let (x1, y1) = polar(half, r, end);
                let large_arc = u8::from(frac > 0.5);
                let _ = write!(
                    svg,
                    r##"<path d="M {c:.2} {c:.2} L {x0:.2} {y0:.2} A {r:.2} {r:.2} 0 {la} 0 {x1:.2} {y1:.2} Z" fill="{color}"/>"##,
                    c = half,
                    x0 = x0,
                    y0 = y0,
                    r = r,
                    la = large_arc,
                    x1 = x1,
                    y1 = y1,
                    color = color
                );
                start = end;
            }
            let _ = write!(svg, "</g>");
        }
        svg.push_str("</svg>");

        Self { svg, size_pt }
    }
}

/// 角度θ（反時計回り、3時方向が0）の円周上の点（SVG座標、Y軸下向き）
fn polar(center: f64, r: f64, theta: f64) -> (f64, f64) {
    (center + r * theta.cos(), center - r * theta.sin())
}
