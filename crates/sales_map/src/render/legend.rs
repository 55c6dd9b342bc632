use std::io::Write;

use super::choropleth::ChoroplethScale;
use super::colors::product_color;
use super::svg_utils::{fmt_number, html_encode};
use crate::constants::{LEGEND_BACKGROUND_HEIGHT, LEGEND_CONTENT_HEIGHT};

/// カラーバーの寸法 [px]
const BAR_WIDTH: f32 = 400.0;
const BAR_HEIGHT: f32 = 10.0;
const BAR_MARGIN: f32 = 10.0;

/// 地図タイトル
pub fn write_title<W: Write>(w: &mut W, title: &str) -> std::io::Result<()> {
    writeln!(
        w,
        r##"<h1 style="position:absolute;z-index:100000;left:38vw;top:5vh" >{}</h1>"##,
        html_encode(title)
    )
}

/// 円グラフの凡例（製品名と色）
///
/// 高さは製品数に比例させる（内容 27px/製品、背景 54px/製品）
pub fn write_pie_legend<W: Write>(
    w: &mut W,
    title: &str,
    products: &[String],
    palette: &[String],
) -> std::io::Result<()> {
    let n = products.len() as u32;
    writeln!(
        w,
        r##"<div style="
    position: fixed;
    bottom: 100px;
    left: 50px;
    width: 250px;
    height: {h}px;
    z-index:9999;
    font-size:14px;
    ">
    <h4 style="margin-left: 40px;">{title}</h4>"##,
        h = LEGEND_CONTENT_HEIGHT * n,
        title = html_encode(title)
    )?;

    for (i, name) in products.iter().enumerate() {
        writeln!(
            w,
            r##"    <p><a style="color:{color};font-size:150%;margin-left:20px;">&#9724;</a>&emsp;{name}</p>"##,
            color = product_color(i, palette),
            name = html_encode(name)
        )?;
    }

    writeln!(
        w,
        r##"</div>
<div style="
    position: fixed;
    bottom: 23px;
    left: 50px;
    width: 150px;
    height: {h}px;
    z-index:9998;
    font-size:14px;
    background-color: #ffffff;
    border: 2px solid #000;
    opacity: 0.7;
    ">
</div>"##,
        h = LEGEND_BACKGROUND_HEIGHT * n
    )
}

/// 階級区分のカラーバー（右上、SVG）
pub fn write_colorbar<W: Write>(
    w: &mut W,
    scale: &ChoroplethScale,
    legend_name: &str,
) -> std::io::Result<()> {
    let classes = scale.colors.len().max(1);
    let cell_w = BAR_WIDTH / classes as f32;
    let width = BAR_WIDTH + BAR_MARGIN * 2.0;
    let height = BAR_HEIGHT + 40.0;

    writeln!(
        w,
        r##"<div class="colorbar" style="position: fixed; top: 10px; right: 10px; z-index: 9999; background: rgba(255,255,255,0.8); padding: 2px;">"##
    )?;
    writeln!(
        w,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"##,
        w = width,
        h = height
    )?;

    for (i, color) in scale.colors.iter().enumerate() {
        writeln!(
            w,
            r##"<rect x="{x:.1}" y="{y:.1}" width="{cw:.1}" height="{bh:.1}" fill="{color}" stroke="none"/>"##,
            x = BAR_MARGIN + cell_w * i as f32,
            y = BAR_MARGIN,
            cw = cell_w,
            bh = BAR_HEIGHT,
            color = color
        )?;
    }

    // 目盛り（境界値）
    let step = if scale.thresholds.len() > 1 {
        BAR_WIDTH / (scale.thresholds.len() - 1) as f32
    } else {
        0.0
    };
    for (i, t) in scale.thresholds.iter().enumerate() {
        let x = BAR_MARGIN + step * i as f32;
        writeln!(
            w,
            r##"<line x1="{x:.1}" y1="{y0:.1}" x2="{x:.1}" y2="{y1:.1}" stroke="#000" stroke-width="1"/>"##,
            x = x,
            y0 = BAR_MARGIN,
            y1 = BAR_MARGIN + BAR_HEIGHT + 4.0
        )?;
        writeln!(
            w,
            r##"<text x="{x:.1}" y="{y:.1}" font-family="Arial, sans-serif" font-size="10px" text-anchor="middle" fill="#000">{label}</text>"##,
            x = x,
            y = BAR_MARGIN + BAR_HEIGHT + 14.0,
            label = fmt_number(*t)
        )?;
    }

    writeln!(
        w,
        r##"<text x="{x:.1}" y="{y:.1}" font-family="Arial, sans-serif" font-size="12px" fill="#000">{name}</text>"##,
        x = BAR_MARGIN,
        y = height - 4.0,
        name = html_encode(legend_name)
    )?;
    writeln!(w, "</svg>")?;
    writeln!(w, "</div>")
}
