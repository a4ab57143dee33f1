//! Renders scenario results and the map style to PNG.

use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;
use urbanpulse_core::dashboard::{
    engine::{InMemoryMap, LayerKind, PaintValue, StyleLayer},
    metrics::{MetricsTable, TrendStyle},
};
use urbanpulse_schemas::geojson::FeatureCollection;

const BASELINE_COLOR: RGBColor = RGBColor(148, 163, 184);
const BACKGROUND_COLOR: RGBColor = RGBColor(241, 245, 249);

/// Parses `#rrggbb` paint colours.
fn parse_hex(color: &str) -> Option<RGBColor> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

fn trend_color(style: TrendStyle) -> RGBColor {
    match style {
        TrendStyle::Red => RGBColor(239, 68, 68),
        TrendStyle::Green => RGBColor(34, 197, 94),
        TrendStyle::Gray => BASELINE_COLOR,
    }
}

/// Draws one baseline/simulated bar pair per metric on a 2x2 grid.
pub fn plot_metrics_comparison(path: &Path, table: &MetricsTable) -> Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let title = format!("Scenario: {:.0}% fewer vehicles", table.reduction_pct);
    let root = root.titled(&title, ("sans-serif", 40))?;

    for (area, row) in root.split_evenly((2, 2)).iter().zip(&table.rows) {
        let top = row.before.max(row.after);
        let y_max = if top > 0.0 { top * 1.2 } else { 1.0 };

        let mut chart = ChartBuilder::on(area)
            .caption(row.label(), ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d((0u32..2u32).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(0) => "Baseline".to_string(),
                SegmentValue::CenterOf(1) => "Simulated".to_string(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BASELINE_COLOR.filled())
                .margin(20)
                .data([(0u32, row.before)]),
        )?;
        chart.draw_series(
            Histogram::vertical(&chart)
                .style(trend_color(row.delta.trend.style()).filled())
                .margin(20)
                .data([(1u32, row.after)]),
        )?;
        chart.draw_series(std::iter::once(Text::new(
            row.delta.to_string(),
            (SegmentValue::CenterOf(1), row.after),
            ("sans-serif", 18).into_font(),
        )))?;
    }

    root.present()?;
    info!("Metrics chart saved to {:?}", path);
    Ok(())
}

/// Rasterises the visible GeoJSON layers of `map` in longitude/latitude space.
///
/// Raster tiles are not fetched; the background is a flat fill.
pub fn render_map(path: &Path, map: &InMemoryMap) -> Result<()> {
    let visible: Vec<(&StyleLayer, &FeatureCollection)> = map
        .layers()
        .iter()
        .filter(|layer| layer.visible && layer.kind != LayerKind::Raster)
        .filter_map(|layer| Some((layer, map.source_data(&layer.source)?)))
        .collect();

    let (min_lon, min_lat, max_lon, max_lat) = view_bounds(map, &visible);

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("UrbanPulse map", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(min_lon..max_lon, min_lat..max_lat)?;

    chart.plotting_area().fill(&BACKGROUND_COLOR)?;
    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()?;

    for (layer, data) in visible {
        let color = paint_color(layer, "color").unwrap_or(BLACK);
        match layer.kind {
            LayerKind::Line => {
                let width = paint_number(layer, "width").unwrap_or(2.0).round() as u32;
                for feature in data.line_strings() {
                    let points = feature
                        .geometry
                        .positions()
                        .iter()
                        .map(|p| (p[0], p[1]));
                    chart.draw_series(LineSeries::new(points, color.stroke_width(width)))?;
                }
            }
            LayerKind::Circle => {
                let radius = paint_number(layer, "radius").unwrap_or(5.0).round() as i32;
                chart.draw_series(data.points().filter_map(|feature| {
                    let p = feature.geometry.positions().first()?;
                    Some(Circle::new((p[0], p[1]), radius, color.filled()))
                }))?;
            }
            LayerKind::Raster => {}
        }
    }

    root.present()?;
    info!("Map snapshot saved to {:?}", path);
    Ok(())
}

fn paint_color(layer: &StyleLayer, property: &str) -> Option<RGBColor> {
    let key = format!("{}{}", layer.kind.paint_prefix(), property);
    layer.paint.get(&key).and_then(PaintValue::as_color).and_then(parse_hex)
}

fn paint_number(layer: &StyleLayer, property: &str) -> Option<f64> {
    let key = format!("{}{}", layer.kind.paint_prefix(), property);
    layer.paint.get(&key).and_then(PaintValue::as_number)
}

/// Union of the visible data bounds, padded; falls back to a window around the
/// map centre when there is nothing to draw.
fn view_bounds(map: &InMemoryMap, visible: &[(&StyleLayer, &FeatureCollection)]) -> (f64, f64, f64, f64) {
    let bounds = visible
        .iter()
        .filter_map(|(_, data)| data.bounds())
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)));

    match bounds {
        Some((min_lon, min_lat, max_lon, max_lat)) => {
            let pad_lon = ((max_lon - min_lon) * 0.05).max(0.005);
            let pad_lat = ((max_lat - min_lat) * 0.05).max(0.005);
            (min_lon - pad_lon, min_lat - pad_lat, max_lon + pad_lon, max_lat + pad_lat)
        }
        None => {
            let [lon, lat] = map.center();
            (lon - 0.05, lat - 0.05, lon + 0.05, lat + 0.05)
        }
    }
}
