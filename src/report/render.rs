// src/report/render.rs
use std::ffi::OsString;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::report::figure::{BarGroup, Figure, HueSeries, Layout, Panel, PanelKind, Series};
use crate::report::RenderFailure;

/// 将 Figure 渲染到磁盘
pub trait ChartRenderer {
    /// `stem` 为不含扩展名的输出路径，返回实际写出的文件
    fn render(&mut self, figure: &Figure, stem: &Path) -> Result<Vec<PathBuf>, RenderFailure>;
}

/// 在文件名后追加扩展名；取值中可能含有 '.'，不能用 `with_extension`
pub fn with_suffix(stem: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = stem.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn backend_error<E: Display>(e: E) -> RenderFailure {
    RenderFailure::Backend(e.to_string())
}

// 箱线图散点的最大水平抖动（像素）
const JITTER_PIXELS: i32 = 8;
// 小提琴半宽与条形总高度（以类别间距为单位）
const VIOLIN_HALF_WIDTH: f64 = 0.4;
const BAR_BAND: f64 = 0.8;
const KDE_STEPS: usize = 64;

/// 使用 plotters 同时输出位图（png）与矢量图（svg）
pub struct PlottersRenderer {
    rng: ChaCha8Rng,
}

impl PlottersRenderer {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&mut self, figure: &Figure, stem: &Path) -> Result<Vec<PathBuf>, RenderFailure> {
        figure.check()?;
        if let Some(parent) = stem.parent() {
            fs::create_dir_all(parent).map_err(|source| RenderFailure::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let size = figure.pixel_size();
        // 两种格式使用相同的抖动
        let jitter_seed: u64 = self.rng.random();

        let png = with_suffix(stem, "png");
        {
            let root = BitMapBackend::new(&png, size).into_drawing_area();
            draw_figure(&root, figure, &mut ChaCha8Rng::seed_from_u64(jitter_seed))?;
        }
        let svg = with_suffix(stem, "svg");
        {
            let root = SVGBackend::new(&svg, size).into_drawing_area();
            draw_figure(&root, figure, &mut ChaCha8Rng::seed_from_u64(jitter_seed))?;
        }
        Ok(vec![png, svg])
    }
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    rng: &mut ChaCha8Rng,
) -> Result<(), RenderFailure> {
    root.fill(&WHITE).map_err(backend_error)?;
    let body = match &figure.title {
        Some(title) => root.titled(title, ("sans-serif", 28)).map_err(backend_error)?,
        None => root.clone(),
    };
    let areas = match &figure.layout {
        Layout::Grid { .. } => body.split_evenly(figure.grid_shape()),
        Layout::Stacked { .. } => split_stacked(&body, &figure.stacked_heights()),
    };

    for (panel, area) in figure.panels.iter().zip(areas.iter()) {
        match &panel.kind {
            PanelKind::Boxes(series) => draw_boxes(area, panel, series, rng)?,
            PanelKind::SplitViolins { hues, groups } => draw_violins(area, panel, hues, groups)?,
            PanelKind::Bars { hues, groups, overlay_labels } => {
                draw_bars(area, panel, hues, groups, *overlay_labels)?
            }
        }
    }
    root.present().map_err(backend_error)?;
    Ok(())
}

/// 按给定高度自上而下切分；最后一块占据剩余空间
fn split_stacked<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    heights: &[u32],
) -> Vec<DrawingArea<DB, Shift>> {
    let mut areas = Vec::with_capacity(heights.len());
    if heights.is_empty() {
        return areas;
    }
    let mut rest = area.clone();
    for &height in &heights[..heights.len() - 1] {
        let (upper, lower) = rest.split_vertically(height as i32);
        areas.push(upper);
        rest = lower;
    }
    areas.push(rest);
    areas
}

/// 数值坐标轴上只在整数位置显示类别名
fn category_label(labels: &[&str], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).map(|s| s.to_string()).unwrap_or_default()
}

fn draw_boxes<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    series: &[Series],
    rng: &mut ChaCha8Rng,
) -> Result<(), RenderFailure> {
    let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0..series.len() as u32).into_segmented(), 0f32..1f32)
        .map_err(backend_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(series.len().max(1))
        .x_label_formatter(&|v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc(panel.value_label.as_str())
        .draw()
        .map_err(backend_error)?;

    chart
        .draw_series(series.iter().enumerate().filter(|(_, s)| !s.values.is_empty()).map(|(i, s)| {
            let quartiles = Quartiles::new(&s.values);
            Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), &quartiles)
                .width(30)
                .whisker_width(0.5)
                .style(Palette99::pick(i).stroke_width(2))
        }))
        .map_err(backend_error)?;

    // 叠加带水平抖动的原始观测值
    let mut points = Vec::new();
    for (i, s) in series.iter().enumerate() {
        for &value in &s.values {
            let dx: i32 = rng.random_range(-JITTER_PIXELS..=JITTER_PIXELS);
            points.push((i as u32, value as f32, dx));
        }
    }
    chart
        .draw_series(points.into_iter().map(|(i, value, dx)| {
            EmptyElement::at((SegmentValue::CenterOf(i), value))
                + Circle::new((dx, 0), 2, BLACK.mix(0.5).filled())
        }))
        .map_err(backend_error)?;
    Ok(())
}

/// 高斯核密度估计，带宽按 Scott 规则，只在数据范围内求值
///
/// 少于两个样本或方差为零时返回 `None`，由调用方退化为一条横线。
pub fn violin_profile(values: &[f64], steps: usize) -> Option<Vec<(f64, f64)>> {
    if values.len() < 2 || steps == 0 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // 均值的舍入误差会让相同样本的方差略大于零，按取值范围判断
    if !std_dev.is_finite() || max - min <= f64::EPSILON * max.abs().max(1.0) {
        return None;
    }
    let bandwidth = std_dev * n.powf(-0.2);
    let norm = n * bandwidth * (2.0 * std::f64::consts::PI).sqrt();

    let profile = (0..=steps)
        .map(|k| {
            let y = min + (max - min) * k as f64 / steps as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((y - v) / bandwidth).powi(2)).exp())
                .sum();
            (y, density / norm)
        })
        .collect();
    Some(profile)
}

fn draw_violins<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    hues: &[String],
    groups: &[HueSeries],
) -> Result<(), RenderFailure> {
    let n = groups.len();
    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..n as f64 - 0.5, 0f64..1f64)
        .map_err(backend_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&|x: &f64| category_label(&labels, *x))
        .y_desc(panel.value_label.as_str())
        .draw()
        .map_err(backend_error)?;

    // (类别, 色调) -> 密度轮廓；同一子图内统一缩放
    let profiles: Vec<Vec<Option<Vec<(f64, f64)>>>> = groups
        .iter()
        .map(|g| g.values.iter().map(|v| violin_profile(v, KDE_STEPS)).collect())
        .collect();
    let peak = profiles
        .iter()
        .flatten()
        .flatten()
        .flat_map(|p| p.iter().map(|(_, d)| *d))
        .fold(0.0, f64::max);

    for (h, hue) in hues.iter().enumerate() {
        let color = Palette99::pick(h).to_rgba();
        let side = if h == 0 { -1.0 } else { 1.0 };

        let mut shapes = Vec::new();
        let mut flat_lines = Vec::new();
        for (i, group) in groups.iter().enumerate() {
            let center = i as f64;
            let Some(values) = group.values.get(h) else { continue };
            match profiles[i].get(h).and_then(Option::as_ref) {
                Some(profile) if peak > 0.0 => {
                    let mut points: Vec<(f64, f64)> = profile
                        .iter()
                        .map(|(y, d)| (center + side * VIOLIN_HALF_WIDTH * d / peak, *y))
                        .collect();
                    if let (Some(first), Some(last)) = (profile.first(), profile.last()) {
                        points.push((center, last.0));
                        points.push((center, first.0));
                    }
                    shapes.push(points);
                }
                _ => {
                    if let Some(&value) = values.first() {
                        flat_lines.push(vec![(center, value), (center + side * VIOLIN_HALF_WIDTH, value)]);
                    }
                }
            }
        }

        chart
            .draw_series(shapes.into_iter().map(|points| Polygon::new(points, color.mix(0.6).filled())))
            .map_err(backend_error)?
            .label(hue.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        chart
            .draw_series(flat_lines.into_iter().map(|line| PathElement::new(line, color.stroke_width(2))))
            .map_err(backend_error)?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(backend_error)?;
    Ok(())
}

/// 水平条形图中第 `index` 个类别所在的行，第一个类别在最上方
fn bar_row(count: usize, index: usize) -> f64 {
    count.saturating_sub(index + 1) as f64
}

fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    hues: &[String],
    groups: &[BarGroup],
    overlay_labels: bool,
) -> Result<(), RenderFailure> {
    let n = groups.len();
    // 坐标轴自下而上，标签按行倒序
    let labels: Vec<&str> = groups.iter().rev().map(|g| g.label.as_str()).collect();
    let row = |i: usize| bar_row(n, i);

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(if overlay_labels { 10 } else { 140 });
    if !panel.title.is_empty() {
        builder.caption(&panel.title, ("sans-serif", 22));
    }
    let mut chart = builder
        .build_cartesian_2d(0f64..1f64, -0.5f64..n as f64 - 0.5)
        .map_err(backend_error)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(panel.value_label.as_str())
        .y_labels(n.max(1))
        .y_label_formatter(&|y: &f64| {
            if overlay_labels {
                String::new()
            } else {
                category_label(&labels, *y)
            }
        })
        .draw()
        .map_err(backend_error)?;

    let band = BAR_BAND / hues.len().max(1) as f64;
    for (h, hue) in hues.iter().enumerate() {
        let color = Palette99::pick(h).to_rgba();
        let bars: Vec<Rectangle<(f64, f64)>> = groups
            .iter()
            .enumerate()
            .filter_map(|(i, group)| {
                let value = group.values.get(h).copied().flatten()?;
                let y0 = row(i) + BAR_BAND / 2.0 - band * (h + 1) as f64;
                Some(Rectangle::new([(0.0, y0), (value, y0 + band)], color.filled()))
            })
            .collect();
        let anno = chart.draw_series(bars).map_err(backend_error)?;
        if hues.len() > 1 {
            anno.label(hue.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if overlay_labels {
        chart
            .draw_series(groups.iter().enumerate().map(|(i, group)| {
                Text::new(
                    group.label.clone(),
                    (0.005, row(i)),
                    ("sans-serif", 18).into_font().color(&WHITE),
                )
            }))
            .map_err(backend_error)?;
    }

    if hues.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(backend_error)?;
    }
    Ok(())
}
