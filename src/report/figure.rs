// src/report/figure.rs
use crate::report::RenderFailure;

/// 与绘图后端无关的图表描述
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    pub layout: Layout,
    pub panels: Vec<Panel>,
    pub panel_size: (u32, u32), // 单个子图的像素尺寸
}

/// 子图排列方式
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// 固定列数的网格，最后一行可以不满
    Grid { columns: usize },
    /// 单列竖排，每个子图的高度按权重分配
    Stacked { weights: Vec<u32> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub value_label: String,
    pub kind: PanelKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelKind {
    /// 每个类别一个竖直箱线图
    Boxes(Vec<Series>),
    /// 每个类别一个左右分开的小提琴图，左右两半对应两个色调
    SplitViolins { hues: Vec<String>, groups: Vec<HueSeries> },
    /// 水平条形图；每个类别每个色调一根条
    Bars {
        hues: Vec<String>,
        groups: Vec<BarGroup>,
        overlay_labels: bool, // 将类别名写在条形内部，而不是坐标轴上
    },
}

/// 一个类别的原始观测值
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// 一个类别按色调拆分的观测值，`values[i]` 对应第i个色调
#[derive(Debug, Clone, PartialEq)]
pub struct HueSeries {
    pub label: String,
    pub values: Vec<Vec<f64>>,
}

/// 一个类别按色调拆分的汇总值（如中位数）
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl Panel {
    fn has_observations(&self) -> bool {
        match &self.kind {
            PanelKind::Boxes(series) => series.iter().any(|s| !s.values.is_empty()),
            PanelKind::SplitViolins { groups, .. } => groups
                .iter()
                .any(|g| g.values.iter().any(|v| !v.is_empty())),
            PanelKind::Bars { groups, .. } => groups
                .iter()
                .any(|g| g.values.iter().any(Option::is_some)),
        }
    }

    /// 类别数，用于决定竖排布局中的高度权重
    pub fn category_count(&self) -> usize {
        match &self.kind {
            PanelKind::Boxes(series) => series.len(),
            PanelKind::SplitViolins { groups, .. } => groups.len(),
            PanelKind::Bars { groups, .. } => groups.len(),
        }
    }
}

impl Figure {
    /// 检查图表数据是否足以绘制
    pub fn check(&self) -> Result<(), RenderFailure> {
        if self.panels.is_empty() {
            return Err(RenderFailure::EmptyFigure);
        }
        for panel in &self.panels {
            if let PanelKind::SplitViolins { hues, .. } = &panel.kind {
                if hues.len() > 2 {
                    return Err(RenderFailure::TooManyHues {
                        panel: panel.title.clone(),
                        count: hues.len(),
                    });
                }
            }
            if !panel.has_observations() {
                return Err(RenderFailure::EmptyPanel { panel: panel.title.clone() });
            }
        }
        Ok(())
    }

    /// 网格的（行数，列数）
    pub fn grid_shape(&self) -> (usize, usize) {
        let n = self.panels.len().max(1);
        match &self.layout {
            Layout::Grid { columns } => {
                let columns = (*columns).clamp(1, n);
                (n.div_ceil(columns), columns)
            }
            Layout::Stacked { .. } => (n, 1),
        }
    }

    /// 整个图表的像素尺寸
    pub fn pixel_size(&self) -> (u32, u32) {
        let (rows, columns) = self.grid_shape();
        let (width, height) = self.panel_size;
        let title_height = if self.title.is_some() { 60 } else { 0 };
        (width * columns as u32, height * rows as u32 + title_height)
    }

    /// 竖排布局中每个子图的像素高度
    pub fn stacked_heights(&self) -> Vec<u32> {
        let total = self.pixel_size().1;
        let weights: Vec<u32> = match &self.layout {
            Layout::Stacked { weights } if weights.len() == self.panels.len() => weights.clone(),
            _ => vec![1; self.panels.len()],
        };
        let sum: u32 = weights.iter().sum::<u32>().max(1);
        weights.iter().map(|w| total * w / sum).collect()
    }
}
