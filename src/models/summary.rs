use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// 报告中的分组策略，对应输出目录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Slices1d,
    ModelSummary,
    Slices2d,
    Stratified3d,
}

impl Strategy {
    /// 该策略输出图表所在的子目录名
    pub fn directory(&self) -> &'static str {
        match self {
            Strategy::Slices1d => "1D-slices",
            Strategy::ModelSummary => "dataset_optimizer_model_summary",
            Strategy::Slices2d => "2D-slices",
            Strategy::Stratified3d => "dataset_optimizer_3d_slices",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory())
    }
}

/// 成功生成的图表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducedChart {
    pub strategy: Strategy,
    pub name: String,
    pub files: Vec<PathBuf>,
}

/// 因数据退化等原因被跳过的图表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedChart {
    pub strategy: Strategy,
    pub name: String,
    pub reason: String,
}

/// 一次报告运行的结果汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub produced: Vec<ProducedChart>,
    pub skipped: Vec<SkippedChart>,
}

impl ReportSummary {
    pub fn chart_names(&self, strategy: Strategy) -> Vec<&str> {
        self.produced
            .iter()
            .filter(|c| c.strategy == strategy)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.produced.len() + self.skipped.len()
    }
}
