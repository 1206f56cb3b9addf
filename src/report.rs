// report.rs - 报告生成入口
// 各分组策略只负责把结果表转换为与后端无关的 Figure，
// 实际绘制由 ChartRenderer 完成，单个图表失败不会中断整个报告。
pub mod figure;
pub mod index;
pub mod render;
pub mod slices_1d;
pub mod slices_2d;
pub mod stratified;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{
    Config, ProducedChart, ReportConfig, ReportSummary, ResultRow, ResultTable, SkippedChart,
    Strategy,
};
pub use figure::Figure;
pub use render::{ChartRenderer, PlottersRenderer};

/// 单个图表无法生成的原因
#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error("figure has no panels")]
    EmptyFigure,

    #[error("panel '{panel}' has no observations")]
    EmptyPanel { panel: String },

    #[error("panel '{panel}' splits on {count} hue levels, at most 2 are supported")]
    TooManyHues { panel: String, count: usize },

    #[error("plotting backend failed: {0}")]
    Backend(String),

    #[error("failed to prepare output for {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 报告生成时所有策略共享的只读上下文
pub struct ReportContext<'a> {
    pub rows: Vec<&'a ResultRow>,
    pub target_header: &'a str,
    pub report: &'a ReportConfig,
}

impl<'a> ReportContext<'a> {
    pub fn new(table: &'a ResultTable, target_header: &'a str, report: &'a ReportConfig) -> Self {
        Self {
            rows: table.rows.iter().collect(),
            target_header,
            report,
        }
    }

    /// 默认子图尺寸
    pub fn panel_size(&self) -> (u32, u32) {
        (self.report.panel_width, self.report.panel_height)
    }
}

/// 一个待绘制的图表：所属策略、文件名（不含扩展名）与图表内容
#[derive(Debug, Clone)]
pub struct ChartPlan {
    pub strategy: Strategy,
    pub name: String,
    pub figure: Figure,
}

// 已停用的分层1D/2D切片，仅创建目录
const DISABLED_DIRECTORIES: [&str; 2] = ["dataset_optimizer_1d_slices", "dataset_optimizer_2d_slices"];

/// 生成完整报告：所有策略的图表、两个 README 索引以及 report.json
pub fn build_report<R: ChartRenderer>(
    config: &Config,
    table: &ResultTable,
    renderer: &mut R,
) -> Result<ReportSummary> {
    let general = &config.general;
    let summary_dir = &general.summary_dir;
    let ctx = ReportContext::new(table, &general.target_header, &config.report);
    let mut summary = ReportSummary::default();

    for strategy in [
        Strategy::Slices1d,
        Strategy::ModelSummary,
        Strategy::Stratified3d,
        Strategy::Slices2d,
    ] {
        let dir = summary_dir.join(strategy.directory());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let plans = plan_strategy(strategy, &ctx);
        info!("Writing {} {} charts", plans.len(), strategy);
        render_plans(renderer, &plans, &dir, &mut summary);
        info!("{}: {} charts produced", strategy, summary.chart_names(strategy).len());
    }

    for name in DISABLED_DIRECTORIES {
        let dir = summary_dir.join(name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    index::write_slice_index(
        &summary_dir.join(Strategy::Slices1d.directory()).join("README.md"),
        &ctx,
    )?;
    index::write_dataset_index(&general.readme_path, summary_dir, &ctx)?;

    let summary_path = summary_dir.join("report.json");
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize report summary")?;
    fs::write(&summary_path, json)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    info!(
        "Report finished: {} charts produced, {} skipped",
        summary.produced.len(),
        summary.skipped.len()
    );
    Ok(summary)
}

/// 枚举某个策略下的全部图表
pub fn plan_strategy(strategy: Strategy, ctx: &ReportContext) -> Vec<ChartPlan> {
    match strategy {
        Strategy::Slices1d => slices_1d::plan(ctx),
        Strategy::ModelSummary => stratified::plan_model_summaries(ctx),
        Strategy::Slices2d => slices_2d::plan(ctx),
        Strategy::Stratified3d => stratified::plan_3d_slices(ctx),
    }
}

fn render_plans<R: ChartRenderer>(
    renderer: &mut R,
    plans: &[ChartPlan],
    dir: &Path,
    summary: &mut ReportSummary,
) {
    let progress = progress_bar(plans.len() as u64);
    for plan in plans {
        progress.set_message(plan.name.clone());
        match renderer.render(&plan.figure, &dir.join(&plan.name)) {
            Ok(files) => summary.produced.push(ProducedChart {
                strategy: plan.strategy,
                name: plan.name.clone(),
                files,
            }),
            Err(e) => {
                warn!("Skipping {}/{}: {}", plan.strategy, plan.name, e);
                summary.skipped.push(SkippedChart {
                    strategy: plan.strategy,
                    name: plan.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
}

fn progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}") {
        progress.set_style(style);
    }
    progress
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    /// 只记录调用而不绘制的渲染器
    #[derive(Default)]
    pub struct RecordingRenderer {
        pub stems: Vec<PathBuf>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render(&mut self, figure: &Figure, stem: &Path) -> Result<Vec<PathBuf>, RenderFailure> {
            figure.check()?;
            self.stems.push(stem.to_path_buf());
            Ok(vec![render::with_suffix(stem, "png"), render::with_suffix(stem, "svg")])
        }
    }

    pub fn row(pairs: &[(&str, Option<&str>)]) -> ResultRow {
        ResultRow {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(|s| s.to_string())))
                .collect(),
        }
    }

    /// 两个数据集 × 两个模型 × 两种损失 × 是否使用逆三元组，单一优化器
    pub fn synthetic_table() -> ResultTable {
        let mut rows = Vec::new();
        let mut hits = 0.05;
        for dataset in ["kinships", "wn18rr"] {
            for model in ["rotate", "transe"] {
                for loss in ["nssa", "softplus"] {
                    for inverse in ["False", "True"] {
                        for replicate in ["0", "1"] {
                            let hits_text = format!("{:.2}", hits);
                            rows.push(row(&[
                                ("dataset", Some(dataset)),
                                ("model", Some(model)),
                                ("optimizer", Some("adam")),
                                ("loss", Some(loss)),
                                ("training_loop", Some("owa")),
                                ("create_inverse_triples", Some(inverse)),
                                ("negative_sampler", Some("basic")),
                                ("regularizer", None),
                                ("replicate", Some(replicate)),
                                ("hits@10", Some(hits_text.as_str())),
                            ]));
                            hits = (hits + 0.013) % 1.0;
                        }
                    }
                }
            }
        }
        ResultTable {
            columns: vec![],
            rows,
        }
    }

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.general.summary_dir = root.join("summary");
        config.general.readme_path = root.join("README.md");
        config
    }

    #[test]
    fn test_build_report_writes_indexes_and_summary() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());
        let table = synthetic_table();
        let mut renderer = RecordingRenderer::default();

        let summary = build_report(&config, &table, &mut renderer).unwrap();

        assert_eq!(summary.produced.len(), renderer.stems.len());
        assert!(!summary.chart_names(Strategy::Slices1d).is_empty());
        assert!(!summary.chart_names(Strategy::ModelSummary).is_empty());
        assert!(!summary.chart_names(Strategy::Slices2d).is_empty());
        assert!(!summary.chart_names(Strategy::Stratified3d).is_empty());

        let summary_dir = &config.general.summary_dir;
        for name in DISABLED_DIRECTORIES {
            let dir = summary_dir.join(name);
            assert!(dir.is_dir());
            assert_eq!(fs::read_dir(dir).unwrap().count(), 0);
        }
        assert!(summary_dir.join("1D-slices").join("README.md").exists());
        assert!(config.general.readme_path.exists());

        let json = fs::read_to_string(summary_dir.join("report.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["produced"].as_array().unwrap().len(), summary.produced.len());
    }

    #[test]
    fn test_rerun_produces_identical_chart_names() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());
        let table = synthetic_table();

        let mut first = RecordingRenderer::default();
        let mut second = RecordingRenderer::default();
        let a = build_report(&config, &table, &mut first).unwrap();
        let b = build_report(&config, &table, &mut second).unwrap();

        assert_eq!(first.stems, second.stems);
        assert_eq!(a.total(), b.total());
        let names_a: Vec<&str> = a.produced.iter().map(|c| c.name.as_str()).collect();
        let names_b: Vec<&str> = b.produced.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_degenerate_group_is_skipped_and_run_continues() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());
        let mut table = synthetic_table();
        // 该损失只出现在一行中，且其他表头全部为常量，1D网格没有子图
        table.rows.push(row(&[
            ("dataset", Some("kinships")),
            ("model", Some("rotate")),
            ("optimizer", Some("adam")),
            ("loss", Some("marginranking")),
            ("training_loop", Some("owa")),
            ("create_inverse_triples", Some("False")),
            ("negative_sampler", Some("basic")),
            ("regularizer", None),
            ("replicate", Some("0")),
            ("hits@10", Some("0.5")),
        ]));
        let mut renderer = RecordingRenderer::default();

        let summary = build_report(&config, &table, &mut renderer).unwrap();

        let skipped: Vec<&str> = summary
            .skipped
            .iter()
            .filter(|c| c.strategy == Strategy::Slices1d)
            .map(|c| c.name.as_str())
            .collect();
        assert!(skipped.contains(&"loss_marginranking"));
        assert!(skipped.contains(&"VERT_loss_marginranking"));
        assert!(summary.chart_names(Strategy::Slices1d).contains(&"loss_softplus"));
        assert!(!summary.chart_names(Strategy::Stratified3d).is_empty());
    }
}
