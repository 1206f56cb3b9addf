// src/report/stratified.rs
// 按 数据集/模型/优化器 等分层后的汇总图
use crate::aggregate::{group_by, median, metric_values, summarize_by_config, unique_values};
use crate::models::{ResultRow, Strategy};
use crate::report::figure::{BarGroup, Figure, Layout, Panel, PanelKind};
use crate::report::{ChartPlan, ReportContext};

const MODEL_SUMMARY_HEADERS: [&str; 3] = ["dataset", "model", "optimizer"];

/// 每个 (dataset, model, optimizer) 一张水平条形图
///
/// 每个配置标签一根条，长度为中位数，按均值升序排列，标签写在条形内部。
pub fn plan_model_summaries(ctx: &ReportContext) -> Vec<ChartPlan> {
    group_by(&ctx.rows, &MODEL_SUMMARY_HEADERS)
        .into_iter()
        .map(|(key, rows)| {
            let (dataset, model, optimizer) = (&key[0], &key[1], &key[2]);
            let groups = summarize_by_config(
                &rows,
                ctx.target_header,
                &ctx.report.regularizer_labels,
                ctx.report.detailed_labels,
            )
            .into_iter()
            .map(|summary| BarGroup {
                label: summary.label,
                values: vec![Some(summary.median)],
            })
            .collect();
            let panel = Panel {
                title: String::new(),
                value_label: ctx.target_header.to_string(),
                kind: PanelKind::Bars {
                    hues: vec![ctx.target_header.to_string()],
                    groups,
                    overlay_labels: true,
                },
            };
            ChartPlan {
                strategy: Strategy::ModelSummary,
                name: format!("{}_{}_{}", dataset, model, optimizer),
                figure: Figure {
                    title: Some(format!("Stratified Summary for {} - {} - {}", dataset, model, optimizer)),
                    layout: Layout::Grid { columns: 1 },
                    panels: vec![panel],
                    panel_size: (ctx.report.panel_width * 2, ctx.report.panel_height * 7 / 5),
                },
            }
        })
        .collect()
}

/// 三维切片：在每个分层内，对每个二值表头和每对有序的其他表头 (h1, h2)
/// 画一张按 h2 分面、以 h1 为类别、按二值表头着色的中位数条形图
pub fn plan_3d_slices(ctx: &ReportContext) -> Vec<ChartPlan> {
    let report = ctx.report;
    let strata: Vec<&str> = report.stratify_headers.iter().map(String::as_str).collect();
    let others: Vec<&str> = report
        .ablation_headers
        .iter()
        .filter(|h| !report.binary_ablation_headers.contains(*h) && !report.stratify_headers.contains(*h))
        .map(String::as_str)
        .collect();

    let mut plans = Vec::new();
    for (key, rows) in group_by(&ctx.rows, &strata) {
        // 文件名中分层取值按倒序排列（optimizer-dataset）
        let stratum: Vec<&str> = key.iter().rev().map(String::as_str).collect();
        for binary in &report.binary_ablation_headers {
            let hues = unique_values(&rows, binary);
            for &h1 in &others {
                for &h2 in &others {
                    if h1 == h2 {
                        continue;
                    }
                    plans.push(ChartPlan {
                        strategy: Strategy::Stratified3d,
                        name: format!("{}-{}-{}-{}", stratum.join("-"), binary, h1, h2),
                        figure: Figure {
                            title: None,
                            layout: Layout::Grid { columns: report.facet_wrap },
                            panels: facet_panels(ctx, &rows, binary, &hues, h1, h2),
                            panel_size: (report.panel_height, report.panel_height),
                        },
                    });
                }
            }
        }
    }
    plans
}

/// `facet` 的每个取值一个子图；子图内 `category` 的每个取值一组条形，每个色调一根
fn facet_panels(
    ctx: &ReportContext,
    rows: &[&ResultRow],
    hue_header: &str,
    hues: &[String],
    category: &str,
    facet: &str,
) -> Vec<Panel> {
    group_by(rows, &[facet])
        .into_iter()
        .map(|(facet_key, facet_rows)| {
            let groups = group_by(&facet_rows, &[category])
                .into_iter()
                .map(|(category_key, cell)| BarGroup {
                    label: category_key.concat(),
                    values: hues
                        .iter()
                        .map(|hue| {
                            let matching: Vec<&ResultRow> = cell
                                .iter()
                                .copied()
                                .filter(|row| row.get(hue_header) == Some(hue.as_str()))
                                .collect();
                            median(&metric_values(&matching, ctx.target_header))
                        })
                        .collect(),
                })
                .collect();
            Panel {
                title: facet_key.concat(),
                value_label: ctx.target_header.to_string(),
                kind: PanelKind::Bars {
                    hues: hues.to_vec(),
                    groups,
                    overlay_labels: false,
                },
            }
        })
        .collect()
}
