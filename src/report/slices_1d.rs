// src/report/slices_1d.rs
use tracing::info;

use crate::aggregate::{constant_headers, group_by, metric_values};
use crate::models::{title_case, ResultRow, Strategy};
use crate::report::figure::{Figure, Layout, Panel, PanelKind, Series};
use crate::report::{ChartPlan, ReportContext};

/// 对每个消融表头的每个取值生成一张箱线图网格及其竖排版本
pub fn plan(ctx: &ReportContext) -> Vec<ChartPlan> {
    let headers = &ctx.report.ablation_headers;
    let mut plans = Vec::new();

    for outer in headers {
        let suppressed = ctx.report.suppressed_for(outer);
        let candidates: Vec<&str> = headers
            .iter()
            .filter(|h| *h != outer && !suppressed.contains(*h))
            .map(String::as_str)
            .collect();

        for (key, rows) in group_by(&ctx.rows, &[outer.as_str()]) {
            let value = key.concat();

            // 组内取值唯一的表头不再单独作图
            let constants = constant_headers(&rows, &candidates);
            if !constants.is_empty() {
                let text = constants
                    .iter()
                    .map(|(header, v)| format!("{}={}", title_case(header), v))
                    .collect::<Vec<_>>()
                    .join(", ");
                info!("Skipping: {} for {}={}", text, outer, value);
            }

            let panels: Vec<Panel> = candidates
                .iter()
                .filter(|h| !constants.contains_key(**h))
                .map(|h| box_panel(&rows, h, ctx.target_header))
                .collect();
            let weights = panels.iter().map(|p| 2 + p.category_count() as u32).collect();

            plans.push(ChartPlan {
                strategy: Strategy::Slices1d,
                name: format!("{}_{}", outer, value),
                figure: Figure {
                    title: None,
                    layout: Layout::Grid { columns: ctx.report.grid_columns },
                    panels: panels.clone(),
                    panel_size: ctx.panel_size(),
                },
            });
            plans.push(ChartPlan {
                strategy: Strategy::Slices1d,
                name: format!("VERT_{}_{}", outer, value),
                figure: Figure {
                    title: None,
                    layout: Layout::Stacked { weights },
                    panels,
                    panel_size: (ctx.report.panel_width, ctx.report.panel_height * 11 / 10),
                },
            });
        }
    }
    plans
}

/// 一个表头的箱线图：每个取值一个箱体
fn box_panel(rows: &[&ResultRow], header: &str, target_header: &str) -> Panel {
    let series = group_by(rows, &[header])
        .into_iter()
        .map(|(key, group)| Series {
            label: key.concat(),
            values: metric_values(&group, target_header),
        })
        .collect();
    Panel {
        title: title_case(header),
        value_label: target_header.to_string(),
        kind: PanelKind::Boxes(series),
    }
}
