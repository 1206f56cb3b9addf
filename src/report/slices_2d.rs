// src/report/slices_2d.rs
use crate::aggregate::{distinct_count, group_by, unique_values};
use crate::models::{ResultRow, Strategy};
use crate::report::figure::{Figure, HueSeries, Layout, Panel, PanelKind};
use crate::report::{ChartPlan, ReportContext};

const DATASET: &str = "dataset";
const MODEL: &str = "model";

/// 二维小提琴图汇总
///
/// 恰好有两个取值的表头按 (dataset, model) 切片并以该表头着色；
/// 其他表头对每个取值 v 以 "v / Not v" 着色，并生成两个方向的切片。
pub fn plan(ctx: &ReportContext) -> Vec<ChartPlan> {
    let mut plans = Vec::new();
    for header in &ctx.report.two_d_headers {
        if distinct_count(&ctx.rows, header) == 2 {
            plans.push(plan_slice(ctx, DATASET, MODEL, header, None));
        } else {
            for value in unique_values(&ctx.rows, header) {
                plans.push(plan_slice(ctx, DATASET, MODEL, header, Some(value.as_str())));
                plans.push(plan_slice(ctx, MODEL, DATASET, header, Some(value.as_str())));
            }
        }
    }
    plans
}

/// 以 `outer` 的每个取值为一个子图，横轴为 `inner` 的取值
fn plan_slice(
    ctx: &ReportContext,
    outer: &str,
    inner: &str,
    hue_header: &str,
    value: Option<&str>,
) -> ChartPlan {
    let hues: Vec<String> = match value {
        Some(v) => vec![v.to_string(), format!("Not {}", v)],
        None => unique_values(&ctx.rows, hue_header),
    };
    let hue_of = |row: &ResultRow| -> Option<String> {
        match value {
            Some(v) if row.get(hue_header) == Some(v) => Some(v.to_string()),
            Some(v) => Some(format!("Not {}", v)),
            None => row.get(hue_header).map(str::to_string),
        }
    };

    let panels = group_by(&ctx.rows, &[outer])
        .into_iter()
        .map(|(outer_key, rows)| {
            let groups = group_by(&rows, &[inner])
                .into_iter()
                .map(|(inner_key, cell)| HueSeries {
                    label: inner_key.concat(),
                    values: hues
                        .iter()
                        .map(|hue| {
                            cell.iter()
                                .filter(|row| hue_of(**row).as_ref() == Some(hue))
                                .filter_map(|row| row.metric(ctx.target_header))
                                .collect()
                        })
                        .collect(),
                })
                .collect();
            Panel {
                title: format!("{} - {}", outer, outer_key.concat()),
                value_label: ctx.target_header.to_string(),
                kind: PanelKind::SplitViolins { hues: hues.clone(), groups },
            }
        })
        .collect();

    let name = match value {
        Some(v) => format!("{}-{}-{}-{}", outer, inner, hue_header, v),
        None => format!("{}-{}-{}", outer, inner, hue_header),
    };
    ChartPlan {
        strategy: Strategy::Slices2d,
        name,
        figure: Figure {
            title: None,
            layout: Layout::Grid { columns: ctx.report.violin_columns },
            panels,
            panel_size: ctx.panel_size(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportConfig;
    use crate::report::tests::synthetic_table;

    #[test]
    fn test_binary_and_multi_valued_headers() {
        let mut table = synthetic_table();
        // 引入第二种优化器，optimizer 成为二值表头
        table.rows[0].values.insert("optimizer".to_string(), Some("sgd".to_string()));
        let report = ReportConfig::default();
        let ctx = ReportContext::new(&table, "hits@10", &report);

        let names: Vec<String> = plan(&ctx).into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "dataset-model-create_inverse_triples",
                "dataset-model-loss",
                "dataset-model-optimizer",
                "dataset-model-training_loop-owa",
                "model-dataset-training_loop-owa",
            ]
        );
    }

    #[test]
    fn test_value_split_hues() {
        let mut table = synthetic_table();
        for row in table.rows.iter_mut().take(4) {
            row.values.insert("loss".to_string(), Some("bceaftersigmoid".to_string()));
        }
        let report = ReportConfig::default();
        let ctx = ReportContext::new(&table, "hits@10", &report);

        let plans = plan(&ctx);
        let chart = plans
            .iter()
            .find(|p| p.name == "model-dataset-loss-softplus")
            .unwrap();
        assert_eq!(chart.figure.layout, Layout::Grid { columns: 3 });
        assert_eq!(chart.figure.panels.len(), 2);

        let panel = &chart.figure.panels[0];
        assert_eq!(panel.title, "model - rotate");
        match &panel.kind {
            PanelKind::SplitViolins { hues, groups } => {
                assert_eq!(hues, &vec!["softplus".to_string(), "Not softplus".to_string()]);
                assert_eq!(groups.len(), 2);
                // rotate 的 16 行全部落入两个色调之一
                let total: usize = groups.iter().flat_map(|g| g.values.iter()).map(Vec::len).sum();
                assert_eq!(total, 16);
            }
            other => panic!("unexpected panel kind {:?}", other),
        }
        assert!(chart.figure.check().is_ok());
    }
}
