// src/aggregate.rs
use std::collections::{BTreeMap, BTreeSet};

use crate::models::ResultRow;

/// 分组键：每个分组表头对应的取值
pub type GroupKey = Vec<String>;

/// 某一列中出现过的全部取值（升序，不含缺失值）
pub fn unique_values(rows: &[&ResultRow], header: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(header))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 某一列的不同取值个数（缺失值也算作一种取值）
pub fn distinct_count(rows: &[&ResultRow], header: &str) -> usize {
    rows.iter()
        .map(|row| row.get(header))
        .collect::<BTreeSet<_>>()
        .len()
}

/// 按多个表头分组；任一分组列缺失的行被丢弃
pub fn group_by<'a>(rows: &[&'a ResultRow], headers: &[&str]) -> BTreeMap<GroupKey, Vec<&'a ResultRow>> {
    let mut groups: BTreeMap<GroupKey, Vec<&'a ResultRow>> = BTreeMap::new();
    for &row in rows {
        let key: Option<GroupKey> = headers
            .iter()
            .map(|h| row.get(h).map(str::to_string))
            .collect();
        if let Some(key) = key {
            groups.entry(key).or_default().push(row);
        }
    }
    groups
}

/// 在组内只有唯一取值的表头，返回 表头 → 取值
///
/// 缺失值同样算作一种取值；全部缺失的表头以"None"记录。
pub fn constant_headers(rows: &[&ResultRow], headers: &[&str]) -> BTreeMap<String, String> {
    let mut constants = BTreeMap::new();
    for &header in headers {
        let values: BTreeSet<Option<&str>> = rows.iter().map(|row| row.get(header)).collect();
        if values.len() == 1 {
            let value = values.into_iter().next().flatten().unwrap_or("None");
            constants.insert(header.to_string(), value.to_string());
        }
    }
    constants
}

/// 提取组内的目标指标值，跳过缺失值
pub fn metric_values(rows: &[&ResultRow], target_header: &str) -> Vec<f64> {
    rows.iter().filter_map(|row| row.metric(target_header)).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// 由一行结果的分类字段派生的展示键，用于分层汇总图的分组与展示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIndex {
    pub inverse: bool,
    pub loss: String,
    pub training_loop: String,
    pub negative_sampler: String,
    pub regularizer: String,
}

impl ConfigIndex {
    pub fn from_row(row: &ResultRow, regularizer_labels: &BTreeMap<String, String>) -> Self {
        let regularizer = match row.get("regularizer") {
            Some(r) => regularizer_labels.get(r).map(String::as_str).unwrap_or(r),
            None => "No Reg.",
        };
        Self {
            inverse: row
                .get("create_inverse_triples")
                .is_some_and(|flag| flag.eq_ignore_ascii_case("true")),
            loss: row.get("loss").unwrap_or("").to_string(),
            training_loop: row.get("training_loop").unwrap_or("").to_string(),
            negative_sampler: row.get("negative_sampler").unwrap_or("No Samp.").to_string(),
            regularizer: regularizer.to_string(),
        }
    }

    /// 展示标签（如 "Inv. / softplus / OWA"）
    ///
    /// `detailed` 为真时追加正则化器与负采样器。
    pub fn label(&self, detailed: bool) -> String {
        let inv_text = if self.inverse { "Inv." } else { "No Inv." };
        let training_loop = self.training_loop.to_uppercase();
        let mut parts = vec![inv_text, self.loss.as_str()];
        if detailed {
            parts.push(self.regularizer.as_str());
        }
        parts.push(training_loop.as_str());
        if detailed {
            parts.push(self.negative_sampler.as_str());
        }
        parts.join(" / ")
    }
}

pub fn config_index(row: &ResultRow, regularizer_labels: &BTreeMap<String, String>, detailed: bool) -> String {
    ConfigIndex::from_row(row, regularizer_labels).label(detailed)
}

/// 一个配置标签的汇总统计
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSummary {
    pub label: String,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

/// 按配置标签汇总目标指标，按均值升序排列
pub fn summarize_by_config(
    rows: &[&ResultRow],
    target_header: &str,
    regularizer_labels: &BTreeMap<String, String>,
    detailed: bool,
) -> Vec<LabelSummary> {
    let mut by_label: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for &row in rows {
        if let Some(value) = row.metric(target_header) {
            by_label
                .entry(config_index(row, regularizer_labels, detailed))
                .or_default()
                .push(value);
        }
    }

    let mut summaries: Vec<LabelSummary> = by_label
        .into_iter()
        .filter_map(|(label, values)| {
            Some(LabelSummary {
                mean: mean(&values)?,
                median: median(&values)?,
                count: values.len(),
                label,
            })
        })
        .collect();
    // 稳定排序：均值相同时保持标签的字母顺序
    summaries.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    summaries
}
