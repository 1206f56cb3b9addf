// src/collate.rs
use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::file_utils::{extract_replicate_number_safe, find_result_files};
use crate::models::{Config, ParameterValue, ResultRow, ResultTable};
use crate::result_parser::parse_multiple_result_files;
use crate::result_table::write_table;

/// 汇总表的列顺序：配置的分类列、replicate、目标指标
pub fn collation_columns(config: &Config) -> Vec<String> {
    let mut columns: Vec<String> = config.collation.columns.keys().cloned().collect();
    columns.push("replicate".to_string());
    columns.push(config.general.target_header.clone());
    columns
}

/// 将一个扁平化后的结果文件映射为汇总表中的一行
///
/// 缺少必需列或目标指标时返回错误，由调用方决定是否跳过。
pub fn build_row(
    config: &Config,
    values: &HashMap<String, ParameterValue>,
    replicate: u32,
) -> Result<ResultRow> {
    let collation = &config.collation;
    let mut row = ResultRow::default();

    for (column, key) in &collation.columns {
        let cell = values.get(key).map(ParameterValue::to_cell);
        if cell.is_none() && !collation.nullable_columns.contains(column) {
            anyhow::bail!("missing required column '{}' (key '{}')", column, key);
        }
        row.values.insert(column.clone(), cell);
    }

    let target_header = &config.general.target_header;
    let target_key = collation.target_key.as_deref().unwrap_or(target_header);
    let metric = values
        .get(target_key)
        .and_then(ParameterValue::as_f64)
        .filter(|v| !v.is_nan())
        .ok_or_else(|| anyhow::anyhow!("missing numeric target metric '{}'", target_key))?;

    row.values.insert("replicate".to_string(), Some(replicate.to_string()));
    row.values.insert(target_header.clone(), Some(metric.to_string()));
    Ok(row)
}

/// 收集所有实验结果，生成并写出汇总表
pub fn collate(config: &Config) -> Result<ResultTable> {
    let general = &config.general;
    let prefix = &config.collation.replicate_prefix;

    let result_files = find_result_files(&general.results_dir, &general.result_file, prefix)?;
    info!("Found {} result files under {}", result_files.len(), general.results_dir.display());

    let mut rows = Vec::new();
    for (path, values) in parse_multiple_result_files(&result_files) {
        let replicate = extract_replicate_number_safe(&path, prefix)?;
        match build_row(config, &values, replicate) {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    let table = ResultTable {
        columns: collation_columns(config),
        rows,
    };
    write_table(&general.collation_path, &table, config.collation.delimiter)
        .with_context(|| format!("Failed to write collation to {}", general.collation_path.display()))?;
    info!("Collated {} rows into {}", table.rows.len(), general.collation_path.display());

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollationConfig;
    use crate::result_table::load_table;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_result(dir: &Path, replicate: u32, loss: &str, hits: Option<f64>, regularizer: Option<&str>) {
        let replicate_dir = dir.join(format!("replicate-{:05}", replicate));
        fs::create_dir_all(&replicate_dir).unwrap();
        let regularizer = regularizer.map_or("null".to_string(), |r| format!("\"{}\"", r));
        let metrics = hits.map_or("{}".to_string(), |h| format!("{{\"hits_at_k\": {{\"avg\": {{\"10\": {}}}}}}}", h));
        let json = format!(
            r#"{{
                "metadata": {{"dataset": "kinships"}},
                "pipeline": {{
                    "model": "transe",
                    "optimizer": "adam",
                    "loss": "{}",
                    "training_loop": "owa",
                    "negative_sampler": "basic",
                    "regularizer": {},
                    "dataset_kwargs": {{"create_inverse_triples": false}}
                }},
                "metrics": {}
            }}"#,
            loss, regularizer, metrics
        );
        fs::write(replicate_dir.join("results.json"), json).unwrap();
    }

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.general.results_dir = root.join("results");
        config.general.collation_path = root.join("collation.tsv");
        config
    }

    #[test]
    fn test_collate_builds_rows_and_writes_table() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());
        let experiment = config.general.results_dir.join("kinships_transe");
        write_result(&experiment, 0, "softplus", Some(0.25), None);
        write_result(&experiment, 1, "softplus", Some(0.75), Some("lp"));

        let table = collate(&config).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns.last().map(String::as_str), Some("hits@10"));
        assert_eq!(table.rows[0].get("create_inverse_triples"), Some("False"));
        assert_eq!(table.rows[0].get("regularizer"), None);
        assert_eq!(table.rows[1].get("regularizer"), Some("lp"));
        assert_eq!(table.rows[1].get("replicate"), Some("1"));
        assert_eq!(table.rows[1].metric("hits@10"), Some(0.75));

        // 写出的文件可以被重新读取
        let loaded = load_table(&config.general.collation_path, &CollationConfig::default()).unwrap();
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.rows[0].metric("hits@10"), Some(0.25));
    }

    #[test]
    fn test_collate_skips_rows_without_metric() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());
        let experiment = config.general.results_dir.join("kinships_transe");
        write_result(&experiment, 0, "softplus", Some(0.5), None);
        write_result(&experiment, 1, "softplus", None, None);

        let table = collate(&config).unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_build_row_requires_non_nullable_columns() {
        let config = Config::default();
        let values = HashMap::new();
        let err = build_row(&config, &values, 0).unwrap_err();
        assert!(err.to_string().contains("missing required column"));
    }

    #[test]
    fn test_target_key_falls_back_to_header() {
        let mut config = Config::default();
        config.collation.columns.clear();
        config.collation.target_key = None;

        let mut values = HashMap::new();
        values.insert(
            "hits@10".to_string(),
            ParameterValue::Basic(crate::models::BasicParameterValue::Float(0.4)),
        );
        let row = build_row(&config, &values, 2).unwrap();
        assert_eq!(row.metric("hits@10"), Some(0.4));
        assert_eq!(row.get("replicate"), Some("2"));
    }
}
