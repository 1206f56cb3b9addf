// src/result_parser.rs
use std::path::{Path, PathBuf};
use std::collections::HashMap;
use anyhow::{Context, Result};
use tracing::warn;
use crate::models::{ParameterValue, BasicParameterValue};
use serde_yaml;

/// 解析单个结果文件（JSON或YAML）到HashMap<String, ParameterValue>
// ————————————————————————————————————————————————————————————————————————
// 核心解析函数：serde_yaml 同时接受 JSON 文本
// ————————————————————————————————————————————————————————————————————————
pub fn parse_result_file(file_path: &Path) -> Result<HashMap<String, ParameterValue>> {
    let contents = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read result file: {}", file_path.display()))?;

    parse_result_str(&contents)
        .with_context(|| format!("Failed to parse result file: {}", file_path.display()))
}

pub fn parse_result_str(contents: &str) -> Result<HashMap<String, ParameterValue>> {
    let value: serde_yaml::Value = serde_yaml::from_str(contents)?;

    let mut result = HashMap::new();
    flatten_value(&value, &mut result, String::new())?;
    Ok(result)
}

// ————————————————————————————————————————————————————————————————————————
// 递归扁平化函数：处理路径拼接
// ————————————————————————————————————————————————————————————————————————
fn flatten_value(
    value: &serde_yaml::Value,
    output: &mut HashMap<String, ParameterValue>,
    path: String,
) -> Result<()> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                // 指标键常为数字（如 hits_at_k 下的 10）
                let key_str = match key {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => anyhow::bail!("Unsupported key in mapping: {:?}", key),
                };
                let new_path = if path.is_empty() { key_str } else { format!("{}-{}", path, key_str) };
                flatten_value(val, output, new_path)?;
            }
        }

        serde_yaml::Value::Sequence(seq) => {
            if seq.iter().all(|v| matches!(v, serde_yaml::Value::String(_) | serde_yaml::Value::Number(_) | serde_yaml::Value::Bool(_))) {
                let list: Result<Vec<ParameterValue>> = seq
                    .iter().map(base_value_to_parameter_value).collect();
                output.insert(path, ParameterValue::List(list?));
            } else {
                for (i, item) in seq.iter().enumerate() {
                    let item_path = format!("{}-{}", path, i);
                    flatten_value(item, output, item_path)?;
                }
            }
        }

        serde_yaml::Value::Tagged(tagged) => {
            flatten_value(&tagged.value, output, path)?;
        }

        serde_yaml::Value::Null => {
            // 空值不写入，汇总时视为缺失
        }

        _ => {
            output.insert(path, base_value_to_parameter_value(value)?);
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————
// 将 serde_yaml::Value 叶子转换为 ParameterValue
// ————————————————————————————————————————————————————————————————————————
fn base_value_to_parameter_value(value: &serde_yaml::Value) -> Result<ParameterValue> {
    match value {
        serde_yaml::Value::String(s) => Ok(ParameterValue::Basic(BasicParameterValue::String(s.clone()))),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ParameterValue::Basic(BasicParameterValue::Int(i)))
            } else if let Some(f) = n.as_f64() {
                Ok(ParameterValue::Basic(BasicParameterValue::Float(f)))
            } else {
                Err(anyhow::anyhow!("Unsupported number format in result file"))
            }
        }
        serde_yaml::Value::Bool(b) => Ok(ParameterValue::Basic(BasicParameterValue::Bool(*b))),
        _ => Err(anyhow::anyhow!("Unexpected value type: {:?}", value)),
    }
}

/// 批量解析多个结果文件，无法解析的文件记录警告后跳过
pub fn parse_multiple_result_files(file_paths: &[PathBuf]) -> Vec<(PathBuf, HashMap<String, ParameterValue>)> {
    let mut results = Vec::new();

    for file_path in file_paths {
        match parse_result_file(file_path) {
            Ok(values) => results.push((file_path.clone(), values)),
            Err(e) => warn!("Failed to parse {}: {:#}", file_path.display(), e),
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_json_result() {
        let json = r#"{
            "metadata": {"dataset": "kinships", "searcher": "random"},
            "pipeline": {
                "model": "TransE",
                "loss": "softplus",
                "regularizer": null,
                "dataset_kwargs": {"create_inverse_triples": true}
            },
            "metrics": {
                "hits_at_k": {"avg": {"1": 0.12, "10": 0.53}},
                "mean_rank": 41
            },
            "ks": [1, 3, 10]
        }"#;

        let values = parse_result_str(json).unwrap();

        assert_eq!(
            values.get("metadata-dataset"),
            Some(&ParameterValue::Basic(BasicParameterValue::String("kinships".to_string())))
        );
        assert_eq!(
            values.get("pipeline-dataset_kwargs-create_inverse_triples"),
            Some(&ParameterValue::Basic(BasicParameterValue::Bool(true)))
        );
        assert_eq!(
            values.get("metrics-hits_at_k-avg-10"),
            Some(&ParameterValue::Basic(BasicParameterValue::Float(0.53)))
        );
        assert_eq!(
            values.get("metrics-mean_rank"),
            Some(&ParameterValue::Basic(BasicParameterValue::Int(41)))
        );
        assert_eq!(
            values.get("ks"),
            Some(&ParameterValue::List(vec![
                ParameterValue::Basic(BasicParameterValue::Int(1)),
                ParameterValue::Basic(BasicParameterValue::Int(3)),
                ParameterValue::Basic(BasicParameterValue::Int(10)),
            ]))
        );

        // null 字段应被忽略
        assert!(!values.contains_key("pipeline-regularizer"));
    }

    #[test]
    fn test_parse_yaml_with_numeric_keys_and_nested_lists() {
        let yaml = r#"
metrics:
  hits_at_k:
    10: 0.4
stages:
  - name: train
    epochs: 100
  - name: eval
"#;
        let values = parse_result_str(yaml).unwrap();
        assert_eq!(
            values.get("metrics-hits_at_k-10"),
            Some(&ParameterValue::Basic(BasicParameterValue::Float(0.4)))
        );
        assert_eq!(
            values.get("stages-0-epochs"),
            Some(&ParameterValue::Basic(BasicParameterValue::Int(100)))
        );
        assert_eq!(
            values.get("stages-1-name"),
            Some(&ParameterValue::Basic(BasicParameterValue::String("eval".to_string())))
        );
    }

    #[test]
    fn test_parse_multiple_skips_broken_files() {
        let temp_dir = tempdir().unwrap();
        let good = temp_dir.path().join("good.json");
        let broken = temp_dir.path().join("broken.json");
        std::fs::write(&good, r#"{"a": 1}"#).unwrap();
        std::fs::write(&broken, "{ not: [valid").unwrap();

        let parsed = parse_multiple_result_files(&[good.clone(), broken, temp_dir.path().join("missing.json")]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, good);
    }
}
