use std::collections::HashMap;
use std::path::PathBuf;

/// 配置目录树中一个通过校验的叶子配置文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub model: String,
    pub dataset: String,
    pub hpo_approach: String,
    pub training_assumption: String,
    pub config_file: String,
    pub path: PathBuf, // 配置文件的完整路径
}

/// 汇总表中的一行，对应一次实验试验
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultRow {
    // ————————————————————————————————————————————————————————————————————————
    // 列名 → 单元格值；None 表示缺失值（如没有负采样器）
    // ————————————————————————————————————————————————————————————————————————
    pub values: HashMap<String, Option<String>>,
}

impl ResultRow {
    /// 获取某一列的值，缺失时返回None
    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).and_then(|v| v.as_deref())
    }

    /// 将目标列解析为数值，无法解析或为NaN时返回None
    pub fn metric(&self, target_header: &str) -> Option<f64> {
        self.get(target_header)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| !v.is_nan())
    }
}

/// 完整的汇总表
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Option<&str>)]) -> ResultRow {
        ResultRow {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(|s| s.to_string())))
                .collect(),
        }
    }

    #[test]
    fn test_result_row_accessors() {
        let r = row(&[
            ("model", Some("transe")),
            ("regularizer", None),
            ("hits@10", Some("0.42")),
            ("replicate", Some("3")),
        ]);

        assert_eq!(r.get("model"), Some("transe"));
        assert_eq!(r.get("regularizer"), None);
        assert_eq!(r.get("missing"), None);
        assert_eq!(r.metric("hits@10"), Some(0.42));
        assert_eq!(r.get("replicate"), Some("3"));
    }

    #[test]
    fn test_metric_rejects_nan_and_text() {
        let r = row(&[("hits@10", Some("NaN")), ("mrr", Some("n/a"))]);
        assert_eq!(r.metric("hits@10"), None);
        assert_eq!(r.metric("mrr"), None);
    }

    #[test]
    fn test_config_entry_creation() {
        let entry = ConfigEntry {
            model: "transe".to_string(),
            dataset: "kinships".to_string(),
            hpo_approach: "random".to_string(),
            training_assumption: "lcwa".to_string(),
            config_file: "transe_kinships.json".to_string(),
            path: PathBuf::from("root/transe/kinships/random/lcwa/transe_kinships.json"),
        };
        assert_eq!(entry.path.file_name().unwrap(), "transe_kinships.json");
    }
}
