use crate::models::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn load_config(config_path: &Path) -> Result<Config> {
    // 检查配置文件是否存在，如果不存在则创建默认配置
    if !config_path.exists() {
        create_default_config(config_path)?;
        println!("Created default config file at {}", config_path.display());
    }

    // 读取配置文件内容
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    // 解析TOML配置
    let config: Config = toml::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    Ok(config)
}

fn create_default_config(config_path: &Path) -> Result<()> {
    let default_config = r#"[general]
config_root = "reduced_search_space"
results_dir = "results"
result_file = "results.json"
collation_path = "collation.tsv"
summary_dir = "summary"
readme_path = "README.md"
target_header = "hits@10"
seed = 5

[schema]
models = [
    "complex", "conve", "convkb", "distmult", "ermlp", "hole", "kg2e", "ntn", "proje", "rescal",
    "rgcn", "rotate", "simple", "structuredembedding", "transd", "transe", "transh", "transr",
    "tucker", "um",
]
datasets = ["fb15k237", "kinships", "wn18rr", "yago310", "examples"]
placeholder_dataset = "examples"
hpo_approaches = ["random"]
training_assumptions = { lcwa = 1, owa = 4 }
# "skip": 忽略以'.'开头的目录项；"stop": 遇到后结束扫描
hidden_entries = "skip"

[collation]
delimiter = "\t"
ignored_columns = ["searcher", "evaluator"]
null_markers = ["nan", "NaN", "None"]
replicate_prefix = "replicate-"
nullable_columns = ["negative_sampler", "regularizer"]
target_key = "metrics-hits_at_k-avg-10"

[collation.columns]
dataset = "metadata-dataset"
model = "pipeline-model"
optimizer = "pipeline-optimizer"
loss = "pipeline-loss"
training_loop = "pipeline-training_loop"
create_inverse_triples = "pipeline-dataset_kwargs-create_inverse_triples"
negative_sampler = "pipeline-negative_sampler"
regularizer = "pipeline-regularizer"

[report]
ablation_headers = [
    "dataset",
    "model",
    "optimizer",
    "loss",
    "training_loop",
    "create_inverse_triples",
    "negative_sampler",
    "regularizer",
]
binary_ablation_headers = ["create_inverse_triples"]
two_d_headers = ["create_inverse_triples", "loss", "optimizer", "training_loop"]
stratify_headers = ["dataset", "optimizer"]
suppressed_headers = { dataset = ["training_loop"] }
regularizer_labels = { NoRegularizer = "No Reg.", LpRegularizer = "Lp" }
detailed_labels = false
grid_columns = 2
violin_columns = 3
facet_wrap = 4
panel_width = 700
panel_height = 500
"#;

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(config_path, default_config)
        .with_context(|| format!("Failed to create default config file: {}", config_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HiddenEntryPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_creates_default_config_when_missing() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ablation_explorer.toml");

        let config = load_config(&path).unwrap();
        assert!(path.exists());

        // 写出的默认文件与内置默认值一致
        let defaults = Config::default();
        assert_eq!(config.general.target_header, defaults.general.target_header);
        assert_eq!(config.general.seed, 5);
        assert_eq!(config.schema.models, defaults.schema.models);
        assert_eq!(config.schema.training_assumptions, defaults.schema.training_assumptions);
        assert_eq!(config.schema.hidden_entries, HiddenEntryPolicy::Skip);
        assert_eq!(config.collation.delimiter, '\t');
        assert_eq!(config.collation.columns, defaults.collation.columns);
        assert_eq!(config.collation.target_key, defaults.collation.target_key);
        assert_eq!(config.report.ablation_headers, defaults.report.ablation_headers);
        assert_eq!(config.report.suppressed_headers, defaults.report.suppressed_headers);
        assert_eq!(config.report.regularizer_labels, defaults.report.regularizer_labels);
    }

    #[test]
    fn test_existing_config_is_not_overwritten() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[general]\ntarget_header = \"mrr\"\n\n[schema]\nhidden_entries = \"stop\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.general.target_header, "mrr");
        assert_eq!(config.schema.hidden_entries, HiddenEntryPolicy::Stop);
        // 未指定的字段使用默认值
        assert_eq!(config.general.seed, 5);
        assert!(fs::read_to_string(&path).unwrap().contains("mrr"));
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[general\nseed = ").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
