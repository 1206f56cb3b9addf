use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 应用程序配置结构
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub schema: SchemaConfig,
    pub collation: CollationConfig,
    pub report: ReportConfig,
}

/// 通用配置
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneralConfig {
    pub config_root: PathBuf,    // HPO配置目录树的根目录
    pub results_dir: PathBuf,    // 原始实验结果的根目录
    pub result_file: String,     // 每个replicate目录下的结果文件名
    pub collation_path: PathBuf, // 汇总表路径
    pub summary_dir: PathBuf,    // 图表输出目录
    pub readme_path: PathBuf,    // 顶层索引文档
    pub target_header: String,   // 目标指标列名
    pub seed: u64,               // 绘图抖动使用的随机种子
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            config_root: PathBuf::from("reduced_search_space"),
            results_dir: PathBuf::from("results"),
            result_file: "results.json".to_string(),
            collation_path: PathBuf::from("collation.tsv"),
            summary_dir: PathBuf::from("summary"),
            readme_path: PathBuf::from("README.md"),
            target_header: "hits@10".to_string(),
            seed: 5,
        }
    }
}

/// 遇到隐藏目录项（以'.'开头）时的处理策略
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HiddenEntryPolicy {
    /// 只跳过该目录项，继续扫描
    #[default]
    Skip,
    /// 遇到第一个隐藏目录项即结束整个扫描
    Stop,
}

/// 配置目录树的结构约束
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchemaConfig {
    pub models: Vec<String>,
    pub datasets: Vec<String>,
    pub placeholder_dataset: String,
    pub hpo_approaches: Vec<String>,
    // ————————————————————————————————————————————————————————————————————————
    // 训练假设 → 该目录下要求的配置文件数量
    // ————————————————————————————————————————————————————————————————————————
    pub training_assumptions: BTreeMap<String, usize>,
    pub hidden_entries: HiddenEntryPolicy,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        let models = [
            "complex", "conve", "convkb", "distmult", "ermlp", "hole", "kg2e", "ntn", "proje",
            "rescal", "rgcn", "rotate", "simple", "structuredembedding", "transd", "transe",
            "transh", "transr", "tucker", "um",
        ];
        let datasets = ["fb15k237", "kinships", "wn18rr", "yago310", "examples"];
        Self {
            models: models.iter().map(|s| s.to_string()).collect(),
            datasets: datasets.iter().map(|s| s.to_string()).collect(),
            placeholder_dataset: "examples".to_string(),
            hpo_approaches: vec!["random".to_string()],
            training_assumptions: BTreeMap::from([("lcwa".to_string(), 1), ("owa".to_string(), 4)]),
            hidden_entries: HiddenEntryPolicy::Skip,
        }
    }
}

/// 汇总表的读写配置
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollationConfig {
    pub delimiter: char,
    pub ignored_columns: Vec<String>,
    pub null_markers: Vec<String>,
    pub replicate_prefix: String,
    // ————————————————————————————————————————————————————————————————————————
    // 汇总列名 → 结果文件中扁平化后的键（如 "metadata-dataset"）
    // ————————————————————————————————————————————————————————————————————————
    pub columns: BTreeMap<String, String>,
    pub nullable_columns: Vec<String>,
    // 目标指标在结果文件中的键；为空时直接使用目标列名
    #[serde(deserialize_with = "crate::models::utils::deserialize_optional_string")]
    pub target_key: Option<String>,
}

impl Default for CollationConfig {
    fn default() -> Self {
        let columns = [
            ("dataset", "metadata-dataset"),
            ("model", "pipeline-model"),
            ("optimizer", "pipeline-optimizer"),
            ("loss", "pipeline-loss"),
            ("training_loop", "pipeline-training_loop"),
            ("create_inverse_triples", "pipeline-dataset_kwargs-create_inverse_triples"),
            ("negative_sampler", "pipeline-negative_sampler"),
            ("regularizer", "pipeline-regularizer"),
        ];
        Self {
            delimiter: '\t',
            ignored_columns: vec!["searcher".to_string(), "evaluator".to_string()],
            null_markers: vec!["nan".to_string(), "NaN".to_string(), "None".to_string()],
            replicate_prefix: "replicate-".to_string(),
            columns: columns.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            nullable_columns: vec!["negative_sampler".to_string(), "regularizer".to_string()],
            target_key: Some("metrics-hits_at_k-avg-10".to_string()),
        }
    }
}

/// 报告生成配置
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub ablation_headers: Vec<String>,
    pub binary_ablation_headers: Vec<String>,
    pub two_d_headers: Vec<String>,
    pub stratify_headers: Vec<String>,
    // 按某个表头切片时需要隐藏的其他表头
    pub suppressed_headers: BTreeMap<String, Vec<String>>,
    pub regularizer_labels: BTreeMap<String, String>,
    // 配置标签中是否包含正则化器与负采样器
    pub detailed_labels: bool,
    pub grid_columns: usize,
    pub violin_columns: usize,
    pub facet_wrap: usize,
    pub panel_width: u32,
    pub panel_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let headers = [
            "dataset", "model", "optimizer", "loss", "training_loop", "create_inverse_triples",
            "negative_sampler", "regularizer",
        ];
        Self {
            ablation_headers: headers.iter().map(|s| s.to_string()).collect(),
            binary_ablation_headers: vec!["create_inverse_triples".to_string()],
            two_d_headers: ["create_inverse_triples", "loss", "optimizer", "training_loop"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stratify_headers: vec!["dataset".to_string(), "optimizer".to_string()],
            suppressed_headers: BTreeMap::from([(
                "dataset".to_string(),
                vec!["training_loop".to_string()],
            )]),
            regularizer_labels: BTreeMap::from([
                ("NoRegularizer".to_string(), "No Reg.".to_string()),
                ("LpRegularizer".to_string(), "Lp".to_string()),
            ]),
            detailed_labels: false,
            grid_columns: 2,
            violin_columns: 3,
            facet_wrap: 4,
            panel_width: 700,
            panel_height: 500,
        }
    }
}

impl ReportConfig {
    /// 按`header`切片时被隐藏的表头
    pub fn suppressed_for(&self, header: &str) -> &[String] {
        self.suppressed_headers
            .get(header)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
