// src/validator.rs
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::vec;

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::{ConfigEntry, HiddenEntryPolicy, SchemaConfig};

/// 配置目录树的结构性错误，遇到第一个即终止校验
#[derive(Debug, Error)]
pub enum StructuralViolation {
    #[error("Model {name} is unknown (found at {path})")]
    UnknownModel { name: String, path: PathBuf },

    #[error("Model {model}: expected configurations for exactly {expected:?}, but got {actual:?}")]
    DatasetCount {
        model: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Model {model}: dataset {name} is unknown")]
    UnknownDataset { model: String, name: String },

    #[error("{model}/{dataset}: only {expected:?} is allowed as HPO approach, but got {actual:?}")]
    HpoApproach {
        model: String,
        dataset: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("{model}/{dataset}/{hpo_approach}: expected only configurations for {expected:?}, but got {actual:?}")]
    TrainingAssumptions {
        model: String,
        dataset: String,
        hpo_approach: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("{model}/{dataset}/{hpo_approach}/{training_assumption}: exactly {expected} configuration(s) required, but {actual} were provided")]
    ConfigCount {
        model: String,
        dataset: String,
        hpo_approach: String,
        training_assumption: String,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to list directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// 校验 `<root>/<model>/<dataset>/<hpo>/<assumption>/<config>` 结构的配置目录树
#[derive(Debug, Clone)]
pub struct ConfigTreeValidator {
    schema: SchemaConfig,
    root: PathBuf,
}

impl ConfigTreeValidator {
    pub fn new(schema: SchemaConfig, root: impl Into<PathBuf>) -> Self {
        Self { schema, root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 返回一个新的惰性迭代器；每次调用都会从头开始遍历
    pub fn entries(&self) -> ConfigEntries<'_> {
        ConfigEntries {
            schema: &self.schema,
            root: &self.root,
            models: None,
            datasets: Vec::new().into_iter(),
            leaves: Vec::new().into_iter(),
            finished: false,
        }
    }

    /// 遍历整个目录树，返回全部叶子或第一个结构错误
    pub fn validate(&self) -> Result<Vec<ConfigEntry>, StructuralViolation> {
        self.entries().collect()
    }
}

/// 列出目录的直接子项名称（按名称排序）
fn list_children(dir: &Path) -> Result<Vec<String>, StructuralViolation> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| StructuralViolation::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// 配置目录树的惰性遍历器
///
/// 模型目录逐个展开；每个数据集目录的叶子在进入该目录时一次性校验，
/// 任一错误之后迭代器不再产生任何元素。
pub struct ConfigEntries<'a> {
    schema: &'a SchemaConfig,
    root: &'a Path,
    models: Option<vec::IntoIter<String>>,
    datasets: vec::IntoIter<(String, String)>,
    leaves: vec::IntoIter<ConfigEntry>,
    finished: bool,
}

impl<'a> ConfigEntries<'a> {
    /// 校验一个模型目录下的数据集集合，返回需要继续展开的数据集
    fn expand_model(&self, model: &str) -> Result<Vec<(String, String)>, StructuralViolation> {
        let model_dir = self.root.join(model);
        let datasets = list_children(&model_dir)?;

        if datasets.len() != self.schema.datasets.len() {
            return Err(StructuralViolation::DatasetCount {
                model: model.to_string(),
                expected: self.schema.datasets.clone(),
                actual: datasets,
            });
        }

        let mut expanded = Vec::new();
        for dataset in datasets {
            if dataset == self.schema.placeholder_dataset {
                continue;
            }
            if !self.schema.datasets.contains(&dataset) {
                return Err(StructuralViolation::UnknownDataset {
                    model: model.to_string(),
                    name: dataset,
                });
            }
            expanded.push((model.to_string(), dataset));
        }
        Ok(expanded)
    }

    /// 校验一个数据集目录，返回其下全部叶子配置文件
    fn expand_dataset(&self, model: &str, dataset: &str) -> Result<Vec<ConfigEntry>, StructuralViolation> {
        let dataset_dir = self.root.join(model).join(dataset);
        let hpo_approaches = list_children(&dataset_dir)?;

        // 当前只允许唯一的一种HPO方式（random）
        let allowed = &self.schema.hpo_approaches;
        let hpo_approach = match hpo_approaches.as_slice() {
            [single] if allowed.contains(single) => single.clone(),
            _ => {
                return Err(StructuralViolation::HpoApproach {
                    model: model.to_string(),
                    dataset: dataset.to_string(),
                    expected: allowed.clone(),
                    actual: hpo_approaches,
                });
            }
        };

        let hpo_dir = dataset_dir.join(&hpo_approach);
        let assumptions = list_children(&hpo_dir)?;
        let expected: BTreeSet<&String> = self.schema.training_assumptions.keys().collect();
        let actual: BTreeSet<&String> = assumptions.iter().collect();
        if assumptions.len() != expected.len() || actual != expected {
            return Err(StructuralViolation::TrainingAssumptions {
                model: model.to_string(),
                dataset: dataset.to_string(),
                hpo_approach,
                expected: self.schema.training_assumptions.keys().cloned().collect(),
                actual: assumptions,
            });
        }

        let mut leaves = Vec::new();
        for assumption in &assumptions {
            let configs_dir = hpo_dir.join(assumption);
            let configs = list_children(&configs_dir)?;
            let required = self.schema.training_assumptions[assumption];
            if configs.len() != required {
                return Err(StructuralViolation::ConfigCount {
                    model: model.to_string(),
                    dataset: dataset.to_string(),
                    hpo_approach,
                    training_assumption: assumption.clone(),
                    expected: required,
                    actual: configs.len(),
                });
            }

            for config in configs {
                leaves.push(ConfigEntry {
                    model: model.to_string(),
                    dataset: dataset.to_string(),
                    hpo_approach: hpo_approach.clone(),
                    training_assumption: assumption.clone(),
                    path: configs_dir.join(&config),
                    config_file: config,
                });
            }
        }
        Ok(leaves)
    }

    fn fail(&mut self, violation: StructuralViolation) -> Option<Result<ConfigEntry, StructuralViolation>> {
        self.finished = true;
        Some(Err(violation))
    }
}

impl<'a> Iterator for ConfigEntries<'a> {
    type Item = Result<ConfigEntry, StructuralViolation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(entry) = self.leaves.next() {
                debug!(path = %entry.path.display(), "validated config");
                return Some(Ok(entry));
            }

            if let Some((model, dataset)) = self.datasets.next() {
                match self.expand_dataset(&model, &dataset) {
                    Ok(leaves) => self.leaves = leaves.into_iter(),
                    Err(violation) => return self.fail(violation),
                }
                continue;
            }

            // 首次调用时才读取根目录
            if self.models.is_none() {
                match list_children(self.root) {
                    Ok(models) => self.models = Some(models.into_iter()),
                    Err(violation) => return self.fail(violation),
                }
            }

            let Some(model) = self.models.as_mut().and_then(Iterator::next) else {
                self.finished = true;
                return None;
            };

            if is_hidden(&model) {
                match self.schema.hidden_entries {
                    HiddenEntryPolicy::Skip => {
                        warn!(entry = %model, "skipping hidden entry in config root");
                        continue;
                    }
                    HiddenEntryPolicy::Stop => {
                        warn!(entry = %model, "hidden entry in config root, stopping scan");
                        self.finished = true;
                        return None;
                    }
                }
            }

            if !self.schema.models.contains(&model) {
                let path = self.root.join(&model);
                return self.fail(StructuralViolation::UnknownModel { name: model, path });
            }

            match self.expand_model(&model) {
                Ok(datasets) => self.datasets = datasets.into_iter(),
                Err(violation) => return self.fail(violation),
            }
        }
    }
}
