// models.rs - 作为模块目录入口文件（Rust 2018+ 风格）
// 导出所有子模块
pub mod config;
pub mod models;
pub mod parameter_value;
pub mod summary;
pub mod utils;

// 重新导出常用类型，保持API一致性
pub use config::{
    CollationConfig, Config, GeneralConfig, HiddenEntryPolicy, ReportConfig, SchemaConfig,
};
pub use models::{ConfigEntry, ResultRow, ResultTable};
pub use parameter_value::{BasicParameterValue, ParameterValue};
pub use summary::{ProducedChart, ReportSummary, SkippedChart, Strategy};
pub use utils::{deserialize_optional_string, parse_optional_cell, title_case};
