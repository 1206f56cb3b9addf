// src/report/index.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::aggregate::unique_values;
use crate::models::{title_case, Strategy};
use crate::report::ReportContext;

fn generated_at() -> String {
    Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

/// 1D切片目录下的索引：每个消融表头一节，列出所有观察到的取值
pub fn slice_index_markdown(ctx: &ReportContext, generated_at: &str) -> String {
    let mut out = String::new();
    out.push_str("# Ablation Results\n\n");
    out.push_str(&format!("Output at {}\n", generated_at));
    for header in &ctx.report.ablation_headers {
        out.push_str(&format!("\n## {}\n\n", title_case(header)));
        for value in unique_values(&ctx.rows, header) {
            out.push_str(&format!("<img src=\"{}_{}.png\" alt=\"{}\"/>\n\n", header, value, value));
        }
    }
    out
}

/// 顶层 README：只列出按数据集切片的图表
pub fn dataset_index_markdown(ctx: &ReportContext, image_dir: &str, generated_at: &str) -> String {
    let mut out = String::new();
    out.push_str("# Ablation Results\n\n");
    out.push_str(&format!("Output at {}\n\n", generated_at));
    for value in unique_values(&ctx.rows, "dataset") {
        out.push_str(&format!("<img src=\"{}/dataset_{}.png\" alt=\"{}\"/>\n\n", image_dir, value, value));
    }
    out
}

pub fn write_slice_index(path: &Path, ctx: &ReportContext) -> Result<()> {
    fs::write(path, slice_index_markdown(ctx, &generated_at()))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote slice index to {}", path.display());
    Ok(())
}

/// 写出顶层 README，图片路径相对于 README 所在目录
pub fn write_dataset_index(readme_path: &Path, summary_dir: &Path, ctx: &ReportContext) -> Result<()> {
    let slices_dir = summary_dir.join(Strategy::Slices1d.directory());
    let image_dir = match readme_path.parent() {
        Some(parent) => slices_dir.strip_prefix(parent).unwrap_or(slices_dir.as_path()),
        None => slices_dir.as_path(),
    };
    let image_dir = image_dir.to_string_lossy().replace('\\', "/");

    if let Some(parent) = readme_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(readme_path, dataset_index_markdown(ctx, &image_dir, &generated_at()))
        .with_context(|| format!("Failed to write {}", readme_path.display()))?;
    info!("Wrote README to {}", readme_path.display());
    Ok(())
}
