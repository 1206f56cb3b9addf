use std::path::{Path, PathBuf};
use walkdir::{WalkDir, DirEntry};
use anyhow::{Context, Result};

/// 遍历结果目录，收集所有位于 "{prefix}{number}" 目录下的结果文件路径
pub fn find_result_files(results_dir: &Path, result_file: &str, replicate_prefix: &str) -> Result<Vec<PathBuf>> {
    // 检查目录是否存在
    if !results_dir.exists() {
        anyhow::bail!("Results directory '{}' does not exist", results_dir.display());
    }

    if !results_dir.is_dir() {
        anyhow::bail!("'{}' is not a directory", results_dir.display());
    }

    let mut result_files: Vec<PathBuf> = WalkDir::new(results_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)             // 过滤掉错误条目
        .filter(|entry| is_result_file(entry, result_file, replicate_prefix)) // 保留符合条件的
        .map(|entry| entry.path().to_path_buf()) // 提取路径
        .collect();                          // 收集成 Vec

    // 先按实验目录排序，同一实验内按重复编号排序
    result_files.sort_by(|a, b| {
        let experiment_a = a.parent().and_then(Path::parent);
        let experiment_b = b.parent().and_then(Path::parent);
        experiment_a.cmp(&experiment_b).then_with(|| {
            extract_replicate_number(a, replicate_prefix).cmp(&extract_replicate_number(b, replicate_prefix))
        })
    });

    Ok(result_files)
}

/// 从路径的父目录名中提取前缀后的字符串部分（如 "replicate-00042" → "00042"）
fn extract_replicate_str_from_path(path: &Path, replicate_prefix: &str) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|name| {
            name.to_string_lossy()
                .strip_prefix(replicate_prefix)
                .map(|s| s.to_string())
        })
}

/// 检查文件名是否为结果文件，且父目录名称为 "{prefix}{number}"
fn is_result_file(entry: &DirEntry, result_file: &str, replicate_prefix: &str) -> bool {
    entry.file_type().is_file()
        && entry.file_name() == result_file
        && extract_replicate_str_from_path(entry.path(), replicate_prefix)
        .and_then(|s| s.parse::<u32>().ok())
        .is_some()
}

/// 从文件路径中提取重复编号
fn extract_replicate_number(path: &Path, replicate_prefix: &str) -> u32 {
    extract_replicate_str_from_path(path, replicate_prefix)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// 从文件路径中提取重复编号（带错误处理）
pub fn extract_replicate_number_safe(path: &Path, replicate_prefix: &str) -> Result<u32> {
    let replicate_str = extract_replicate_str_from_path(path, replicate_prefix)
        .ok_or_else(|| anyhow::anyhow!("Failed to extract replicate number from path: {}", path.display()))?;

    replicate_str
        .parse()
        .with_context(|| format!("Failed to parse replicate number from: {}{}", replicate_prefix, replicate_str))
}
