// src/result_table.rs
use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::{parse_optional_cell, CollationConfig, ResultRow, ResultTable};

/// 将配置中的分隔符转换为单字节
fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow::anyhow!("Delimiter {:?} is not a single ASCII character", delimiter))
}

/// 读取汇总表，去掉被忽略的列，并将空值标记转换为缺失值
pub fn load_table(path: &Path, collation: &CollationConfig) -> Result<ResultTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(collation.delimiter)?)
        .from_path(path)
        .with_context(|| format!("Failed to open collation table: {}", path.display()))?;

    let ignored: HashSet<&str> = collation.ignored_columns.iter().map(String::as_str).collect();
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let columns: Vec<String> = headers
        .iter()
        .filter(|h| !ignored.contains(h.as_str()))
        .cloned()
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read record {} of {}", line + 1, path.display()))?;
        let values = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !ignored.contains(header.as_str()))
            .map(|(header, cell)| (header.clone(), parse_optional_cell(cell, &collation.null_markers)))
            .collect();
        rows.push(ResultRow { values });
    }

    info!(rows = rows.len(), columns = columns.len(), "loaded collation table from {}", path.display());
    Ok(ResultTable { columns, rows })
}

/// 写出汇总表，缺失值写为空单元格
pub fn write_table(path: &Path, table: &ResultTable, delimiter: char) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .from_path(path)
        .with_context(|| format!("Failed to create collation table: {}", path.display()))?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(table.columns.iter().map(|c| row.get(c).unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}
