// src/main.rs
mod aggregate;
mod collate;
mod config;
mod file_utils;
mod models;
mod report;
mod result_parser;
mod result_table;
mod validator;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use collate::collate;
use config::load_config;
use models::Config;
use report::{build_report, PlottersRenderer};
use result_table::load_table;
use validator::ConfigTreeValidator;

#[derive(Parser, Debug)]
#[command(name = "AblationExplorer", about = "Validate HPO config trees and plot ablation results")]
struct Cli {
    /// 配置文件路径，不存在时自动创建
    #[arg(short, long, default_value = "ablation_explorer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检查配置目录树的结构
    Validate {
        /// 覆盖配置中的 config_root
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// 收集所有实验结果并写出汇总表
    Collate,
    /// 生成全部图表与索引（默认）
    Report,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command.unwrap_or(Commands::Report) {
        Commands::Validate { root } => run_validate(&config, root),
        Commands::Collate => {
            let table = collate(&config)?;
            println!("Collated {} rows into {}", table.rows.len(), config.general.collation_path.display());
            Ok(())
        }
        Commands::Report => run_report(&config),
    }
}

fn run_validate(config: &Config, root: Option<PathBuf>) -> Result<()> {
    let root = root.unwrap_or_else(|| config.general.config_root.clone());
    let validator = ConfigTreeValidator::new(config.schema.clone(), root);

    let entries = validator
        .validate()
        .with_context(|| format!("Invalid config tree under {}", validator.root().display()))?;
    for entry in &entries {
        debug!(
            "{} / {} / {} / {} / {}",
            entry.model, entry.dataset, entry.hpo_approach, entry.training_assumption, entry.config_file
        );
    }
    println!("Validated {} configuration files under {}", entries.len(), validator.root().display());
    Ok(())
}

fn run_report(config: &Config) -> Result<()> {
    let general = &config.general;
    if !general.collation_path.exists() {
        info!("No collation found at {}, collating first", general.collation_path.display());
        collate(config)?;
    }
    let table = load_table(&general.collation_path, &config.collation)?;

    // 绘图抖动可复现
    let mut renderer = PlottersRenderer::new(general.seed);
    let summary = build_report(config, &table, &mut renderer)?;
    info!(
        "{} of {} charts written, see {}",
        summary.produced.len(),
        summary.total(),
        general.summary_dir.join("report.json").display()
    );
    println!("done!");
    Ok(())
}
