// ==========================================
// 表格数据导入系统 - 命令行入口
// ==========================================
// 子命令:
// - preview: 输出 PreviewResult JSON
// - import:  输出 ImportReport JSON
// 日志写 stderr，stdout 只输出结果 JSON
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabular_import::api::{ImportApi, ImportRequest};
use tabular_import::app::{get_default_db_path, AppState};
use tabular_import::config::{ImportConfig, ImportConfigReader};
use tabular_import::{logging, ColumnMapping, ResourceCatalog};

#[derive(Parser, Debug)]
#[command(name = "tabular-import", version, about = "表格数据导入系统")]
struct Cli {
    /// 数据库路径（默认: $TABULAR_IMPORT_DB_PATH 或用户数据目录）
    #[arg(long, global = true, env = "TABULAR_IMPORT_DB_PATH")]
    db: Option<String>,

    /// 输出 JSON 结构化日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 预览表格文件
    Preview(PreviewArgs),
    /// 导入表格文件
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// 表格文件路径
    file: PathBuf,

    /// 资源目录 JSON
    #[arg(long)]
    catalog: PathBuf,

    /// 样本行数（默认读取配置）
    #[arg(long)]
    sample_size: Option<usize>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// 表格文件路径
    file: PathBuf,

    /// 资源目录 JSON
    #[arg(long)]
    catalog: PathBuf,

    /// 目标资源键
    #[arg(long)]
    resource: String,

    /// 列映射，形如 "源列=属性"，可重复
    #[arg(long = "map", value_name = "COLUMN=ATTRIBUTE")]
    mappings: Vec<String>,

    /// 启用校验规则
    #[arg(long)]
    validate: bool,
}

fn parse_mapping(raw: &[String]) -> Result<ColumnMapping> {
    raw.iter()
        .map(|pair| {
            let (column, attribute) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("映射格式应为 COLUMN=ATTRIBUTE: {}", pair))?;
            Ok::<_, anyhow::Error>((column.trim().to_string(), attribute.trim().to_string()))
        })
        .collect()
}

/// 命令行直接给出文件路径：以其所在目录作为上传目录
fn split_file(file: &Path) -> Result<(PathBuf, String)> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("无效文件路径: {}", file.display()))?
        .to_string();
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name))
}

async fn build_api(
    db_path: String,
    catalog_path: &Path,
    file: &Path,
    sample_size: Option<usize>,
) -> Result<(ImportApi, String)> {
    let catalog = ResourceCatalog::from_json_file(catalog_path)
        .with_context(|| format!("加载资源目录失败: {}", catalog_path.display()))?;
    let (upload_dir, name) = split_file(file)?;

    let state = AppState::with_upload_dir(db_path, catalog, upload_dir.clone())
        .map_err(|e| anyhow!(e))?;

    let sample_size = match sample_size {
        Some(n) => n,
        None => state
            .config_manager
            .get_preview_sample_size()
            .await
            .map_err(|e| anyhow!("读取样本行数失败: {}", e))?,
    };
    let config = ImportConfig::new(upload_dir).with_sample_size(sample_size);

    Ok((state.import_api_with_config(Arc::new(config)), name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!(version = tabular_import::VERSION, db_path = %db_path, "启动");

    match cli.command {
        Command::Preview(args) => {
            let (api, name) = build_api(db_path, &args.catalog, &args.file, args.sample_size).await?;
            let preview = api.preview(&name).await?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Command::Import(args) => {
            let mappings = parse_mapping(&args.mappings)?;
            if mappings.is_empty() {
                bail!("至少需要一个 --map 列映射");
            }
            let (api, name) = build_api(db_path, &args.catalog, &args.file, None).await?;
            let request = ImportRequest::new(args.resource, mappings).with_validation(args.validate);

            let report = api.import(&name, &request).await?;
            tracing::info!(
                total = report.total_rows,
                imported = report.imported,
                "导入结束"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !report.is_success() {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
