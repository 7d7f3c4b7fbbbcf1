// ==========================================
// 配置工作簿 - 命令行入口
// ==========================================
// 子命令: transform（请求文件 → 文档）/ ini（INI → JSON）
// 输出: 结果写 stdout，日志写 stderr
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config_workbook::{ini_to_json, logging, OutputFormat, WorkbookEngine, WorkbookRequest};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "config-workbook",
    version,
    about = "将 CSV / Excel 工作表按映射文档转换为分组的 JSON/YAML 文档"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 按请求文件执行转换
    Transform {
        /// 请求文件（YAML 或 JSON）
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// 输出格式（json / pretty / yaml）
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// 将 INI 文件转换为 JSON
    Ini {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 只输出指定节
        #[arg(long)]
        section: Option<String>,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let output = match cli.command {
        Command::Transform { request, format } => {
            tracing::info!(request = %request.display(), "开始转换");
            let parsed = WorkbookRequest::from_file(&request)
                .with_context(|| format!("无法读取请求文件 {}", request.display()))?;
            WorkbookEngine::new()
                .transform_to_string(&parsed, format)
                .context("转换失败")?
        }
        Command::Ini { file, section } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("无法读取 INI 文件 {}", file.display()))?;
            ini_to_json(&text, section.as_deref()).context("INI 转换失败")?
        }
    };

    println!("{}", output);
    Ok(())
}
