use std::path::{Path, PathBuf};
use std::process::ExitCode;

use autodim_config::{AppConfig, ConfigError, DraftingStandard, LoggingConfig, PaperSize};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

mod pipeline;

use pipeline::RunOptions;

/// 为按第三角画法排布的 DXF 投影图自动添加尺寸标注。
#[derive(Debug, Parser)]
#[command(name = "autodim", version, long_about = None)]
struct Cli {
    /// 输入 DXF 文件
    input: PathBuf,
    /// 输出 DXF 文件（默认 `<输入>_dimensioned.dxf`）
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 配置文件路径，未指定时依次尝试 `AUTODIM_CONFIG` 与 `./config/default.toml`
    #[arg(long)]
    config: Option<PathBuf>,
    /// 覆盖配置中的制图标准（ISO 或 ANSI）
    #[arg(long)]
    standard: Option<DraftingStandard>,
    /// 覆盖配置中的图纸幅面（A0..A5），用于计算出图比例
    #[arg(long)]
    paper: Option<PaperSize>,
    /// 将标注结果写成 JSON 报告
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            init_logging(&LoggingConfig::default());
            error!(error = %err, "加载配置失败");
            return ExitCode::FAILURE;
        }
    };
    if let Some(standard) = cli.standard {
        config.dimensioning.standard = standard;
    }
    if let Some(paper) = cli.paper {
        config.drawing.paper_size = Some(paper);
    }

    init_logging(&config.logging);
    info!(input = %cli.input.display(), standard = %config.dimensioning.standard, "启动自动标注");

    let options = RunOptions {
        input: cli.input,
        output: cli.output,
        report: cli.report,
    };
    match pipeline::run(&config, &options) {
        Ok(summary) => {
            summary.print();
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "自动标注失败");
            ExitCode::FAILURE
        }
    }
}

/// 配置错误一律视为致命错误，不回退到默认值。
fn load_configuration(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(config.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
