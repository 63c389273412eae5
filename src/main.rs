use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use manga_downloader::cli::{Cli, Command};
use manga_downloader::utils::logging;
use manga_downloader::{App, Config, ConsoleSink, DownloadRequest};

/// 有章节下载失败时的退出码
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 加载配置
    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 配置加载失败: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.command.apply_to(&mut config);
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    if let Err(e) = logging::init(config.verbose_logging, &config.output_log_file) {
        eprintln!("❌ {:#}", e);
        return ExitCode::FAILURE;
    }
    logging::log_startup(cli.command.name(), config.concurrency);

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> Result<ExitCode> {
    // 命令行参数覆盖后的配置也需要校验
    config.validate()?;
    let verbose = config.verbose_logging;
    let app = App::initialize(config)?;

    match command {
        Command::Download {
            manga_url, chapters, ..
        } => {
            let request = DownloadRequest {
                manga_url,
                range: chapters,
            };
            let mut sink = ConsoleSink::new(verbose);
            let result = app.download(&request, &mut sink).await?;
            if result.has_failures() {
                warn!("⚠️ {} 个章节下载失败", result.failed);
                return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
            }
        }
        Command::List { manga_url, .. } => {
            let chapters = app.list_chapters(&manga_url).await?;
            for chapter in &chapters {
                match chapter.sequence_number() {
                    Some(n) => info!("{:>8}  {}", n, chapter.title()),
                    None => info!("{:>8}  {}", "-", chapter.title()),
                }
            }
        }
        Command::Search { query, .. } => {
            let hits = app.search(&query).await?;
            if hits.is_empty() {
                warn!("⚠️ 没有找到与 '{}' 匹配的漫画", query);
            }
            for hit in &hits {
                info!("{}  {}", hit.title, hit.url);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
