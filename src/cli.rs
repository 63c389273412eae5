//! 命令行参数

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, Renderer};
use crate::services::Site;

#[derive(Debug, Parser)]
#[command(name = "manga-dl", version, about = "并发下载漫画章节")]
pub struct Cli {
    /// 配置文件路径（默认读取当前目录下的 manga-dl.toml）
    #[arg(long, global = true, env = "MANGA_DL_CONFIG")]
    pub config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 下载章节
    Download {
        /// 漫画主页地址
        #[arg(long)]
        manga_url: String,

        /// 章节范围，例如 "2-4" 或 "7"；不指定时下载全部
        #[arg(long)]
        chapters: Option<String>,

        /// 下载根目录
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 同时下载的章节数量
        #[arg(short, long)]
        concurrency: Option<usize>,

        #[arg(long, value_enum)]
        site: Option<Site>,

        #[arg(long, value_enum)]
        renderer: Option<Renderer>,
    },

    /// 列出章节
    List {
        #[arg(long)]
        manga_url: String,

        #[arg(long, value_enum)]
        site: Option<Site>,
    },

    /// 按名称搜索漫画
    Search {
        query: String,

        #[arg(long, value_enum)]
        site: Option<Site>,
    },
}

impl Command {
    /// 日志中显示的命令名
    pub fn name(&self) -> &'static str {
        match self {
            Command::Download { .. } => "download",
            Command::List { .. } => "list",
            Command::Search { .. } => "search",
        }
    }

    /// 用命令行参数覆盖配置
    ///
    /// 未指定 `--site` 时根据漫画地址推断站点
    pub fn apply_to(&self, config: &mut Config) {
        match self {
            Command::Download {
                manga_url,
                output,
                concurrency,
                site,
                renderer,
                ..
            } => {
                if let Some(output) = output {
                    config.output_dir = output.clone();
                }
                if let Some(concurrency) = concurrency {
                    config.concurrency = *concurrency;
                }
                if let Some(renderer) = renderer {
                    config.renderer = *renderer;
                }
                config.site = site.or_else(|| Site::detect(manga_url)).unwrap_or(config.site);
            }
            Command::List { manga_url, site } => {
                config.site = site.or_else(|| Site::detect(manga_url)).unwrap_or(config.site);
            }
            Command::Search { site, .. } => {
                if let Some(site) = site {
                    config.site = *site;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_download_flags() {
        let cli = Cli::parse_from([
            "manga-dl",
            "--verbose",
            "download",
            "--manga-url",
            "https://www.natomanga.com/manga/solo",
            "--chapters",
            "2-4",
            "-c",
            "2",
            "--renderer",
            "http",
        ]);
        assert!(cli.verbose);

        let mut config = Config::default();
        cli.command.apply_to(&mut config);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.renderer, Renderer::Http);
        assert_eq!(config.site, Site::Natomanga);

        match cli.command {
            Command::Download { chapters, .. } => assert_eq!(chapters.as_deref(), Some("2-4")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn site_is_detected_from_url() {
        let cli = Cli::parse_from([
            "manga-dl",
            "list",
            "--manga-url",
            "https://www.nelomanga.com/manga/abc",
        ]);
        let mut config = Config::default();
        cli.command.apply_to(&mut config);
        assert_eq!(config.site, Site::Nelomanga);
    }

    #[test]
    fn explicit_site_wins_over_url() {
        let cli = Cli::parse_from([
            "manga-dl",
            "list",
            "--manga-url",
            "https://www.nelomanga.com/manga/abc",
            "--site",
            "mangakakalot",
        ]);
        let mut config = Config::default();
        cli.command.apply_to(&mut config);
        assert_eq!(config.site, Site::Mangakakalot);
    }

    #[test]
    fn download_requires_manga_url() {
        assert!(Cli::try_parse_from(["manga-dl", "download"]).is_err());
    }
}
