//! 命令入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 HTTP 客户端和站点抓取能力
//! 2. **章节准备**：获取标题、章节列表，按范围筛选
//! 3. **资源管理**：按需启动浏览器并构造 `ChapterFetcher`
//! 4. **批量下载**：委托 `BatchOrchestrator`，Ctrl-C 触发取消
//! 5. **全局统计**：输出最终结果

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::browser;
use crate::config::{Config, Renderer};
use crate::error::FetchError;
use crate::models::{select_chapters, sort_chapters, BatchResult, ChapterDescriptor, SearchHit};
use crate::orchestrator::batch_orchestrator::BatchOrchestrator;
use crate::progress::ProgressSink;
use crate::services::{build_http_client, KakalotSource, MangaSource};
use crate::utils::logging;
use crate::workflow::{
    BrowserChapterFetcher, ChapterFetcher, ChapterLayout, ChapterProgress, HttpChapterFetcher,
};

/// 一次下载请求
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub manga_url: String,
    /// 章节范围，例如 `"2-4"`；为空时下载全部章节
    pub range: Option<String>,
}

/// 应用主结构
pub struct App {
    config: Config,
    source: Arc<dyn MangaSource>,
    client: reqwest::Client,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let client = build_http_client(&config).context("创建 HTTP 客户端失败")?;
        let source: Arc<dyn MangaSource> = Arc::new(KakalotSource::new(config.site, client.clone()));
        Ok(Self {
            config,
            source,
            client,
        })
    }

    /// 使用指定的站点实现初始化
    pub fn with_source(config: Config, source: Arc<dyn MangaSource>) -> Result<Self> {
        let client = build_http_client(&config).context("创建 HTTP 客户端失败")?;
        Ok(Self {
            config,
            source,
            client,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 获取章节列表（升序）
    pub async fn list_chapters(&self, manga_url: &str) -> Result<Vec<ChapterDescriptor>> {
        info!("📁 正在获取章节列表: {}", manga_url);
        let mut chapters = self
            .source
            .fetch_chapter_list(manga_url)
            .await
            .with_context(|| format!("获取章节列表失败: {}", manga_url))?;
        sort_chapters(&mut chapters);
        info!("✓ 找到 {} 个章节", chapters.len());
        Ok(chapters)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        info!("🔍 在 {} 搜索: {}", self.source.site(), query);
        let hits = self
            .source
            .search(query)
            .await
            .with_context(|| format!("搜索失败: {}", query))?;
        info!("✓ 搜索完成，找到 {} 个结果", hits.len());
        Ok(hits)
    }

    /// 下载章节
    ///
    /// 范围无效时直接返回错误，不会开始任何下载
    pub async fn download<S>(&self, request: &DownloadRequest, sink: &mut S) -> Result<BatchResult>
    where
        S: ProgressSink + ?Sized,
    {
        let manga_title = self
            .source
            .fetch_title(&request.manga_url)
            .await
            .with_context(|| format!("获取漫画标题失败: {}", request.manga_url))?;
        let chapters = self.list_chapters(&request.manga_url).await?;

        let selected = match &request.range {
            Some(range) => select_chapters(chapters, range)?,
            None => chapters,
        };

        let orchestrator = BatchOrchestrator::new(self.config.concurrency)?;
        logging::log_batch_start(&manga_title, selected.len(), self.config.concurrency);

        // 没有章节时不启动浏览器
        let fetcher: Arc<dyn ChapterFetcher> = if selected.is_empty() {
            Arc::new(NoopFetcher)
        } else {
            self.build_fetcher(&manga_title).await?
        };

        let cancel = orchestrator.cancel_handle();
        let ctrl_c_watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⚠️ 收到 Ctrl-C，等待进行中的章节完成...");
                cancel.cancel();
            }
        });

        let result = orchestrator.submit(selected, fetcher, sink).await;
        ctrl_c_watcher.abort();

        logging::print_final_stats(&result, &self.config.output_log_file);
        Ok(result)
    }

    async fn build_fetcher(&self, manga_title: &str) -> Result<Arc<dyn ChapterFetcher>> {
        let layout = ChapterLayout::new(&self.config.output_dir, manga_title);
        info!("📂 保存目录: {}", layout.manga_dir().display());

        let fetcher: Arc<dyn ChapterFetcher> = match self.config.renderer {
            Renderer::Browser => {
                let browser = browser::open_browser(&self.config).await?;
                Arc::new(BrowserChapterFetcher::new(
                    Arc::new(browser),
                    layout,
                    &self.config,
                ))
            }
            Renderer::Http => Arc::new(HttpChapterFetcher::new(
                self.source.clone(),
                self.client.clone(),
                layout,
            )),
        };
        Ok(fetcher)
    }
}

/// 空批次使用的占位实现，编排器不会调用它
struct NoopFetcher;

#[async_trait]
impl ChapterFetcher for NoopFetcher {
    async fn fetch(
        &self,
        _chapter: &ChapterDescriptor,
        _progress: ChapterProgress,
    ) -> Result<(), FetchError> {
        Ok(())
    }
}
