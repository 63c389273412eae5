//! 浏览器渲染章节流程
//!
//! 流程顺序：
//! 1. 创建章节目录
//! 2. 新建页面并等待加载（带超时）
//! 3. 逐个 `<img>` 滚动到可见区域后截图，跳过过小的图片
//! 4. 关闭页面，写入 metadata.json
//!
//! 每个章节使用独立的页面，章节之间只共享 Browser

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, Page};
use tokio::time::error::Elapsed;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{ChapterDescriptor, LogLevel};
use crate::services::MetadataWriter;
use crate::workflow::chapter_fetcher::{ChapterFetcher, ChapterLayout, ChapterProgress};

/// 滚动后等待图片渲染的时间
const SETTLE_DELAY: Duration = Duration::from_millis(500);

pub struct BrowserChapterFetcher {
    browser: Arc<Browser>,
    layout: ChapterLayout,
    min_image_size: f64,
    page_load_timeout: Duration,
    metadata_writer: MetadataWriter,
}

impl BrowserChapterFetcher {
    pub fn new(browser: Arc<Browser>, layout: ChapterLayout, config: &Config) -> Self {
        Self {
            browser,
            layout,
            min_image_size: config.min_image_size,
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            metadata_writer: MetadataWriter::new(),
        }
    }

    /// 先打开空白页再导航，超时或失败时关闭该页面
    async fn open_page(&self, url: &str) -> Result<Page, FetchError> {
        let page = self.browser.new_page("about:blank").await?;

        let navigation = tokio::time::timeout(self.page_load_timeout, page.goto(url))
            .await
            .map(|loaded| loaded.map(|_| ()));

        match navigation_error(navigation, url, self.page_load_timeout) {
            None => Ok(page),
            Some(e) => {
                if let Err(close_err) = page.close().await {
                    warn!("关闭页面失败 ({}): {}", url, close_err);
                }
                Err(e)
            }
        }
    }

    /// 截取所有图片，返回保存的数量
    async fn capture_images(
        &self,
        page: &Page,
        dir: &Path,
        progress: &ChapterProgress,
    ) -> Result<usize, FetchError> {
        let images = page.find_elements("img").await?;
        let total = images.len();
        progress.log(
            LogLevel::Info,
            format!("Found {} images in {}", total, progress.title()),
        );

        let mut saved = 0;
        for (i, image) in images.iter().enumerate() {
            let index = i + 1;
            match self.capture_image(image, index, dir).await {
                Ok(true) => saved += 1,
                Ok(false) => {}
                // 单张失败不影响整章
                Err(e) => progress.log(
                    LogLevel::Danger,
                    format!("Failed to save image #{}: {}", index, e),
                ),
            }
            progress.report_fraction(index, total);
        }
        Ok(saved)
    }

    /// 截取单张图片；过小的图片返回 `Ok(false)`
    async fn capture_image(
        &self,
        image: &Element,
        index: usize,
        dir: &Path,
    ) -> Result<bool, FetchError> {
        image.scroll_into_view().await?;
        tokio::time::sleep(SETTLE_DELAY).await;

        let bbox = image.bounding_box().await?;
        if is_decorative(bbox.width, bbox.height, self.min_image_size) {
            debug!(
                "跳过小图片 #{} ({:.0}x{:.0})",
                index, bbox.width, bbox.height
            );
            return Ok(false);
        }

        let path = dir.join(format!("{:03}.png", index));
        image
            .save_screenshot(CaptureScreenshotFormat::Png, &path)
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl ChapterFetcher for BrowserChapterFetcher {
    async fn fetch(
        &self,
        chapter: &ChapterDescriptor,
        progress: ChapterProgress,
    ) -> Result<(), FetchError> {
        let dir = self.layout.prepare(chapter).await?;
        let page = self.open_page(chapter.source_locator()).await?;

        let captured = self.capture_images(&page, &dir, &progress).await;
        if let Err(e) = page.close().await {
            warn!("关闭页面失败 ({}): {}", chapter.title(), e);
        }

        if captured? == 0 {
            return Err(FetchError::NoImages {
                url: chapter.source_locator().to_string(),
            });
        }

        let metadata_path = self
            .metadata_writer
            .write(&dir, &self.layout.metadata(chapter))
            .await?;
        progress.log(
            LogLevel::Success,
            format!("Saved metadata to {}", metadata_path.display()),
        );

        Ok(())
    }
}

/// 导航结果转为错误；成功时返回 `None`
fn navigation_error(
    navigation: Result<Result<(), CdpError>, Elapsed>,
    url: &str,
    timeout: Duration,
) -> Option<FetchError> {
    match navigation {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(FetchError::Browser(e)),
        Err(_) => Some(FetchError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}

/// 宽和高都小于阈值才视为装饰图片
///
/// 只有一边较小的（渲染了一半的长图）仍然保留
pub fn is_decorative(width: f64, height: f64, threshold: f64) -> bool {
    width < threshold && height < threshold
}
