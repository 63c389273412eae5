//! 直接下载图片的章节流程
//!
//! 流程顺序：
//! 1. 创建章节目录
//! 2. 向站点获取图片地址
//! 3. 逐张下载（带 Referer）
//! 4. 写入 metadata.json

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{ChapterDescriptor, LogLevel};
use crate::services::{MangaSource, MetadataWriter};
use crate::workflow::chapter_fetcher::{ChapterFetcher, ChapterLayout, ChapterProgress};

pub struct HttpChapterFetcher<S: ?Sized> {
    source: Arc<S>,
    client: Client,
    layout: ChapterLayout,
    metadata_writer: MetadataWriter,
}

impl<S: MangaSource + ?Sized> HttpChapterFetcher<S> {
    pub fn new(source: Arc<S>, client: Client, layout: ChapterLayout) -> Self {
        Self {
            source,
            client,
            layout,
            metadata_writer: MetadataWriter::new(),
        }
    }

    async fn download_image(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .header(REFERER, self.source.site().base_url())
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await.map_err(http_err)?.to_vec())
    }
}

#[async_trait]
impl<S: MangaSource + ?Sized> ChapterFetcher for HttpChapterFetcher<S> {
    async fn fetch(
        &self,
        chapter: &ChapterDescriptor,
        progress: ChapterProgress,
    ) -> Result<(), FetchError> {
        let dir = self.layout.prepare(chapter).await?;
        let image_urls = self
            .source
            .fetch_chapter_assets(chapter.source_locator())
            .await?;

        if image_urls.is_empty() {
            return Err(FetchError::NoImages {
                url: chapter.source_locator().to_string(),
            });
        }

        let total = image_urls.len();
        progress.log(
            LogLevel::Info,
            format!("Found {} images in {}", total, chapter.title()),
        );

        for (i, url) in image_urls.iter().enumerate() {
            let index = i + 1;
            let bytes = self.download_image(url).await?;
            let path = dir.join(format!("{:03}.{}", index, image_extension(url)));
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| FetchError::io(&path, e))?;
            debug!("已保存 {} ({} 字节)", path.display(), bytes.len());
            progress.report_fraction(index, total);
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

/// 从图片地址推断扩展名，未知时使用 jpg
pub fn image_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "png",
        Some("webp") => "webp",
        Some("gif") => "gif",
        Some("avif") => "avif",
        _ => "jpg",
    }
}
