//! 站点抓取能力 - 业务能力层
//!
//! 只负责"从站点拿到数据"，不关心下载流程和并发

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::{ChapterDescriptor, SearchHit};
use crate::services::site::Site;

/// 标题缺失时使用的占位名
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// 站点抓取能力
///
/// 每个站点一个实现，在构造时选定
#[async_trait]
pub trait MangaSource: Send + Sync {
    fn site(&self) -> Site;

    /// 漫画标题
    async fn fetch_title(&self, manga_url: &str) -> Result<String, ScrapeError>;

    /// 章节列表，顺序与站点展示顺序一致
    async fn fetch_chapter_list(&self, manga_url: &str)
        -> Result<Vec<ChapterDescriptor>, ScrapeError>;

    /// 章节图片地址
    async fn fetch_chapter_assets(&self, chapter_url: &str) -> Result<Vec<String>, ScrapeError>;

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ScrapeError>;
}

/// 创建模拟浏览器访问的 HTTP 客户端
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_static(config.site.base_url()));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
}

/// mangakakalot 系列站点（natomanga / mangakakalot / nelomanga）
pub struct KakalotSource {
    site: Site,
    client: Client,
}

impl KakalotSource {
    pub fn new(site: Site, client: Client) -> Self {
        Self { site, client }
    }

    async fn get_html(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("GET {}", url);
        let http_err = |source| ScrapeError::Http {
            url: url.to_string(),
            source,
        };
        self.client
            .get(url)
            .header(REFERER, self.site.base_url())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?
            .text()
            .await
            .map_err(http_err)
    }
}

#[async_trait]
impl MangaSource for KakalotSource {
    fn site(&self) -> Site {
        self.site
    }

    async fn fetch_title(&self, manga_url: &str) -> Result<String, ScrapeError> {
        let html = self.get_html(manga_url).await?;
        Ok(parse_title(&html).unwrap_or_else(|| {
            warn!("⚠️ 页面中没有找到标题: {}", manga_url);
            UNKNOWN_TITLE.to_string()
        }))
    }

    async fn fetch_chapter_list(
        &self,
        manga_url: &str,
    ) -> Result<Vec<ChapterDescriptor>, ScrapeError> {
        let html = self.get_html(manga_url).await?;
        parse_chapter_list(&html, manga_url)
    }

    async fn fetch_chapter_assets(&self, chapter_url: &str) -> Result<Vec<String>, ScrapeError> {
        let html = self.get_html(chapter_url).await?;
        parse_chapter_images(&html).ok_or(ScrapeError::MissingElement {
            what: "chapterImages",
            url: chapter_url.to_string(),
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ScrapeError> {
        let url = format!("{}/search/story/{}", self.site.base_url(), search_slug(query));
        let html = self.get_html(&url).await?;
        parse_search_results(&html, &url)
    }
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("静态选择器")
}

fn resolve_url(base: &str, href: &str) -> Result<String, ScrapeError> {
    let invalid = |reason: String| ScrapeError::InvalidUrl {
        url: href.to_string(),
        reason,
    };
    let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    base.join(href)
        .map(String::from)
        .map_err(|e| invalid(e.to_string()))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 解析漫画标题
pub fn parse_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let primary = selector("div.manga-info-content h1, ul.manga-info-text h1");
    let fallback = selector("h1");
    document
        .select(&primary)
        .chain(document.select(&fallback))
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// 解析章节列表，相对链接按 `page_url` 补全
pub fn parse_chapter_list(
    html: &str,
    page_url: &str,
) -> Result<Vec<ChapterDescriptor>, ScrapeError> {
    let document = Html::parse_document(html);
    let links = selector(".chapter-list .row a");

    let mut chapters = Vec::new();
    for link in document.select(&links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let title = link
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| element_text(link));
        chapters.push(ChapterDescriptor::new(title, resolve_url(page_url, href)?));
    }
    Ok(chapters)
}

fn chapter_images_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)var\s+chapterImages\s*=\s*\[(.*?)\];").expect("静态正则"))
}

fn cdns_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)var\s+cdns\s*=\s*\[(.*?)\];").expect("静态正则"))
}

fn split_js_array(body: &str) -> Vec<String> {
    body.split(',')
        .map(|item| item.trim().trim_matches(|c: char| c == '"' || c == '\'').replace("\\/", "/"))
        .filter(|item| !item.is_empty())
        .collect()
}

/// 从页面脚本的 `chapterImages` / `cdns` 变量中提取图片地址
///
/// 没有 `chapterImages` 变量时返回 `None`
pub fn parse_chapter_images(html: &str) -> Option<Vec<String>> {
    let paths = split_js_array(chapter_images_re().captures(html)?.get(1)?.as_str());
    let cdn = cdns_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| split_js_array(m.as_str()).into_iter().next());

    let urls = paths
        .into_iter()
        .filter_map(|path| match &cdn {
            Some(cdn) => resolve_url(cdn, &path).ok(),
            None => Url::parse(&path).ok().map(String::from),
        })
        .collect();
    Some(urls)
}

/// 解析搜索结果页
pub fn parse_search_results(html: &str, page_url: &str) -> Result<Vec<SearchHit>, ScrapeError> {
    let document = Html::parse_document(html);
    let links = selector(".story_item .story_name a, .search-story-item .item-title");

    let mut hits = Vec::new();
    for link in document.select(&links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        hits.push(SearchHit {
            title: element_text(link),
            url: resolve_url(page_url, href)?,
        });
    }
    Ok(hits)
}

/// 搜索关键词转为站点使用的路径片段
pub fn search_slug(query: &str) -> String {
    query
        .trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANGA_PAGE: &str = r#"
        <html><body>
          <div class="manga-info-content"><h1>  Solo  Leveling </h1></div>
          <div class="chapter-list">
            <div class="row"><span><a href="/manga/solo/chapter-3" title="Chapter 3">Chapter 3</a></span></div>
            <div class="row"><span><a href="https://www.natomanga.com/manga/solo/chapter-2">Chapter 2</a></span></div>
            <div class="row"><span><a title="Chapter 1">no href</a></span></div>
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_title_and_collapses_whitespace() {
        assert_eq!(parse_title(MANGA_PAGE).as_deref(), Some("Solo Leveling"));
        assert_eq!(parse_title("<html><body><p>x</p></body></html>"), None);
    }

    #[test]
    fn parses_chapter_rows_in_page_order() {
        let chapters =
            parse_chapter_list(MANGA_PAGE, "https://www.natomanga.com/manga/solo").unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title(), "Chapter 3");
        assert_eq!(
            chapters[0].source_locator(),
            "https://www.natomanga.com/manga/solo/chapter-3"
        );
        assert_eq!(chapters[0].sequence_number(), Some(3.0));
        assert_eq!(chapters[1].title(), "Chapter 2");
    }

    #[test]
    fn extracts_images_from_script_variables() {
        let html = r#"
            <script>
              var cdns = ["https:\/\/img.cdn.example\/"];
              var chapterImages = ["manga/a/001.jpg","manga/a/002.jpg"];
            </script>
        "#;
        let images = parse_chapter_images(html).unwrap();
        assert_eq!(
            images,
            vec![
                "https://img.cdn.example/manga/a/001.jpg",
                "https://img.cdn.example/manga/a/002.jpg",
            ]
        );
    }

    #[test]
    fn missing_script_variable_yields_none() {
        assert!(parse_chapter_images("<script>var x = 1;</script>").is_none());
    }

    #[test]
    fn builds_search_slug() {
        assert_eq!(search_slug("  One Piece: Red! "), "one_piece_red");
    }

    #[test]
    fn parses_search_results() {
        let html = r#"
            <div class="story_item"><h3 class="story_name"><a href="/manga/op">One Piece</a></h3></div>
        "#;
        let hits = parse_search_results(html, "https://www.natomanga.com/search/story/one").unwrap();
        assert_eq!(
            hits,
            vec![SearchHit {
                title: "One Piece".into(),
                url: "https://www.natomanga.com/manga/op".into()
            }]
        );
    }
}
