use std::sync::Arc;

use manga_downloader::browser::open_browser;
use manga_downloader::config::Config;
use manga_downloader::services::{build_http_client, KakalotSource, MangaSource};
use manga_downloader::workflow::{BrowserChapterFetcher, ChapterLayout};
use manga_downloader::{
    App, ChapterDescriptor, ChapterFetcher, ChapterProgress, ConsoleSink, DownloadRequest,
    FetchError, Renderer, Site,
};

/// 需要联网：cargo test -- --ignored
const MANGA_URL: &str = "https://www.natomanga.com/manga/the-beginning-after-the-end";

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_fetch_chapter_list() {
    let config = Config::load(None).expect("加载配置失败");
    let client = build_http_client(&config).expect("创建 HTTP 客户端失败");
    let source = KakalotSource::new(Site::Natomanga, client);

    let title = source.fetch_title(MANGA_URL).await.expect("获取标题失败");
    let chapters = source
        .fetch_chapter_list(MANGA_URL)
        .await
        .expect("获取章节列表失败");

    println!("{}: {} 个章节", title, chapters.len());
    assert!(!chapters.is_empty(), "应该至少有一个章节");
}

#[tokio::test]
#[ignore]
async fn test_download_first_chapter_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        output_dir: dir.path().to_path_buf(),
        renderer: Renderer::Http,
        concurrency: 1,
        ..Config::load(None).expect("加载配置失败")
    };
    let app = App::initialize(config).expect("初始化失败");

    let request = DownloadRequest {
        manga_url: MANGA_URL.to_string(),
        range: Some("1".to_string()),
    };
    let result = app
        .download(&request, &mut ConsoleSink::new(true))
        .await
        .expect("下载失败");

    assert_eq!(result.succeeded, 1, "第一章应该下载成功");
}

#[tokio::test]
#[ignore]
async fn test_search() {
    let config = Config::load(None).expect("加载配置失败");
    let app = App::initialize(config).expect("初始化失败");

    let hits = app.search("solo leveling").await.expect("搜索失败");

    assert!(!hits.is_empty(), "应该能搜到结果");
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_page_load_timeout_closes_tab() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        output_dir: dir.path().to_path_buf(),
        page_load_timeout_secs: 0,
        ..Config::load(None).expect("加载配置失败")
    };
    let browser = Arc::new(open_browser(&config).await.expect("启动浏览器失败"));
    let before = browser.pages().await.expect("获取页面失败").len();

    let fetcher =
        BrowserChapterFetcher::new(browser.clone(), ChapterLayout::new(dir.path(), "M"), &config);
    let chapter = ChapterDescriptor::new("Chapter 1", MANGA_URL);
    let err = fetcher
        .fetch(&chapter, ChapterProgress::detached("Chapter 1"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }), "{:?}", err);
    assert_eq!(browser.pages().await.expect("获取页面失败").len(), before);
}
