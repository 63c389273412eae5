pub mod browser_fetcher;
pub mod chapter_fetcher;
pub mod http_fetcher;

pub use browser_fetcher::BrowserChapterFetcher;
pub use chapter_fetcher::{ChapterFetcher, ChapterLayout, ChapterProgress};
pub use http_fetcher::HttpChapterFetcher;
