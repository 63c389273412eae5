use serde::{Deserialize, Serialize};

/// 章节目录下的 `metadata.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMetadata {
    pub manga_title: String,
    pub chapter_title: String,
    pub chapter_url: String,
}

/// 搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}
