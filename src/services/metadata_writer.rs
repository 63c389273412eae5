//! 元数据写入服务 - 业务能力层
//!
//! 只负责"写 metadata.json"能力，不关心流程

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FetchError;
use crate::models::ChapterMetadata;

/// 章节目录中的元数据文件名
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// 元数据写入服务
pub struct MetadataWriter {
    file_name: String,
}

impl MetadataWriter {
    pub fn new() -> Self {
        Self {
            file_name: METADATA_FILE_NAME.to_string(),
        }
    }

    /// 写入章节元数据，返回文件路径
    pub async fn write(
        &self,
        chapter_dir: &Path,
        metadata: &ChapterMetadata,
    ) -> Result<PathBuf, FetchError> {
        let path = chapter_dir.join(&self.file_name);
        debug!(
            "写入元数据: {} | {}",
            metadata.chapter_title,
            path.display()
        );

        let json = serde_json::to_string_pretty(metadata)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| FetchError::io(&path, e))?;

        Ok(path)
    }
}

impl Default for MetadataWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_pretty_json_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = ChapterMetadata {
            manga_title: "Solo Leveling".into(),
            chapter_title: "Chapter 1".into(),
            chapter_url: "https://example.com/c1".into(),
        };

        let path = MetadataWriter::new()
            .write(dir.path(), &metadata)
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), METADATA_FILE_NAME);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n"));
        let parsed: ChapterMetadata = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[tokio::test]
    async fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = ChapterMetadata {
            manga_title: "m".into(),
            chapter_title: "c".into(),
            chapter_url: "u".into(),
        };
        let err = MetadataWriter::new()
            .write(&dir.path().join("nope"), &metadata)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
