use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 章节描述
///
/// 一次下载的最小单元，构造后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterDescriptor {
    title: String,
    source_locator: String,
    sequence_number: Option<f64>,
}

impl ChapterDescriptor {
    /// 创建章节描述，章节号从标题中解析
    pub fn new(title: impl Into<String>, source_locator: impl Into<String>) -> Self {
        let title = title.into();
        let sequence_number = parse_chapter_number(&title);
        Self {
            title,
            source_locator: source_locator.into(),
            sequence_number,
        }
    }

    /// 使用显式章节号创建
    pub fn with_number(
        title: impl Into<String>,
        source_locator: impl Into<String>,
        sequence_number: Option<f64>,
    ) -> Self {
        Self {
            title: title.into(),
            source_locator: source_locator.into(),
            sequence_number,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_locator(&self) -> &str {
        &self.source_locator
    }

    pub fn sequence_number(&self) -> Option<f64> {
        self.sequence_number
    }

    /// 可以安全用作目录名的标题
    pub fn sanitized_title(&self) -> String {
        sanitize_file_name(&self.title)
    }
}

impl fmt::Display for ChapterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sequence_number {
            Some(n) => write!(f, "#{} {}", n, self.title),
            None => write!(f, "#? {}", self.title),
        }
    }
}

fn chapter_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:chapter|chap|ch)\.?\s*(\d+(?:\.\d+)?)").expect("静态正则")
    })
}

fn first_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("静态正则"))
}

/// 从章节标题中解析章节号
///
/// 优先匹配 `Chapter 12.5` 这类写法，否则取标题中的第一个数字
pub fn parse_chapter_number(title: &str) -> Option<f64> {
    let raw = chapter_keyword_re()
        .captures(title)
        .and_then(|c| c.get(1))
        .or_else(|| first_number_re().find(title))?;
    raw.as_str().parse().ok()
}

/// 把任意字符串转换为可用的文件/目录名
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// 章节排序比较：按章节号升序，无章节号的排在最后
pub fn compare_chapters(a: &ChapterDescriptor, b: &ChapterDescriptor) -> Ordering {
    match (a.sequence_number, b.sequence_number) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 将章节列表规范为升序（稳定排序）
///
/// 站点通常按倒序展示章节，下载前需要先调用本函数
pub fn sort_chapters(chapters: &mut [ChapterDescriptor]) {
    chapters.sort_by(compare_chapters);
}
