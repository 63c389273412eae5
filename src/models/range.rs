//! 章节范围选择
//!
//! 范围按章节号（闭区间）解释，而不是列表下标

use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::models::chapter::{sort_chapters, ChapterDescriptor};

/// 闭区间章节范围 `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChapterRange {
    pub start: f64,
    pub end: f64,
}

impl ChapterRange {
    /// 解析 `"2-4"` 或单个章节号 `"3"`
    pub fn parse(input: &str) -> AppResult<Self> {
        let text = input.trim();
        if text.is_empty() {
            return Err(AppError::invalid_range(input, "范围为空"));
        }

        let (start_text, end_text) = match text.split_once('-') {
            Some((start, end)) => (start.trim(), end.trim()),
            None => (text, text),
        };

        let start = parse_bound(input, start_text)?;
        let end = parse_bound(input, end_text)?;

        if start > end {
            return Err(AppError::invalid_range(
                input,
                format!("起始章节 {} 大于结束章节 {}", start, end),
            ));
        }

        Ok(Self { start, end })
    }

    pub fn contains(&self, number: f64) -> bool {
        number >= self.start && number <= self.end
    }
}

impl FromStr for ChapterRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ChapterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn parse_bound(input: &str, bound: &str) -> AppResult<f64> {
    match bound.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(AppError::invalid_range(
            input,
            format!("'{}' 不是有效的章节号", bound),
        )),
    }
}

/// 从章节列表中选出范围内的章节
///
/// 列表会先被规范为升序；返回结果同样为升序。
/// 起始章节小于 1，或结束章节超过可用章节数量时返回 `InvalidRange`。
pub fn select_range(
    mut chapters: Vec<ChapterDescriptor>,
    range: &ChapterRange,
) -> AppResult<Vec<ChapterDescriptor>> {
    let available = chapters.len();

    if range.start < 1.0 {
        return Err(AppError::invalid_range(
            range.to_string(),
            format!("起始章节 {} 小于 1", range.start),
        ));
    }
    if range.end > available as f64 {
        return Err(AppError::invalid_range(
            range.to_string(),
            format!("结束章节 {} 超出可用章节数量 {}", range.end, available),
        ));
    }

    sort_chapters(&mut chapters);

    Ok(chapters
        .into_iter()
        .filter(|c| c.sequence_number().is_some_and(|n| range.contains(n)))
        .collect())
}

/// 解析并选择，供命令行直接使用
pub fn select_chapters(
    chapters: Vec<ChapterDescriptor>,
    range_text: &str,
) -> AppResult<Vec<ChapterDescriptor>> {
    let range = ChapterRange::parse(range_text)?;
    select_range(chapters, &range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_chapters_descending() -> Vec<ChapterDescriptor> {
        (1..=5)
            .rev()
            .map(|n| ChapterDescriptor::new(format!("Chapter {}", n), format!("u{}", n)))
            .collect()
    }

    fn numbers(chapters: &[ChapterDescriptor]) -> Vec<f64> {
        chapters.iter().filter_map(|c| c.sequence_number()).collect()
    }

    #[test]
    fn selects_inclusive_range_in_ascending_order() {
        let selected = select_chapters(five_chapters_descending(), "2-4").unwrap();
        assert_eq!(numbers(&selected), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn single_number_selects_one_chapter() {
        let selected = select_chapters(five_chapters_descending(), " 5 ").unwrap();
        assert_eq!(numbers(&selected), vec![5.0]);
    }

    #[test]
    fn rejects_reversed_range() {
        let err = select_chapters(five_chapters_descending(), "4-2").unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }

    #[test]
    fn rejects_start_below_one() {
        let err = select_chapters(five_chapters_descending(), "0-3").unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }

    #[test]
    fn rejects_end_beyond_available() {
        let err = select_chapters(five_chapters_descending(), "3-99").unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }

    #[test]
    fn rejects_non_numeric_bounds() {
        for input in ["a-3", "2-b", "", "-", "1-2-3"] {
            let result = select_chapters(five_chapters_descending(), input);
            assert!(
                matches!(result, Err(AppError::InvalidRange { .. })),
                "应拒绝 {:?}",
                input
            );
        }
    }

    #[test]
    fn decimal_chapters_inside_range_are_kept() {
        let mut chapters = five_chapters_descending();
        chapters.push(ChapterDescriptor::new("Chapter 2.5", "u25"));
        let selected = select_chapters(chapters, "2-3").unwrap();
        assert_eq!(numbers(&selected), vec![2.0, 2.5, 3.0]);
    }
}
