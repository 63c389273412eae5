use serde::Serialize;

use crate::models::chapter::ChapterDescriptor;

/// 单个章节的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed { reason: String },
    /// 取消前尚未开始，从未调用 fetch
    Cancelled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

/// 一次批量下载的汇总结果
///
/// 条目顺序与提交顺序一致；重复提交的章节各占一条
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    entries: Vec<(ChapterDescriptor, Outcome)>,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchResult {
    pub fn new(entries: Vec<(ChapterDescriptor, Outcome)>) -> Self {
        let mut result = Self {
            entries,
            ..Default::default()
        };
        for (_, outcome) in &result.entries {
            match outcome {
                Outcome::Success => result.succeeded += 1,
                Outcome::Failed { .. } => result.failed += 1,
                Outcome::Cancelled => result.cancelled += 1,
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(ChapterDescriptor, Outcome)] {
        &self.entries
    }

    /// 按提交下标获取结果
    pub fn outcome(&self, index: usize) -> Option<&Outcome> {
        self.entries.get(index).map(|(_, o)| o)
    }

    /// 按标题查找第一条结果
    pub fn outcome_for(&self, title: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|(c, _)| c.title() == title)
            .map(|(_, o)| o)
    }

    /// 所有失败章节及原因
    pub fn failures(&self) -> impl Iterator<Item = (&ChapterDescriptor, &str)> {
        self.entries.iter().filter_map(|(c, o)| match o {
            Outcome::Failed { reason } => Some((c, reason.as_str())),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_outcome_kind() {
        let result = BatchResult::new(vec![
            (ChapterDescriptor::new("Chapter 1", "a"), Outcome::Success),
            (
                ChapterDescriptor::new("Chapter 2", "b"),
                Outcome::Failed {
                    reason: "timeout".into(),
                },
            ),
            (ChapterDescriptor::new("Chapter 3", "c"), Outcome::Cancelled),
            (ChapterDescriptor::new("Chapter 4", "d"), Outcome::Success),
        ]);

        assert_eq!(result.len(), 4);
        assert_eq!((result.succeeded, result.failed, result.cancelled), (2, 1, 1));
        assert!(result.has_failures());
        let failures: Vec<_> = result.failures().map(|(c, r)| (c.title(), r)).collect();
        assert_eq!(failures, vec![("Chapter 2", "timeout")]);
        assert_eq!(result.outcome_for("Chapter 3"), Some(&Outcome::Cancelled));
    }
}
