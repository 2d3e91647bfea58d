//! 下载相关的数据模型定义。
//!
//! 包含章节引用、章节结果、书籍元数据、下载计划、进度快照等核心数据结构。

/// 目录中的一章。`position` 是目录顺序下标（从 0 开始），也是最终成书的唯一排序依据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    pub id: String,
    pub title: String,
    pub position: usize,
}

impl ChapterRef {
    /// 面向用户的章节序号（从 1 开始）。
    pub fn display_number(&self) -> usize {
        self.position + 1
    }
}

/// 单章下载结果：要么是正文，要么是失败占位文本，二者只居其一。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterResult {
    pub position: usize,
    pub title: String,
    pub content: String,
    pub failed: bool,
}

impl ChapterResult {
    pub fn fetched(chapter: &ChapterRef, content: String) -> Self {
        Self {
            position: chapter.position,
            title: chapter.title.clone(),
            content,
            failed: false,
        }
    }

    pub fn failed(chapter: &ChapterRef, reason: &str) -> Self {
        Self {
            position: chapter.position,
            title: chapter.title.clone(),
            content: failure_placeholder(chapter.display_number(), reason),
            failed: true,
        }
    }
}

pub fn failure_placeholder(display_number: usize, reason: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        format!("【章节 {} 下载失败】", display_number)
    } else {
        format!("【章节 {} 下载失败：{}】", display_number, reason)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadResult {
    pub success: u32,
    pub failed: u32,
}

impl DownloadResult {
    pub fn from_results(results: &[ChapterResult]) -> Self {
        let failed = results.iter().filter(|r| r.failed).count() as u32;
        Self {
            success: results.len() as u32 - failed,
            failed,
        }
    }
}

/// 书籍元数据；字段缺失时使用固定的“未知…”占位文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub book_name: String,
    pub author: String,
    pub summary: String,
    pub cover_url: String,
    pub category: String,
    pub status: String,
    pub word_count: String,
    pub readers: String,
}

impl BookMetadata {
    pub fn unknown(book_id: &str) -> Self {
        Self {
            book_name: format!("未知书名_{}", book_id),
            author: "未知作者".to_string(),
            summary: "无简介".to_string(),
            cover_url: String::new(),
            category: "未知类型".to_string(),
            status: "未知状态".to_string(),
            word_count: "未知字数".to_string(),
            readers: "未知在读人数".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub book_id: String,
    pub meta: BookMetadata,
    pub chapters: Vec<ChapterRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub done: usize,
    pub failed: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(position: usize) -> ChapterRef {
        ChapterRef {
            id: format!("id-{position}"),
            title: format!("第{}章", position + 1),
            position,
        }
    }

    #[test]
    fn placeholder_uses_one_based_number() {
        let r = ChapterResult::failed(&chapter(3), "请求超时");
        assert!(r.failed);
        assert_eq!(r.position, 3);
        assert_eq!(r.content, "【章节 4 下载失败：请求超时】");
    }

    #[test]
    fn placeholder_without_reason() {
        assert_eq!(failure_placeholder(1, "  "), "【章节 1 下载失败】");
    }

    #[test]
    fn summary_counts_failures() {
        let results = vec![
            ChapterResult::fetched(&chapter(0), "a".to_string()),
            ChapterResult::failed(&chapter(1), "x"),
            ChapterResult::fetched(&chapter(2), "c".to_string()),
        ];
        let summary = DownloadResult::from_results(&results);
        assert_eq!(summary.success, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn unknown_metadata_embeds_book_id() {
        let meta = BookMetadata::unknown("7143038691944959011");
        assert_eq!(meta.book_name, "未知书名_7143038691944959011");
        assert_eq!(meta.author, "未知作者");
        assert!(meta.cover_url.is_empty());
    }
}
