//! 下载计划准备。
//!
//! 先拉取书籍信息，再拉取目录，合成 `DownloadPlan`；任一步失败都直接终止，不会发起任何章节请求。

use anyhow::{Context, Result};
use tracing::info;

use super::models::{BookMetadata, ChapterRef, DownloadPlan};
use crate::network_parser::network::{ApiError, TomaApi};

/// 书籍信息 / 目录 / 封面的来源。
pub trait BookCatalog {
    fn fetch_metadata(&self, book_id: &str) -> Result<BookMetadata, ApiError>;
    fn fetch_chapter_list(&self, book_id: &str) -> Result<Vec<ChapterRef>, ApiError>;
    fn fetch_cover(&self, url: &str) -> Option<Vec<u8>>;
}

impl BookCatalog for TomaApi {
    fn fetch_metadata(&self, book_id: &str) -> Result<BookMetadata, ApiError> {
        TomaApi::fetch_metadata(self, book_id)
    }

    fn fetch_chapter_list(&self, book_id: &str) -> Result<Vec<ChapterRef>, ApiError> {
        TomaApi::fetch_chapter_list(self, book_id)
    }

    fn fetch_cover(&self, url: &str) -> Option<Vec<u8>> {
        TomaApi::fetch_cover(self, url)
    }
}

pub fn prepare_download_plan<C: BookCatalog + ?Sized>(
    catalog: &C,
    book_id: &str,
) -> Result<DownloadPlan> {
    info!(target: "download", book_id, "准备下载计划");

    let meta = catalog
        .fetch_metadata(book_id)
        .with_context(|| format!("获取书籍信息失败: book_id={book_id}"))?;
    let chapters = catalog
        .fetch_chapter_list(book_id)
        .with_context(|| format!("获取章节目录失败: book_id={book_id}"))?;

    info!(
        target: "download",
        book_id,
        book_name = %meta.book_name,
        chapters = chapters.len(),
        "下载计划就绪"
    );

    Ok(DownloadPlan {
        book_id: book_id.to_string(),
        meta,
        chapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubCatalog {
        meta: Result<BookMetadata, i64>,
        list_calls: AtomicUsize,
    }

    impl BookCatalog for StubCatalog {
        fn fetch_metadata(&self, _book_id: &str) -> Result<BookMetadata, ApiError> {
            self.meta.clone().map_err(ApiError::ApiCode)
        }

        fn fetch_chapter_list(&self, _book_id: &str) -> Result<Vec<ChapterRef>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ChapterRef {
                id: "101".to_string(),
                title: "第一章".to_string(),
                position: 0,
            }])
        }

        fn fetch_cover(&self, _url: &str) -> Option<Vec<u8>> {
            None
        }
    }

    #[test]
    fn plan_carries_metadata_and_chapters() {
        let catalog = StubCatalog {
            meta: Ok(BookMetadata::unknown("42")),
            list_calls: AtomicUsize::new(0),
        };
        let plan = prepare_download_plan(&catalog, "42").unwrap();
        assert_eq!(plan.book_id, "42");
        assert_eq!(plan.meta.author, "未知作者");
        assert_eq!(plan.chapters.len(), 1);
    }

    #[test]
    fn metadata_failure_stops_before_directory() {
        let catalog = StubCatalog {
            meta: Err(-1),
            list_calls: AtomicUsize::new(0),
        };
        let err = prepare_download_plan(&catalog, "42").unwrap_err();
        assert!(err.to_string().contains("获取书籍信息失败"));
        assert_eq!(catalog.list_calls.load(Ordering::SeqCst), 0);
    }
}
