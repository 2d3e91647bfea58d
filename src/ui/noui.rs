//! 命令行下载流程：书籍信息 → 目录 → 并发下载 → 成书。

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};

use super::console::Palette;
use crate::base_system::context::{Config, OutputFormat};
use crate::book_parser::book_manager::BookManager;
use crate::download::downloader::{ChapterSource, download_chapters};
use crate::download::models::{BookMetadata, DownloadResult};
use crate::download::plan::{BookCatalog, prepare_download_plan};
use crate::download::progress::ProgressReporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, result: DownloadResult },
    NoChapters,
}

pub fn download_book<A>(
    api: &A,
    config: &Config,
    book_id: &str,
    palette: Palette,
) -> Result<DownloadOutcome>
where
    A: BookCatalog + ChapterSource,
{
    download_book_with(api, config, book_id, palette, ProgressReporter::with_cli_bar)
}

pub(crate) fn download_book_with<A, F>(
    api: &A,
    config: &Config,
    book_id: &str,
    palette: Palette,
    make_progress: F,
) -> Result<DownloadOutcome>
where
    A: BookCatalog + ChapterSource,
    F: FnOnce(usize) -> ProgressReporter,
{
    let start_time = Instant::now();

    let plan = prepare_download_plan(api, book_id)?;
    print_book_summary(&plan.meta, palette);

    if plan.chapters.is_empty() {
        warn!(target: "download", book_id, "目录为空");
        println!("{}", palette.red("未找到章节列表"));
        return Ok(DownloadOutcome::NoChapters);
    }

    let total = plan.chapters.len();
    println!(
        "\n{}",
        palette.green(&format!("发现 {} 个章节，开始下载...", total))
    );

    let mut progress = make_progress(total);
    let results = download_chapters(api, &plan.chapters, config.worker_count(), &mut progress);
    drop(progress);

    let manager = BookManager::new(config, &plan.book_id, plan.meta);
    let cover = if manager.wants_cover() {
        api.fetch_cover(&manager.meta.cover_url)
    } else {
        None
    };
    let path = manager.finalize(&results, cover)?;

    let label = match config.output_format() {
        OutputFormat::Txt => "TXT生成成功",
        OutputFormat::Epub => "EPUB生成成功",
    };
    println!("{}：{}", palette.green(label), path.display());

    let result = DownloadResult::from_results(&results);
    if result.failed > 0 {
        println!(
            "{}",
            palette.yellow(&format!("有 {} 章下载失败，已写入占位文本", result.failed))
        );
    }
    println!(
        "\n{}文件保存至：{}",
        palette.green("下载完成！"),
        absolute_display(&path).display()
    );

    info!(
        target: "download",
        book_id,
        success = result.success,
        failed = result.failed,
        "下载完成，用时 {:.1}s",
        start_time.elapsed().as_secs_f32()
    );

    Ok(DownloadOutcome::Saved { path, result })
}

fn print_book_summary(meta: &BookMetadata, palette: Palette) {
    println!("\n{}", palette.blue("===== 书籍信息 ====="));
    println!("书名：{}", palette.magenta(&meta.book_name));
    println!("作者：{}", meta.author);
    println!("类型：{} | 状态：{}", meta.category, meta.status);
    println!("字数：{} | 在读：{}", meta.word_count, meta.readers);
}

fn absolute_display(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::downloader::FetchError;
    use crate::download::models::ChapterRef;
    use crate::network_parser::network::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubApi {
        meta_code: i64,
        chapters: Vec<ChapterRef>,
        failing: Option<String>,
        chapter_calls: AtomicUsize,
        cover_calls: AtomicUsize,
    }

    impl StubApi {
        fn with_chapters(n: usize) -> Self {
            let chapters = (0..n)
                .map(|i| ChapterRef {
                    id: format!("item-{i}"),
                    title: format!("标题{i}"),
                    position: i,
                })
                .collect();
            Self {
                meta_code: 0,
                chapters,
                failing: None,
                chapter_calls: AtomicUsize::new(0),
                cover_calls: AtomicUsize::new(0),
            }
        }
    }

    impl BookCatalog for StubApi {
        fn fetch_metadata(&self, book_id: &str) -> Result<BookMetadata, ApiError> {
            if self.meta_code != 0 {
                return Err(ApiError::ApiCode(self.meta_code));
            }
            let mut meta = BookMetadata::unknown(book_id);
            meta.book_name = "星海".to_string();
            meta.author = "某作者".to_string();
            meta.cover_url = "https://img.example.com/c.jpg".to_string();
            Ok(meta)
        }

        fn fetch_chapter_list(&self, _book_id: &str) -> Result<Vec<ChapterRef>, ApiError> {
            Ok(self.chapters.clone())
        }

        fn fetch_cover(&self, _url: &str) -> Option<Vec<u8>> {
            self.cover_calls.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    impl ChapterSource for StubApi {
        fn fetch_chapter(&self, item_id: &str) -> Result<String, FetchError> {
            self.chapter_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.as_deref() == Some(item_id) {
                return Err(FetchError::Timeout);
            }
            Ok(format!("正文-{item_id}"))
        }
    }

    fn txt_config(dir: &Path) -> Config {
        let mut cfg = Config::default();
        cfg.output_dir = dir.join("download").to_string_lossy().into_owned();
        cfg.default_format = "txt".to_string();
        cfg.default_threads = 2;
        cfg
    }

    #[test]
    fn full_run_writes_ordered_txt() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = txt_config(dir.path());
        let mut api = StubApi::with_chapters(5);
        api.failing = Some("item-3".to_string());

        let outcome =
            download_book_with(&api, &cfg, "42", Palette::new(false), ProgressReporter::hidden)
                .unwrap();
        let DownloadOutcome::Saved { path, result } = outcome else {
            panic!("expected a saved book");
        };
        assert_eq!(result, DownloadResult { success: 4, failed: 1 });
        assert_eq!(api.chapter_calls.load(Ordering::SeqCst), 5);
        // txt 不下载封面
        assert_eq!(api.cover_calls.load(Ordering::SeqCst), 0);

        let text = std::fs::read_to_string(path).unwrap();
        let positions: Vec<usize> = [
            "正文-item-0",
            "正文-item-1",
            "正文-item-2",
            "【章节 4 下载失败：请求超时】",
            "正文-item-4",
        ]
        .iter()
        .map(|needle| text.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_directory_produces_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = txt_config(dir.path());
        let api = StubApi::with_chapters(0);

        let outcome =
            download_book_with(&api, &cfg, "42", Palette::new(false), ProgressReporter::hidden)
                .unwrap();
        assert_eq!(outcome, DownloadOutcome::NoChapters);
        assert_eq!(api.chapter_calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("download").exists());
    }

    #[test]
    fn metadata_error_is_fatal_before_any_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = txt_config(dir.path());
        let mut api = StubApi::with_chapters(3);
        api.meta_code = 1001;

        let result =
            download_book_with(&api, &cfg, "42", Palette::new(false), ProgressReporter::hidden);
        assert!(result.is_err());
        assert_eq!(api.chapter_calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("download").exists());
    }

    #[test]
    fn epub_run_asks_for_cover() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = txt_config(dir.path());
        cfg.default_format = "epub".to_string();
        let api = StubApi::with_chapters(2);

        let outcome =
            download_book_with(&api, &cfg, "42", Palette::new(false), ProgressReporter::hidden)
                .unwrap();
        let DownloadOutcome::Saved { path, .. } = outcome else {
            panic!("expected a saved book");
        };
        assert!(path.ends_with("星海-某作者.epub"));
        assert_eq!(api.cover_calls.load(Ordering::SeqCst), 1);
    }
}
