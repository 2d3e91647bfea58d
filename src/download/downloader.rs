//! 章节并发下载编排。
//!
//! 每章一个任务，投递到固定大小的工作线程池；结果按章节下标写入预分配的槽位，
//! 全部结束后按目录顺序输出。单章失败只会变成占位文本，不影响其他章节。

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use crossbeam_channel as channel;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{ChapterRef, ChapterResult, DownloadResult};
use super::progress::ProgressReporter;

/// 单章正文获取失败的原因。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("请求超时")]
    Timeout,
    #[error("网络错误: {0}")]
    Transport(String),
    #[error("HTTP 状态码 {0}")]
    Status(u16),
    #[error("响应解析失败: {0}")]
    Malformed(String),
    #[error("接口返回 code={0}")]
    ApiCode(i64),
    #[error("响应缺少 content 字段")]
    MissingContent,
    #[error("正文为空")]
    EmptyContent,
    #[error("下载线程异常: {0}")]
    Panicked(String),
}

/// 章节正文来源。实现需要能被多个下载线程同时调用。
pub trait ChapterSource: Send + Sync {
    /// 拉取并清洗一章正文。
    fn fetch_chapter(&self, item_id: &str) -> Result<String, FetchError>;
}

/// 并发下载全部章节，返回与 `chapters` 顺序一致、数量相同的结果。
///
/// `concurrency` 为 0 时按 1 处理，且不会超过章节数。
pub fn download_chapters<S>(
    source: &S,
    chapters: &[ChapterRef],
    concurrency: usize,
    progress: &mut ProgressReporter,
) -> Vec<ChapterResult>
where
    S: ChapterSource + ?Sized,
{
    if chapters.is_empty() {
        return Vec::new();
    }

    let start = Instant::now();
    let workers = concurrency.max(1).min(chapters.len());
    info!(target: "download", total = chapters.len(), workers, "开始下载章节");

    let slots: Mutex<Vec<Option<ChapterResult>>> = Mutex::new(vec![None; chapters.len()]);

    let (tx, rx) = channel::unbounded::<usize>();
    let (done_tx, done_rx) = channel::unbounded::<bool>();
    for idx in 0..chapters.len() {
        let _ = tx.send(idx);
    }
    drop(tx);

    thread::scope(|scope| {
        for worker in 0..workers {
            let rx = rx.clone();
            let done_tx = done_tx.clone();
            let slots = &slots;
            let spawned = thread::Builder::new()
                .name(format!("chapter-worker-{worker}"))
                .spawn_scoped(scope, move || {
                    for idx in rx.iter() {
                        let result = fetch_one(source, &chapters[idx]);
                        let failed = result.failed;
                        store_slot(slots, idx, result);
                        let _ = done_tx.send(failed);
                    }
                });
            if let Err(err) = spawned {
                warn!(target: "download", worker, error = %err, "创建下载线程失败");
            }
        }
        drop(done_tx);

        for failed in done_rx.iter() {
            progress.inc_done(failed);
        }
    });
    progress.finish();

    let slots = slots.into_inner().unwrap_or_else(|p| p.into_inner());
    let results: Vec<ChapterResult> = slots
        .into_iter()
        .zip(chapters)
        .map(|(slot, chapter)| {
            slot.unwrap_or_else(|| {
                warn!(target: "download", position = chapter.position, "章节未返回结果");
                ChapterResult::failed(chapter, "未返回结果")
            })
        })
        .collect();

    let summary = DownloadResult::from_results(&results);
    info!(
        target: "download",
        "章节下载结束：成功 {} 章，失败 {} 章，用时 {:.1}s",
        summary.success,
        summary.failed,
        start.elapsed().as_secs_f32()
    );

    results
}

fn fetch_one<S>(source: &S, chapter: &ChapterRef) -> ChapterResult
where
    S: ChapterSource + ?Sized,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| source.fetch_chapter(&chapter.id)))
        .unwrap_or_else(|payload| Err(FetchError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(content) if !content.trim().is_empty() => {
            debug!(target: "download", position = chapter.position, bytes = content.len(), "章节下载完成");
            ChapterResult::fetched(chapter, content)
        }
        Ok(_) => failed_result(chapter, FetchError::EmptyContent),
        Err(err) => failed_result(chapter, err),
    }
}

fn failed_result(chapter: &ChapterRef, err: FetchError) -> ChapterResult {
    warn!(
        target: "download",
        position = chapter.position,
        item_id = %chapter.id,
        title = %chapter.title,
        error = %err,
        "章节下载失败"
    );
    ChapterResult::failed(chapter, &err.to_string())
}

fn store_slot(slots: &Mutex<Vec<Option<ChapterResult>>>, idx: usize, result: ChapterResult) {
    let mut guard = slots.lock().unwrap_or_else(|p| p.into_inner());
    if let Some(slot) = guard.get_mut(idx) {
        *slot = Some(result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
