//! 进度上报与 CLI 进度条管理。

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::models::ProgressSnapshot;

pub type ProgressCallback = Box<dyn FnMut(ProgressSnapshot) + Send>;

pub struct ProgressReporter {
    pub(crate) snapshot: ProgressSnapshot,
    cb: Option<ProgressCallback>, // optional UI callback
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// 命令行模式：stderr 上的下载进度条。
    pub fn with_cli_bar(total: usize) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template(
            "{prefix} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
        bar.set_style(style);
        bar.set_prefix("下载进度");

        Self::new(total, None, Some(bar))
    }

    #[cfg(test)]
    pub fn with_callback(total: usize, cb: ProgressCallback) -> Self {
        Self::new(total, Some(cb), None)
    }

    pub fn hidden(total: usize) -> Self {
        Self::new(total, None, None)
    }

    fn new(total: usize, cb: Option<ProgressCallback>, bar: Option<ProgressBar>) -> Self {
        let mut reporter = Self {
            snapshot: ProgressSnapshot {
                done: 0,
                failed: 0,
                total,
            },
            cb,
            bar,
        };
        reporter.emit();
        reporter
    }

    fn emit(&mut self) {
        if let Some(cb) = self.cb.as_mut() {
            cb(self.snapshot);
        }
    }

    /// 一个任务结束（无论成败）。
    pub(crate) fn inc_done(&mut self, failed: bool) {
        if self.snapshot.done >= self.snapshot.total {
            return;
        }
        self.snapshot.done += 1;
        if failed {
            self.snapshot.failed += 1;
        }
        if let Some(bar) = self.bar.as_ref() {
            bar.inc(1);
        }
        self.emit();
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}
