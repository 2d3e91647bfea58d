//! 下载流程模块入口。
//!
//! 子模块：
//! - `models`      — 数据模型（ChapterRef / ChapterResult / BookMetadata / DownloadPlan 等）
//! - `progress`    — 进度上报与 CLI 进度条
//! - `plan`        — 书籍信息与目录的拉取，生成 `DownloadPlan`
//! - `downloader`  — 章节并发下载与按序回收

pub mod downloader;
pub mod models;
pub mod plan;
pub mod progress;
