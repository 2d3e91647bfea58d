//! 交互层入口。
//!
//! - `console` — 终端配色
//! - `noui`    — 命令行下载流程

pub mod console;
pub mod noui;
