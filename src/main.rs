//! Tomato Novel Fetch（番茄小说章节下载器）。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/书籍 ID 解析等基础设施
//! - `network_parser`：内容接口客户端
//! - `download`：下载计划与章节并发下载编排
//! - `book_parser`：正文清洗与 txt/epub 导出
//! - `ui`：终端配色与命令行下载流程

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{error, info, warn};

mod base_system;
mod book_parser;
mod download;
mod network_parser;
mod ui;

use base_system::book_id::parse_book_id;
use base_system::config::load_or_default;
use base_system::context::{Config, OutputFormat};
use base_system::logging::{LogOptions, LogSystem};
use network_parser::network::TomaApi;
use ui::console::Palette;
use ui::noui::DownloadOutcome;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "tomato-novel-fetch", version)]
#[command(about = "并发下载小说章节并生成 TXT / EPUB")]
struct Cli {
    /// 书籍 ID 或包含书籍 ID 的链接
    book: Option<String>,

    /// 输出 EPUB
    #[arg(long, conflicts_with = "txt")]
    epub: bool,

    /// 输出 TXT
    #[arg(long)]
    txt: bool,

    /// 下载线程数（无法解析时忽略）
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    threads: Option<String>,

    /// 配置文件路径（默认 ./config.json）
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let fallback = Palette::new(true);

    let _log = match init_logging(cli.debug) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("{} {:#}", fallback.red("日志初始化失败:"), err);
            return ExitCode::FAILURE;
        }
    };
    info!(target: "startup", "当前版本: v{}", VERSION);

    let config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(target: "startup", "{:#}", err);
            eprintln!("{} {:#}", fallback.red("配置错误:"), err);
            return ExitCode::FAILURE;
        }
    };
    let palette = Palette::new(config.show_colors);

    let Some(input) = cli.book.as_deref() else {
        eprintln!("用法: tomato-novel-fetch <书籍ID或链接> [--epub|--txt] [--threads N]");
        return ExitCode::FAILURE;
    };
    let Some(book_id) = parse_book_id(input) else {
        eprintln!("{}", palette.red("无法解析书籍ID，请检查输入"));
        return ExitCode::FAILURE;
    };

    match run(&config, &book_id, palette) {
        Ok(DownloadOutcome::Saved { .. }) => ExitCode::SUCCESS,
        Ok(DownloadOutcome::NoChapters) => ExitCode::FAILURE,
        Err(err) => {
            error!(target: "startup", book_id = %book_id, "{:#}", err);
            eprintln!("{} {:#}", palette.red("下载失败:"), err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, book_id: &str, palette: Palette) -> Result<DownloadOutcome> {
    let api = TomaApi::new(config).context("初始化网络客户端失败")?;
    ui::noui::download_book(&api, config, book_id, palette)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = load_or_default::<Config>(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    apply_cli_overrides(&mut config, cli);
    Ok(config)
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if cli.txt {
        config.set_output_format(OutputFormat::Txt);
    } else if cli.epub {
        config.set_output_format(OutputFormat::Epub);
    }

    if let Some(raw) = cli.threads.as_deref() {
        match raw.trim().parse::<i64>() {
            Ok(n) => config.default_threads = n,
            Err(_) => warn!(target: "startup", threads = raw, "线程数无法解析，已忽略"),
        }
    }
}

fn init_logging(debug: bool) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        archive_on_exit: true,
        console: false,
    };
    LogSystem::init(opts).map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tomato-novel-fetch"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn format_flags_override_config() {
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &parse(&["123", "--txt"]));
        assert_eq!(cfg.output_format(), OutputFormat::Txt);
        apply_cli_overrides(&mut cfg, &parse(&["123", "--epub"]));
        assert_eq!(cfg.output_format(), OutputFormat::Epub);
    }

    #[test]
    fn format_flags_are_mutually_exclusive() {
        let err = Cli::try_parse_from(["tomato-novel-fetch", "123", "--txt", "--epub"]);
        assert!(err.is_err());
    }

    #[test]
    fn bad_thread_count_is_ignored() {
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &parse(&["123", "--threads", "abc"]));
        assert_eq!(cfg.default_threads, 4);
        apply_cli_overrides(&mut cfg, &parse(&["123", "--threads=0"]));
        assert_eq!(cfg.worker_count(), 1);
        apply_cli_overrides(&mut cfg, &parse(&["123", "--threads", "8"]));
        assert_eq!(cfg.worker_count(), 8);
    }
}
