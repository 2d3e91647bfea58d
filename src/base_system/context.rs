//! 全局配置结构（Config）与默认值。
//!
//! 字段名与 `config.json` 中的键一一对应，缺省字段使用内置默认值。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::ConfigSpec;

pub const DEFAULT_API_BASE: &str = "https://toma.jam.cz.eu.org.cdn.cloudflare.net";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Txt,
    Epub,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Epub => "epub",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 保存配置
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_true")]
    pub save_cover: bool,

    // 网络配置
    #[serde(default = "default_threads")]
    pub default_threads: i64,
    #[serde(default = "default_api_timeout")]
    pub api_timeout: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,

    // 界面配置
    #[serde(default = "default_true")]
    pub show_colors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            output_dir: default_output_dir(),
            save_cover: default_true(),
            default_threads: default_threads(),
            api_timeout: default_api_timeout(),
            api_base: default_api_base(),
            show_colors: default_true(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.json";
}

impl Config {
    /// 未识别的格式按 epub 处理。
    pub fn output_format(&self) -> OutputFormat {
        if self.default_format.trim().eq_ignore_ascii_case("txt") {
            OutputFormat::Txt
        } else {
            OutputFormat::Epub
        }
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.default_format = format.extension().to_string();
    }

    /// 并发数 <= 0 时退回 1，而不是报错。
    pub fn worker_count(&self) -> usize {
        usize::try_from(self.default_threads).unwrap_or(0).max(1)
    }

    pub fn default_save_dir(&self) -> PathBuf {
        if self.output_dir.trim().is_empty() {
            PathBuf::from(default_output_dir())
        } else {
            PathBuf::from(&self.output_dir)
        }
    }

    pub fn api_base(&self) -> &str {
        let base = self.api_base.trim().trim_end_matches('/');
        if base.is_empty() {
            DEFAULT_API_BASE
        } else {
            base
        }
    }
}

/// 去掉文件名非法字符并限制长度（按字符计）。
pub fn safe_fs_name(name: &str, max_chars: usize) -> String {
    let stripped: String = name
        .chars()
        .filter(|ch| !matches!(ch, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .filter(|ch| (*ch as u32) >= 32)
        .collect();

    let mut cleaned: String = stripped.trim().chars().take(max_chars).collect();

    while cleaned.ends_with(' ') || cleaned.ends_with('.') {
        cleaned.pop();
    }

    if cleaned.is_empty() {
        cleaned.push_str("unnamed");
    }

    const RESERVED: [&str; 22] = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let upper = cleaned.to_uppercase();
    if RESERVED.contains(&upper.as_str()) {
        cleaned = format!("_{}", cleaned);
    }

    cleaned
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "epub".to_string()
}

fn default_output_dir() -> String {
    "download".to_string()
}

fn default_threads() -> i64 {
    4
}

fn default_api_timeout() -> u64 {
    10
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
