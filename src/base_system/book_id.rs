//! 书籍 ID/链接解析。

use regex::Regex;
use std::sync::OnceLock;

static RE_BOOK_ID: OnceLock<Regex> = OnceLock::new();

fn re_book_id() -> &'static Regex {
    RE_BOOK_ID.get_or_init(|| Regex::new(r"\d{10,20}").expect("compile RE_BOOK_ID"))
}

/// 从纯 ID、分享链接或夹带链接的文本中取出第一段 10~20 位数字。
pub fn parse_book_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    re_book_id().find(trimmed).map(|m| m.as_str().to_string())
}
