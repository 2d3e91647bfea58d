use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::base_system::json_extract::{JsonMap, pick_f64, pick_string, response_code};
use crate::download::downloader::FetchError;
use crate::download::models::{BookMetadata, ChapterRef};
use crate::network_parser::network::ApiError;

fn re_para_index() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r#"<p idx="\d+">"#).expect("compile re_para_index"))
}

pub struct ContentParser;

impl ContentParser {
    /// 章节正文清洗：`</p>` 换行，解码 `&quot;`/`&amp;`，去掉 `<p idx="N">`，首尾去空白。
    pub fn clean_chapter_markup(raw: &str) -> String {
        let replaced = raw
            .replace("</p>", "\n")
            .replace("&quot;", "\"")
            .replace("&amp;", "&");
        re_para_index()
            .replace_all(&replaced, "")
            .trim()
            .to_string()
    }

    /// 解析正文接口：`{code: 0, data: {content}}`。
    pub fn parse_content_response(value: &Value) -> Result<String, FetchError> {
        match response_code(value) {
            Some(0) => {}
            Some(code) => return Err(FetchError::ApiCode(code)),
            None => return Err(FetchError::Malformed("缺少 code 字段".to_string())),
        }

        let content = value
            .get("data")
            .and_then(|d| d.get("content"))
            .and_then(Value::as_str)
            .ok_or(FetchError::MissingContent)?;

        Ok(Self::clean_chapter_markup(content))
    }

    /// 解析书籍信息接口，取 `data[0]`；缺失字段使用“未知…”占位。
    pub fn parse_metadata_response(value: &Value, book_id: &str) -> Result<BookMetadata, ApiError> {
        match response_code(value) {
            Some(0) => {}
            Some(code) => return Err(ApiError::ApiCode(code)),
            None => return Err(ApiError::Malformed("缺少 code 字段".to_string())),
        }

        let book = value
            .get("data")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(Value::as_object)
            .ok_or(ApiError::EmptyData)?;

        Ok(Self::metadata_from_map(book, book_id))
    }

    fn metadata_from_map(book: &JsonMap, book_id: &str) -> BookMetadata {
        let mut meta = BookMetadata::unknown(book_id);

        if let Some(name) = pick_string(book, &["book_name"]) {
            meta.book_name = strip_title_marks(&name);
        }
        if let Some(author) = pick_string(book, &["author"]) {
            meta.author = author;
        }
        if let Some(summary) = pick_string(book, &["abstract"]) {
            meta.summary = summary;
        }
        meta.cover_url =
            pick_string(book, &["bookshelf_thumb_url", "thumb_url"]).unwrap_or_default();
        if let Some(category) = pick_string(book, &["category"]) {
            meta.category = category;
        }
        if let Some(status) = pick_string(book, &["update_status"]) {
            meta.status = if status == "1" { "连载中" } else { "已完结" }.to_string();
        }
        if let Some(words) = pick_f64(book, &["word_count"])
            && words > 0.0
        {
            meta.word_count = format!("{:.1}万字", words / 10000.0);
        }
        if let Some(readers) = pick_string(book, &["sub_info"]) {
            meta.readers = readers;
        }

        meta
    }

    /// 解析目录接口，按卷顺序展开为带下标的章节列表。
    pub fn parse_chapter_list_response(value: &Value) -> Result<Vec<ChapterRef>, ApiError> {
        match response_code(value) {
            Some(0) => {}
            Some(code) => return Err(ApiError::ApiCode(code)),
            None => return Err(ApiError::Malformed("缺少 code 字段".to_string())),
        }

        let volumes = value
            .get("data")
            .and_then(|d| d.get("chapterListWithVolume"))
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Malformed("缺少 chapterListWithVolume".to_string()))?;

        let mut chapters = Vec::new();
        for volume in volumes {
            let items = volume
                .as_array()
                .ok_or_else(|| ApiError::Malformed("分卷不是数组".to_string()))?;
            for item in items {
                let map = item
                    .as_object()
                    .ok_or_else(|| ApiError::Malformed("章节条目不是对象".to_string()))?;
                let id = pick_string(map, &["itemId", "item_id"])
                    .ok_or_else(|| ApiError::Malformed("章节缺少 itemId".to_string()))?;
                let title = map
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let position = chapters.len();
                chapters.push(ChapterRef {
                    id,
                    title,
                    position,
                });
            }
        }

        Ok(chapters)
    }
}

fn strip_title_marks(name: &str) -> String {
    name.strip_prefix('《')
        .and_then(|s| s.strip_suffix('》'))
        .unwrap_or(name)
        .to_string()
}
