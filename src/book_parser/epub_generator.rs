//! EPUB 生成器。

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use epub_builder::{EpubBuilder, EpubContent, EpubVersion, ReferenceType, ZipLibrary};

use super::txt_generator::DISCLAIMER;
use crate::download::models::{BookMetadata, ChapterResult};

/// 用于从 book_id 确定性生成 UUID v5 的命名空间。
/// 同一本书（同 book_id）的 dc:identifier 永远不变。
const EPUB_UUID_NAMESPACE: uuid::Uuid = uuid::Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x10, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30, 0xc8,
]);

const STYLESHEET: &str = "body { font-family: serif; color:#000; line-height:1.5; }
h1, h2 { text-align:center; }
p { margin:0 0 .8em 0; line-height:1.5; }";

pub struct EpubGenerator {
    book: EpubBuilder<ZipLibrary>,
    pages: Vec<Page>,
}

struct Page {
    file_name: String,
    title: String,
    html: String,
}

impl EpubGenerator {
    pub fn new(book_id: &str, meta: &BookMetadata) -> Result<Self> {
        let zip = ZipLibrary::new().map_err(|e| anyhow!(e.to_string()))?;
        let mut book = EpubBuilder::new(zip).map_err(|e| anyhow!(e.to_string()))?;

        book.epub_version(EpubVersion::V30);
        book.set_uuid(stable_uuid(book_id));
        book.metadata("title", meta.book_name.as_str()).ok();
        book.metadata("toc_name", meta.book_name.as_str()).ok();
        book.metadata("lang", "zh-CN").ok();

        let author = meta.author.trim();
        if !author.is_empty() {
            book.metadata("author", author).ok();
        }
        let description = meta.summary.trim();
        if !description.is_empty() {
            book.metadata("description", description).ok();
        }

        Ok(Self {
            book,
            pages: Vec::new(),
        })
    }

    pub fn set_cover(&mut self, bytes: Vec<u8>) -> Result<()> {
        let mime = image_mime(&bytes);
        let ext = if mime == "image/png" { "png" } else { "jpg" };
        self.book
            .add_cover_image(format!("images/cover.{ext}"), Cursor::new(bytes), mime)
            .map_err(|e| anyhow!(e.to_string()))?;
        Ok(())
    }

    fn push_page(&mut self, file_name: String, title: &str, body: &str) {
        self.pages.push(Page {
            html: wrap_page_html(title, body),
            file_name,
            title: title.to_string(),
        });
    }

    /// 声明 → 书籍信息 → 各章 → 再次声明；内容为空的章节不成页。
    pub fn add_book_pages(&mut self, meta: &BookMetadata, chapters: &[ChapterResult]) {
        self.push_page(
            "disclaim_start.xhtml".to_string(),
            "声明",
            &format!("<h1>声明</h1><p>{}</p>", DISCLAIMER),
        );

        let intro = format!(
            "<h1>《{}》</h1><p><strong>作者：</strong>{}</p><p><strong>类型：</strong>{} | <strong>状态：</strong>{}</p><p><strong>简介：</strong>{}</p>",
            html_escape(&meta.book_name),
            html_escape(&meta.author),
            html_escape(&meta.category),
            html_escape(&meta.status),
            text_to_html(&meta.summary),
        );
        self.push_page("intro.xhtml".to_string(), "书籍信息", &intro);

        for (idx, chapter) in chapters.iter().enumerate() {
            if chapter.content.is_empty() {
                continue;
            }
            let number = idx + 1;
            let title = format!("第{}章：{}", number, chapter.title);
            let body = format!(
                "<h2>{}</h2><p>{}</p>",
                html_escape(&title),
                text_to_html(&chapter.content)
            );
            self.push_page(format!("chap_{number}.xhtml"), &title, &body);
        }

        self.push_page(
            "disclaim_end.xhtml".to_string(),
            "再次声明",
            &format!("<h1>再次声明</h1><p>{}</p>", DISCLAIMER),
        );
    }

    pub fn generate(mut self, output_path: &Path) -> Result<()> {
        // stylesheet() 而非 add_resource()，避免额外生成空的 stylesheet.css。
        self.book
            .stylesheet(Cursor::new(STYLESHEET))
            .map_err(|e| anyhow!(e.to_string()))?;

        for page in &self.pages {
            self.book
                .add_content(
                    EpubContent::new(page.file_name.clone(), Cursor::new(page.html.clone()))
                        .title(page.title.clone())
                        .reftype(ReferenceType::Text),
                )
                .map_err(|e| anyhow!(e.to_string()))?;
        }

        let parent = output_path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("创建输出目录失败: {}", parent.display()))?;

        let mut buffer = Vec::new();
        self.book
            .generate(&mut buffer)
            .map_err(|e| anyhow!(e.to_string()))?;
        fs::write(output_path, buffer)
            .with_context(|| format!("写入 EPUB 失败: {}", output_path.display()))?;
        Ok(())
    }
}

fn stable_uuid(book_id: &str) -> uuid::Uuid {
    uuid::Uuid::new_v5(&EPUB_UUID_NAMESPACE, book_id.as_bytes())
}

fn image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else {
        "image/jpeg"
    }
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn text_to_html(text: &str) -> String {
    html_escape(text).replace('\n', "<br/>")
}

fn wrap_page_html(title: &str, body: &str) -> String {
    let escaped_title = html_escape(title);
    format!(
        "<?xml version='1.0' encoding='utf-8'?>\n<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" lang=\"zh-CN\" xml:lang=\"zh-CN\">\n  <head>\n    <title>{}</title>\n    <link href=\"stylesheet.css\" rel=\"stylesheet\" type=\"text/css\"/>\n  </head>\n  <body>\n{}\n  </body>\n</html>",
        escaped_title, body
    )
}
