//! TXT 生成器。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::download::models::{BookMetadata, ChapterResult};

pub const DISCLAIMER: &str = "本工具仅供学习交流";

fn thin_rule() -> String {
    "-".repeat(50)
}

fn thick_rule() -> String {
    "=".repeat(50)
}

/// 按成书格式写出：声明 → 书籍信息 → 各章 → 再次声明。
pub fn write_txt<W: Write>(
    out: &mut W,
    meta: &BookMetadata,
    chapters: &[ChapterResult],
) -> std::io::Result<()> {
    writeln!(out, "第0章：声明\n")?;
    writeln!(out, "{}\n", DISCLAIMER)?;
    writeln!(out, "{}\n", thin_rule())?;

    writeln!(out, "《{}》", meta.book_name)?;
    writeln!(out, "作者：{}", meta.author)?;
    writeln!(out, "类型：{} | 状态：{}\n", meta.category, meta.status)?;
    writeln!(out, "简介：{}\n", meta.summary)?;
    writeln!(out, "{}\n", thick_rule())?;

    for (idx, chapter) in chapters.iter().enumerate() {
        writeln!(out, "第{}章：{}\n", idx + 1, chapter.title)?;
        writeln!(out, "{}\n", chapter.content)?;
        writeln!(out, "{}\n", thin_rule())?;
    }

    writeln!(out, "第{}章：再次声明\n", chapters.len() + 1)?;
    writeln!(out, "{}\n", DISCLAIMER)?;
    writeln!(out, "{}", thick_rule())?;
    Ok(())
}

pub fn generate_txt(path: &Path, meta: &BookMetadata, chapters: &[ChapterResult]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("创建输出目录失败: {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("创建文件失败: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_txt(&mut writer, meta, chapters)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::models::ChapterRef;

    fn sample_meta() -> BookMetadata {
        BookMetadata {
            book_name: "星海".to_string(),
            author: "某作者".to_string(),
            summary: "一段简介".to_string(),
            cover_url: String::new(),
            category: "科幻".to_string(),
            status: "已完结".to_string(),
            word_count: "1.0万字".to_string(),
            readers: "100人在读".to_string(),
        }
    }

    fn chapter(position: usize, title: &str) -> ChapterRef {
        ChapterRef {
            id: position.to_string(),
            title: title.to_string(),
            position,
        }
    }

    #[test]
    fn layout_wraps_chapters_with_disclaimers() {
        let chapters = vec![
            ChapterResult::fetched(&chapter(0, "开端"), "正文一".to_string()),
            ChapterResult::failed(&chapter(1, "转折"), "请求超时"),
        ];
        let mut buf = Vec::new();
        write_txt(&mut buf, &sample_meta(), &chapters).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("第0章：声明\n\n本工具仅供学习交流\n\n"));
        assert!(text.contains("《星海》\n作者：某作者\n类型：科幻 | 状态：已完结\n\n简介：一段简介\n"));
        assert!(text.contains("第1章：开端\n\n正文一\n\n"));
        assert!(text.contains("第2章：转折\n\n【章节 2 下载失败：请求超时】\n\n"));
        assert!(text.contains("第3章：再次声明\n\n本工具仅供学习交流\n\n"));
        assert!(text.ends_with(&format!("{}\n", "=".repeat(50))));

        let first = text.find("第1章：开端").unwrap();
        let second = text.find("第2章：转折").unwrap();
        assert!(first < second);
    }

    #[test]
    fn generate_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("book.txt");
        generate_txt(&path, &sample_meta(), &[]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("第1章：再次声明"));
    }
}
