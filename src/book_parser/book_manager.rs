use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use super::epub_generator::EpubGenerator;
use super::txt_generator::generate_txt;
use crate::base_system::context::{Config, OutputFormat, safe_fs_name};
use crate::download::models::{BookMetadata, ChapterResult};

const NAME_MAX_CHARS: usize = 100;

/// 一本书的成书上下文：元数据 + 输出位置 + 格式。
pub struct BookManager<'a> {
    pub config: &'a Config,
    pub book_id: String,
    pub meta: BookMetadata,
}

impl<'a> BookManager<'a> {
    pub fn new(config: &'a Config, book_id: &str, meta: BookMetadata) -> Self {
        Self {
            config,
            book_id: book_id.to_string(),
            meta,
        }
    }

    /// `书名-作者`；含“未知”时追加 `_book_id` 以免重名。
    pub fn file_stem(&self) -> String {
        let mut stem = format!(
            "{}-{}",
            safe_fs_name(&self.meta.book_name, NAME_MAX_CHARS),
            safe_fs_name(&self.meta.author, NAME_MAX_CHARS)
        );
        if stem.contains("未知") {
            stem.push('_');
            stem.push_str(&self.book_id);
        }
        stem
    }

    pub fn output_path(&self) -> PathBuf {
        let ext = self.config.output_format().extension();
        self.config
            .default_save_dir()
            .join(format!("{}.{}", self.file_stem(), ext))
    }

    /// 写出最终文件，返回输出路径。`cover` 仅用于 EPUB。
    pub fn finalize(&self, chapters: &[ChapterResult], cover: Option<Vec<u8>>) -> Result<PathBuf> {
        let path = self.output_path();
        match self.config.output_format() {
            OutputFormat::Txt => generate_txt(&path, &self.meta, chapters)?,
            OutputFormat::Epub => {
                let mut generator = EpubGenerator::new(&self.book_id, &self.meta)?;
                if let Some(bytes) = cover {
                    generator.set_cover(bytes)?;
                    debug!(target: "book_manager", "已添加封面");
                }
                generator.add_book_pages(&self.meta, chapters);
                generator.generate(&path)?;
            }
        }
        info!(
            target: "book_manager",
            path = %path.display(),
            chapters = chapters.len(),
            "成书完成"
        );
        Ok(path)
    }

    /// 是否需要下载封面：EPUB + 开启 save_cover + 有封面地址。
    pub fn wants_cover(&self) -> bool {
        self.config.output_format() == OutputFormat::Epub
            && self.config.save_cover
            && !self.meta.cover_url.trim().is_empty()
    }
}
