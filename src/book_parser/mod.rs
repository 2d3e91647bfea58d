//! 解析与导出模块入口。
//!
//! 负责清洗接口返回的正文，并将章节结果写成 txt/epub。

pub mod book_manager;
pub mod epub_generator;
pub mod parser;
pub mod txt_generator;
