pub mod book_id;
pub mod config;
pub mod context;
pub mod json_extract;
pub mod logging;
