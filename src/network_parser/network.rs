//! 内容接口客户端：书籍信息、目录、章节正文、封面。
//!
//! 所有请求共用一个 `reqwest::blocking::Client`（连接复用 + 公共请求头），
//! 可被多个下载线程同时使用。

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::base_system::context::Config;
use crate::book_parser::parser::ContentParser;
use crate::download::downloader::{ChapterSource, FetchError};
use crate::download::models::{BookMetadata, ChapterRef};

const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

const CHAPTER_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const CHAPTER_READ_TIMEOUT: Duration = Duration::from_secs(15);
const COVER_TIMEOUT: Duration = Duration::from_secs(10);

const META_AID: &str = "1967";
const META_IID: &str = "1";
const META_VERSION_CODE: &str = "999";
const NOVEL_SDK_AID: &str = "638505";
const SDK_TYPE: &str = "4";

/// 书籍信息/目录阶段的错误；出现即终止整个下载。
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP 状态码 {0}")]
    Status(u16),
    #[error("接口返回 code={0}")]
    ApiCode(i64),
    #[error("响应格式异常: {0}")]
    Malformed(String),
    #[error("接口未返回书籍信息")]
    EmptyData,
}

pub struct TomaApi {
    client: Client,
    base: String,
    api_timeout: Duration,
    chapter_timeout: Duration,
}

impl TomaApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let builder = Client::builder()
            .default_headers(headers)
            .connect_timeout(CHAPTER_CONNECT_TIMEOUT);
        // 测试里的本地服务不能走环境代理
        #[cfg(test)]
        let builder = builder.no_proxy();
        let client = builder.build()?;

        Ok(Self {
            client,
            base: config.api_base().to_string(),
            api_timeout: Duration::from_secs(config.api_timeout.max(1)),
            chapter_timeout: CHAPTER_READ_TIMEOUT,
        })
    }

    #[cfg(test)]
    fn with_chapter_timeout(mut self, timeout: Duration) -> Self {
        self.chapter_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub fn fetch_metadata(&self, book_id: &str) -> Result<BookMetadata, ApiError> {
        debug!(target: "network", book_id, "请求书籍信息");
        let request = self
            .client
            .get(self.url("info/"))
            .query(&[
                ("aid", META_AID),
                ("iid", META_IID),
                ("version_code", META_VERSION_CODE),
                ("book_id", book_id),
            ])
            .timeout(self.api_timeout);
        let value = send_json(request)?;
        ContentParser::parse_metadata_response(&value, book_id)
    }

    pub fn fetch_chapter_list(&self, book_id: &str) -> Result<Vec<ChapterRef>, ApiError> {
        debug!(target: "network", book_id, "请求章节目录");
        let request = self
            .client
            .get(self.url("directory"))
            .query(&[("bookId", book_id)])
            .timeout(self.api_timeout);
        let value = send_json(request)?;
        ContentParser::parse_chapter_list_response(&value)
    }

    /// 封面下载失败不影响成书，直接返回 None。
    pub fn fetch_cover(&self, url: &str) -> Option<Vec<u8>> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        let resp = match self.client.get(url).timeout(COVER_TIMEOUT).send() {
            Ok(r) => r,
            Err(e) => {
                debug!(target: "network", error = %e, "封面下载失败");
                return None;
            }
        };
        if resp.status() != StatusCode::OK {
            debug!(target: "network", status = resp.status().as_u16(), "封面下载失败");
            return None;
        }
        resp.bytes().ok().map(|b| b.to_vec())
    }
}

impl ChapterSource for TomaApi {
    fn fetch_chapter(&self, item_id: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .post(self.url("down/"))
            .query(&[
                ("item_id", item_id),
                ("novelsdk_aid", NOVEL_SDK_AID),
                ("sdk_type", SDK_TYPE),
            ])
            .timeout(self.chapter_timeout)
            .send()
            .map_err(fetch_error)?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let value: Value = resp.json().map_err(fetch_error)?;
        ContentParser::parse_content_response(&value)
    }
}

fn send_json(request: RequestBuilder) -> Result<Value, ApiError> {
    let resp = request.send()?;
    if !resp.status().is_success() {
        return Err(ApiError::Status(resp.status().as_u16()));
    }
    let text = resp.text()?;
    serde_json::from_str(&text).map_err(|e| ApiError::Malformed(e.to_string()))
}

fn fetch_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Malformed(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}
