// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 超时
    #[error("Timeout fetching {0}")]
    Timeout(String),
    /// URL不合法
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// 响应内容为空或不可用
    #[error("Empty content from {0}")]
    EmptyContent(String),
    /// 内容处理失败
    #[error("Processing failed: {0}")]
    Processing(String),
}

impl FetchError {
    /// 判断错误是否为瞬时错误
    ///
    /// 瞬时错误（超时、连接失败、服务端5xx）值得重试；
    /// 校验类错误重试也不会变好，应立即失败。
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            FetchError::Timeout(_) => true,
            FetchError::InvalidUrl(_) => false,
            FetchError::EmptyContent(_) => false,
            FetchError::Processing(_) => false,
        }
    }
}

/// 抓取到的页面
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// 最终URL（重定向后）
    pub url: String,
    /// HTTP状态码
    pub status_code: u16,
    /// 页面原始内容
    pub content: String,
    /// 内容类型
    pub content_type: String,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

/// 处理后的文章内容
#[derive(Debug, Clone)]
pub struct ProcessedContent {
    /// 标题
    pub title: String,
    /// 正文
    pub content: String,
    /// 分类，无法判断时为None
    pub category: Option<String>,
    /// 情感倾向[-1.0, 1.0]
    pub sentiment: Option<f64>,
    /// 质量等级1-5
    pub quality_level: Option<i32>,
}

/// 文章抓取器特质
///
/// 抓取作业通过该特质获取远端页面，实现可替换（HTTP客户端、
/// 测试桩等）。实现方负责网络细节并将失败映射为[`FetchError`]。
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// 抓取指定URL的页面
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// 抓取器名称
    fn name(&self) -> &'static str;
}

/// 内容处理器特质
///
/// 将原始页面提炼为结构化文章字段。重处理作业复用同一特质
/// 对已入库的文章重新提炼。
#[async_trait]
pub trait ContentProcessor: Send + Sync {
    /// 处理页面内容
    async fn process(&self, page: &FetchedPage) -> Result<ProcessedContent, FetchError>;

    /// 对已入库的标题和正文重新运行内容分析
    ///
    /// 不做HTML提取，只重算分类、质量等级和情感倾向。
    async fn reprocess(
        &self,
        title: &str,
        content: Option<&str>,
    ) -> Result<ProcessedContent, FetchError>;

    /// 处理器名称
    fn name(&self) -> &'static str;
}

/// 校验并规范化文章URL
///
/// 只接受带主机名的http/https地址，返回规范化后的URL字符串。
pub fn validate_article_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(FetchError::InvalidUrl(format!(
            "{raw}: unsupported scheme {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(FetchError::InvalidUrl(format!("{raw}: missing host")));
    }
    Ok(url)
}

/// 从URL提取来源域名
pub fn source_domain(url: &Url) -> String {
    url.host_str().unwrap_or("unknown").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_article_url_accepts_http_and_https() {
        assert!(validate_article_url("https://news.example.com/a/1").is_ok());
        assert!(validate_article_url("http://example.com").is_ok());
        // 前后空白应被容忍
        assert!(validate_article_url("  https://example.com/x  ").is_ok());
    }

    #[test]
    fn test_validate_article_url_rejects_bad_input() {
        assert!(matches!(
            validate_article_url("ftp://example.com/file"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_article_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_article_url(""),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_source_domain_extraction() {
        let url = validate_article_url("https://news.example.com/tech/42").unwrap();
        assert_eq!(source_domain(&url), "news.example.com");
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout("https://example.com".into()).is_transient());
        assert!(!FetchError::InvalidUrl("x".into()).is_transient());
        assert!(!FetchError::EmptyContent("https://example.com".into()).is_transient());
        assert!(!FetchError::Processing("boom".into()).is_transient());
    }
}
