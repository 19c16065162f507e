// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::fetcher::{validate_article_url, ArticleFetcher, FetchError, FetchedPage};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// HTTP文章抓取器
///
/// 基于reqwest实现的抓取器。客户端在构造时创建并复用连接池，
/// 请求级超时由客户端配置承担，作业级的硬超时在worker一侧另行
/// 施加。
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// 创建新的HTTP抓取器
    ///
    /// # 参数
    ///
    /// * `timeout` - 单次请求的超时时间
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; feedrs/1.0; +https://feedrs.dev)")
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArticleFetcher for HttpFetcher {
    /// 抓取指定URL的页面
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchedPage)` - 抓取到的页面
    /// * `Err(FetchError)` - 校验失败、网络错误或非2xx响应
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = validate_article_url(url)?;

        let start = Instant::now();
        let response = self.client.get(parsed.clone()).send().await?;
        // 非2xx映射为带状态码的请求错误，5xx在上层视为瞬时
        let response = response.error_for_status()?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        let content_type = if content_type.trim().is_empty() {
            "text/html".to_string()
        } else {
            content_type
        };

        let content = response.text().await?;
        if content.trim().is_empty() {
            return Err(FetchError::EmptyContent(final_url));
        }

        Ok(FetchedPage {
            url: final_url,
            status_code,
            content,
            content_type,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
#[path = "http_fetcher_test.rs"]
mod tests;
