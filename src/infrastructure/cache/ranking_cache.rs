// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::redis_client::RedisClient;

/// 热榜缓存键前缀
pub const HOT_ARTICLES_PREFIX: &str = "hot_articles";
/// 趋势榜缓存键前缀（趋势查询本身不走缓存，前缀保留用于统一失效）
pub const TRENDING_ARTICLES_PREFIX: &str = "trending_articles";
/// 文章统计缓存键前缀
pub const ARTICLE_STATS_PREFIX: &str = "article_stats";

/// 热榜缓存TTL（秒）
pub const HOT_ARTICLES_TTL: usize = 900;
/// 趋势榜缓存TTL（秒）
pub const TRENDING_ARTICLES_TTL: usize = 600;
/// 文章统计缓存TTL（秒）
pub const ARTICLE_STATS_TTL: usize = 300;
/// 分类热榜缓存TTL（秒）
pub const CATEGORY_HOT_TTL: usize = 1200;

/// 排行缓存
///
/// 以JSON缓存开销较大的排行查询结果。所有操作都是尽力而为：
/// 后端不可用时读取退化为未命中、写入和失效退化为空操作，
/// 只记日志，绝不向调用方抛错——缓存故障的代价是重算，不是失败。
///
/// 失效策略是粗粒度的前缀删除：任何一次交互计数变更都会清空
/// 全部排行类缓存，用命中率换取不会出错的一致性。
#[derive(Clone)]
pub struct RankingCache {
    client: RedisClient,
}

impl RankingCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// 构造规范化缓存键
    ///
    /// 参数对按键名排序后以`key:value`形式用冒号连接，保证
    /// 同一查询无论参数书写顺序如何都映射到同一个缓存键。
    pub fn build_key(prefix: &str, pairs: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = pairs.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);

        let mut key = String::from(prefix);
        for (name, value) in sorted {
            key.push(':');
            key.push_str(name);
            key.push(':');
            key.push_str(value);
        }
        key
    }

    /// 读取并反序列化缓存值
    ///
    /// 未命中、反序列化失败和后端错误一律返回None。
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.client.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    counter!("ranking_cache_hits_total").increment(1);
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                counter!("ranking_cache_misses_total").increment(1);
                None
            }
            Err(e) => {
                counter!("ranking_cache_errors_total").increment(1);
                warn!(key = %key, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    /// 序列化并写入缓存值
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: usize) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping cache write, value not serializable");
                return;
            }
        };
        if let Err(e) = self.client.set(key, &raw, ttl_seconds).await {
            counter!("ranking_cache_errors_total").increment(1);
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// 删除单个缓存键
    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.client.delete(key).await {
            warn!(key = %key, error = %e, "Cache delete failed");
        }
    }

    /// 删除匹配前缀的所有缓存键，返回删除数量
    pub async fn delete_by_prefix(&self, prefix: &str) -> u64 {
        let pattern = format!("{}:*", prefix);
        let keys = match self.client.keys(&pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Cache prefix scan failed");
                return 0;
            }
        };
        if keys.is_empty() {
            return 0;
        }
        match self.client.delete_many(&keys).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Cache prefix delete failed");
                0
            }
        }
    }

    /// 判断缓存键是否存在，后端错误按不存在处理
    pub async fn exists(&self, key: &str) -> bool {
        match self.client.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache exists check failed");
                false
            }
        }
    }

    /// 使全部排行类缓存失效
    ///
    /// 任何交互计数变更或批量重算之后调用。
    pub async fn invalidate_rankings(&self) {
        let mut removed = 0;
        for prefix in [
            HOT_ARTICLES_PREFIX,
            TRENDING_ARTICLES_PREFIX,
            ARTICLE_STATS_PREFIX,
        ] {
            removed += self.delete_by_prefix(prefix).await;
        }
        debug!(removed = removed, "Invalidated ranking caches");
    }
}
