// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;

/// Redis客户端
///
/// 提供对Redis数据库的异步操作接口，同时服务于排行缓存
/// 和任务队列两个用途
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - 创建过程中出现的错误
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 获取指定键的值
    ///
    /// # 参数
    ///
    /// * `key` - 键
    ///
    /// # 返回值
    ///
    /// * `Ok(Option<String>)` - 键对应的值，如果不存在则返回None
    /// * `Err(anyhow::Error)` - 获取过程中出现的错误
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    /// 设置键值对并指定过期时间
    ///
    /// # 参数
    ///
    /// * `key` - 键
    /// * `value` - 值
    /// * `ttl_seconds` - 过期时间（秒）
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 设置成功
    /// * `Err(anyhow::Error)` - 设置过程中出现的错误
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: usize) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.set_ex::<_, _, ()>(key, value, ttl_seconds as u64)
            .await?;
        Ok(())
    }

    /// 删除单个键
    ///
    /// # 参数
    ///
    /// * `key` - 键
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 删除完成（键不存在也算成功）
    /// * `Err(anyhow::Error)` - 删除过程中出现的错误
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }

    /// 批量删除键，返回实际删除的数量
    pub async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let removed: u64 = con.del(keys).await?;
        Ok(removed)
    }

    /// 查找匹配模式的所有键
    ///
    /// # 参数
    ///
    /// * `pattern` - glob风格的匹配模式，如`hot_articles:*`
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<String>)` - 匹配到的键列表
    /// * `Err(anyhow::Error)` - 查询过程中出现的错误
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let keys: Vec<String> = con.keys(pattern).await?;
        Ok(keys)
    }

    /// 判断键是否存在
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let exists: bool = con.exists(key).await?;
        Ok(exists)
    }

    /// 向列表左端推入一个元素
    pub async fn lpush(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// 从列表右端弹出一个元素
    pub async fn rpop(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.rpop(key, None).await?;
        Ok(value)
    }

    /// 获取列表长度
    pub async fn llen(&self, key: &str) -> Result<u64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = con.llen(key).await?;
        Ok(len)
    }

    /// 读取列表的一段元素
    pub async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let values: Vec<String> = con.lrange(key, start, stop).await?;
        Ok(values)
    }

    /// 从列表中移除与给定值相等的元素，返回移除数量
    pub async fn lrem(&self, key: &str, count: isize, value: &str) -> Result<u64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let removed: u64 = con.lrem(key, count, value).await?;
        Ok(removed)
    }

    /// 向有序集合写入成员
    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.zadd::<_, _, _, ()>(key, member, score).await?;
        Ok(())
    }

    /// 按分数区间读取有序集合成员
    pub async fn zrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<Vec<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let members: Vec<String> = con.zrangebyscore(key, min, max).await?;
        Ok(members)
    }

    /// 从有序集合移除成员，返回移除数量
    pub async fn zrem(&self, key: &str, member: &str) -> Result<u64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let removed: u64 = con.zrem(key, member).await?;
        Ok(removed)
    }

    /// 获取有序集合的成员数量
    pub async fn zcard(&self, key: &str) -> Result<u64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let count: u64 = con.zcard(key).await?;
        Ok(count)
    }

    /// 向集合添加成员
    pub async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.sadd::<_, _, ()>(key, member).await?;
        Ok(())
    }

    /// 判断成员是否属于集合
    pub async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let is_member: bool = con.sismember(key, member).await?;
        Ok(is_member)
    }

    /// 从集合移除成员
    pub async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.srem::<_, _, ()>(key, member).await?;
        Ok(())
    }
}
