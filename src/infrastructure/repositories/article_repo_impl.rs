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

use crate::domain::models::article::Article;
use crate::domain::repositories::article_repository::{ArticleRepository, HotQueryParams};
use crate::domain::repositories::job_history_repository::RepositoryError;
use crate::infrastructure::database::entities::article as article_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Unchanged,
};
use std::sync::Arc;
use uuid::Uuid;

/// 文章仓库实现
///
/// 基于SeaORM实现的文章数据访问层。交互计数全部走
/// `UPDATE ... SET x = x + 1`形式的原子更新，绝不读改写，
/// 并发请求不会丢计数。
#[derive(Clone)]
pub struct ArticleRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ArticleRepositoryImpl {
    /// 创建新的文章仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn exists(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let count = article_entity::Entity::find()
            .filter(article_entity::Column::Id.eq(id))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }
}

impl From<article_entity::Model> for Article {
    fn from(model: article_entity::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            title: model.title,
            content: model.content,
            source_domain: model.source_domain,
            category: model.category,
            quality_level: model.quality_level,
            sentiment: model.sentiment,
            view_count: model.view_count,
            like_count: model.like_count,
            share_count: model.share_count,
            hot_score: model.hot_score,
            hot_score_computed_at: model.hot_score_computed_at,
            ingested_at: model.ingested_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Article> for article_entity::ActiveModel {
    fn from(article: Article) -> Self {
        Self {
            id: Set(article.id),
            url: Set(article.url.clone()),
            title: Set(article.title.clone()),
            content: Set(article.content.clone()),
            source_domain: Set(article.source_domain.clone()),
            category: Set(article.category.clone()),
            quality_level: Set(article.quality_level),
            sentiment: Set(article.sentiment),
            view_count: Set(article.view_count),
            like_count: Set(article.like_count),
            share_count: Set(article.share_count),
            hot_score: Set(article.hot_score),
            hot_score_computed_at: Set(article.hot_score_computed_at),
            ingested_at: Set(article.ingested_at),
            updated_at: Set(article.updated_at),
        }
    }
}

#[async_trait]
impl ArticleRepository for ArticleRepositoryImpl {
    async fn create(&self, article: &Article) -> Result<Article, RepositoryError> {
        let model: article_entity::ActiveModel = article.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepositoryError> {
        let model = article_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, RepositoryError> {
        let model = article_entity::Entity::find()
            .filter(article_entity::Column::Url.eq(url))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update_enrichment(&self, article: &Article) -> Result<Article, RepositoryError> {
        // 只覆盖内容类字段，交互计数由原子更新独占管理
        let model = article_entity::ActiveModel {
            id: Unchanged(article.id),
            title: Set(article.title.clone()),
            content: Set(article.content.clone()),
            source_domain: Set(article.source_domain.clone()),
            category: Set(article.category.clone()),
            quality_level: Set(article.quality_level),
            sentiment: Set(article.sentiment),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn increment_view(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = article_entity::Entity::update_many()
            .col_expr(
                article_entity::Column::ViewCount,
                Expr::col(article_entity::Column::ViewCount).add(1),
            )
            .col_expr(
                article_entity::Column::UpdatedAt,
                Expr::value::<DateTime<FixedOffset>>(Utc::now().into()),
            )
            .filter(article_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn adjust_like(&self, id: Uuid, is_like: bool) -> Result<bool, RepositoryError> {
        if is_like {
            let result = article_entity::Entity::update_many()
                .col_expr(
                    article_entity::Column::LikeCount,
                    Expr::col(article_entity::Column::LikeCount).add(1),
                )
                .col_expr(
                    article_entity::Column::UpdatedAt,
                    Expr::value::<DateTime<FixedOffset>>(Utc::now().into()),
                )
                .filter(article_entity::Column::Id.eq(id))
                .exec(self.db.as_ref())
                .await?;
            return Ok(result.rows_affected > 0);
        }

        // 取消点赞带下界保护：计数为零时不再递减
        let result = article_entity::Entity::update_many()
            .col_expr(
                article_entity::Column::LikeCount,
                Expr::col(article_entity::Column::LikeCount).sub(1),
            )
            .col_expr(
                article_entity::Column::UpdatedAt,
                Expr::value::<DateTime<FixedOffset>>(Utc::now().into()),
            )
            .filter(
                Condition::all()
                    .add(article_entity::Column::Id.eq(id))
                    .add(article_entity::Column::LikeCount.gt(0)),
            )
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected > 0 {
            return Ok(true);
        }
        // 计数已经是零或文章不存在，按存在性区分
        self.exists(id).await
    }

    async fn increment_share(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = article_entity::Entity::update_many()
            .col_expr(
                article_entity::Column::ShareCount,
                Expr::col(article_entity::Column::ShareCount).add(1),
            )
            .col_expr(
                article_entity::Column::UpdatedAt,
                Expr::value::<DateTime<FixedOffset>>(Utc::now().into()),
            )
            .filter(article_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn save_hot_score(
        &self,
        id: Uuid,
        score: f64,
        computed_at: DateTime<FixedOffset>,
    ) -> Result<bool, RepositoryError> {
        // 不触碰updated_at：分数写入是派生值刷新，不算交互活动
        let result = article_entity::Entity::update_many()
            .col_expr(article_entity::Column::HotScore, Expr::value(score))
            .col_expr(
                article_entity::Column::HotScoreComputedAt,
                Expr::value::<Option<DateTime<FixedOffset>>>(Some(computed_at)),
            )
            .filter(article_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_hot(&self, params: HotQueryParams) -> Result<Vec<Article>, RepositoryError> {
        let mut query = article_entity::Entity::find();
        if let Some(category) = &params.category {
            query = query.filter(article_entity::Column::Category.eq(category.clone()));
        }
        if let Some(ingested_after) = params.ingested_after {
            query = query.filter(article_entity::Column::IngestedAt.gte(ingested_after));
        }

        let models = query
            .order_by_desc(article_entity::Column::HotScore)
            .limit(params.limit as u64)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Article::from).collect())
    }

    async fn find_active_since(
        &self,
        touched_after: DateTime<FixedOffset>,
    ) -> Result<Vec<Article>, RepositoryError> {
        let models = article_entity::Entity::find()
            .filter(article_entity::Column::UpdatedAt.gte(touched_after))
            .filter(article_entity::Column::ViewCount.gt(0))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Article::from).collect())
    }

    async fn find_ingested_since(
        &self,
        ingested_after: DateTime<FixedOffset>,
    ) -> Result<Vec<Article>, RepositoryError> {
        let models = article_entity::Entity::find()
            .filter(article_entity::Column::IngestedAt.gte(ingested_after))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Article::from).collect())
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<Article>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = article_entity::Entity::find()
            .filter(article_entity::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Article::from).collect())
    }

    async fn delete_older_than(
        &self,
        cutoff: DateTime<FixedOffset>,
        max_quality_level: i32,
    ) -> Result<u64, RepositoryError> {
        let result = article_entity::Entity::delete_many()
            .filter(article_entity::Column::IngestedAt.lt(cutoff))
            .filter(article_entity::Column::QualityLevel.lt(max_quality_level))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
