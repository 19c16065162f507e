// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub source_domain: Option<String>,
    pub category: Option<String>,
    pub quality_level: i32,
    pub sentiment: Option<f64>,
    pub view_count: i32,
    pub like_count: i32,
    pub share_count: i32,
    pub hot_score: f64,
    pub hot_score_computed_at: Option<ChronoDateTimeWithTimeZone>,
    pub ingested_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
