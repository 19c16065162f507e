// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub job_id: Uuid,
    pub job_type: String,
    pub queue_name: String,
    pub worker_id: Option<String>,
    pub args: Json,
    pub kwargs: Json,
    pub status: String,
    pub result: Option<Json>,
    pub error_message: Option<String>,
    pub error_detail: Option<String>,
    pub retry_count: i32,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub started_at: Option<ChronoDateTimeWithTimeZone>,
    pub completed_at: Option<ChronoDateTimeWithTimeZone>,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
