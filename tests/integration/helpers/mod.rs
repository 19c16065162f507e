// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use feedrs::config::settings::DatabaseSettings;
use feedrs::infrastructure::database::connection;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::path::Path;
use std::sync::Arc;

/// 创建内存sqlite测试库并执行迁移
///
/// 连接池上限固定为1：内存库按连接隔离，多个连接会各自看到
/// 一个空库。
pub async fn memory_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: None,
        connect_timeout: None,
        idle_timeout: None,
    };
    let db = connection::create_pool(&settings)
        .await
        .expect("Failed to open in-memory sqlite");
    Migrator::up(&db, None).await.expect("Migration failed");
    Arc::new(db)
}

/// 创建文件sqlite测试库并执行迁移
///
/// 并发用例需要多个连接共享同一份数据，内存库做不到，
/// 退而使用临时文件。
pub async fn file_db(path: &Path) -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: Some(4),
        min_connections: None,
        connect_timeout: None,
        idle_timeout: None,
    };
    let db = connection::create_pool(&settings)
        .await
        .expect("Failed to open file sqlite");
    Migrator::up(&db, None).await.expect("Migration failed");
    Arc::new(db)
}
