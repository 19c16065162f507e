// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 文章仓库（article_repository）：管理文章的持久化与交互计数
/// - 作业历史仓库（job_history_repository）：管理作业生命周期记录
///
/// 这些接口确保了领域层不依赖于具体的数据存储技术，
/// 提高了系统的可测试性和可维护性.
pub mod article_repository;
pub mod job_history_repository;
