// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含系统的核心业务逻辑服务，这些服务封装了复杂的
/// 业务规则和领域逻辑，协调多个领域对象来完成业务操作。
///
/// 包含的服务：
/// - 热度引擎（hot_score）：纯函数式的文章热度分数计算
/// - 排行服务（ranking）：热榜/趋势榜查询与交互计数编排
/// - 生命周期记录器（lifecycle）：作业状态机与历史落库
/// - 抓取特质（fetcher）：文章抓取与内容处理的策略接口
///
/// 领域服务与应用程序服务的区别在于：领域服务包含纯粹的业务逻辑，
/// 而应用程序服务负责协调和编排，可能包含技术实现细节。
pub mod fetcher;
pub mod hot_score;
pub mod lifecycle;
pub mod ranking;
