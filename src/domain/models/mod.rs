// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 文章（article）：已抓取入库的内容及其交互状态
/// - 作业信封（envelope）：队列中流转的作业描述
/// - 作业记录（job）：作业生命周期的历史记录与状态机
///
/// 这些模型构成了系统的数据基础，定义了业务概念的
/// 结构和行为，是领域驱动设计的核心组成部分。
pub mod article;
pub mod envelope;
pub mod job;
