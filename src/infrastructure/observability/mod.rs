// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 可观测性模块
///
/// 提供系统监控和可观测性功能
/// 包括指标收集和遥测数据管理
pub mod metrics;
// pub mod telemetry;
