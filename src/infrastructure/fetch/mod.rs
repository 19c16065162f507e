// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 抓取模块
///
/// 提供文章抓取与内容处理的具体实现
/// 包括HTTP抓取器和基于关键词的内容处理器
pub mod http_fetcher;
pub mod keyword_processor;
