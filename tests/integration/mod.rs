// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod helpers;

pub mod article_repository_test;
pub mod history_repository_test;
pub mod ranking_flow_test;
