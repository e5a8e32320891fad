// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod mock_delivery;
pub mod mock_storage;

use std::sync::Arc;

use renderq::application::use_cases::render_page::RenderPageUseCase;
use renderq::domain::repositories::storage_repository::StorageRepository;
use renderq::engines::scripted_engine::ScriptedEngine;
use renderq::engines::traits::NavigateOptions;
use renderq::infrastructure::result_sink::ResultSink;
use renderq::workers::dispatcher::TaskDispatcher;

pub const RENDERED_HTML: &str = "<html><head><title>t</title></head><body>rendered</body></html>";

/// 使用脚本化引擎构建调度器
pub fn scripted_dispatcher(
    engine: &ScriptedEngine,
    storage: Arc<dyn StorageRepository>,
) -> TaskDispatcher {
    let use_case = RenderPageUseCase::new(
        Arc::new(engine.clone()),
        NavigateOptions::default(),
        ResultSink::new(storage),
    );
    TaskDispatcher::new(use_case)
}
