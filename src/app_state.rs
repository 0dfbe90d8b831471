use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::mask_store::MaskStore;
use crate::performance::PerformanceStore;
use crate::run_store::RunStore;
use crate::utils::parser_registry::ParserRegistry;

/// 全局应用状态，负责在各个 handler 之间共享解析器与资源目录
pub struct AppState {
    pub parser_registry: Arc<ParserRegistry>,
    pub resource_dir: String,
    pub mask_store: Arc<MaskStore>,
    pub run_store: Arc<RunStore>,
    pub performance_store: Arc<PerformanceStore>,
    /// 标签计数器，每次洪水填充或生长启动递增一次（同一次调用内的
    /// 多个种子点共用同一个标签）
    label_counter: AtomicI32,
}

impl AppState {
    pub fn new(
        parser_registry: Arc<ParserRegistry>,
        resource_dir: String,
        mask_store: Arc<MaskStore>,
        run_store: Arc<RunStore>,
        performance_store: Arc<PerformanceStore>,
    ) -> Self {
        Self {
            parser_registry,
            resource_dir,
            mask_store,
            run_store,
            performance_store,
            label_counter: AtomicI32::new(0),
        }
    }

    /// 分配下一个标签值，从 1 开始
    pub fn next_label(&self) -> i32 {
        self.label_counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}
