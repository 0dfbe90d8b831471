mod app_state;
mod ball;
mod error;
mod flood;
mod growth;
mod handlers;
mod mask_store;
mod parsers;
mod performance;
mod routes;
mod run_store;
mod utils;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};

use crate::mask_store::MaskStore;
use crate::performance::PerformanceStore;
use crate::run_store::RunStore;
use crate::utils::parser_registry::ParserRegistry;
use app_state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 初始化解析器注册表
    let parser_registry = Arc::new(ParserRegistry::new());
    let resource_dir = "test/resource".to_string();

    let supported_extensions = parser_registry.supported_extensions();
    println!("已注册的解析器:");
    for ext in &supported_extensions {
        println!("  - .{}", ext);
    }

    let mask_store = Arc::new(MaskStore::new());
    let run_store = Arc::new(RunStore::new());
    let performance_store = Arc::new(PerformanceStore::new());
    let app_state = web::Data::new(AppState::new(
        parser_registry,
        resource_dir.clone(),
        mask_store.clone(),
        run_store.clone(),
        performance_store.clone(),
    ));

    // 启动后台清理任务：定期清理过期的填充任务、生长会话和性能数据
    // 每 5 分钟执行一次清理，避免长期占用内存
    let cleanup_masks = mask_store.clone();
    let cleanup_runs = run_store.clone();
    let cleanup_performance = performance_store.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(std::time::Duration::from_secs(5 * 60));
        loop {
            interval.tick().await;
            let cleaned_masks = cleanup_masks.cleanup_expired();
            let cleaned_runs = cleanup_runs.cleanup_expired();
            let cleaned_sessions = cleanup_performance.cleanup_expired();
            if cleaned_masks + cleaned_runs + cleaned_sessions > 0 {
                println!(
                    "[清理任务] 清理了 {} 个填充任务、{} 个生长会话、{} 组性能数据，当前剩余: {} 个任务 / {} 个会话",
                    cleaned_masks,
                    cleaned_runs,
                    cleaned_sessions,
                    cleanup_masks.task_count(),
                    cleanup_runs.run_count()
                );
            }
        }
    });

    println!("\n服务器启动在 http://127.0.0.1:8080");
    println!("资源目录: {}", resource_dir);
    println!(
        "任务 TTL: {} 分钟 / 会话 TTL: {} 分钟",
        mask_store.default_ttl().as_secs() / 60,
        run_store.default_ttl().as_secs() / 60
    );
    println!("\n可用接口:");
    println!("  GET / - API 信息");
    println!("  POST /flood - 洪水填充（connected / replace 模式）");
    println!("  GET /flood/chunk?task_id=<id>&chunk_index=<n> - 分块下载填充结果");
    println!("  POST /growth/start - 启动逐步生长");
    println!("  POST /growth/advance - 推进一步生长");
    println!("  POST /growth/auto - 有界自动生长");
    println!("  POST /growth/stop - 停止生长");
    println!("  GET /growth/mask?run_id=<id> - 下载当前生长掩码");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
