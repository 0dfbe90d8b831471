use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::app_state::AppState;

#[derive(Deserialize)]
pub struct PerformanceQuery {
    pub session_id: String,
}

/// 获取指定会话（task_id 或 run_id）的性能数据
#[get("/performance")]
pub async fn get_performance(
    data: web::Data<AppState>,
    query: web::Query<PerformanceQuery>,
) -> impl Responder {
    let records = data.performance_store.get_records(&query.session_id);
    eprintln!(
        "[性能数据查询] session_id: {}, 记录数: {}",
        query.session_id,
        records.as_ref().map(|r| r.len()).unwrap_or(0)
    );

    // 即使没有记录也返回空数组，会话可能还没有产生任何计算
    HttpResponse::Ok().json(serde_json::json!({
        "session_id": query.session_id,
        "records": records.unwrap_or_default(),
    }))
}
