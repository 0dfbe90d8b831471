use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    let supported = data.parser_registry.supported_extensions();
    HttpResponse::Ok().json(serde_json::json!({
        "message": "3D 区域分割服务",
        "endpoints": [
            "POST /flood",
            "GET /flood/chunk?task_id=<id>&chunk_index=<n>",
            "POST /growth/start",
            "POST /growth/advance",
            "POST /growth/auto",
            "POST /growth/stop",
            "GET /growth/mask?run_id=<id>",
            "GET /performance?session_id=<id>",
        ],
        "supported_extensions": supported,
        "resource_dir": data.resource_dir,
    }))
}
