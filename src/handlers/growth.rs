use std::sync::Arc;
use std::time::Instant;

use actix_web::{HttpResponse, Responder, get, http::header::ContentType, post, web};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::SegmentationError;
use crate::growth::GrowthRun;
use crate::handlers::chunk::{encode_i32_le, maybe_gzip};
use crate::handlers::flood::segmentation_error_response;
use crate::performance::{PerformanceRecord, get_unix_timestamp_ms};
use crate::run_store::GrowthSession;

#[derive(Deserialize)]
pub struct GrowthStartRequest {
    pub file: String,
    /// 种子点坐标，浮点坐标按轴四舍五入
    pub seed: [f64; 3],
    /// 容差，默认 10
    pub tolerance: Option<f64>,
    /// 每步半径增量，默认 10
    pub step: Option<f64>,
}

#[derive(Serialize)]
pub struct GrowthStartResponse {
    pub run_id: String,
    pub label: i32,
    pub shape: [usize; 3],
    pub seed: [usize; 3],
    pub seed_value: f64,
    pub radius: f64,
    pub step: f64,
}

#[derive(Deserialize)]
pub struct GrowthSignalRequest {
    pub run_id: String,
}

#[derive(Deserialize)]
pub struct GrowthAutoRequest {
    pub run_id: String,
    /// 自动推进的步数上限，默认 20
    pub steps: Option<u32>,
}

#[derive(Serialize)]
pub struct GrowthStateResponse {
    pub run_id: String,
    pub running: bool,
    /// 下一次 advance 使用的半径
    pub radius: f64,
    /// 当前已写入掩码的体素总数
    pub admitted: usize,
}

fn unknown_run_response(run_id: &str) -> HttpResponse {
    segmentation_error_response(&SegmentationError::InvalidState(format!(
        "生长任务 {} 不存在或尚未启动",
        run_id
    )))
}

/// 启动一次逐步生长：同步解析体素文件，创建生长会话
/// 之后通过 /growth/advance、/growth/stop 信号驱动状态机
#[post("/growth/start")]
pub async fn start_growth(
    data: web::Data<AppState>,
    payload: web::Json<GrowthStartRequest>,
) -> impl Responder {
    let tolerance = payload.tolerance.unwrap_or(10.0);
    // 非正或 NaN 的步长按 1 处理，保证半径单调递增
    let step = payload.step.unwrap_or(10.0);
    let step = if step > 0.0 { step } else { 1.0 };
    let file_path = format!("{}/{}", data.resource_dir, payload.file);

    let parser = match data.parser_registry.find_parser_for_file(&file_path) {
        Some((p, _)) => p,
        None => {
            let supported = data.parser_registry.supported_extensions();
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "不支持的文件格式",
                "file": payload.file,
                "supported_extensions": supported,
            }));
        }
    };

    // 生长的每一步都要读取体素强度，启动时同步加载整个网格
    let parse_start = Instant::now();
    let parse_start_ms = get_unix_timestamp_ms();
    let grid = match parser.parse_from_file(&file_path) {
        Ok(grid) => Arc::new(grid),
        Err(e) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "加载体素文件失败",
                "file": payload.file,
                "parser": parser.name(),
                "details": e.to_string(),
            }));
        }
    };
    println!(
        "[区域生长] 文件 {} 解析完成，耗时 {:.2}ms",
        payload.file,
        parse_start.elapsed().as_millis()
    );

    let label = data.next_label();
    let run = match GrowthRun::start(&grid, payload.seed, tolerance, step, label) {
        Ok(run) => run,
        Err(err) => return segmentation_error_response(&err),
    };

    let shape = grid.shape;
    let seed = run.seed();
    let seed_value = run.seed_value();
    let radius = run.radius();
    let step = run.step();
    let run_id = data.run_store.insert(GrowthSession::new(grid, run));

    data.performance_store.add_record(
        &run_id,
        PerformanceRecord {
            start_time: parse_start_ms,
            end_time: get_unix_timestamp_ms(),
            channel_group: "growth".to_string(),
            channel_index: "parse_file".to_string(),
            msg: file_path,
        },
    );

    HttpResponse::Ok().json(GrowthStartResponse {
        run_id,
        label,
        shape,
        seed,
        seed_value,
        radius,
        step,
    })
}

/// 推进信号：扩大一圈球形搜索邻域并吸纳容差内的体素
/// 任务已停止时是空操作，返回当前状态
#[post("/growth/advance")]
pub async fn advance_growth(
    data: web::Data<AppState>,
    payload: web::Json<GrowthSignalRequest>,
) -> impl Responder {
    let Some(session) = data.run_store.get(&payload.run_id) else {
        return unknown_run_response(&payload.run_id);
    };

    let advance_start_ms = get_unix_timestamp_ms();
    let (running, radius, admitted, radius_before) = {
        let mut run = session.run.write();
        let radius_before = run.radius();
        run.advance(&session.grid);
        (
            run.running(),
            run.radius(),
            run.mask().admitted_count(),
            radius_before,
        )
    };

    if running {
        data.performance_store.add_record(
            &payload.run_id,
            PerformanceRecord {
                start_time: advance_start_ms,
                end_time: get_unix_timestamp_ms(),
                channel_group: "growth".to_string(),
                channel_index: format!("advance_r{}", radius_before),
                msg: format!("已吸纳 {} 个体素", admitted),
            },
        );
    }

    HttpResponse::Ok().json(GrowthStateResponse {
        run_id: payload.run_id.clone(),
        running,
        radius,
        admitted,
    })
}

/// 有界自动运行：无需逐次发送 advance 信号，最多推进 steps 步
#[post("/growth/auto")]
pub async fn auto_growth(
    data: web::Data<AppState>,
    payload: web::Json<GrowthAutoRequest>,
) -> impl Responder {
    let Some(session) = data.run_store.get(&payload.run_id) else {
        return unknown_run_response(&payload.run_id);
    };
    let steps = payload.steps.unwrap_or(20);

    let auto_start_ms = get_unix_timestamp_ms();
    let (running, radius, admitted) = {
        let mut run = session.run.write();
        run.auto_run(&session.grid, steps);
        (run.running(), run.radius(), run.mask().admitted_count())
    };

    data.performance_store.add_record(
        &payload.run_id,
        PerformanceRecord {
            start_time: auto_start_ms,
            end_time: get_unix_timestamp_ms(),
            channel_group: "growth".to_string(),
            channel_index: format!("auto_{}", steps),
            msg: format!("已吸纳 {} 个体素", admitted),
        },
    );

    HttpResponse::Ok().json(GrowthStateResponse {
        run_id: payload.run_id.clone(),
        running,
        radius,
        admitted,
    })
}

/// 停止信号：幂等，停止后所有 advance 都是空操作
#[post("/growth/stop")]
pub async fn stop_growth(
    data: web::Data<AppState>,
    payload: web::Json<GrowthSignalRequest>,
) -> impl Responder {
    let Some(session) = data.run_store.get(&payload.run_id) else {
        return unknown_run_response(&payload.run_id);
    };

    let (radius, admitted) = {
        let mut run = session.run.write();
        run.stop();
        (run.radius(), run.mask().admitted_count())
    };
    println!(
        "[区域生长] 任务 {} 已停止，吸纳 {} 个体素",
        payload.run_id, admitted
    );

    HttpResponse::Ok().json(GrowthStateResponse {
        run_id: payload.run_id.clone(),
        running: false,
        radius,
        admitted,
    })
}

#[derive(Deserialize)]
pub struct GrowthMaskQuery {
    pub run_id: String,
    /// true 时响应体使用 gzip 压缩
    pub compress: Option<bool>,
}

/// 下载当前生长掩码的完整二进制快照（小端 i32）
/// 每次 advance 之后调用即可刷新显示
#[get("/growth/mask")]
pub async fn get_growth_mask(
    data: web::Data<AppState>,
    query: web::Query<GrowthMaskQuery>,
) -> impl Responder {
    let Some(session) = data.run_store.get(&query.run_id) else {
        return unknown_run_response(&query.run_id);
    };

    let (shape, label, encoded) = {
        let run = session.run.read();
        (
            run.mask().shape,
            run.label(),
            encode_i32_le(&run.mask().data),
        )
    };

    let bytes = match encoded {
        Ok(bytes) => bytes,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "写入掩码数据失败",
                "details": e.to_string(),
            }));
        }
    };

    let (bytes, gzipped) = match maybe_gzip(bytes, query.compress.unwrap_or(false)) {
        Ok(result) => result,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "压缩掩码数据失败",
                "details": e.to_string(),
            }));
        }
    };

    let mut response = HttpResponse::Ok();
    response
        .content_type(ContentType::octet_stream())
        .append_header(("X-Mask-Dtype", "int32"))
        .append_header(("X-Mask-Label", label.to_string()))
        .append_header((
            "X-Mask-Shape",
            format!("{},{},{}", shape[0], shape[1], shape[2]),
        ))
        .append_header(("X-Mask-Run", query.run_id.clone()));
    if gzipped {
        response.append_header(("Content-Encoding", "gzip"));
    }
    response.body(bytes)
}
