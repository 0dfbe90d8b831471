use std::time::Instant;

use actix_web::{HttpResponse, Responder, post, web};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::SegmentationError;
use crate::flood::{Connectivity, FillMode, FloodOutput, compute_region_mask};
use crate::mask_store::{ChunkDescriptor, MaskChunk, MaskTask, make_chunks};
use crate::performance::{PerformanceRecord, get_unix_timestamp_ms};
use crate::utils::voxel_grid::checked_seed_in_shape;

#[derive(Deserialize)]
pub struct FloodRequest {
    pub file: String,
    /// 种子点坐标列表，浮点坐标按轴四舍五入后参与计算
    pub seeds: Vec<[f64; 3]>,
    /// 容差，默认 10
    pub tolerance: Option<f64>,
    /// "connected"（默认）或 "replace"
    pub mode: Option<String>,
    /// replace 模式的填充值
    pub fill_value: Option<f64>,
    /// 连通性: 6 | 18 | 26，默认 6
    pub connectivity: Option<u32>,
    /// 分块大小（元素数量），默认 1000000
    pub chunk_size: Option<usize>,
}

#[derive(Serialize, Clone)]
pub struct FloodResponse {
    pub task_id: String,
    pub file: String,
    pub file_size: u64,
    pub label: i32,
    pub shape: [usize; 3],
    pub data_length: usize,
    pub dtype: &'static str,
    pub chunk_size: usize,
    pub chunks: Vec<ChunkDescriptor>,
}

/// 洪水填充接口：校验参数后立即返回任务信息，计算在后台进行
/// 结果通过 /flood/chunk 接口分块下载
#[post("/flood")]
pub async fn start_flood(
    data: web::Data<AppState>,
    payload: web::Json<FloodRequest>,
) -> impl Responder {
    match run_flood(data.get_ref(), &payload) {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(err) => err,
    }
}

/// 核心层错误统一转成 400 响应，kind 字段是稳定的机器可读标识
pub fn segmentation_error_response(err: &SegmentationError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": err.to_string(),
        "kind": err.kind(),
    }))
}

/// 预处理洪水填充请求：同步校验，后台解析与计算
///
/// ## 流程
/// 1. 解析请求参数（模式、连通性、容差、分块大小）
/// 2. 查找匹配的解析器并快速读取 shape（不加载数据）
/// 3. 凭 shape 同步校验全部种子点，越界立即报错
/// 4. 分配标签、登记任务，启动后台解析 + 填充计算
/// 5. 立即返回 task_id、shape、chunks 等信息
pub fn run_flood(
    app_state: &AppState,
    request: &FloodRequest,
) -> Result<FloodResponse, HttpResponse> {
    // ==================== 步骤 1: 参数解析 ====================
    let tolerance = request.tolerance.unwrap_or(10.0);
    let chunk_size = request.chunk_size.unwrap_or(1_000_000).max(1);
    let file_path = format!("{}/{}", app_state.resource_dir, request.file);

    let connectivity = match request.connectivity {
        None => Connectivity::default(),
        Some(count) => match Connectivity::from_neighbor_count(count) {
            Some(connectivity) => connectivity,
            None => {
                return Err(HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "连通性非法，仅支持 6、18、26",
                    "connectivity": count,
                })));
            }
        },
    };

    let mode = match request.mode.as_deref() {
        None | Some("connected") => FillMode::Connected,
        Some("replace") => {
            let Some(fill_value) = request.fill_value else {
                return Err(HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "replace 模式需要提供 fill_value 参数",
                })));
            };
            FillMode::Replace { fill_value }
        }
        Some(other) => {
            return Err(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "填充模式非法，仅支持 connected 和 replace",
                "mode": other,
            })));
        }
    };

    // ==================== 步骤 2: 查找解析器并读取元数据 ====================
    let parser = match app_state.parser_registry.find_parser_for_file(&file_path) {
        Some((p, _)) => p,
        None => {
            let supported = app_state.parser_registry.supported_extensions();
            return Err(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "不支持的文件格式",
                "file": request.file,
                "supported_extensions": supported,
            })));
        }
    };

    let file_size = match std::fs::metadata(&file_path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            return Err(HttpResponse::NotFound().json(serde_json::json!({
                "error": "文件不存在或无法访问",
                "file": request.file,
                "details": e.to_string(),
            })));
        }
    };

    let shape = match parser.get_shape_from_file(&file_path) {
        Ok(s) => s,
        Err(e) => {
            return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "获取文件 shape 失败",
                "file": request.file,
                "parser": parser.name(),
                "details": e.to_string(),
            })));
        }
    };

    // ==================== 步骤 3: 同步校验分割参数 ====================
    // 越界种子、空种子列表、非法容差都在启动后台计算之前报告
    if request.seeds.is_empty() {
        return Err(segmentation_error_response(&SegmentationError::NoSeedPoints));
    }
    if !(tolerance >= 0.0) {
        return Err(segmentation_error_response(
            &SegmentationError::InvalidTolerance(tolerance),
        ));
    }
    for &seed in &request.seeds {
        if let Err(err) = checked_seed_in_shape(shape, seed) {
            return Err(segmentation_error_response(&err));
        }
    }

    // ==================== 步骤 4: 登记任务并启动后台计算 ====================
    let label = app_state.next_label();
    let dtype = match mode {
        FillMode::Connected => "int32",
        FillMode::Replace { .. } => "float64",
    };
    let data_length = shape[0] * shape[1] * shape[2];
    let chunks = make_chunks(data_length, chunk_size);

    let task_id = app_state
        .mask_store
        .insert(MaskTask::new(shape, label, dtype, chunks.clone()));
    let Some(task) = app_state.mask_store.get(&task_id) else {
        return Err(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "创建任务失败",
        })));
    };

    let parser_registry = app_state.parser_registry.clone();
    let performance_store = app_state.performance_store.clone();
    let seeds = request.seeds.clone();
    let file_path_clone = file_path.clone();
    let task_id_clone = task_id.clone();
    let chunks_clone = chunks.clone();

    actix_web::rt::spawn(async move {
        // 步骤 4.1: 完整解析文件
        let parser = match parser_registry.find_parser_for_file(&file_path_clone) {
            Some((p, _)) => p,
            None => {
                eprintln!("[后台计算] 任务 {} 失败：找不到解析器", task_id_clone);
                return;
            }
        };

        let parse_start = Instant::now();
        let parse_start_ms = get_unix_timestamp_ms();
        let grid = match parser.parse_from_file(&file_path_clone) {
            Ok(grid) => grid,
            Err(e) => {
                eprintln!("[后台计算] 任务 {} 解析文件失败: {}", task_id_clone, e);
                return;
            }
        };
        performance_store.add_record(
            &task_id_clone,
            PerformanceRecord {
                start_time: parse_start_ms,
                end_time: get_unix_timestamp_ms(),
                channel_group: "flood".to_string(),
                channel_index: "parse_file".to_string(),
                msg: file_path_clone.clone(),
            },
        );
        println!(
            "[后台计算] 任务 {} 文件解析完成，耗时 {:.2}ms",
            task_id_clone,
            parse_start.elapsed().as_millis()
        );

        // 步骤 4.2: 洪水填充
        let compute_start = Instant::now();
        let compute_start_ms = get_unix_timestamp_ms();
        let output = match compute_region_mask(&grid, &seeds, tolerance, label, mode, connectivity)
        {
            Ok(output) => output,
            Err(e) => {
                // 种子点已在预校验中通过，这里只可能是网格与元数据不一致
                eprintln!("[后台计算] 任务 {} 填充计算失败: {}", task_id_clone, e);
                return;
            }
        };
        performance_store.add_record(
            &task_id_clone,
            PerformanceRecord {
                start_time: compute_start_ms,
                end_time: get_unix_timestamp_ms(),
                channel_group: "flood".to_string(),
                channel_index: "compute_mask".to_string(),
                msg: format!("{} 个种子点，容差 {}", seeds.len(), tolerance),
            },
        );
        println!(
            "[后台计算] 任务 {} 填充计算完成，耗时 {:.2}ms",
            task_id_clone,
            compute_start.elapsed().as_millis()
        );

        // 步骤 4.3: 按块切分结果并写入任务存储
        match output {
            FloodOutput::Mask(mask) => {
                for descriptor in chunks_clone {
                    let values = mask.data[descriptor.start..descriptor.end].to_vec();
                    task.set_chunk(descriptor.index, MaskChunk::Labels(values));
                }
            }
            FloodOutput::Volume(volume) => {
                for descriptor in chunks_clone {
                    let values = volume.data[descriptor.start..descriptor.end].to_vec();
                    task.set_chunk(descriptor.index, MaskChunk::Volume(values));
                }
            }
        }
        println!(
            "[后台计算] 任务 {} 分块完成，共 {} 个 chunk",
            task_id_clone,
            task.chunks.len()
        );
    });

    // ==================== 步骤 5: 立即返回任务信息 ====================
    Ok(FloodResponse {
        task_id,
        file: request.file.clone(),
        file_size,
        label,
        shape,
        data_length,
        dtype,
        chunk_size,
        chunks,
    })
}
