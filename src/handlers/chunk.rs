use std::io::Write;

use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::mask_store::MaskChunk;

#[derive(Deserialize)]
pub struct ChunkQuery {
    pub task_id: String,
    pub chunk_index: usize,
    /// true 时响应体使用 gzip 压缩
    pub compress: Option<bool>,
}

/// 标签掩码序列化为小端 i32 字节流
pub(crate) fn encode_i32_le(values: &[i32]) -> Result<Vec<u8>, std::io::Error> {
    let mut bytes = Vec::with_capacity(values.len() * std::mem::size_of::<i32>());
    for &value in values {
        bytes.write_i32::<LittleEndian>(value)?;
    }
    Ok(bytes)
}

/// 体素数据序列化为小端 f64 字节流
pub(crate) fn encode_f64_le(values: &[f64]) -> Result<Vec<u8>, std::io::Error> {
    let mut bytes = Vec::with_capacity(values.len() * std::mem::size_of::<f64>());
    for &value in values {
        bytes.write_f64::<LittleEndian>(value)?;
    }
    Ok(bytes)
}

/// 按需 gzip 压缩，大掩码走网络时明显减小体积
pub(crate) fn maybe_gzip(bytes: Vec<u8>, compress: bool) -> Result<(Vec<u8>, bool), std::io::Error> {
    if !compress {
        return Ok((bytes, false));
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes)?;
    Ok((encoder.finish()?, true))
}

/// 洪水填充结果分块下载接口
/// 计算未完成时返回 202，chunk 下载成功后立即从内存释放
#[get("/flood/chunk")]
pub async fn get_flood_chunk(
    data: web::Data<AppState>,
    query: web::Query<ChunkQuery>,
) -> impl Responder {
    let Some(task) = data.mask_store.get(&query.task_id) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 task_id",
            "task_id": query.task_id,
        }));
    };

    let Some(descriptor) = task.chunks.get(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 chunk_index",
            "chunk_index": query.chunk_index,
        }));
    };

    // 检查 chunk 是否已就绪（后台计算是否完成）
    if !task.is_chunk_ready(query.chunk_index) {
        return HttpResponse::Accepted().json(serde_json::json!({
            "error": "结果还在计算中，请稍后重试",
            "task_id": query.task_id,
            "chunk_index": query.chunk_index,
            "status": "processing",
        }));
    }

    // 获取并移除 chunk 数据（请求后立即释放内存）
    // 如果 chunk 已被请求，take_chunk 会返回 None
    let Some(chunk) = task.take_chunk(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "chunk 已被请求或不存在",
            "task_id": query.task_id,
            "chunk_index": query.chunk_index,
        }));
    };

    let encoded = match &chunk {
        MaskChunk::Labels(values) => encode_i32_le(values),
        MaskChunk::Volume(values) => encode_f64_le(values),
    };
    let bytes = match encoded {
        Ok(bytes) => bytes,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "写入 chunk 数据失败",
                "details": e.to_string(),
            }));
        }
    };

    let (bytes, gzipped) = match maybe_gzip(bytes, query.compress.unwrap_or(false)) {
        Ok(result) => result,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "压缩 chunk 数据失败",
                "details": e.to_string(),
            }));
        }
    };

    let mut response = HttpResponse::Ok();
    response
        .content_type(ContentType::octet_stream())
        .append_header(("X-Chunk-Index", descriptor.index.to_string()))
        .append_header(("X-Chunk-Start", descriptor.start.to_string()))
        .append_header(("X-Chunk-End", descriptor.end.to_string()))
        .append_header((
            "X-Chunk-Length",
            (descriptor.end - descriptor.start).to_string(),
        ))
        .append_header(("X-Chunk-Dtype", task.dtype))
        .append_header(("X-Chunk-Label", task.label.to_string()))
        .append_header((
            "X-Grid-Shape",
            format!("{},{},{}", task.shape[0], task.shape[1], task.shape[2]),
        ))
        .append_header(("X-Chunk-Task", query.task_id.clone()));
    if gzipped {
        response.append_header(("Content-Encoding", "gzip"));
    }
    response.body(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_encode_i32_le() {
        let bytes = encode_i32_le(&[1, -2]).unwrap();
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(cursor.read_i32::<LittleEndian>().unwrap(), 1);
        assert_eq!(cursor.read_i32::<LittleEndian>().unwrap(), -2);
    }

    #[test]
    fn test_maybe_gzip_roundtrip() {
        let original = encode_f64_le(&[1.5, 2.5, 3.5]).unwrap();
        let (compressed, gzipped) = maybe_gzip(original.clone(), true).unwrap();
        assert!(gzipped);

        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_maybe_gzip_passthrough() {
        let bytes = vec![1u8, 2, 3];
        let (unchanged, gzipped) = maybe_gzip(bytes.clone(), false).unwrap();
        assert!(!gzipped);
        assert_eq!(unchanged, bytes);
    }
}
