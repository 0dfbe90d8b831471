use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ChunkDescriptor {
    pub index: usize,
    /// 开始位置（包含），单位：元素索引
    pub start: usize,
    /// 结束位置（不包含），单位：元素索引
    pub end: usize,
}

/// 按 chunk_size 把 data_length 个元素切成连续的块
pub fn make_chunks(data_length: usize, chunk_size: usize) -> Vec<ChunkDescriptor> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    while start < data_length {
        let end = (start + chunk_size).min(data_length);
        chunks.push(ChunkDescriptor { index, start, end });
        start = end;
        index += 1;
    }
    chunks
}

/// 一个 chunk 的计算结果载荷，类型由填充模式决定
/// 与所属任务的 dtype 字段一一对应（"int32" / "float64"）
#[derive(Debug, Clone)]
pub enum MaskChunk {
    /// 连通填充的标签掩码片段
    Labels(Vec<i32>),
    /// 替换填充后的体素网格片段
    Volume(Vec<f64>),
}

/// 洪水填充任务数据，存储分块的计算结果
/// 使用 HashMap 独立存储每个 chunk，允许单独释放
pub struct MaskTask {
    /// 网格维度 [nx, ny, nz]
    pub shape: [usize; 3],
    /// 本次填充使用的标签值
    pub label: i32,
    /// "int32"（掩码）或 "float64"（替换填充后的网格）
    pub dtype: &'static str,
    /// 分块描述列表
    pub chunks: Vec<ChunkDescriptor>,
    /// 每个 chunk 的数据，key 是 chunk_index
    /// None 表示后台还在计算中，Some 表示已就绪
    /// 当 chunk 被请求后，对应的数据会被移除以释放内存
    pub chunk_data: RwLock<HashMap<usize, Option<MaskChunk>>>,
    /// 任务创建时间，用于 TTL 过期检查
    pub created_at: Instant,
}

impl MaskTask {
    /// 创建新的任务（后台计算尚未完成，所有 chunk 都是 None）
    pub fn new(
        shape: [usize; 3],
        label: i32,
        dtype: &'static str,
        chunks: Vec<ChunkDescriptor>,
    ) -> Self {
        let mut chunk_data = HashMap::new();
        for descriptor in &chunks {
            chunk_data.insert(descriptor.index, None);
        }

        Self {
            shape,
            label,
            dtype,
            chunks,
            chunk_data: RwLock::new(chunk_data),
            created_at: Instant::now(),
        }
    }

    /// 写入指定 chunk 的数据（后台计算完成后调用）
    pub fn set_chunk(&self, chunk_index: usize, chunk: MaskChunk) {
        self.chunk_data.write().insert(chunk_index, Some(chunk));
    }

    /// 获取并移除指定 chunk 的数据（请求后立即释放内存）
    /// 返回 None 如果 chunk 不存在、还在计算中或已被请求
    pub fn take_chunk(&self, chunk_index: usize) -> Option<MaskChunk> {
        let mut chunk_data = self.chunk_data.write();
        if let Some(Some(chunk)) = chunk_data.remove(&chunk_index) {
            Some(chunk)
        } else {
            None
        }
    }

    /// 检查指定 chunk 是否已就绪
    pub fn is_chunk_ready(&self, chunk_index: usize) -> bool {
        self.chunk_data
            .read()
            .get(&chunk_index)
            .map(|opt| opt.is_some())
            .unwrap_or(false)
    }
}

/// 洪水填充任务存储，按 task_id 管理结果的生命周期
pub struct MaskStore {
    tasks: RwLock<HashMap<String, Arc<MaskTask>>>,
    /// TTL（Time-To-Live）默认过期时间：30 分钟
    default_ttl: Duration,
}

impl MaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            default_ttl: Duration::from_secs(30 * 60), // 30 分钟
        }
    }

    /// 创建带自定义 TTL 的 MaskStore
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    pub fn insert(&self, task: MaskTask) -> String {
        let task_id = Uuid::new_v4().to_string();
        self.tasks.write().insert(task_id.clone(), Arc::new(task));
        task_id
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<MaskTask>> {
        self.tasks.read().get(task_id).cloned()
    }

    /// 清理过期的任务，返回清理的任务数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut tasks = self.tasks.write();
        let before_count = tasks.len();

        tasks.retain(|_, task| now.duration_since(task.created_at) < self.default_ttl);

        before_count - tasks.len()
    }

    /// 获取当前任务数量
    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    /// 获取默认 TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_chunks_covers_all_elements() {
        let chunks = make_chunks(10, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 4));
        assert_eq!((chunks[2].start, chunks[2].end), (8, 10));
        // chunk_size 为 0 时按 1 处理
        assert_eq!(make_chunks(3, 0).len(), 3);
    }

    #[test]
    fn test_chunk_lifecycle_take_frees_data() {
        let chunks = make_chunks(4, 4);
        let task = MaskTask::new([4, 1, 1], 1, "int32", chunks);
        assert!(!task.is_chunk_ready(0));

        task.set_chunk(0, MaskChunk::Labels(vec![1, 1, 0, 0]));
        assert!(task.is_chunk_ready(0));

        let chunk = task.take_chunk(0).unwrap();
        assert!(matches!(chunk, MaskChunk::Labels(values) if values == vec![1, 1, 0, 0]));
        // 再次请求同一个 chunk 返回 None
        assert!(task.take_chunk(0).is_none());
    }

    #[test]
    fn test_cleanup_expired_removes_old_tasks() {
        let store = MaskStore::with_ttl(Duration::ZERO);
        store.insert(MaskTask::new([1, 1, 1], 1, "int32", make_chunks(1, 1)));
        assert_eq!(store.task_count(), 1);
        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.task_count(), 0);
    }
}
