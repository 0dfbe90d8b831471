use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// 性能数据记录
/// 记录一次计算阶段（文件解析、洪水填充、生长推进等）的起止时间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// 开始时间 (Unix 时间戳，毫秒)
    pub start_time: u64,
    /// 结束时间 (Unix 时间戳，毫秒)
    pub end_time: u64,
    /// 阶段分组，如 "flood"、"growth"
    pub channel_group: String,
    /// 分组内的阶段标识，如 "parse_file"、"compute_mask"、"advance_3"
    pub channel_index: String,
    /// 附加信息（hover 时除时间外的显示内容）
    pub msg: String,
}

/// 性能数据存储
/// 按 session_id（task_id 或 run_id）存储性能记录
pub struct PerformanceStore {
    /// session_id -> 性能记录列表
    records: RwLock<HashMap<String, Vec<PerformanceRecord>>>,
    /// TTL（Time-To-Live）默认过期时间：30 分钟
    default_ttl: Duration,
    /// session_id -> 创建时间
    session_times: RwLock<HashMap<String, SystemTime>>,
}

impl PerformanceStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            default_ttl: Duration::from_secs(30 * 60), // 30 分钟
            session_times: RwLock::new(HashMap::new()),
        }
    }

    /// 添加性能记录
    pub fn add_record(&self, session_id: &str, record: PerformanceRecord) {
        let mut records = self.records.write();
        let entry = records.entry(session_id.to_string()).or_insert_with(Vec::new);
        entry.push(record);

        // 记录会话创建时间（如果还没有）
        let mut session_times = self.session_times.write();
        session_times
            .entry(session_id.to_string())
            .or_insert_with(SystemTime::now);
    }

    /// 获取指定会话的所有性能记录
    pub fn get_records(&self, session_id: &str) -> Option<Vec<PerformanceRecord>> {
        self.records.read().get(session_id).cloned()
    }

    /// 清理过期的会话，返回清理的会话数量
    pub fn cleanup_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut records = self.records.write();
        let mut session_times = self.session_times.write();
        let before_count = records.len();

        let expired_sessions: Vec<String> = session_times
            .iter()
            .filter_map(|(session_id, created_at)| {
                if now.duration_since(*created_at).unwrap_or(Duration::ZERO) > self.default_ttl {
                    Some(session_id.clone())
                } else {
                    None
                }
            })
            .collect();

        for session_id in &expired_sessions {
            records.remove(session_id);
            session_times.remove(session_id);
        }

        before_count - records.len()
    }
}

/// 获取 Unix 时间戳（毫秒）
pub fn get_unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
