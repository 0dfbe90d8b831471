use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::growth::GrowthRun;
use crate::utils::voxel_grid::VoxelGrid;
use uuid::Uuid;

/// 一次生长任务的会话数据
/// 体素网格在 start 时加载一次，整个生命周期内只读共享；
/// 生长状态用写锁保护，保证同一任务的 advance 被串行化
pub struct GrowthSession {
    pub grid: Arc<VoxelGrid>,
    pub run: RwLock<GrowthRun>,
    /// 会话创建时间，用于 TTL 过期检查
    pub created_at: Instant,
}

impl GrowthSession {
    pub fn new(grid: Arc<VoxelGrid>, run: GrowthRun) -> Self {
        Self {
            grid,
            run: RwLock::new(run),
            created_at: Instant::now(),
        }
    }
}

/// 生长任务存储，按 run_id 管理所有进行中的生长会话
pub struct RunStore {
    runs: RwLock<HashMap<String, Arc<GrowthSession>>>,
    /// TTL（Time-To-Live）默认过期时间：30 分钟
    default_ttl: Duration,
}

impl RunStore {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            default_ttl: Duration::from_secs(30 * 60), // 30 分钟
        }
    }

    /// 创建带自定义 TTL 的 RunStore
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    pub fn insert(&self, session: GrowthSession) -> String {
        let run_id = Uuid::new_v4().to_string();
        self.runs.write().insert(run_id.clone(), Arc::new(session));
        run_id
    }

    pub fn get(&self, run_id: &str) -> Option<Arc<GrowthSession>> {
        self.runs.read().get(run_id).cloned()
    }

    /// 清理过期的会话，返回清理的会话数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut runs = self.runs.write();
        let before_count = runs.len();

        runs.retain(|_, session| now.duration_since(session.created_at) < self.default_ttl);

        before_count - runs.len()
    }

    /// 获取当前会话数量
    pub fn run_count(&self) -> usize {
        self.runs.read().len()
    }

    /// 获取默认 TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
