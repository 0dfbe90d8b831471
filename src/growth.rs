use crate::ball::ball_offsets;
use crate::error::SegmentationError;
use crate::utils::voxel_grid::{LabelMask, VoxelGrid};

/// 一次逐步生长的完整状态
///
/// 状态机为 Running → Stopped：`start` 创建即进入 Running，`stop` 之后
/// 状态不再变化。状态值由调用方持有并在 `start`/`advance`/`stop` 之间
/// 传递，核心内部不做任何加锁，同一个生长任务的并发访问由调用方串行化。
#[derive(Debug, Clone)]
pub struct GrowthRun {
    /// 种子点坐标（已取整并通过越界校验）
    seed: [usize; 3],
    /// 种子点强度，整个生长过程的容差基准，启动后不再变化
    seed_value: f64,
    tolerance: f64,
    /// 每次 advance 后半径的增量，调用方保证为正数
    step: f64,
    /// 当前搜索半径，随 advance 单调递增
    radius: f64,
    /// 写入掩码的标签值
    label: i32,
    mask: LabelMask,
    running: bool,
}

impl GrowthRun {
    /// 启动一次生长：校验种子点和容差，掩码从全零开始，半径从 step 开始
    /// 初始掩码不做洪水填充，第一轮球形扫描由第一次 advance 完成
    pub fn start(
        grid: &VoxelGrid,
        seed: [f64; 3],
        tolerance: f64,
        step: f64,
        label: i32,
    ) -> Result<Self, SegmentationError> {
        if !(tolerance >= 0.0) {
            return Err(SegmentationError::InvalidTolerance(tolerance));
        }
        let seed = grid.checked_seed(seed)?;

        Ok(GrowthRun {
            seed,
            seed_value: grid.value(seed),
            tolerance,
            step,
            radius: step,
            label,
            mask: LabelMask::zeros(grid.shape),
            running: true,
        })
    }

    /// 推进一步：光栅化当前半径的实心球，平移到种子点，越界候选静默
    /// 丢弃，容差内的候选写入掩码。已写入的体素从不清除，所以掩码随
    /// 步数单调增长。返回值借用自身的掩码，不产生副本。
    ///
    /// 任务已停止时本方法是空操作，原样返回当前掩码。
    pub fn advance(&mut self, grid: &VoxelGrid) -> &LabelMask {
        if !self.running {
            return &self.mask;
        }

        for offset in ball_offsets(self.radius) {
            let candidate = [
                self.seed[0] as i64 + offset[0],
                self.seed[1] as i64 + offset[1],
                self.seed[2] as i64 + offset[2],
            ];
            if !grid.contains(candidate) {
                continue;
            }
            let index = grid.index([
                candidate[0] as usize,
                candidate[1] as usize,
                candidate[2] as usize,
            ]);
            if (grid.data[index] - self.seed_value).abs() <= self.tolerance {
                self.mask.data[index] = self.label;
            }
        }

        self.radius += self.step;
        &self.mask
    }

    /// 停止生长，幂等，之后所有 advance 都是空操作
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// 有界自动运行：最多连续推进 steps 步，外部停止信号仍然生效
    pub fn auto_run(&mut self, grid: &VoxelGrid, steps: u32) -> &LabelMask {
        for _ in 0..steps {
            if !self.running {
                break;
            }
            self.advance(grid);
        }
        &self.mask
    }

    pub fn mask(&self) -> &LabelMask {
        &self.mask
    }

    pub fn seed(&self) -> [usize; 3] {
        self.seed
    }

    pub fn seed_value(&self) -> f64 {
        self.seed_value
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn label(&self) -> i32 {
        self.label
    }

    pub fn running(&self) -> bool {
        self.running
    }
}
