use crate::error::SegmentationError;

/// 体素网格数据结构
/// 表示三维规则网格上的标量场数据，分割算法只读取它，从不修改
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    /// 网格维度 [nx, ny, nz]
    pub shape: [usize; 3],
    /// 数据数组，按 C 语言顺序存储 (x变化最快，y其次，z最慢)
    /// 索引计算: index = k * nx * ny + j * nx + i
    pub data: Vec<f64>,
}

impl VoxelGrid {
    /// 创建新的体素网格
    pub fn new(shape: [usize; 3], data: Vec<f64>) -> Result<Self, String> {
        let total_elements = shape[0] * shape[1] * shape[2];

        if data.len() != total_elements {
            return Err(format!(
                "数据量不匹配: shape {:?} 需要 {} 个元素，但提供了 {} 个",
                shape,
                total_elements,
                data.len()
            ));
        }

        Ok(VoxelGrid { shape, data })
    }

    /// 网格元素总数
    pub fn len(&self) -> usize {
        self.shape[0] * self.shape[1] * self.shape[2]
    }

    /// 坐标 [i, j, k] 对应的扁平索引
    pub fn index(&self, coord: [usize; 3]) -> usize {
        let [nx, ny, _] = self.shape;
        coord[2] * nx * ny + coord[1] * nx + coord[0]
    }

    /// 扁平索引还原为坐标 [i, j, k]
    pub fn coord(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.shape;
        let k = index / (nx * ny);
        let rem = index % (nx * ny);
        [rem % nx, rem / nx, k]
    }

    /// 带符号坐标是否落在网格内部
    pub fn contains(&self, coord: [i64; 3]) -> bool {
        (0..3).all(|axis| coord[axis] >= 0 && (coord[axis] as usize) < self.shape[axis])
    }

    /// 读取指定坐标的标量值
    pub fn value(&self, coord: [usize; 3]) -> f64 {
        self.data[self.index(coord)]
    }

    /// 校验种子点：先对每个轴四舍五入到最近整数，再做越界检查
    /// 外部采点工具给出的是浮点坐标，所以取整发生在校验之前
    pub fn checked_seed(&self, seed: [f64; 3]) -> Result<[usize; 3], SegmentationError> {
        checked_seed_in_shape(self.shape, seed)
    }
}

/// 只凭 shape 校验种子点，供尚未加载数据、只探测了元数据的调用方使用
pub fn checked_seed_in_shape(
    shape: [usize; 3],
    seed: [f64; 3],
) -> Result<[usize; 3], SegmentationError> {
    let rounded = [
        seed[0].round() as i64,
        seed[1].round() as i64,
        seed[2].round() as i64,
    ];

    let in_bounds =
        (0..3).all(|axis| rounded[axis] >= 0 && (rounded[axis] as usize) < shape[axis]);
    if !in_bounds {
        return Err(SegmentationError::OutOfBoundsSeed {
            seed: rounded,
            shape,
        });
    }

    Ok([rounded[0] as usize, rounded[1] as usize, rounded[2] as usize])
}

/// 标签掩码，与体素网格同形状的整数数组
/// 0 表示未分配，正数表示所属的分割类别
#[derive(Debug, Clone)]
pub struct LabelMask {
    pub shape: [usize; 3],
    pub data: Vec<i32>,
}

impl LabelMask {
    /// 创建全零掩码
    pub fn zeros(shape: [usize; 3]) -> Self {
        LabelMask {
            shape,
            data: vec![0; shape[0] * shape[1] * shape[2]],
        }
    }

    /// 已分配（非零）体素数量
    pub fn admitted_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
