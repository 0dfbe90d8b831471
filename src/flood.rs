use crate::error::SegmentationError;
use crate::utils::voxel_grid::{LabelMask, VoxelGrid};

/// 连通性配置，决定洪水填充时哪些体素算作邻居
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// 6-连通：仅共面邻居（默认）
    Face6,
    /// 18-连通：共面 + 共棱邻居
    Edge18,
    /// 26-连通：共面 + 共棱 + 共角邻居
    Corner26,
}

impl Connectivity {
    /// 从邻居数量解析连通性，非法值返回 None
    pub fn from_neighbor_count(count: u32) -> Option<Self> {
        match count {
            6 => Some(Connectivity::Face6),
            18 => Some(Connectivity::Edge18),
            26 => Some(Connectivity::Corner26),
            _ => None,
        }
    }

    /// 该连通性下的邻居偏移列表
    fn offsets(&self) -> Vec<[i64; 3]> {
        let max_dist2 = match self {
            Connectivity::Face6 => 1,
            Connectivity::Edge18 => 2,
            Connectivity::Corner26 => 3,
        };

        let mut offsets = Vec::new();
        for dz in -1i64..=1 {
            for dc in -1i64..=1 {
                for dr in -1i64..=1 {
                    let dist2 = dr * dr + dc * dc + dz * dz;
                    if dist2 > 0 && dist2 <= max_dist2 {
                        offsets.push([dr, dc, dz]);
                    }
                }
            }
        }
        offsets
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Connectivity::Face6
    }
}

/// 填充模式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillMode {
    /// 连通填充：返回标签掩码，不修改体素网格
    Connected,
    /// 替换填充：返回一份体素网格副本，命中区域被改写为 fill_value
    Replace { fill_value: f64 },
}

/// 洪水填充的输出，由填充模式决定
#[derive(Debug, Clone)]
pub enum FloodOutput {
    Mask(LabelMask),
    Volume(VoxelGrid),
}

/// 计算种子点集合对应的标记区域
///
/// 每个种子点独立做一次连通填充，容差始终以该种子点自身的强度为基准
/// （不做逐邻居的梯度链式判定）。各种子的区域乘以同一个 label 后逐体素
/// 相加合成最终掩码，重叠区域因此是标签值的和，调用方负责在每次调用前
/// 递增 label 计数器。
pub fn compute_region_mask(
    grid: &VoxelGrid,
    seeds: &[[f64; 3]],
    tolerance: f64,
    label: i32,
    mode: FillMode,
    connectivity: Connectivity,
) -> Result<FloodOutput, SegmentationError> {
    if seeds.is_empty() {
        return Err(SegmentationError::NoSeedPoints);
    }
    if !(tolerance >= 0.0) {
        // 同时拦截负数和 NaN
        return Err(SegmentationError::InvalidTolerance(tolerance));
    }

    // 所有种子点先整体校验，任何一个越界都不开始计算
    let mut checked_seeds = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        checked_seeds.push(grid.checked_seed(seed)?);
    }

    match mode {
        FillMode::Connected => {
            let mut mask = LabelMask::zeros(grid.shape);
            for seed in checked_seeds {
                let region = flood_region(grid, seed, tolerance, connectivity);
                for (index, admitted) in region.iter().enumerate() {
                    if *admitted {
                        mask.data[index] += label;
                    }
                }
            }
            Ok(FloodOutput::Mask(mask))
        }
        FillMode::Replace { fill_value } => {
            // 每个种子的区域都基于原始体素网格计算，结果与种子顺序无关
            let mut output = grid.clone();
            for seed in checked_seeds {
                let region = flood_region(grid, seed, tolerance, connectivity);
                for (index, admitted) in region.iter().enumerate() {
                    if *admitted {
                        output.data[index] = fill_value;
                    }
                }
            }
            Ok(FloodOutput::Volume(output))
        }
    }
}

/// 单个种子点的连通填充，返回与网格同长度的命中标记
/// 基于栈的深度优先遍历，候选体素的判定条件是
/// |intensity(candidate) - intensity(seed)| <= tolerance
fn flood_region(
    grid: &VoxelGrid,
    seed: [usize; 3],
    tolerance: f64,
    connectivity: Connectivity,
) -> Vec<bool> {
    let seed_value = grid.value(seed);
    let offsets = connectivity.offsets();

    let mut region = vec![false; grid.len()];
    let seed_index = grid.index(seed);
    region[seed_index] = true;

    let mut stack = vec![seed_index];
    while let Some(index) = stack.pop() {
        let [i, j, k] = grid.coord(index);
        for offset in &offsets {
            let candidate = [
                i as i64 + offset[0],
                j as i64 + offset[1],
                k as i64 + offset[2],
            ];
            if !grid.contains(candidate) {
                continue;
            }
            let candidate_index = grid.index([
                candidate[0] as usize,
                candidate[1] as usize,
                candidate[2] as usize,
            ]);
            if region[candidate_index] {
                continue;
            }
            if (grid.data[candidate_index] - seed_value).abs() <= tolerance {
                region[candidate_index] = true;
                stack.push(candidate_index);
            }
        }
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_grid(shape: [usize; 3], value: f64) -> VoxelGrid {
        VoxelGrid::new(shape, vec![value; shape[0] * shape[1] * shape[2]]).unwrap()
    }

    fn line_grid(values: &[f64]) -> VoxelGrid {
        VoxelGrid::new([values.len(), 1, 1], values.to_vec()).unwrap()
    }

    fn mask_of(output: FloodOutput) -> LabelMask {
        match output {
            FloodOutput::Mask(mask) => mask,
            FloodOutput::Volume(_) => panic!("期望掩码输出"),
        }
    }

    #[test]
    fn test_uniform_volume_fills_completely() {
        let grid = uniform_grid([10, 10, 10], 100.0);
        let output = compute_region_mask(
            &grid,
            &[[5.0, 5.0, 5.0]],
            5.0,
            1,
            FillMode::Connected,
            Connectivity::Face6,
        )
        .unwrap();
        let mask = mask_of(output);
        assert_eq!(mask.admitted_count(), 1000);
        assert!(mask.data.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_single_seed_never_exceeds_tolerance() {
        let grid = line_grid(&[10.0, 12.0, 30.0, 11.0, 10.0]);
        let output = compute_region_mask(
            &grid,
            &[[0.0, 0.0, 0.0]],
            5.0,
            1,
            FillMode::Connected,
            Connectivity::Face6,
        )
        .unwrap();
        let mask = mask_of(output);
        let seed_value = 10.0;
        for (index, &label) in mask.data.iter().enumerate() {
            if label != 0 {
                assert!((grid.data[index] - seed_value).abs() <= 5.0);
            }
        }
        // 30.0 处的高强度壁垒挡住了另一侧
        assert_eq!(mask.data, vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_tolerance_is_seed_referenced_not_chained() {
        // 斜坡体素：每步相差 3，都在容差内，但相对种子点的总差会超出
        let grid = line_grid(&[0.0, 3.0, 6.0, 9.0, 12.0]);
        let output = compute_region_mask(
            &grid,
            &[[0.0, 0.0, 0.0]],
            5.0,
            1,
            FillMode::Connected,
            Connectivity::Face6,
        )
        .unwrap();
        let mask = mask_of(output);
        // 梯度链式判定会填满整条线，种子基准判定在 6.0 处截断
        assert_eq!(mask.data, vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_additive_composition_disjoint_seeds() {
        let grid = line_grid(&[0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 0.0]);
        let label = 3;
        let both = mask_of(
            compute_region_mask(
                &grid,
                &[[1.0, 0.0, 0.0], [5.0, 0.0, 0.0]],
                5.0,
                label,
                FillMode::Connected,
                Connectivity::Face6,
            )
            .unwrap(),
        );
        let left = mask_of(
            compute_region_mask(
                &grid,
                &[[1.0, 0.0, 0.0]],
                5.0,
                label,
                FillMode::Connected,
                Connectivity::Face6,
            )
            .unwrap(),
        );
        let right = mask_of(
            compute_region_mask(
                &grid,
                &[[5.0, 0.0, 0.0]],
                5.0,
                label,
                FillMode::Connected,
                Connectivity::Face6,
            )
            .unwrap(),
        );
        let summed: Vec<i32> = left
            .data
            .iter()
            .zip(&right.data)
            .map(|(a, b)| a + b)
            .collect();
        assert_eq!(both.data, summed);
    }

    #[test]
    fn test_overlap_composition_sums_labels() {
        let grid = uniform_grid([4, 1, 1], 50.0);
        let mask = mask_of(
            compute_region_mask(
                &grid,
                &[[0.0, 0.0, 0.0], [3.0, 0.0, 0.0]],
                5.0,
                2,
                FillMode::Connected,
                Connectivity::Face6,
            )
            .unwrap(),
        );
        // 两个种子的区域完全重叠，重叠处是标签之和而不是 max 或覆盖
        assert!(mask.data.iter().all(|&v| v == 4));
    }

    #[test]
    fn test_face6_blocks_diagonal_corner26_admits() {
        let mut data = vec![0.0; 8];
        let grid_shape = [2, 2, 2];
        // 对角体素 (0,0,0) 和 (1,1,0) 同强度，其余不同
        data[0] = 100.0;
        data[3] = 100.0; // index = 0*4 + 1*2 + 1
        let grid = VoxelGrid::new(grid_shape, data).unwrap();

        let face = mask_of(
            compute_region_mask(
                &grid,
                &[[0.0, 0.0, 0.0]],
                1.0,
                1,
                FillMode::Connected,
                Connectivity::Face6,
            )
            .unwrap(),
        );
        assert_eq!(face.admitted_count(), 1);

        let corner = mask_of(
            compute_region_mask(
                &grid,
                &[[0.0, 0.0, 0.0]],
                1.0,
                1,
                FillMode::Connected,
                Connectivity::Corner26,
            )
            .unwrap(),
        );
        assert_eq!(corner.admitted_count(), 2);
        assert_eq!(corner.data[3], 1);
    }

    #[test]
    fn test_replace_mode_rewrites_region_in_copy() {
        let grid = line_grid(&[10.0, 10.0, 0.0, 10.0, 10.0]);
        let output = compute_region_mask(
            &grid,
            &[[0.0, 0.0, 0.0]],
            1.0,
            1,
            FillMode::Replace { fill_value: 99.0 },
            Connectivity::Face6,
        )
        .unwrap();
        let volume = match output {
            FloodOutput::Volume(v) => v,
            FloodOutput::Mask(_) => panic!("期望体素网格输出"),
        };
        assert_eq!(volume.data, vec![99.0, 99.0, 0.0, 10.0, 10.0]);
        // 输入网格保持不变
        assert_eq!(grid.data, vec![10.0, 10.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_replace_mode_multi_seed_uses_original_intensities() {
        let grid = line_grid(&[10.0, 0.0, 20.0]);
        // 第一个种子填充后的值 (20.0) 恰好等于第二个种子的强度，
        // 若链式使用改写后的网格，结果会随种子顺序变化
        let output = compute_region_mask(
            &grid,
            &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            1.0,
            1,
            FillMode::Replace { fill_value: 20.0 },
            Connectivity::Face6,
        )
        .unwrap();
        let volume = match output {
            FloodOutput::Volume(v) => v,
            FloodOutput::Mask(_) => panic!("期望体素网格输出"),
        };
        assert_eq!(volume.data, vec![20.0, 0.0, 20.0]);
    }

    #[test]
    fn test_empty_seed_list_fails() {
        let grid = uniform_grid([2, 2, 2], 0.0);
        let err = compute_region_mask(
            &grid,
            &[],
            5.0,
            1,
            FillMode::Connected,
            Connectivity::Face6,
        )
        .unwrap_err();
        assert_eq!(err, SegmentationError::NoSeedPoints);
    }

    #[test]
    fn test_negative_tolerance_fails() {
        let grid = uniform_grid([2, 2, 2], 0.0);
        let err = compute_region_mask(
            &grid,
            &[[0.0, 0.0, 0.0]],
            -1.0,
            1,
            FillMode::Connected,
            Connectivity::Face6,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidTolerance");
    }

    #[test]
    fn test_out_of_bounds_seed_fails_before_computing() {
        let grid = uniform_grid([2, 2, 2], 0.0);
        let err = compute_region_mask(
            &grid,
            &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            5.0,
            1,
            FillMode::Connected,
            Connectivity::Face6,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "OutOfBoundsSeed");
    }
}
