/// 球体光栅化：返回半径 radius 的实心球内所有整数偏移 [dr, dc, dz]
/// 逐步生长算法把这些偏移平移到种子点得到候选体素
/// 判定标准: dr² + dc² + dz² <= radius²，确定性遍历顺序，关于原点对称
pub fn ball_offsets(radius: f64) -> Vec<[i64; 3]> {
    let r = radius.floor() as i64;
    let r2 = radius * radius;
    let mut offsets = Vec::new();

    for dz in -r..=r {
        for dc in -r..=r {
            for dr in -r..=r {
                let dist2 = (dr * dr + dc * dc + dz * dz) as f64;
                if dist2 <= r2 {
                    offsets.push([dr, dc, dz]);
                }
            }
        }
    }

    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_zero_is_center_only() {
        assert_eq!(ball_offsets(0.0), vec![[0, 0, 0]]);
    }

    #[test]
    fn test_radius_one_is_center_plus_faces() {
        // 中心 1 个 + 6 个面邻居
        assert_eq!(ball_offsets(1.0).len(), 7);
    }

    #[test]
    fn test_radius_two_count() {
        // dist² <= 4: 1 + 6 + 12 + 8 + 6 = 33
        assert_eq!(ball_offsets(2.0).len(), 33);
    }

    #[test]
    fn test_symmetric_under_negation() {
        let offsets = ball_offsets(3.0);
        for &[dr, dc, dz] in &offsets {
            assert!(offsets.contains(&[-dr, -dc, -dz]));
        }
    }

    #[test]
    fn test_all_offsets_within_radius() {
        let radius = 4.0;
        for &[dr, dc, dz] in &ball_offsets(radius) {
            let dist2 = (dr * dr + dc * dc + dz * dz) as f64;
            assert!(dist2 <= radius * radius);
        }
    }
}
