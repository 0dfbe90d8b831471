use std::fmt;

/// 分割核心层的错误类型
/// 所有错误都通过 Result 返回给调用方，由调用方决定如何呈现
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationError {
    /// 种子点（四舍五入后）超出体素网格范围
    OutOfBoundsSeed { seed: [i64; 3], shape: [usize; 3] },

    /// 种子点列表为空
    NoSeedPoints,

    /// 容差非法（负数或 NaN）
    InvalidTolerance(f64),

    /// 状态机状态非法，例如对不存在的生长任务调用 advance
    InvalidState(String),
}

impl SegmentationError {
    /// 稳定的错误类别标识，用于 HTTP 响应中的机器可读字段
    pub fn kind(&self) -> &'static str {
        match self {
            SegmentationError::OutOfBoundsSeed { .. } => "OutOfBoundsSeed",
            SegmentationError::NoSeedPoints => "NoSeedPoints",
            SegmentationError::InvalidTolerance(_) => "InvalidTolerance",
            SegmentationError::InvalidState(_) => "InvalidState",
        }
    }
}

impl fmt::Display for SegmentationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentationError::OutOfBoundsSeed { seed, shape } => {
                write!(f, "种子点 {:?} 超出网格范围 {:?}", seed, shape)
            }
            SegmentationError::NoSeedPoints => {
                write!(f, "种子点列表为空，至少需要一个种子点")
            }
            SegmentationError::InvalidTolerance(t) => {
                write!(f, "容差非法: {}，容差必须是非负数", t)
            }
            SegmentationError::InvalidState(msg) => {
                write!(f, "状态非法: {}", msg)
            }
        }
    }
}

impl std::error::Error for SegmentationError {}
