use crate::utils::voxel_grid::VoxelGrid;

/// 体素网格解析器 trait，体积图像加载的统一入口
/// 分割核心不关心文件格式，新格式只需要实现这个 trait 并注册
pub trait VoxelGridParser: Send + Sync {
    /// 支持的文件扩展名（不含点号），例如: "vasp"
    fn supported_extensions(&self) -> Vec<&'static str>;

    /// 判断扩展名是否被本解析器支持
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// 只读取元数据，快速返回网格 shape
    /// 洪水填充在启动后台计算之前用它校验种子点越界
    fn get_shape_from_file(
        &self,
        file_path: &str,
    ) -> Result<[usize; 3], Box<dyn std::error::Error>>;

    /// 完整解析文件为体素网格
    fn parse_from_file(&self, file_path: &str) -> Result<VoxelGrid, Box<dyn std::error::Error>>;

    /// 解析器名称，用于日志和错误信息
    fn name(&self) -> &'static str;
}
