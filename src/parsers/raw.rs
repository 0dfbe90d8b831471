use crate::utils::parser::VoxelGridParser;
use crate::utils::voxel_grid::VoxelGrid;
use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Error, ErrorKind};

/// 原始二进制体素文件解析器
/// 文件头是 3 个小端 u32（nx, ny, nz），随后是 nx*ny*nz 个小端 f64，
/// 按 C 语言顺序排列（x 变化最快）
pub struct RawParser;

impl RawParser {
    pub fn new() -> Self {
        RawParser
    }

    fn read_header(reader: &mut impl ReadBytesExt) -> Result<[usize; 3], Box<dyn std::error::Error>> {
        let nx = reader.read_u32::<LittleEndian>()? as usize;
        let ny = reader.read_u32::<LittleEndian>()? as usize;
        let nz = reader.read_u32::<LittleEndian>()? as usize;

        if nx == 0 || ny == 0 || nz == 0 {
            return Err(Box::new(Error::new(
                ErrorKind::InvalidData,
                format!("文件头中的维度非法: [{}, {}, {}]", nx, ny, nz),
            )));
        }

        Ok([nx, ny, nz])
    }
}

impl VoxelGridParser for RawParser {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["raw"]
    }

    fn name(&self) -> &'static str {
        "Raw Parser"
    }

    fn get_shape_from_file(
        &self,
        file_path: &str,
    ) -> Result<[usize; 3], Box<dyn std::error::Error>> {
        let file = File::open(file_path)?;
        let mut reader = BufReader::new(file);
        Self::read_header(&mut reader)
    }

    fn parse_from_file(&self, file_path: &str) -> Result<VoxelGrid, Box<dyn std::error::Error>> {
        let file = File::open(file_path)?;
        let mut reader = BufReader::new(file);

        let shape = Self::read_header(&mut reader)?;
        let total_elements = shape[0] * shape[1] * shape[2];

        let mut data = Vec::with_capacity(total_elements);
        for _ in 0..total_elements {
            // 数据不足时这里会返回 UnexpectedEof，作为加载错误上抛
            let value = reader.read_f64::<LittleEndian>().map_err(|e| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("数据段不完整，期望 {} 个元素: {}", total_elements, e),
                )
            })?;
            data.push(value);
        }

        VoxelGrid::new(shape, data).map_err(|e| {
            Box::new(Error::new(ErrorKind::InvalidData, e)) as Box<dyn std::error::Error>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn encode(shape: [u32; 3], values: &[f64]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for dim in shape {
            bytes.write_u32::<LittleEndian>(dim).unwrap();
        }
        for &value in values {
            bytes.write_f64::<LittleEndian>(value).unwrap();
        }
        bytes
    }

    #[test]
    fn test_read_header() {
        let bytes = encode([2, 3, 4], &[]);
        let mut cursor = Cursor::new(bytes);
        assert_eq!(RawParser::read_header(&mut cursor).unwrap(), [2, 3, 4]);
    }

    #[test]
    fn test_read_header_rejects_zero_dimension() {
        let bytes = encode([2, 0, 4], &[]);
        let mut cursor = Cursor::new(bytes);
        assert!(RawParser::read_header(&mut cursor).is_err());
    }

    #[test]
    fn test_parse_roundtrip_through_temp_file() {
        let values: Vec<f64> = (0..8).map(|v| v as f64 * 0.5).collect();
        let bytes = encode([2, 2, 2], &values);
        let path = std::env::temp_dir().join("regionseg_raw_parser_test.raw");
        std::fs::write(&path, bytes).unwrap();

        let parser = RawParser::new();
        assert_eq!(parser.get_shape_from_file(path.to_str().unwrap()).unwrap(), [2, 2, 2]);
        let grid = parser.parse_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(grid.shape, [2, 2, 2]);
        assert_eq!(grid.data, values);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_truncated_payload_is_load_error() {
        let values = [1.0, 2.0, 3.0];
        // 头部声称 8 个元素，实际只有 3 个
        let bytes = encode([2, 2, 2], &values);
        let path = std::env::temp_dir().join("regionseg_raw_parser_truncated.raw");
        std::fs::write(&path, bytes).unwrap();

        let parser = RawParser::new();
        assert!(parser.parse_from_file(path.to_str().unwrap()).is_err());

        std::fs::remove_file(&path).ok();
    }
}
