use crate::utils::parser::VoxelGridParser;
use crate::utils::voxel_grid::VoxelGrid;
use std::fs::File;
use std::io::{BufRead, BufReader, Error, ErrorKind};

/// VASP 电荷密度文件的 shape 信息所在行号（0-indexed）
const SHAPE_LINE_INDEX: usize = 28;

/// VASP 文件格式解析器
/// 文本格式，第 29 行是三个维度，之后是空白分隔的浮点数据
pub struct VaspParser;

impl VaspParser {
    pub fn new() -> Self {
        VaspParser
    }

    /// 解析 shape 行: "112  112  108"
    fn parse_shape_line(line: &str) -> Result<[usize; 3], Box<dyn std::error::Error>> {
        let shape: Vec<usize> = line
            .split_whitespace()
            .map(|s| s.parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|e| Error::new(ErrorKind::InvalidData, format!("无法解析shape: {}", e)))?;

        if shape.len() != 3 {
            return Err(Box::new(Error::new(
                ErrorKind::InvalidData,
                format!("shape应该包含3个维度，但得到{}个", shape.len()),
            )));
        }

        Ok([shape[0], shape[1], shape[2]])
    }
}

impl VoxelGridParser for VaspParser {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["vasp"]
    }

    fn name(&self) -> &'static str {
        "VASP Parser"
    }

    fn get_shape_from_file(
        &self,
        file_path: &str,
    ) -> Result<[usize; 3], Box<dyn std::error::Error>> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);

        // 只读到 shape 行为止，不加载数据部分
        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            if line_index == SHAPE_LINE_INDEX {
                return Self::parse_shape_line(&line);
            }
        }

        Err(Box::new(Error::new(
            ErrorKind::InvalidData,
            "文件行数不足，无法读取shape信息",
        )))
    }

    fn parse_from_file(&self, file_path: &str) -> Result<VoxelGrid, Box<dyn std::error::Error>> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);

        let mut shape: Option<[usize; 3]> = None;
        let mut data = Vec::new();

        // 流式逐行解析，避免把整个文件先收集成 Vec<String>
        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;

            if line_index < SHAPE_LINE_INDEX {
                continue;
            }
            if line_index == SHAPE_LINE_INDEX {
                let parsed = Self::parse_shape_line(&line)?;
                data.reserve(parsed[0] * parsed[1] * parsed[2]);
                shape = Some(parsed);
                continue;
            }

            // 数据行：空白分隔的浮点数，支持科学计数法（如 0.14631837E+00）
            for token in line.split_whitespace() {
                match token.parse::<f64>() {
                    Ok(value) => data.push(value),
                    Err(_) => {
                        if !token.trim().is_empty() {
                            eprintln!("警告: 无法解析值 '{}'，已跳过", token);
                        }
                    }
                }
            }
        }

        let Some(shape) = shape else {
            return Err(Box::new(Error::new(
                ErrorKind::InvalidData,
                "文件行数不足，无法读取shape信息",
            )));
        };

        VoxelGrid::new(shape, data).map_err(|e| {
            Box::new(Error::new(ErrorKind::InvalidData, e)) as Box<dyn std::error::Error>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shape_line() {
        assert_eq!(
            VaspParser::parse_shape_line("112  112  108").unwrap(),
            [112, 112, 108]
        );
        assert!(VaspParser::parse_shape_line("112 112").is_err());
        assert!(VaspParser::parse_shape_line("a b c").is_err());
    }

    #[test]
    fn test_supports_is_case_insensitive() {
        let parser = VaspParser::new();
        assert!(parser.supports("vasp"));
        assert!(parser.supports("VASP"));
        assert!(!parser.supports("raw"));
    }
}
