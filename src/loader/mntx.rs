use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::loader::FormatParser;
use crate::matrix::Matrix2D;

/// 细节点描述符的维数（z1 到 z128）
pub const DESCRIPTOR_DIM: usize = 128;

/// 细节点模板文本解析器（.mntx / .tpt）
///
/// 第二行为头部：`特征数量 v1 v2 v3`，之后每行一条记录：
/// `x y theta score z1..z128`，z 值整体归一化为单位 L2 长度
pub struct MntxParser;

impl FormatParser for MntxParser {
    fn extensions(&self) -> &[&str] {
        &["mntx", "tpt"]
    }

    fn parse(&self, path: &Path) -> Result<Option<Matrix2D>, Error> {
        let content = fs::read_to_string(path)?;
        let mut lines = content.lines();

        lines.next().ok_or_else(|| malformed(path, "missing first line"))?;
        let header = lines.next().ok_or_else(|| malformed(path, "missing header line"))?;

        let mut fields = header.split_whitespace();
        let feature_num: usize = fields
            .next()
            .ok_or_else(|| malformed(path, "empty header line"))?
            .parse()
            .map_err(|_| malformed(path, "feature count is not an integer"))?;
        if feature_num == 0 {
            return Ok(None);
        }
        for _ in 0..3 {
            fields
                .next()
                .ok_or_else(|| malformed(path, "header is missing global values"))?
                .parse::<f64>()
                .map_err(|_| malformed(path, "header global value is not a number"))?;
        }

        let mut matrix = Matrix2D::new(DESCRIPTOR_DIM);
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 + DESCRIPTOR_DIM {
                return Err(malformed(
                    path,
                    &format!("expected {} columns, got {}", 4 + DESCRIPTOR_DIM, parts.len()),
                ));
            }

            // 前四列 x y theta score 不参与检索
            let mut z = [0f32; DESCRIPTOR_DIM];
            for (value, field) in z.iter_mut().zip(&parts[4..4 + DESCRIPTOR_DIM]) {
                *value = field
                    .parse::<i64>()
                    .map_err(|_| malformed(path, &format!("invalid z value {field:?}")))?
                    as f32;
            }

            let norm = z.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0. {
                for v in &mut z {
                    *v /= norm;
                }
            }
            matrix.push(&z)?;
        }

        if matrix.is_empty() {
            return Err(malformed(path, "header promises features but file has no records"));
        }
        Ok(Some(matrix))
    }
}

fn malformed(path: &Path, reason: &str) -> Error {
    Error::Format { path: path.to_path_buf(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn record(seed: i64) -> String {
        let z: Vec<String> =
            (0..DESCRIPTOR_DIM as i64).map(|i| ((seed + i) % 7 + 1).to_string()).collect();
        format!("10 20 0.5 0.9 {}", z.join(" "))
    }

    fn write_tpt(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".tpt").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_records_with_unit_norm() {
        let content = format!("header\n2 0.1 0.2 0.3\n{}\n{}\n", record(1), record(2));
        let file = write_tpt(&content);

        let matrix = MntxParser.parse(file.path()).unwrap().unwrap();
        assert_eq!(matrix.height(), 2);
        assert_eq!(matrix.width(), DESCRIPTOR_DIM);

        for n in 0..matrix.height() {
            let norm: f32 = matrix.line(n).iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_features_yields_none() {
        let file = write_tpt("header\n0 0.1 0.2 0.3\n");
        assert!(MntxParser.parse(file.path()).unwrap().is_none());
    }

    #[test]
    fn truncated_record_is_format_error() {
        let content = "header\n1 0.1 0.2 0.3\n10 20 0.5 0.9 1 2 3\n";
        let file = write_tpt(content);
        assert!(matches!(MntxParser.parse(file.path()), Err(Error::Format { .. })));
    }

    #[test]
    fn missing_header_is_format_error() {
        let file = write_tpt("header\n");
        assert!(matches!(MntxParser.parse(file.path()), Err(Error::Format { .. })));
    }
}
