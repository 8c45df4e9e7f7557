use std::path::Path;

use ndarray::Array2;
use ndarray_npy::read_npy;

use crate::error::Error;
use crate::loader::FormatParser;
use crate::matrix::Matrix2D;

/// 预计算好的稠密特征解析器（.npy），一行一条特征
pub struct NpyParser;

impl FormatParser for NpyParser {
    fn extensions(&self) -> &[&str] {
        &["npy"]
    }

    fn parse(&self, path: &Path) -> Result<Option<Matrix2D>, Error> {
        let arr: Array2<f32> = read_npy(path)
            .map_err(|e| Error::Format { path: path.to_path_buf(), reason: e.to_string() })?;
        if arr.nrows() == 0 {
            return Ok(None);
        }

        let mut matrix = Matrix2D::new(arr.ncols());
        for row in arr.rows() {
            matrix.push(&row.to_vec())?;
        }
        Ok(Some(matrix))
    }
}
