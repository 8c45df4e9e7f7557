use ndarray::Array2;

use crate::error::Error;

/// 按行累积的二维 f32 矩阵，所有行宽度一致
#[derive(Debug, Clone, Default)]
pub struct Matrix2D {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Matrix2D {
    pub fn new(width: usize) -> Self {
        Self { width, height: 0, data: vec![] }
    }

    /// 追加一行，宽度不一致时报 DimensionMismatch
    pub fn push(&mut self, v: &[f32]) -> Result<(), Error> {
        if v.len() != self.width {
            return Err(Error::DimensionMismatch { expected: self.width, actual: v.len() });
        }
        self.height += 1;
        self.data.extend_from_slice(v);
        Ok(())
    }

    /// 追加另一个矩阵的所有行
    pub fn extend(&mut self, other: &Matrix2D) -> Result<(), Error> {
        if other.width != self.width {
            return Err(Error::DimensionMismatch { expected: self.width, actual: other.width });
        }
        self.height += other.height;
        self.data.extend_from_slice(&other.data);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn line(&self, n: usize) -> &[f32] {
        &self.data[n * self.width..(n + 1) * self.width]
    }

    pub fn into_array(self) -> Array2<f32> {
        Array2::from_shape_vec((self.height, self.width), self.data).unwrap()
    }
}
