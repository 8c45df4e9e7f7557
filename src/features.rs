use ndarray::{Array2, ArrayView2, s};

use crate::error::Error;

/// 特征集：所有组的特征按顺序拼接成一个扁平矩阵
///
/// gallery 和 probe 都用这个结构表示，不变式：
/// `group_sizes.iter().sum() == matrix.nrows()`，组顺序与输入文件顺序一致
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// 拼接后的特征矩阵，每行一条特征
    pub matrix: Array2<f32>,
    /// 每组的特征数量
    pub group_sizes: Vec<usize>,
    /// 每组来源文件名
    pub identifiers: Vec<String>,
}

impl FeatureSet {
    pub fn new(
        matrix: Array2<f32>,
        group_sizes: Vec<usize>,
        identifiers: Vec<String>,
    ) -> Result<Self, Error> {
        let set = Self { matrix, group_sizes, identifiers };
        set.verify()?;
        Ok(set)
    }

    /// 校验行数不变式，不满足时视为缓存损坏
    pub fn verify(&self) -> Result<(), Error> {
        if self.group_sizes.len() != self.identifiers.len() {
            return Err(Error::CacheCorruption(format!(
                "{} group(s) but {} identifier(s)",
                self.group_sizes.len(),
                self.identifiers.len()
            )));
        }
        if let Some(g) = self.group_sizes.iter().position(|&s| s == 0) {
            return Err(Error::CacheCorruption(format!("group {g} is empty")));
        }
        let total: usize = self.group_sizes.iter().sum();
        if total != self.matrix.nrows() {
            return Err(Error::CacheCorruption(format!(
                "group sizes sum to {total} but matrix has {} row(s)",
                self.matrix.nrows()
            )));
        }
        Ok(())
    }

    /// 特征总数
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    /// 特征维数
    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn num_groups(&self) -> usize {
        self.group_sizes.len()
    }

    /// 每组的起始行号，最后一项为总行数
    pub fn offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.group_sizes.len() + 1);
        let mut acc = 0;
        offsets.push(0);
        for &size in &self.group_sizes {
            acc += size;
            offsets.push(acc);
        }
        offsets
    }

    /// 行号到所属组号的映射表
    pub fn group_of_index(&self) -> Vec<usize> {
        let mut table = Vec::with_capacity(self.len());
        for (g, &size) in self.group_sizes.iter().enumerate() {
            table.extend(std::iter::repeat_n(g, size));
        }
        table
    }

    /// 第 g 组的特征行
    pub fn group(&self, g: usize) -> ArrayView2<'_, f32> {
        let offsets = self.offsets();
        self.matrix.slice(s![offsets[g]..offsets[g + 1], ..])
    }
}
