use ndarray::{Array1, Array2, ArrayView1, Axis, s};

/// 标准差低于该值的维度视为退化维度，按 1.0 处理，
/// 使该维度对距离的贡献退化为与均值的原始偏移
pub const STD_EPSILON: f32 = 1e-6;

/// 每组特征的均值与总体标准差（除数为组大小，不是组大小减一）
///
/// 查询向量在与第 g 组比较前要先用该组的统计量平移，
/// 这也是逐组顺序搜索无法复用单一全局索引的原因
#[derive(Debug, Clone)]
pub struct GroupStats {
    /// (组数, 维数)
    mean: Array2<f32>,
    std: Array2<f32>,
}

impl GroupStats {
    /// 逐组统计均值和标准差
    pub fn fit(matrix: &Array2<f32>, group_sizes: &[usize]) -> Self {
        let d = matrix.ncols();
        let mut mean = Array2::zeros((group_sizes.len(), d));
        let mut std = Array2::ones((group_sizes.len(), d));

        let mut acc = 0;
        for (g, &size) in group_sizes.iter().enumerate() {
            let rows = matrix.slice(s![acc..acc + size, ..]);
            let m = rows.mean_axis(Axis(0)).unwrap();

            let mut var = Array1::<f32>::zeros(d);
            for row in rows.rows() {
                let diff = &row - &m;
                var += &(&diff * &diff);
            }
            let s = var.mapv(|v| {
                let s = (v / size as f32).sqrt();
                if s < STD_EPSILON { 1.0 } else { s }
            });

            mean.row_mut(g).assign(&m);
            std.row_mut(g).assign(&s);
            acc += size;
        }

        Self { mean, std }
    }

    /// 就地对 gallery 矩阵做组内标准化：`(v - mean_g) / std_g`
    pub fn apply(&self, matrix: &mut Array2<f32>, group_sizes: &[usize]) {
        let mut acc = 0;
        for (g, &size) in group_sizes.iter().enumerate() {
            let mut rows = matrix.slice_mut(s![acc..acc + size, ..]);
            rows -= &self.mean.row(g);
            rows /= &self.std.row(g);
            acc += size;
        }
    }

    /// 用第 g 组的统计量平移查询向量
    pub fn shift_query(&self, query: ArrayView1<f32>, g: usize) -> Array1<f32> {
        (&query - &self.mean.row(g)) / &self.std.row(g)
    }

    pub fn num_groups(&self) -> usize {
        self.mean.nrows()
    }

    pub fn mean(&self, g: usize) -> ArrayView1<'_, f32> {
        self.mean.row(g)
    }

    pub fn std(&self, g: usize) -> ArrayView1<'_, f32> {
        self.std.row(g)
    }
}
