use ndarray::{Array2, ArrayView1, ArrayView2, s};
use rayon::prelude::*;

use crate::features::FeatureSet;
use crate::knn::{SearchResult, knn_l2, squared_l2, top_k};
use crate::shift::GroupStats;

/// 最近邻搜索的统一接口，距离为平方欧氏距离
///
/// 对固定的输入和 k，结果保证确定；gallery 小于 k 时返回全部，不报错
pub trait Searcher: Sync {
    /// 返回 query 在 gallery 中的 k 个最近邻
    fn search(&self, query: ArrayView1<f32>, k: usize) -> SearchResult;
    /// gallery 向量总数
    fn ntotal(&self) -> usize;
}

/// 平面索引：构建一次，之后所有查询共用
///
/// 精确的 top-k，充当外部索引实现的参考；更聪明的索引
/// 只要满足同样的契约就能替换掉它
pub struct FlatSearcher {
    matrix: Array2<f32>,
}

impl FlatSearcher {
    pub fn new(matrix: Array2<f32>) -> Self {
        Self { matrix }
    }
}

impl Searcher for FlatSearcher {
    fn search(&self, query: ArrayView1<f32>, k: usize) -> SearchResult {
        knn_l2(query, self.matrix.view(), k)
    }

    fn ntotal(&self) -> usize {
        self.matrix.nrows()
    }
}

/// 逐组平移的顺序搜索
///
/// 查询在与第 g 组比较前先用该组的统计量平移，距离写进一个
/// 横跨整个 gallery 的数组（行号跨组保持不变），最后取前 k 个。
/// 每条查询 O(N·d)，但标准化以组为条件时没有可共用的全局索引
pub struct ShiftSearcher {
    /// 已做组内标准化的 gallery 矩阵
    matrix: Array2<f32>,
    group_sizes: Vec<usize>,
    stats: GroupStats,
}

impl ShiftSearcher {
    /// 拟合各组统计量并标准化 gallery
    pub fn new(set: &FeatureSet) -> Self {
        let stats = GroupStats::fit(&set.matrix, &set.group_sizes);
        let mut matrix = set.matrix.clone();
        stats.apply(&mut matrix, &set.group_sizes);
        Self { matrix, group_sizes: set.group_sizes.clone(), stats }
    }

    pub fn stats(&self) -> &GroupStats {
        &self.stats
    }
}

impl Searcher for ShiftSearcher {
    fn search(&self, query: ArrayView1<f32>, k: usize) -> SearchResult {
        let mut distances = vec![0f32; self.matrix.nrows()];
        let mut acc = 0;
        for (g, &size) in self.group_sizes.iter().enumerate() {
            let shifted = self.stats.shift_query(query, g);
            let rows = self.matrix.slice(s![acc..acc + size, ..]);
            for (i, row) in rows.rows().into_iter().enumerate() {
                distances[acc + i] = squared_l2(shifted.view(), row);
            }
            acc += size;
        }
        top_k(&distances, k)
    }

    fn ntotal(&self) -> usize {
        self.matrix.nrows()
    }
}

/// 并行检索一组查询向量，每条查询写入自己的结果槽
pub fn search_batch(
    searcher: &dyn Searcher,
    queries: ArrayView2<f32>,
    k: usize,
) -> Vec<SearchResult> {
    (0..queries.nrows())
        .into_par_iter()
        .map(|i| searcher.search(queries.row(i), k))
        .collect()
}
