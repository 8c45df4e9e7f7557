use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// 单条查询的最近邻结果，按 (距离, 行号) 升序排列，长度不超过 k
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// gallery 扁平矩阵中的行号
    pub indices: Vec<usize>,
    /// 对应的平方欧氏距离
    pub distances: Vec<f32>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// 两个向量的平方欧氏距离，两边长度必须一致
pub fn squared_l2(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// 从距离数组中选出最小的 k 项
///
/// 距离相同时行号小者在前，保证结果确定；k 超过数组长度时返回全部
pub fn top_k(distances: &[f32], k: usize) -> SearchResult {
    let k = k.min(distances.len());
    if k == 0 {
        return SearchResult::default();
    }

    let cmp = |&a: &usize, &b: &usize| {
        distances[a].total_cmp(&distances[b]).then(a.cmp(&b))
    };

    let mut order: Vec<usize> = (0..distances.len()).collect();
    if k < order.len() {
        order.select_nth_unstable_by(k - 1, cmp);
        order.truncate(k);
    }
    order.sort_unstable_by(cmp);

    let dist = order.iter().map(|&i| distances[i]).collect();
    SearchResult { indices: order, distances: dist }
}

/// 计算 query 与 base 每一行的平方 L2 距离并返回前 k 个
pub fn knn_l2(query: ArrayView1<f32>, base: ArrayView2<f32>, k: usize) -> SearchResult {
    let distances: Vec<f32> =
        base.rows().into_iter().map(|row| squared_l2(query, row)).collect();
    top_k(&distances, k)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    #[test]
    fn test_squared_l2() {
        let a = array![1., 2., 3.];
        let b = array![1., 2., 3.];
        assert_eq!(squared_l2(a.view(), b.view()), 0.);

        let c = array![2., 4., 3.];
        assert_eq!(squared_l2(a.view(), c.view()), 5.);
    }

    #[test]
    #[should_panic]
    fn squared_l2_rejects_mismatched_lengths() {
        let a = array![1., 2., 3.];
        let b = array![1., 2.];
        squared_l2(a.view(), b.view());
    }

    #[test]
    fn test_top_k_ordering() {
        let result = top_k(&[3., 0., 2., 1.], 3);
        assert_eq!(result.indices, &[1, 3, 2]);
        assert_eq!(result.distances, &[0., 1., 2.]);
    }

    #[test]
    fn test_top_k_ties_by_index() {
        let result = top_k(&[1., 0., 1., 0.], 3);
        assert_eq!(result.indices, &[1, 3, 0]);
        assert_eq!(result.distances, &[0., 0., 1.]);
    }

    #[test]
    fn test_top_k_k_exceeds_len() {
        let result = top_k(&[2., 1.], 5);
        assert_eq!(result.indices, &[1, 0]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_knn_l2_exact_match() {
        // 组大小 [2, 3, 1]，维数 4，第 3 行与查询相同
        let base = Array2::from_shape_vec(
            (6, 4),
            vec![
                0., 0., 0., 0., //
                1., 1., 1., 1., //
                2., 2., 2., 2., //
                5., 6., 7., 8., //
                3., 3., 3., 3., //
                9., 9., 9., 9., //
            ],
        )
        .unwrap();
        let query = array![5., 6., 7., 8.];

        let result = knn_l2(query.view(), base.view(), 1);
        assert_eq!(result.indices, &[3]);
        assert_eq!(result.distances, &[0.]);
    }

    #[test]
    fn test_knn_l2_deterministic() {
        let base = Array2::from_shape_vec((4, 2), vec![0., 0., 1., 1., 0., 0., 2., 2.]).unwrap();
        let query = array![0., 0.];

        let a = knn_l2(query.view(), base.view(), 3);
        let b = knn_l2(query.view(), base.view(), 3);
        assert_eq!(a, b);
        // 距离相同的 0 号和 2 号行按行号排序
        assert_eq!(a.indices, &[0, 2, 1]);
    }
}
