use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::features::FeatureSet;

/// 缓存元数据，与同名 .npy 矩阵成对出现
///
/// digest 是矩阵内容的 blake3 摘要，加载时校验，
/// 防止两次重命名之间崩溃留下的新矩阵配旧元数据
#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    dim: usize,
    rows: usize,
    digest: String,
    group_sizes: Vec<usize>,
    identifiers: Vec<String>,
}

fn matrix_digest(matrix: &Array2<f32>) -> String {
    let mut hasher = blake3::Hasher::new();
    for v in matrix.iter() {
        hasher.update(&v.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// 特征缓存：`<name>.json` 存组大小和文件名，`<name>.npy` 存拼接矩阵
///
/// 两个文件都先写临时文件再原子重命名，崩溃不会留下不配对的缓存
pub struct FeatureCache {
    dir: PathBuf,
}

impl FeatureCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn matrix_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.npy"))
    }

    /// 检索结果文件的默认路径
    pub fn results_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}_results.json"))
    }

    /// 尝试加载缓存
    ///
    /// 缓存不存在时返回 `Ok(None)`；元数据与矩阵不一致、
    /// 或维数与 `expected_dim` 不符时报 CacheCorruption
    pub fn load(
        &self,
        name: &str,
        expected_dim: Option<usize>,
    ) -> Result<Option<FeatureSet>, Error> {
        let meta_path = self.meta_path(name);
        let matrix_path = self.matrix_path(name);
        if !meta_path.exists() || !matrix_path.exists() {
            return Ok(None);
        }

        debug!("loading cache {name} from {}", self.dir.display());
        let meta: CacheMeta = serde_json::from_slice(&fs::read(&meta_path)?)
            .map_err(|e| Error::CacheCorruption(format!("{}: {e}", meta_path.display())))?;
        let matrix: Array2<f32> = read_npy(&matrix_path)
            .map_err(|e| Error::CacheCorruption(format!("{}: {e}", matrix_path.display())))?;

        if matrix.ncols() != meta.dim {
            return Err(Error::CacheCorruption(format!(
                "cache {name} metadata says dim {} but matrix has {} column(s)",
                meta.dim,
                matrix.ncols()
            )));
        }
        if matrix.nrows() != meta.rows || matrix_digest(&matrix) != meta.digest {
            return Err(Error::CacheCorruption(format!(
                "cache {name} metadata does not match matrix content"
            )));
        }
        if let Some(dim) = expected_dim
            && dim != meta.dim
        {
            return Err(Error::CacheCorruption(format!(
                "cache {name} has dim {} but {dim} was expected",
                meta.dim
            )));
        }

        let set = FeatureSet::new(matrix, meta.group_sizes, meta.identifiers)?;
        Ok(Some(set))
    }

    /// 写缓存：矩阵先落盘，元数据最后重命名
    pub fn save(&self, name: &str, set: &FeatureSet) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)?;

        let matrix_path = self.matrix_path(name);
        let matrix_tmp = matrix_path.with_extension("npy.tmp");
        write_npy(&matrix_tmp, &set.matrix).map_err(|e| Error::Io(std::io::Error::other(e)))?;
        fs::rename(&matrix_tmp, &matrix_path)?;

        let meta = CacheMeta {
            dim: set.dim(),
            rows: set.len(),
            digest: matrix_digest(&set.matrix),
            group_sizes: set.group_sizes.clone(),
            identifiers: set.identifiers.clone(),
        };
        let meta_path = self.meta_path(name);
        let meta_tmp = meta_path.with_extension("json.tmp");
        fs::write(&meta_tmp, serde_json::to_vec(&meta).map_err(std::io::Error::other)?)?;
        fs::rename(&meta_tmp, &meta_path)?;

        debug!("cache {name} saved to {}", self.dir.display());
        Ok(())
    }
}
