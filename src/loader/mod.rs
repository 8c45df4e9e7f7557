mod mntx;
mod npy;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use log::{info, warn};
use walkdir::WalkDir;

pub use mntx::{DESCRIPTOR_DIM, MntxParser};
pub use npy::NpyParser;

use crate::cache::FeatureCache;
use crate::error::Error;
use crate::features::FeatureSet;
use crate::matrix::Matrix2D;
use crate::utils::{format_time, pb_style};

/// 特征文件解析器：一个文件解析出一组特征向量
///
/// 返回 `Ok(None)` 表示文件里没有任何特征，调用方会跳过该文件
pub trait FormatParser: Sync {
    /// 解析器负责的扩展名
    fn extensions(&self) -> &[&str];
    /// 解析单个文件
    fn parse(&self, path: &Path) -> Result<Option<Matrix2D>, Error>;
}

/// 解析器注册表，按扩展名分发，新格式不需要改动加载流程
pub struct ParserRegistry {
    parsers: Vec<Box<dyn FormatParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MntxParser));
        registry.register(Box::new(NpyParser));
        registry
    }
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self { parsers: vec![] }
    }

    pub fn register(&mut self, parser: Box<dyn FormatParser>) {
        self.parsers.push(parser);
    }

    pub fn get(&self, extension: &str) -> Option<&dyn FormatParser> {
        let extension = extension.to_ascii_lowercase();
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&extension.as_str()))
            .map(|p| p.as_ref())
    }
}

/// 特征仓库：目录展开、格式分发、缓存读写
pub struct FeatureRepository {
    registry: ParserRegistry,
    cache: Option<FeatureCache>,
    max_files: Option<usize>,
    expected_dim: Option<usize>,
    progress: bool,
}

impl Default for FeatureRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureRepository {
    pub fn new() -> Self {
        Self {
            registry: ParserRegistry::default(),
            cache: None,
            max_files: None,
            expected_dim: None,
            progress: false,
        }
    }

    pub fn registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn cache(mut self, cache: FeatureCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// 最多加载的文件数量
    pub fn max_files(mut self, n: Option<usize>) -> Self {
        self.max_files = n;
        self
    }

    /// 期望的特征维数，用于校验缓存与输入
    pub fn expected_dim(mut self, dim: Option<usize>) -> Self {
        self.expected_dim = dim;
        self
    }

    pub fn progress(mut self, on: bool) -> Self {
        self.progress = on;
        self
    }

    /// 加载特征
    ///
    /// 指定 `cache_name` 且缓存命中时直接读缓存，跳过全部解析；
    /// 否则按输入顺序解析所有文件，再写入一份新缓存。
    /// 解析失败和零特征的文件跳过并记录警告，维数不一致中止加载。
    pub fn load(&self, paths: &[PathBuf], cache_name: Option<&str>) -> Result<FeatureSet, Error> {
        let start = Instant::now();

        if let (Some(cache), Some(name)) = (&self.cache, cache_name) {
            if let Some(set) = cache.load(name, self.expected_dim)? {
                info!(
                    "loaded {} cached group(s) ({} vectors, dim {}) in {}",
                    set.num_groups(),
                    set.len(),
                    set.dim(),
                    format_time(start.elapsed().as_secs_f64())
                );
                return Ok(set);
            }
            info!("cache {name} not found, loading features from scratch");
        }

        let files = self.expand(paths)?;
        let pb = match self.progress {
            true => ProgressBar::new(files.len() as u64).with_style(pb_style()),
            false => ProgressBar::hidden(),
        };

        let mut matrix: Option<Matrix2D> = None;
        let mut group_sizes = vec![];
        let mut identifiers = vec![];
        let mut skipped = 0usize;

        for file in &files {
            pb.inc(1);

            let extension = file.extension().and_then(OsStr::to_str).unwrap_or_default();
            let parser = self
                .registry
                .get(extension)
                .ok_or_else(|| Error::UnsupportedFormat(extension.to_string()))?;

            let parsed = match parser.parse(file) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => {
                    warn!("skipping {}: no features", file.display());
                    skipped += 1;
                    continue;
                }
                Err(e @ Error::Format { .. }) => {
                    warn!("skipping {}: {e}", file.display());
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(dim) = self.expected_dim
                && parsed.width() != dim
            {
                return Err(Error::DimensionMismatch { expected: dim, actual: parsed.width() });
            }

            let identifier = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());

            group_sizes.push(parsed.height());
            identifiers.push(identifier);
            match &mut matrix {
                Some(matrix) => matrix.extend(&parsed)?,
                None => matrix = Some(parsed),
            }

            if let Some(max) = self.max_files
                && identifiers.len() >= max
            {
                break;
            }
        }
        pb.finish_and_clear();

        let Some(matrix) = matrix else {
            return Err(Error::Input(format!(
                "no features loaded from {} file(s)",
                files.len()
            )));
        };
        let set = FeatureSet::new(matrix.into_array(), group_sizes, identifiers)?;

        info!(
            "loaded {} file(s), skipped {skipped}, matrix shape ({}, {}) in {}",
            set.num_groups(),
            set.len(),
            set.dim(),
            format_time(start.elapsed().as_secs_f64())
        );

        if let (Some(cache), Some(name)) = (&self.cache, cache_name) {
            cache.save(name, &set)?;
        }
        Ok(set)
    }

    /// 将目录展开为文件列表，目录内按文件名排序保证组顺序稳定
    fn expand(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
        let mut files = vec![];
        for path in paths {
            if path.is_dir() {
                files.extend(
                    WalkDir::new(path)
                        .sort_by_file_name()
                        .into_iter()
                        .filter_map(|e| e.ok())
                        .filter(|e| e.file_type().is_file())
                        .map(|e| e.into_path()),
                );
            } else if path.is_file() {
                files.push(path.clone());
            } else {
                return Err(Error::Input(format!("{} is not a file or directory", path.display())));
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn record(seed: i64) -> String {
        let z: Vec<String> =
            (0..DESCRIPTOR_DIM as i64).map(|i| ((seed * 31 + i) % 9 + 1).to_string()).collect();
        format!("10 20 0.5 0.9 {}", z.join(" "))
    }

    fn write_tpt(dir: &Path, name: &str, records: &[i64]) {
        let mut content = format!("header\n{} 0.1 0.2 0.3\n", records.len());
        for &seed in records {
            content.push_str(&record(seed));
            content.push('\n');
        }
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_directory_in_order() {
        let dir = TempDir::new().unwrap();
        write_tpt(dir.path(), "b.tpt", &[3]);
        write_tpt(dir.path(), "a.tpt", &[1, 2]);

        let set =
            FeatureRepository::new().load(&[dir.path().to_path_buf()], None).unwrap();
        assert_eq!(set.identifiers, vec!["a.tpt", "b.tpt"]);
        assert_eq!(set.group_sizes, vec![2, 1]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.dim(), DESCRIPTOR_DIM);
    }

    #[test]
    fn zero_feature_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_tpt(dir.path(), "a.tpt", &[1]);
        fs::write(dir.path().join("empty.tpt"), "header\n0 0.1 0.2 0.3\n").unwrap();

        let set =
            FeatureRepository::new().load(&[dir.path().to_path_buf()], None).unwrap();
        assert_eq!(set.identifiers, vec!["a.tpt"]);
        assert_eq!(set.group_sizes, vec![1]);
    }

    #[test]
    fn malformed_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_tpt(dir.path(), "a.tpt", &[1]);
        fs::write(dir.path().join("bad.tpt"), "header\n1 0.1 0.2 0.3\n1 2 3\n").unwrap();

        let set =
            FeatureRepository::new().load(&[dir.path().to_path_buf()], None).unwrap();
        assert_eq!(set.identifiers, vec!["a.tpt"]);
    }

    #[test]
    fn unsupported_extension_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let err = FeatureRepository::new().load(&[dir.path().to_path_buf()], None);
        assert!(matches!(err, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn max_files_caps_loaded_groups() {
        let dir = TempDir::new().unwrap();
        write_tpt(dir.path(), "a.tpt", &[1]);
        write_tpt(dir.path(), "b.tpt", &[2]);
        write_tpt(dir.path(), "c.tpt", &[3]);

        let set = FeatureRepository::new()
            .max_files(Some(2))
            .load(&[dir.path().to_path_buf()], None)
            .unwrap();
        assert_eq!(set.identifiers, vec!["a.tpt", "b.tpt"]);
    }

    #[test]
    fn cache_round_trip_through_load() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        write_tpt(data.path(), "a.tpt", &[1, 2]);
        write_tpt(data.path(), "b.tpt", &[3]);

        let repo = || FeatureRepository::new().cache(FeatureCache::new(cache_dir.path()));
        let first = repo().load(&[data.path().to_path_buf()], Some("gal")).unwrap();

        // 第二次加载直接命中缓存，哪怕数据目录已经清空
        fs::remove_file(data.path().join("a.tpt")).unwrap();
        fs::remove_file(data.path().join("b.tpt")).unwrap();
        let second = repo().load(&[data.path().to_path_buf()], Some("gal")).unwrap();

        assert_eq!(first.matrix, second.matrix);
        assert_eq!(first.group_sizes, second.group_sizes);
        assert_eq!(first.identifiers, second.identifiers);
    }
}
