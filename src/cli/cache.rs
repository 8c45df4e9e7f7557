use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::cache::FeatureCache;
use crate::cli::SubCommandExtend;
use crate::config::{LoadOptions, Opts};
use crate::loader::FeatureRepository;
use crate::utils::format_time;

#[derive(Parser, Debug, Clone)]
pub struct CacheCommand {
    /// 特征文件或目录
    #[arg(required = true)]
    pub path: Vec<PathBuf>,
    /// 缓存名称
    #[arg(short = 'o', long)]
    pub name: String,
    #[command(flatten)]
    pub load: LoadOptions,
}

impl SubCommandExtend for CacheCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let start = Instant::now();
        let repo = FeatureRepository::new()
            .cache(FeatureCache::new(&opts.cache_dir))
            .max_files(self.load.max_files)
            .expected_dim(self.load.dim)
            .progress(!self.load.no_progress);

        let set = repo.load(&self.path, Some(&self.name))?;
        info!(
            "cached {} group(s) ({} vectors, dim {}) as {} in {}",
            set.num_groups(),
            set.len(),
            set.dim(),
            self.name,
            format_time(start.elapsed().as_secs_f64())
        );
        Ok(())
    }
}
