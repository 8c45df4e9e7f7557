use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::cache::FeatureCache;
use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::evaluate::{RunResults, eval_rank};

#[derive(Parser, Debug, Clone)]
pub struct EvaluateCommand {
    /// 检索结果文件
    pub results: PathBuf,
    /// gallery 缓存名称
    #[arg(long, value_name = "NAME")]
    pub gallery_cache: String,
    /// probe 缓存名称
    #[arg(long, value_name = "NAME")]
    pub probe_cache: String,
    /// 报告的候选身份数量
    #[arg(short, default_value_t = 5)]
    pub n: usize,
}

impl SubCommandExtend for EvaluateCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let cache = FeatureCache::new(&opts.cache_dir);
        let gallery = cache
            .load(&self.gallery_cache, None)?
            .ok_or_else(|| anyhow!("gallery cache {} not found", self.gallery_cache))?;
        let probe = cache
            .load(&self.probe_cache, None)?
            .ok_or_else(|| anyhow!("probe cache {} not found", self.probe_cache))?;

        let run = RunResults::load(&self.results)?;
        eval_rank(&run, &gallery, &probe, self.n)?;
        Ok(())
    }
}
