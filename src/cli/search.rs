use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use ndarray::s;

use crate::cache::FeatureCache;
use crate::cli::SubCommandExtend;
use crate::config::{LoadOptions, Opts, SearchMode, SearchOptions};
use crate::error::Error;
use crate::evaluate::{RunResults, eval_rank, resolve_identities};
use crate::loader::FeatureRepository;
use crate::searcher::{FlatSearcher, Searcher, ShiftSearcher, search_batch};
use crate::utils::format_time;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    /// gallery 特征文件或目录
    #[arg(short, long, required = true, value_name = "PATH")]
    pub gallery: Vec<PathBuf>,
    /// probe 特征文件或目录
    #[arg(short, long, required = true, value_name = "PATH")]
    pub probe: Vec<PathBuf>,
    /// gallery 缓存名称
    #[arg(long, value_name = "NAME")]
    pub gallery_cache: Option<String>,
    /// probe 缓存名称
    #[arg(long, value_name = "NAME")]
    pub probe_cache: Option<String>,
    /// 最多处理的查询组数量
    #[arg(long, value_name = "N")]
    pub max_queries: Option<usize>,
    /// 检索结果保存路径
    #[arg(long, value_name = "FILE")]
    pub results: Option<PathBuf>,
    #[command(flatten)]
    pub load: LoadOptions,
    #[command(flatten)]
    pub search: SearchOptions,
}

impl SubCommandExtend for SearchCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let repo = || {
            FeatureRepository::new()
                .cache(FeatureCache::new(&opts.cache_dir))
                .max_files(self.load.max_files)
                .expected_dim(self.load.dim)
                .progress(!self.load.no_progress)
        };
        let gallery = repo().load(&self.gallery, self.gallery_cache.as_deref())?;
        let probe = repo().load(&self.probe, self.probe_cache.as_deref())?;
        if gallery.dim() != probe.dim() {
            return Err(
                Error::DimensionMismatch { expected: gallery.dim(), actual: probe.dim() }.into()
            );
        }

        let searcher: Box<dyn Searcher> = match self.search.mode {
            SearchMode::Indexed => {
                info!("building flat index over {} vectors", gallery.len());
                Box::new(FlatSearcher::new(gallery.matrix.clone()))
            }
            SearchMode::Shift => {
                info!("fitting per-group statistics for {} group(s)", gallery.num_groups());
                Box::new(ShiftSearcher::new(&gallery))
            }
        };

        let group_of_index = gallery.group_of_index();
        let gallery_ids = resolve_identities(&gallery.identifiers);

        let offsets = probe.offsets();
        let total = probe.num_groups().min(self.max_queries.unwrap_or(usize::MAX));

        let mut run = RunResults::default();
        for q in 0..total {
            let queries = probe.matrix.slice(s![offsets[q]..offsets[q + 1], ..]);

            let start = Instant::now();
            let results = search_batch(searcher.as_ref(), queries, self.search.k);
            let elapsed = start.elapsed().as_secs_f64();

            info!(
                "query {q} {} ({} vectors) in {}",
                probe.identifiers[q],
                queries.nrows(),
                format_time(elapsed)
            );
            for result in &results {
                let neighbors = result
                    .indices
                    .iter()
                    .zip(&result.distances)
                    .map(|(&i, d)| {
                        format!("{}:{d:.4}", gallery_ids[group_of_index[i]].trim_start())
                    })
                    .collect::<Vec<_>>()
                    .join("  ");
                debug!("{neighbors}");
            }

            run.queries.push(results);
            run.times.push(elapsed);
        }

        eval_rank(&run, &gallery, &probe, self.search.n)?;

        let results_path = self.results.clone().or_else(|| {
            self.probe_cache
                .as_deref()
                .map(|name| FeatureCache::new(&opts.cache_dir).results_path(name))
        });
        if let Some(path) = results_path {
            run.save(&path)?;
            info!("results saved to {}", path.display());
        }

        Ok(())
    }
}
