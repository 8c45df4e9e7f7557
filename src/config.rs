use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;

use crate::cli::*;

static CACHE_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    ProjectDirs::from("", "", "fpsearch")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
});

fn default_cache_dir() -> &'static str {
    CACHE_DIR.to_str().unwrap_or(".")
}

#[derive(Parser, Debug, Clone)]
#[command(name = "fpsearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 特征缓存目录
    #[arg(short, long, default_value = default_cache_dir())]
    pub cache_dir: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 预加载特征并写入缓存
    Cache(CacheCommand),
    /// 在 gallery 中检索 probe 并计算命中率
    Search(SearchCommand),
    /// 重新评估已保存的检索结果
    Evaluate(EvaluateCommand),
}

/// 特征加载相关选项
#[derive(Parser, Debug, Clone)]
pub struct LoadOptions {
    /// 最多加载的文件数量
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,
    /// 期望的特征维数，用于校验缓存与输入
    #[arg(long, value_name = "D")]
    pub dim: Option<usize>,
    /// 不显示进度条
    #[arg(long)]
    pub no_progress: bool,
}

/// 检索相关选项
#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 每个查询向量检索的最近邻数量
    #[arg(short, value_name = "K", default_value_t = 16)]
    pub k: usize,
    /// 报告的候选身份数量
    #[arg(short, value_name = "N", default_value_t = 5)]
    pub n: usize,
    /// 检索策略
    #[arg(long, value_enum, default_value_t = SearchMode::Shift)]
    pub mode: SearchMode,
}

/// 检索策略
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// 在原始 gallery 矩阵上一次性构建平面索引
    Indexed,
    /// 逐组平移查询后的顺序搜索
    Shift,
}
