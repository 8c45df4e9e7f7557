use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::features::FeatureSet;
use crate::identity;
use crate::knn::SearchResult;
use crate::utils::format_time;

/// 一次检索运行的全部结果，可落盘后离线重新评估
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunResults {
    /// 每个查询组内所有向量的近邻结果
    pub queries: Vec<Vec<SearchResult>>,
    /// 每个查询组的墙钟耗时（秒）
    pub times: Vec<f64>,
}

impl RunResults {
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, serde_json::to_vec(self).map_err(std::io::Error::other)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        serde_json::from_slice(&fs::read(path)?)
            .map_err(|e| Error::Format { path: path.to_path_buf(), reason: e.to_string() })
    }
}

/// 统计一个查询组的近邻落在哪些 gallery 组，按票数排名取前 n
///
/// 平票时组号小者在前，结果确定
pub fn aggregate(
    results: &[SearchResult],
    group_of_index: &[usize],
    n: usize,
) -> Vec<(usize, usize)> {
    let mut votes: HashMap<usize, usize> = HashMap::new();
    for result in results {
        for &idx in &result.indices {
            *votes.entry(group_of_index[idx]).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(usize, usize)> = votes.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// 命中判定：top-n 候选里任何一个与查询同 subject 即命中，每条查询只记一次
pub fn is_hit(
    candidates: &[(usize, usize)],
    probe_identity: &str,
    gallery_identities: &[String],
) -> bool {
    let subject = identity::subject(probe_identity);
    candidates.iter().any(|&(g, _)| identity::subject(&gallery_identities[g]) == subject)
}

/// 将文件名逐个解析为规范化身份，解析不了的保留原文件名并记录警告
pub fn resolve_identities(identifiers: &[String]) -> Vec<String> {
    identifiers
        .iter()
        .map(|name| match identity::resolve(name) {
            Ok(id) => id,
            Err(e) => {
                warn!("{e}, keeping raw name");
                name.clone()
            }
        })
        .collect()
}

/// 评估整个查询批次：打印每条查询的候选列表，返回命中率（百分比）
///
/// 结果文件必须与当前加载的 gallery/probe 一致：查询组数不能超过
/// probe 的组数，近邻行号不能超出 gallery，否则报 CacheCorruption。
/// 查询身份解析失败只影响该条查询的计分（按未命中处理），不会中断批次
pub fn eval_rank(
    results: &RunResults,
    gallery: &FeatureSet,
    probe: &FeatureSet,
    n: usize,
) -> Result<f64, Error> {
    if results.queries.is_empty() {
        return Ok(0.);
    }
    if results.queries.len() > probe.num_groups() {
        return Err(Error::CacheCorruption(format!(
            "results contain {} query group(s) but probe has {}",
            results.queries.len(),
            probe.num_groups()
        )));
    }
    for query_results in &results.queries {
        for result in query_results {
            if let Some(&idx) = result.indices.iter().find(|&&idx| idx >= gallery.len()) {
                return Err(Error::CacheCorruption(format!(
                    "results reference gallery row {idx} but gallery has {} row(s)",
                    gallery.len()
                )));
            }
        }
    }

    let group_of_index = gallery.group_of_index();
    let gallery_ids = resolve_identities(&gallery.identifiers);

    let mut hits = 0usize;
    for (q, query_results) in results.queries.iter().enumerate() {
        let ranked = aggregate(query_results, &group_of_index, n);
        let candidates = ranked
            .iter()
            .map(|&(g, count)| format!("({}, {count})", gallery_ids[g].trim_start()))
            .collect::<Vec<_>>()
            .join(", ");

        let raw = &probe.identifiers[q];
        let shown = match identity::resolve(raw) {
            Ok(id) => {
                if is_hit(&ranked, &id, &gallery_ids) {
                    hits += 1;
                }
                id.trim_start().to_string()
            }
            Err(e) => {
                warn!("cannot score query {q}: {e}");
                raw.clone()
            }
        };

        let elapsed = results.times.get(q).copied().unwrap_or_default();
        println!("{shown} [{candidates}] ({})", format_time(elapsed));
    }

    let rate = 100. * hits as f64 / results.queries.len() as f64;
    println!("Hit rate: {rate:.2}%");
    Ok(rate)
}
