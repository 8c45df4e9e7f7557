use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

/// 规范化身份字符串的固定宽度，不足时右对齐补空格
pub const NAME_WIDTH: usize = 15;

/// 结构化命名：subject、session、带指位编号的第三段
static STRUCTURED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^_]+)_([^_]+)_[^_]*?(\d+)$").expect("invalid regex"));

/// 从文件名解析规范化身份，纯函数
///
/// 识别两种命名：
/// - 旧式（主干含连字符）：直接取扩展名前的主干
/// - 结构化（下划线分隔）：subject 后 5 位 + `_` + session 后 5 位 + `_d` + 两位指位编号
///
/// 例：`006022331520_E25916112409340610_dedo3.tpt` -> `31520_40610_d03`
pub fn resolve(filename: &str) -> Result<String, Error> {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);

    if stem.contains('-') {
        return Ok(format!("{stem:>NAME_WIDTH$}"));
    }

    if let Some(caps) = STRUCTURED.captures(stem) {
        let subject = tail(&caps[1], 5);
        let session = tail(&caps[2], 5);
        let finger: u32 = caps[3]
            .parse()
            .map_err(|_| Error::IdentityParse(filename.to_string()))?;
        let canonical = format!("{subject}_{session}_d{finger:02}");
        return Ok(format!("{canonical:>NAME_WIDTH$}"));
    }

    Err(Error::IdentityParse(filename.to_string()))
}

/// 身份的 subject 前缀，命中判定按它比较
pub fn subject(canonical: &str) -> &str {
    canonical.split('_').next().unwrap_or(canonical).trim()
}

fn tail(s: &str, n: usize) -> &str {
    let skip = s.chars().count().saturating_sub(n);
    match s.char_indices().nth(skip) {
        Some((pos, _)) => &s[pos..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn structured_name() {
        let id = resolve("006022331520_E25916112409340610_dedo3.tpt").unwrap();
        assert_eq!(id, "31520_40610_d03");
        assert_eq!(id.len(), NAME_WIDTH);
        assert_eq!(subject(&id), "31520");
    }

    #[test]
    fn structured_short_fields() {
        let id = resolve("12_E34_dedo10.mntx").unwrap();
        assert_eq!(id, format!("{:>NAME_WIDTH$}", "12_E34_d10"));
        assert_eq!(subject(&id), "12");
    }

    #[test]
    fn legacy_name() {
        let id = resolve("001-1.npy").unwrap();
        assert_eq!(id, format!("{:>NAME_WIDTH$}", "001-1"));
        assert_eq!(subject(&id), "001-1");
    }

    #[rstest]
    #[case("justaname.tpt")]
    #[case("a_b.tpt")]
    #[case("a_b_dedo.tpt")]
    #[case("a_b_c_dedo1.tpt")]
    fn unrecognized_shapes(#[case] name: &str) {
        assert!(matches!(resolve(name), Err(Error::IdentityParse(_))));
    }

    #[test]
    fn deterministic() {
        let a = resolve("006022331520_E25916112409340610_dedo3.tpt").unwrap();
        let b = resolve("006022331520_E25916112409340610_dedo3.tpt").unwrap();
        assert_eq!(a, b);
    }
}
