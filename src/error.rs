use std::path::PathBuf;

/// 管线内部的错误类型，CLI 边界统一转成 anyhow
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 输入路径或参数不可用
    #[error("invalid input: {0}")]
    Input(String),

    /// 扩展名没有对应的解析器，立即终止
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 单个特征文件内容不合法，调用方跳过该文件
    #[error("malformed {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    /// 特征维数与期望不一致
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 缓存元数据与矩阵不一致
    #[error("cache corruption: {0}")]
    CacheCorruption(String),

    /// 文件名无法解析出规范化身份
    #[error("cannot parse identity from {0}")]
    IdentityParse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
