//! 统一错误类型

use crate::config::ConfigError;
use crate::dataset::DatasetError;
use crate::report::ReportError;
use thiserror::Error;

/// 通用结果类型
pub type Result<T> = std::result::Result<T, TrackerError>;

/// 定位系统错误
///
/// 只有 `Config` 和 `ClassifierUnavailable` 在启动时致命；
/// `Parse` 仅丢弃当前报告。
#[derive(Debug, Error)]
pub enum TrackerError {
    /// 上行报告格式错误
    #[error("报告解析失败: {0}")]
    Parse(#[from] ReportError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 区域模型无法加载
    #[error("区域模型不可用: {0}")]
    ClassifierUnavailable(String),

    /// 训练数据错误
    #[error("训练数据错误: {0}")]
    Dataset(#[from] DatasetError),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// 是否为启动期致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackerError::Config(_) | TrackerError::ClassifierUnavailable(_)
        )
    }
}
