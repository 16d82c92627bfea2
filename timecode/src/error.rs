// 帧率核心 - 错误类型定义
//
// 构造非法帧率或向换算函数传入负帧数时返回的错误。

use thiserror::Error;

/// 帧率错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimecodeError {
    /// 非法帧率（分母 <= 0 或分子 < 0）
    #[error("Invalid rate: {num}/{den}")]
    InvalidRate { num: i64, den: i64 },

    /// 非法参数
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 帧率表中不存在该名称
    #[error("Unknown rate: {0}")]
    UnknownRate(String),
}

pub type Result<T> = std::result::Result<T, TimecodeError>;
