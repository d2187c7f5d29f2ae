//! # 客户端错误定义
//!
//! 汇总证书开通、安全传输与网关响应三层的错误。

use swish_identity::IdentityError;
use swish_transport::{ResponseError, TransportError};
use thiserror::Error;

/// 网关客户端错误类型
#[derive(Debug, Error)]
pub enum ClientError {
    /// 调用参数无效
    #[error("参数无效: {0}")]
    InvalidArgument(String),

    /// 证书开通错误
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// 安全传输错误
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 网关返回的业务错误或响应解码错误
    #[error(transparent)]
    Gateway(#[from] ResponseError),

    /// HTTP 请求失败（连接、超时等）
    #[error("HTTP请求失败: {0}")]
    Http(String),

    /// 响应缺少必需的请求头
    #[error("响应缺少请求头: {0}")]
    MissingHeader(&'static str),

    /// URL 无效
    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    /// 应用配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件读写失败
    #[error("IO错误: {0}")]
    Io(String),
}

impl ClientError {
    /// 获取错误码
    pub fn code(&self) -> u32 {
        match self {
            ClientError::InvalidArgument(_) => 8001,
            ClientError::Identity(e) => e.code(),
            ClientError::Transport(e) => e.code(),
            ClientError::Gateway(e) => e.code(),
            ClientError::Http(_) => 8002,
            ClientError::MissingHeader(_) => 8003,
            ClientError::InvalidUrl(_) => 8004,
            ClientError::Config(_) => 8100,
            ClientError::Io(_) => 8200,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidUrl(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e.to_string())
    }
}

/// 客户端统一结果类型
pub type ClientResult<T> = std::result::Result<T, ClientError>;
