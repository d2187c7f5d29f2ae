//! # 传输层错误定义

use crate::error_codes;
use thiserror::Error;

/// 安全传输层错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 客户端证书链为空
    #[error("客户端证书链为空")]
    EmptyCertificateChain,

    /// 客户端身份（证书或私钥）不可用
    #[error("无效的客户端身份: {0}")]
    InvalidIdentity(String),

    /// 协议版本配置失败
    #[error("TLS协议版本配置失败: {0}")]
    ProtocolVersions(String),

    /// 信任锚证书无法加入信任存储
    #[error("无效的信任锚: {0}")]
    InvalidTrustAnchor(String),

    /// 其他 TLS 配置失败
    #[error("TLS配置失败: {0}")]
    TlsConfig(String),

    /// HTTP 客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    HttpClient(String),

    /// 传输配置无效
    #[error("传输配置无效: {0}")]
    Config(String),

    /// 配置要求按信任锚校验，但没有可用的信任锚
    #[error("服务器校验策略要求信任锚，但证书链未解析出信任锚")]
    MissingTrustAnchor,
}

impl TransportError {
    /// 获取错误码
    pub fn code(&self) -> u32 {
        match self {
            TransportError::EmptyCertificateChain => error_codes::identity::EMPTY_CERTIFICATE_CHAIN,
            TransportError::InvalidIdentity(_) => error_codes::identity::INVALID_IDENTITY,
            TransportError::ProtocolVersions(_) => error_codes::tls::PROTOCOL_VERSIONS_FAILED,
            TransportError::InvalidTrustAnchor(_) => error_codes::tls::INVALID_TRUST_ANCHOR,
            TransportError::TlsConfig(_) => error_codes::tls::CONFIG_FAILED,
            TransportError::HttpClient(_) => error_codes::http::CLIENT_BUILD_FAILED,
            TransportError::Config(_) => error_codes::config::INVALID_TRANSPORT_CONFIG,
            TransportError::MissingTrustAnchor => error_codes::config::MISSING_TRUST_ANCHOR,
        }
    }
}

/// 安全传输层结果类型
pub type TransportResult<T> = std::result::Result<T, TransportError>;
