//! # 证书开通错误定义
//!
//! 定义密钥生成、证书签名请求、PKCS#12 归档与证书链处理过程中的错误类型。
//! 开通类错误均不可在本层恢复，直接向调用方传播。

use thiserror::Error;

/// 证书开通专用错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// 请求的密钥长度不受支持，或底层加密实现生成失败
    #[error("密钥生成失败: {0}")]
    KeyGeneration(String),

    /// PEM/DER 编码或解码失败
    #[error("编码失败: {0}")]
    Encoding(String),

    /// 证书主题字符串无法解析
    #[error("无效的证书主题: {0}")]
    InvalidSubject(String),

    /// 证书签名请求的自签名无法通过校验
    #[error("证书签名请求校验失败: {0}")]
    CsrVerification(String),

    /// PKCS#12 归档构建失败（证书链为空、缺少私钥或序列化失败）
    #[error("PKCS#12 归档构建失败: {0}")]
    ArchiveBuild(String),

    /// PKCS#12 归档读取失败
    #[error("PKCS#12 归档读取失败: {0}")]
    ArchiveOpen(String),

    /// X.509 证书解析失败
    #[error("证书解析失败: {0}")]
    CertificateParse(String),

    /// 私钥签名失败
    #[error("签名失败: {0}")]
    Signing(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl IdentityError {
    /// 获取错误码
    pub fn code(&self) -> u32 {
        match self {
            IdentityError::KeyGeneration(_) => 6001,
            IdentityError::Encoding(_) => 6002,
            IdentityError::InvalidSubject(_) => 6003,
            IdentityError::CsrVerification(_) => 6004,
            IdentityError::ArchiveBuild(_) => 6005,
            IdentityError::ArchiveOpen(_) => 6006,
            IdentityError::CertificateParse(_) => 6007,
            IdentityError::Signing(_) => 6008,
            IdentityError::Config(_) => 6100,
        }
    }
}

/// 证书开通统一结果类型
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;
