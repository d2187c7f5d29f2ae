//! # 证书开通数据类型定义
//!
//! 定义证书签名请求输出、导入的证书集合、归档摘要以及证书链解析结果等数据结构。

use crate::error::{IdentityError, IdentityResult};
use rustls::pki_types::CertificateDer;
use serde::{Deserialize, Serialize};
use std::fmt;
use x509_parser::prelude::{FromDer, X509Certificate};

/// 证书签名请求构建输出
///
/// 私钥与请求一同导出后即交由外部证书颁发机构处理，系统内不保留。
#[derive(Clone, PartialEq, Eq)]
pub struct CsrOutput {
    /// PKCS#1 PEM 格式私钥
    pub private_key_pem: String,

    /// PKCS#10 PEM 格式证书签名请求
    pub csr_pem: String,
}

impl fmt::Debug for CsrOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrOutput")
            .field("private_key_pem", &"<redacted>")
            .field("csr_pem", &self.csr_pem)
            .finish()
    }
}

/// 已通过签名校验的证书签名请求信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrInfo {
    /// 主题可分辨名称字符串
    pub subject: String,

    /// 内嵌公钥（SubjectPublicKeyInfo DER）
    pub public_key_der: Vec<u8>,
}

/// 导入的证书
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedCertificate {
    /// DER 编码证书
    pub der: CertificateDer<'static>,

    /// 是否与私钥关联
    pub has_private_key: bool,
}

impl ImportedCertificate {
    /// 创建不带私钥关联的证书
    pub fn new(der: CertificateDer<'static>) -> Self {
        Self {
            der,
            has_private_key: false,
        }
    }

    /// 创建带私钥关联的证书
    pub fn with_private_key(der: CertificateDer<'static>) -> Self {
        Self {
            der,
            has_private_key: true,
        }
    }

    /// 证书主题字符串
    pub fn subject(&self) -> IdentityResult<String> {
        certificate_subject(self.der.as_ref())
    }
}

/// 证书集合（任意顺序）
pub type CertificateChain = Vec<ImportedCertificate>;

/// 从 PKCS#12 归档导入的身份
#[derive(Clone, PartialEq, Eq)]
pub struct ImportedIdentity {
    /// 归档中的全部证书
    pub certificates: CertificateChain,

    /// PKCS#8 DER 格式私钥
    pub private_key_der: Vec<u8>,

    /// 私钥条目友好名称
    pub friendly_name: Option<String>,
}

impl ImportedIdentity {
    /// 与私钥关联的证书
    pub fn keyed_certificate(&self) -> Option<&ImportedCertificate> {
        self.certificates.iter().find(|cert| cert.has_private_key)
    }
}

impl fmt::Debug for ImportedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportedIdentity")
            .field("certificates", &self.certificates.len())
            .field("private_key_der", &"<redacted>")
            .field("friendly_name", &self.friendly_name)
            .finish()
    }
}

/// PKCS#12 归档摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    /// 私钥条目数量
    pub key_entries: usize,

    /// 证书数量
    pub certificate_count: usize,

    /// 私钥条目友好名称
    pub friendly_name: Option<String>,

    /// 各证书主题
    pub subjects: Vec<String>,
}

/// 证书链解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChain {
    /// 叶子证书（与私钥关联）
    pub leaf: CertificateDer<'static>,

    /// 从叶子的颁发者开始依次向上的颁发机构证书
    pub authorities: Vec<CertificateDer<'static>>,

    /// 信任锚（路径的终点）
    pub anchor: CertificateDer<'static>,
}

impl ResolvedChain {
    /// 叶子在前的完整证书链
    pub fn presented_chain(&self) -> Vec<CertificateDer<'static>> {
        std::iter::once(self.leaf.clone())
            .chain(self.authorities.iter().cloned())
            .collect()
    }
}

/// 读取 DER 证书的主题字符串
pub fn certificate_subject(der: &[u8]) -> IdentityResult<String> {
    let (_, certificate) = X509Certificate::from_der(der)
        .map_err(|e| IdentityError::CertificateParse(e.to_string()))?;
    Ok(certificate.subject().to_string())
}
