//! # 证书签名请求构建
//!
//! 以 RSA 密钥对和主题字符串构建自签名的 PKCS#10 证书签名请求，
//! 并将请求与私钥一同序列化为 PEM 文本，交由外部证书颁发机构签发。

use crate::config::{CsrSignatureAlgorithm, ProvisioningConfig};
use crate::error::{IdentityError, IdentityResult};
use crate::keypair::AsymmetricKeyPair;
use crate::subject::SubjectName;
use crate::types::{CsrInfo, CsrOutput};
use rcgen::CertificateParams;
use tracing::{debug, info};
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::prelude::FromDer;

const CSR_PEM_TAG: &str = "CERTIFICATE REQUEST";

/// 证书签名请求构建器
#[derive(Debug, Clone, Default)]
pub struct CsrBuilder {
    signature_algorithm: CsrSignatureAlgorithm,
}

impl CsrBuilder {
    /// 使用默认签名算法（SHA-256 with RSA）创建构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据开通配置创建构建器
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self {
            signature_algorithm: config.signature_algorithm,
        }
    }

    /// 设置签名算法
    pub fn with_signature_algorithm(mut self, algorithm: CsrSignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// 构建证书签名请求
    ///
    /// # 参数
    ///
    /// * `key_pair` - 请求者的 RSA 密钥对
    /// * `subject` - 主题字符串，例如 `CN=Merchant, C=NL`
    ///
    /// # 返回值
    ///
    /// 返回 PEM 格式的私钥和证书签名请求
    pub fn build_csr(&self, key_pair: &AsymmetricKeyPair, subject: &str) -> IdentityResult<CsrOutput> {
        let subject = SubjectName::parse(subject)?;
        info!(
            "构建证书签名请求: {}，签名算法: {}",
            subject,
            self.signature_algorithm.name()
        );

        let mut params = CertificateParams::default();
        params.distinguished_name = subject.to_distinguished_name();

        let signing_key = key_pair.to_rcgen_key_pair(self.signature_algorithm.rcgen_algorithm())?;
        let request = params
            .serialize_request(&signing_key)
            .map_err(|e| IdentityError::Encoding(format!("证书签名请求序列化失败: {}", e)))?;
        let csr_pem = request
            .pem()
            .map_err(|e| IdentityError::Encoding(format!("证书签名请求PEM编码失败: {}", e)))?;

        let private_key_pem = key_pair.to_private_key_pem()?;

        debug!("证书签名请求构建完成");
        Ok(CsrOutput {
            private_key_pem,
            csr_pem,
        })
    }
}

/// 解析并校验 PEM 格式的证书签名请求
///
/// 校验请求的自签名是否与内嵌公钥匹配，通过后返回主题与公钥。
pub fn verify_csr_pem(csr_pem: &str) -> IdentityResult<CsrInfo> {
    let block = pem::parse(csr_pem)
        .map_err(|e| IdentityError::Encoding(format!("PEM解析失败: {}", e)))?;
    if block.tag() != CSR_PEM_TAG {
        return Err(IdentityError::Encoding(format!(
            "期望PEM块'{}'，实际为'{}'",
            CSR_PEM_TAG,
            block.tag()
        )));
    }

    let (_, request) = X509CertificationRequest::from_der(block.contents())
        .map_err(|e| IdentityError::Encoding(format!("证书签名请求解析失败: {}", e)))?;

    request
        .verify_signature()
        .map_err(|e| IdentityError::CsrVerification(e.to_string()))?;

    let info = &request.certification_request_info;
    Ok(CsrInfo {
        subject: info.subject.to_string(),
        public_key_der: info.subject_pki.raw.to_vec(),
    })
}
