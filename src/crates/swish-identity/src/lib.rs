//! # Swish 商户证书开通模块
//!
//! 提供商户双向 TLS 身份所需的证书开通能力：RSA 密钥对生成、PKCS#10
//! 证书签名请求构建、PKCS#12 归档打包与导入，以及证书链解析与信任锚确定。
//!
//! ## 开通流程
//!
//! 1. [`KeyPairGenerator`] 生成 RSA 密钥对
//! 2. [`CsrBuilder`] 构建证书签名请求，交由外部证书颁发机构签发
//! 3. [`PkcsArchiveBuilder`] 将签发的证书链与私钥打包为 PKCS#12 归档
//! 4. [`PkcsArchive::open`] 重新导入归档
//! 5. [`CertificateChainResolver`] 区分叶子与颁发机构证书并确定信任锚
//!
//! ## 安全特性
//!
//! - 使用操作系统安全随机源生成密钥
//! - 私钥与口令不写入日志，`Debug` 输出会隐藏密钥材料
//! - 不修改任何全局信任存储
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use swish_identity::{CsrBuilder, KeyPairGenerator, ProvisioningConfig};
//!
//! # fn example() -> Result<(), swish_identity::IdentityError> {
//! let config = ProvisioningConfig::builder()
//!     .with_key_size(2048)
//!     .build()?;
//!
//! let key_pair = KeyPairGenerator::generate(config.key_size)?;
//! let output = CsrBuilder::from_config(&config).build_csr(&key_pair, "CN=1231181189, C=SE")?;
//! println!("{}", output.csr_pem);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod chain;
pub mod config;
pub mod csr;
pub mod error;
pub mod keypair;
pub mod subject;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use archive::{parse_certificate_chain, PkcsArchive, PkcsArchiveBuilder};
pub use chain::CertificateChainResolver;
pub use config::{
    CsrSignatureAlgorithm, LeafSelection, ProvisioningConfig, ProvisioningConfigBuilder, MAX_CHAIN_DEPTH_LIMIT,
};
pub use csr::{verify_csr_pem, CsrBuilder};
pub use error::{IdentityError, IdentityResult};
pub use keypair::{AsymmetricKeyPair, KeyPairGenerator, DEFAULT_KEY_BITS, SUPPORTED_KEY_BITS};
pub use subject::{SubjectAttribute, SubjectName};
pub use types::{
    certificate_subject, ArchiveSummary, CertificateChain, CsrInfo, CsrOutput, ImportedCertificate,
    ImportedIdentity, ResolvedChain,
};
