//! # 证书开通配置
//!
//! 提供密钥长度、签名算法、私钥条目选择策略与证书链深度等开通参数。
//! 通过构建器创建并在 `build()` 时统一校验。

use crate::error::{IdentityError, IdentityResult};
use crate::keypair::{DEFAULT_KEY_BITS, SUPPORTED_KEY_BITS};
use serde::{Deserialize, Serialize};

/// 证书链最大深度上限
pub const MAX_CHAIN_DEPTH_LIMIT: u8 = 10;

/// 证书签名请求使用的签名算法（RSA PKCS#1 v1.5）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CsrSignatureAlgorithm {
    /// SHA-256 with RSA
    #[default]
    Sha256,
    /// SHA-384 with RSA
    Sha384,
    /// SHA-512 with RSA
    Sha512,
}

impl CsrSignatureAlgorithm {
    /// 对应的 rcgen 签名算法
    pub fn rcgen_algorithm(&self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            CsrSignatureAlgorithm::Sha256 => &rcgen::PKCS_RSA_SHA256,
            CsrSignatureAlgorithm::Sha384 => &rcgen::PKCS_RSA_SHA384,
            CsrSignatureAlgorithm::Sha512 => &rcgen::PKCS_RSA_SHA512,
        }
    }

    /// 算法名称
    pub fn name(&self) -> &'static str {
        match self {
            CsrSignatureAlgorithm::Sha256 => "SHA256withRSA",
            CsrSignatureAlgorithm::Sha384 => "SHA384withRSA",
            CsrSignatureAlgorithm::Sha512 => "SHA512withRSA",
        }
    }
}

/// PKCS#12 归档中私钥条目的绑定策略
///
/// 决定私钥绑定到证书链中的哪一张证书上。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeafSelection {
    /// 选择公钥与私钥匹配的证书（与输入顺序无关）
    #[default]
    MatchPrivateKey,

    /// 选择迭代顺序中的第一张证书
    ///
    /// 仅在输入保证叶子证书在前时正确，否则私钥会被绑定到颁发机构证书上。
    FirstInChain,
}

/// 证书开通配置构建器
#[derive(Debug, Clone)]
pub struct ProvisioningConfigBuilder {
    key_size: u32,
    signature_algorithm: CsrSignatureAlgorithm,
    leaf_selection: LeafSelection,
    max_chain_depth: u8,
}

impl Default for ProvisioningConfigBuilder {
    fn default() -> Self {
        Self {
            key_size: DEFAULT_KEY_BITS,
            signature_algorithm: CsrSignatureAlgorithm::default(),
            leaf_selection: LeafSelection::default(),
            max_chain_depth: MAX_CHAIN_DEPTH_LIMIT,
        }
    }
}

impl ProvisioningConfigBuilder {
    /// 创建新的配置构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 RSA 密钥长度（位）
    pub fn with_key_size(mut self, bits: u32) -> Self {
        self.key_size = bits;
        self
    }

    /// 设置证书签名请求的签名算法
    pub fn with_signature_algorithm(mut self, algorithm: CsrSignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// 设置私钥条目绑定策略
    pub fn with_leaf_selection(mut self, selection: LeafSelection) -> Self {
        self.leaf_selection = selection;
        self
    }

    /// 设置证书链遍历的最大深度
    pub fn with_max_chain_depth(mut self, depth: u8) -> Self {
        self.max_chain_depth = depth;
        self
    }

    /// 构建并验证配置
    pub fn build(self) -> IdentityResult<ProvisioningConfig> {
        if !SUPPORTED_KEY_BITS.contains(&self.key_size) {
            return Err(IdentityError::Config(format!(
                "不支持的密钥长度: {}，可选值: {:?}",
                self.key_size, SUPPORTED_KEY_BITS
            )));
        }

        if self.max_chain_depth == 0 || self.max_chain_depth > MAX_CHAIN_DEPTH_LIMIT {
            return Err(IdentityError::Config(format!(
                "证书链深度必须在1-{}之间",
                MAX_CHAIN_DEPTH_LIMIT
            )));
        }

        Ok(ProvisioningConfig {
            key_size: self.key_size,
            signature_algorithm: self.signature_algorithm,
            leaf_selection: self.leaf_selection,
            max_chain_depth: self.max_chain_depth,
        })
    }
}

/// 证书开通配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// RSA 密钥长度（位）
    pub key_size: u32,

    /// 证书签名请求签名算法
    pub signature_algorithm: CsrSignatureAlgorithm,

    /// 私钥条目绑定策略
    pub leaf_selection: LeafSelection,

    /// 证书链遍历最大深度
    pub max_chain_depth: u8,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            key_size: DEFAULT_KEY_BITS,
            signature_algorithm: CsrSignatureAlgorithm::default(),
            leaf_selection: LeafSelection::default(),
            max_chain_depth: MAX_CHAIN_DEPTH_LIMIT,
        }
    }
}

impl ProvisioningConfig {
    /// 创建配置构建器
    pub fn builder() -> ProvisioningConfigBuilder {
        ProvisioningConfigBuilder::new()
    }

    /// 重新校验配置（用于反序列化得到的配置）
    pub fn validate(&self) -> IdentityResult<()> {
        ProvisioningConfigBuilder::new()
            .with_key_size(self.key_size)
            .with_signature_algorithm(self.signature_algorithm)
            .with_leaf_selection(self.leaf_selection)
            .with_max_chain_depth(self.max_chain_depth)
            .build()
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProvisioningConfig::default();
        assert_eq!(config.key_size, 4096);
        assert_eq!(config.signature_algorithm, CsrSignatureAlgorithm::Sha256);
        assert_eq!(config.leaf_selection, LeafSelection::MatchPrivateKey);
        assert_eq!(config.max_chain_depth, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_unsupported_key_size() {
        let result = ProvisioningConfig::builder().with_key_size(1024).build();
        assert!(matches!(result, Err(IdentityError::Config(_))), "1024位密钥应被拒绝");
    }

    #[test]
    fn test_builder_rejects_invalid_chain_depth() {
        assert!(ProvisioningConfig::builder().with_max_chain_depth(0).build().is_err());
        assert!(ProvisioningConfig::builder().with_max_chain_depth(11).build().is_err());
    }

    #[test]
    fn test_builder_customization() {
        let config = ProvisioningConfig::builder()
            .with_key_size(2048)
            .with_signature_algorithm(CsrSignatureAlgorithm::Sha512)
            .with_leaf_selection(LeafSelection::FirstInChain)
            .with_max_chain_depth(3)
            .build()
            .unwrap();

        assert_eq!(config.key_size, 2048);
        assert_eq!(config.signature_algorithm.name(), "SHA512withRSA");
        assert_eq!(config.leaf_selection, LeafSelection::FirstInChain);
        assert_eq!(config.max_chain_depth, 3);
    }

    #[test]
    fn test_config_deserialization_uses_defaults() {
        let config: ProvisioningConfig =
            serde_json::from_str(r#"{"key_size": 3072, "leaf_selection": "first-in-chain"}"#).unwrap();
        assert_eq!(config.key_size, 3072);
        assert_eq!(config.leaf_selection, LeafSelection::FirstInChain);
        assert_eq!(config.signature_algorithm, CsrSignatureAlgorithm::Sha256);
    }
}
