//! # 应用配置
//!
//! 从 TOML 配置文件加载网关客户端与证书开通的配置。
//! 配置文件路径由 `SWISH_CONFIG` 环境变量指定，默认 `swish.toml`。

use crate::client::SwishEnvironment;
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use swish_identity::{CsrSignatureAlgorithm, LeafSelection, ProvisioningConfig, DEFAULT_KEY_BITS, MAX_CHAIN_DEPTH_LIMIT};
use swish_transport::TransportConfig;
use url::Url;

/// 配置文件路径环境变量
pub const CONFIG_ENV: &str = "SWISH_CONFIG";

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "swish.toml";

/// 证书开通设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningSettings {
    /// RSA 密钥长度
    pub key_bits: u32,

    /// 默认证书主题，例如 `CN=1231181189, C=SE`
    pub subject: Option<String>,

    /// CSR 签名算法
    pub signature_algorithm: CsrSignatureAlgorithm,

    /// 打包归档时的叶子证书选择方式
    pub leaf_selection: LeafSelection,

    /// 解析信任锚时向上查找的颁发机构证书数量上限
    pub max_chain_depth: u8,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            subject: None,
            signature_algorithm: CsrSignatureAlgorithm::default(),
            leaf_selection: LeafSelection::default(),
            max_chain_depth: MAX_CHAIN_DEPTH_LIMIT,
        }
    }
}

impl ProvisioningSettings {
    /// 转换为经过校验的开通配置
    pub fn to_provisioning_config(&self) -> ClientResult<ProvisioningConfig> {
        Ok(ProvisioningConfig::builder()
            .with_key_size(self.key_bits)
            .with_signature_algorithm(self.signature_algorithm)
            .with_leaf_selection(self.leaf_selection)
            .with_max_chain_depth(self.max_chain_depth)
            .build()?)
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 网关环境
    pub environment: SwishEnvironment,

    /// 商户 Swish 号
    pub merchant_id: String,

    /// 自定义网关基础地址，设置后覆盖环境默认地址
    pub base_url: Option<Url>,

    /// PKCS#12 归档路径
    pub archive_path: Option<PathBuf>,

    /// 保存归档口令的环境变量名
    pub archive_passphrase_env: String,

    /// 传输配置
    pub transport: TransportConfig,

    /// 证书开通设置
    pub provisioning: ProvisioningSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: SwishEnvironment::default(),
            merchant_id: String::new(),
            base_url: None,
            archive_path: None,
            archive_passphrase_env: "SWISH_ARCHIVE_PASSPHRASE".to_string(),
            transport: TransportConfig::default(),
            provisioning: ProvisioningSettings::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置
    ///
    /// 配置文件不存在时使用默认配置
    pub fn load() -> ClientResult<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// 从指定路径加载配置
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        #[cfg(feature = "config")]
        {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config = Self::from_toml_str(&content)?;
                tracing::info!("从配置文件加载: {}", path.display());
                return Ok(config);
            }
        }

        tracing::info!("未找到配置文件 {}，使用默认配置", path.display());
        Ok(Self::default())
    }

    /// 解析 TOML 配置文本
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> ClientResult<()> {
        if self.archive_passphrase_env.trim().is_empty() {
            return Err(ClientError::Config("口令环境变量名不能为空".to_string()));
        }
        self.transport.validate()?;
        self.provisioning.to_provisioning_config()?;
        Ok(())
    }

    /// 生效的网关基础地址
    pub fn resolved_base_url(&self) -> ClientResult<Url> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => self.environment.base_url(),
        }
    }

    /// 从环境变量读取归档口令
    pub fn archive_passphrase(&self) -> Option<String> {
        std::env::var(&self.archive_passphrase_env).ok()
    }

    /// 要求商户号已配置
    pub fn require_merchant_id(&self) -> ClientResult<&str> {
        let merchant_id = self.merchant_id.trim();
        if merchant_id.is_empty() {
            return Err(ClientError::Config("未配置商户号 merchant_id".to_string()));
        }
        Ok(merchant_id)
    }
}
