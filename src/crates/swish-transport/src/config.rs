//! # 传输配置模块
//!
//! 定义安全传输层的协议版本下限、服务器证书校验方式、超时与 User-Agent 配置。

use crate::error::{TransportError, TransportResult};
use rustls::SupportedProtocolVersion;
use serde::{Deserialize, Serialize};
use std::time::Duration;

static TLS12_AND_LATER: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13, &rustls::version::TLS12];
static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

/// TLS 协议版本下限
///
/// 握手时协商双方都支持的最高版本。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TlsVersionFloor {
    /// 允许 TLS 1.2 与 TLS 1.3
    #[default]
    #[serde(rename = "tls1.2")]
    Tls12,

    /// 仅允许 TLS 1.3
    #[serde(rename = "tls1.3")]
    Tls13,
}

impl TlsVersionFloor {
    /// 允许的协议版本，按优先级从高到低排列
    pub fn protocol_versions(&self) -> &'static [&'static SupportedProtocolVersion] {
        match self {
            TlsVersionFloor::Tls12 => TLS12_AND_LATER,
            TlsVersionFloor::Tls13 => TLS13_ONLY,
        }
    }
}

/// 服务器证书校验方式（配置文件使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerValidationKind {
    /// 使用内置的 Mozilla 根证书集合校验
    #[default]
    PlatformDefault,

    /// 接受任意服务器证书（不安全，仅用于测试环境）
    AcceptAll,

    /// 使用证书链解析出的信任锚校验
    Anchor,
}

/// 传输配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TLS 协议版本下限
    pub min_tls_version: TlsVersionFloor,

    /// 服务器证书校验方式
    pub server_validation: ServerValidationKind,

    /// 请求超时（秒）
    pub request_timeout_secs: u64,

    /// 连接超时（秒）
    pub connect_timeout_secs: u64,

    /// User-Agent 请求头
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            min_tls_version: TlsVersionFloor::default(),
            server_validation: ServerValidationKind::default(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("swish-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 连接超时
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// 验证配置
    pub fn validate(&self) -> TransportResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(TransportError::Config("请求超时必须大于0".to_string()));
        }

        if self.connect_timeout_secs == 0 {
            return Err(TransportError::Config("连接超时必须大于0".to_string()));
        }

        if self.connect_timeout_secs > self.request_timeout_secs {
            return Err(TransportError::Config("连接超时不能大于请求超时".to_string()));
        }

        if self.user_agent.trim().is_empty() {
            return Err(TransportError::Config("User-Agent不能为空".to_string()));
        }

        Ok(())
    }
}
