//! # 双向 TLS 安全传输
//!
//! 根据客户端身份、协议版本下限与服务器证书校验策略构建 rustls 客户端配置，
//! 并以此创建可并发复用的 HTTP 客户端。
//!
//! 颁发机构证书作为客户端证书链的一部分在握手中出示，不写入任何全局信任存储。

use crate::config::{ServerValidationKind, TlsVersionFloor, TransportConfig};
use crate::error::{TransportError, TransportResult};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WantsClientCert;
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, ConfigBuilder, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use swish_identity::{ImportedIdentity, ResolvedChain};
use tracing::{debug, info, warn};

/// 客户端身份
///
/// 证书链按叶子在前、颁发机构依次在后的顺序排列。
pub struct ClientIdentity {
    certificate_chain: Vec<CertificateDer<'static>>,
    private_key: PrivateKeyDer<'static>,
}

impl ClientIdentity {
    /// 创建客户端身份
    ///
    /// # 参数
    ///
    /// * `certificate_chain` - 叶子在前的证书链
    /// * `private_key` - 叶子证书对应的私钥
    pub fn new(
        certificate_chain: Vec<CertificateDer<'static>>,
        private_key: PrivateKeyDer<'static>,
    ) -> TransportResult<Self> {
        if certificate_chain.is_empty() {
            return Err(TransportError::EmptyCertificateChain);
        }

        Ok(Self {
            certificate_chain,
            private_key,
        })
    }

    /// 由导入的归档与证书链解析结果创建客户端身份
    ///
    /// 没有解析结果时只出示与私钥关联的叶子证书。
    pub fn from_resolved(identity: &ImportedIdentity, resolved: Option<&ResolvedChain>) -> TransportResult<Self> {
        let chain = match resolved {
            Some(resolved) => resolved.presented_chain(),
            None => {
                let leaf = identity
                    .keyed_certificate()
                    .ok_or_else(|| TransportError::InvalidIdentity("归档中没有与私钥关联的证书".to_string()))?;
                vec![leaf.der.clone()]
            }
        };

        let private_key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(identity.private_key_der.clone()));
        Self::new(chain, private_key)
    }

    /// 证书链
    pub fn certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.certificate_chain
    }
}

impl Clone for ClientIdentity {
    fn clone(&self) -> Self {
        Self {
            certificate_chain: self.certificate_chain.clone(),
            private_key: self.private_key.clone_key(),
        }
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("certificate_chain", &self.certificate_chain.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// 服务器证书校验策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerValidationPolicy {
    /// 接受任意服务器证书
    ///
    /// 不校验服务器身份，仅用于测试环境，构建时会输出警告。握手签名仍会被校验。
    AcceptAll,

    /// 仅信任给定的根证书
    ValidateAgainstAnchor(CertificateDer<'static>),

    /// 信任内置的 Mozilla 根证书集合
    PlatformDefault,
}

impl ServerValidationPolicy {
    /// 根据配置选择校验策略
    ///
    /// `anchor` 配置要求提供证书链解析出的信任锚。
    pub fn from_kind(kind: ServerValidationKind, anchor: Option<CertificateDer<'static>>) -> TransportResult<Self> {
        match kind {
            ServerValidationKind::PlatformDefault => Ok(ServerValidationPolicy::PlatformDefault),
            ServerValidationKind::AcceptAll => Ok(ServerValidationPolicy::AcceptAll),
            ServerValidationKind::Anchor => anchor
                .map(ServerValidationPolicy::ValidateAgainstAnchor)
                .ok_or(TransportError::MissingTrustAnchor),
        }
    }

    /// 是否为不安全策略
    pub fn is_insecure(&self) -> bool {
        matches!(self, ServerValidationPolicy::AcceptAll)
    }

    /// 策略名称
    pub fn name(&self) -> &'static str {
        match self {
            ServerValidationPolicy::AcceptAll => "accept-all",
            ServerValidationPolicy::ValidateAgainstAnchor(_) => "anchor",
            ServerValidationPolicy::PlatformDefault => "platform-default",
        }
    }
}

/// 接受任意服务器证书的校验器
#[derive(Debug)]
struct AcceptAllServerVerifier {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptAllServerVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

/// 安全传输配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureTransportConfig {
    /// TLS 协议版本下限
    pub min_tls_version: TlsVersionFloor,

    /// 默认服务器证书校验策略
    pub server_validation: ServerValidationPolicy,

    /// 请求超时
    pub request_timeout: Duration,

    /// 连接超时
    pub connect_timeout: Duration,

    /// User-Agent 请求头
    pub user_agent: String,
}

impl Default for SecureTransportConfig {
    fn default() -> Self {
        let config = TransportConfig::default();
        Self {
            min_tls_version: config.min_tls_version,
            server_validation: ServerValidationPolicy::PlatformDefault,
            request_timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            user_agent: config.user_agent,
        }
    }
}

impl SecureTransportConfig {
    /// 由传输配置与可选的信任锚创建
    pub fn from_config(config: &TransportConfig, anchor: Option<CertificateDer<'static>>) -> TransportResult<Self> {
        config.validate()?;
        Ok(Self {
            min_tls_version: config.min_tls_version,
            server_validation: ServerValidationPolicy::from_kind(config.server_validation, anchor)?,
            request_timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// 已配置双向 TLS 的 HTTP 客户端
///
/// 构建后不可变，可克隆并在多个任务间并发复用。
#[derive(Debug, Clone)]
pub struct SecureHttpClient {
    http: reqwest::Client,
    validation: &'static str,
    insecure: bool,
}

impl SecureHttpClient {
    /// 底层 HTTP 客户端
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// 使用的服务器证书校验策略名称
    pub fn validation(&self) -> &'static str {
        self.validation
    }

    /// 是否使用了不安全的服务器校验策略
    pub fn is_insecure(&self) -> bool {
        self.insecure
    }
}

/// 安全传输工厂
#[derive(Debug, Clone)]
pub struct SecureTransportFactory {
    config: Arc<SecureTransportConfig>,
    provider: Arc<CryptoProvider>,
}

impl SecureTransportFactory {
    /// 创建安全传输工厂
    pub fn new(config: SecureTransportConfig) -> Self {
        Self {
            config: Arc::new(config),
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }

    /// 工厂配置
    pub fn config(&self) -> &SecureTransportConfig {
        &self.config
    }

    /// 构建 rustls 客户端配置
    ///
    /// # 参数
    ///
    /// * `identity` - 握手时出示的客户端身份
    /// * `policy` - 服务器证书校验策略
    ///
    /// # 返回值
    ///
    /// 返回独立的 rustls 客户端配置
    pub fn build_tls_config(
        &self,
        identity: &ClientIdentity,
        policy: &ServerValidationPolicy,
    ) -> TransportResult<ClientConfig> {
        let versions = self.config.min_tls_version.protocol_versions();
        let builder = ClientConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(versions)
            .map_err(|e| TransportError::ProtocolVersions(e.to_string()))?;

        let builder = self.apply_server_validation(builder, policy)?;

        let tls_config = builder
            .with_client_auth_cert(identity.certificate_chain.clone(), identity.private_key.clone_key())
            .map_err(|e| TransportError::InvalidIdentity(e.to_string()))?;

        debug!(
            "TLS客户端配置生成完成: 证书链长度 {}，校验策略 {}",
            identity.certificate_chain.len(),
            policy.name()
        );
        Ok(tls_config)
    }

    fn apply_server_validation(
        &self,
        builder: ConfigBuilder<ClientConfig, rustls::WantsVerifier>,
        policy: &ServerValidationPolicy,
    ) -> TransportResult<ConfigBuilder<ClientConfig, WantsClientCert>> {
        match policy {
            ServerValidationPolicy::AcceptAll => {
                warn!("服务器证书校验已关闭（accept-all），服务器身份不会被验证");
                let verifier = AcceptAllServerVerifier {
                    algorithms: self.provider.signature_verification_algorithms,
                };
                Ok(builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(verifier)))
            }
            ServerValidationPolicy::ValidateAgainstAnchor(anchor) => {
                let mut roots = RootCertStore::empty();
                roots
                    .add(anchor.clone())
                    .map_err(|e| TransportError::InvalidTrustAnchor(e.to_string()))?;
                Ok(builder.with_root_certificates(roots))
            }
            ServerValidationPolicy::PlatformDefault => {
                let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                Ok(builder.with_root_certificates(roots))
            }
        }
    }

    /// 构建安全 HTTP 客户端
    ///
    /// 每次调用都会生成独立的客户端，彼此不共享可变状态。
    ///
    /// # 参数
    ///
    /// * `identity` - 客户端身份
    /// * `policy_override` - 覆盖工厂默认的服务器证书校验策略
    pub fn build_client(
        &self,
        identity: &ClientIdentity,
        policy_override: Option<ServerValidationPolicy>,
    ) -> TransportResult<SecureHttpClient> {
        let policy = policy_override.unwrap_or_else(|| self.config.server_validation.clone());
        info!(
            "构建安全HTTP客户端: 协议下限 {:?}，校验策略 {}",
            self.config.min_tls_version,
            policy.name()
        );

        let tls_config = self.build_tls_config(identity, &policy)?;
        let http = reqwest::Client::builder()
            .use_preconfigured_tls(tls_config)
            .timeout(self.config.request_timeout)
            .connect_timeout(self.config.connect_timeout)
            .user_agent(self.config.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::HttpClient(e.to_string()))?;

        Ok(SecureHttpClient {
            http,
            validation: policy.name(),
            insecure: policy.is_insecure(),
        })
    }
}
