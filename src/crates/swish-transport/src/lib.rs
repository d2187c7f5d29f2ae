//! # Swish 安全传输层模块
//!
//! 基于 rustls 的双向 TLS HTTP 传输，以及网关响应到类型化业务结果的映射。
//! 客户端身份由 swish_identity 证书开通模块导入与解析，本模块只负责传输配置。
//!
//! ## 核心特性
//!
//! - **双向认证**: 握手时出示叶子证书及其颁发机构证书
//! - **协议版本**: 可配置 TLS 1.2 或 TLS 1.3 下限，协商双方支持的最高版本
//! - **服务器校验策略**: 内置根证书集合、指定信任锚或显式开启的不安全模式
//! - **响应映射**: 对所有状态码定义确定的结果，业务错误作为返回值而非异常

pub mod config;
pub mod error;
pub mod error_codes;
pub mod response;
pub mod tls;

pub use config::{ServerValidationKind, TlsVersionFloor, TransportConfig};
pub use error::{TransportError, TransportResult};
pub use response::{check_status, map_response, DomainErrorOutcome, GatewayValidationError, ResponseError};
pub use tls::{ClientIdentity, SecureHttpClient, SecureTransportConfig, SecureTransportFactory, ServerValidationPolicy};
