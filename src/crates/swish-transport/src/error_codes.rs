//! # 错误代码常量模块
//!
//! 定义swish-transport包使用的所有错误代码常量，避免硬编码

/// 客户端身份错误代码
pub mod identity {
    /// 证书链为空
    pub const EMPTY_CERTIFICATE_CHAIN: u32 = 7001;
    /// 私钥或证书无法用于客户端认证
    pub const INVALID_IDENTITY: u32 = 7002;
}

/// TLS配置错误代码
pub mod tls {
    /// 协议版本配置失败
    pub const PROTOCOL_VERSIONS_FAILED: u32 = 7101;
    /// 信任锚无效
    pub const INVALID_TRUST_ANCHOR: u32 = 7102;
    /// TLS配置生成失败
    pub const CONFIG_FAILED: u32 = 7103;
}

/// HTTP客户端错误代码
pub mod http {
    /// HTTP客户端构建失败
    pub const CLIENT_BUILD_FAILED: u32 = 7201;
}

/// 响应映射错误代码
pub mod response {
    /// 网关返回业务错误
    pub const DOMAIN_OUTCOME: u32 = 7301;
    /// 响应体解码失败
    pub const DECODE_FAILED: u32 = 7302;
}

/// 配置错误代码
pub mod config {
    /// 传输配置无效
    pub const INVALID_TRANSPORT_CONFIG: u32 = 7401;
    /// 缺少信任锚
    pub const MISSING_TRUST_ANCHOR: u32 = 7402;
}
