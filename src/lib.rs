//! # Swish 商户支付网关客户端
//!
//! 基于双向 TLS 的 Swish 支付网关客户端，包含商户证书开通工具链。
//!
//! ## 核心特性
//!
//! - **证书开通**: RSA 密钥生成、CSR 构建、PKCS#12 归档打包与导入
//! - **证书链解析**: 区分叶子证书与颁发机构证书，确定信任锚
//! - **安全传输**: 出示完整证书链的双向 TLS 客户端，服务器校验策略可配置
//! - **支付操作**: e-commerce / m-commerce 支付请求、退款与状态查询
//!
//! ## 模块架构
//!
//! ```text
//! swish/
//! ├── src/
//! │   ├── main.rs         # 命令行入口
//! │   ├── lib.rs          # 库入口
//! │   ├── client.rs       # 网关客户端
//! │   ├── commands.rs     # 命令实现
//! │   ├── config.rs       # 应用配置
//! │   ├── error.rs        # 错误定义
//! │   └── crates/
//! │       ├── swish-identity/   # 证书开通
//! │       └── swish-transport/  # 安全传输与响应映射
//! ```
//!
//! ## 使用示例
//!
//! ```no_run
//! use swish::{ECommercePaymentRequest, SwishClient, SwishEnvironment};
//! use swish_transport::TransportConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let archive = std::fs::read("merchant.p12")?;
//!     let client = SwishClient::from_archive(
//!         SwishEnvironment::Test,
//!         &archive,
//!         Some("swish"),
//!         "1231181189",
//!         &TransportConfig::default(),
//!     )?;
//!
//!     let request = ECommercePaymentRequest::new("https://example.com/callback", "100", "SEK", "0701234567");
//!     let response = client.create_ecommerce_payment(&request).await?;
//!     let status = client.payment_status(&response.id).await?;
//!     println!("{:?}", status.status);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod error;

pub use client::{
    generate_swish_url, normalize_payer_alias, ECommercePaymentRequest, MCommercePaymentRequest,
    MCommercePaymentResponse, PaymentResponse, PaymentState, PaymentStatus, RefundRequest, RefundStatus,
    SwishClient, SwishEnvironment,
};
pub use config::{AppConfig, ProvisioningSettings};
pub use error::{ClientError, ClientResult};
