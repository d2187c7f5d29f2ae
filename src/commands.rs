//! # 命令实现
//!
//! 命令行工具各子命令的实现：生成 CSR、打包归档、查看归档以及查询网关状态。

use crate::client::{PaymentStatus, RefundStatus, SwishClient};
use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};
use std::fs;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use swish_identity::{
    ArchiveSummary, CertificateChainResolver, CsrBuilder, KeyPairGenerator, PkcsArchive, PkcsArchiveBuilder,
    ProvisioningConfig,
};
use tracing::info;

/// 私钥输出文件名
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

/// CSR 输出文件名
pub const CSR_FILE: &str = "request.csr";

/// `generate-csr` 的输出文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrFiles {
    /// 私钥文件路径
    pub private_key: PathBuf,
    /// CSR 文件路径
    pub csr: PathBuf,
}

/// 生成密钥对与证书签名请求并写入输出目录
///
/// # 参数
///
/// * `config` - 开通配置（密钥长度、签名算法）
/// * `subject` - 证书主题，例如 `CN=1231181189, C=SE`
/// * `out_dir` - 输出目录，不存在时自动创建
pub fn generate_csr(config: &ProvisioningConfig, subject: &str, out_dir: &Path) -> ClientResult<CsrFiles> {
    let key_pair = KeyPairGenerator::generate(config.key_size)?;
    let output = CsrBuilder::from_config(config).build_csr(&key_pair, subject)?;

    fs::create_dir_all(out_dir)?;
    let files = CsrFiles {
        private_key: out_dir.join(PRIVATE_KEY_FILE),
        csr: out_dir.join(CSR_FILE),
    };

    write_secret(&files.private_key, output.private_key_pem.as_bytes())?;
    fs::write(&files.csr, output.csr_pem.as_bytes())?;

    info!("CSR已写入: {}", files.csr.display());
    Ok(files)
}

/// 将私钥与签发的证书链打包为 PKCS#12 归档
///
/// # 返回值
///
/// 重新打开写入的归档得到的摘要
pub fn build_archive(
    config: &ProvisioningConfig,
    key_path: &Path,
    chain_path: &Path,
    out_path: &Path,
    passphrase: Option<&str>,
) -> ClientResult<ArchiveSummary> {
    let key_pem = fs::read_to_string(key_path)?;
    let chain = fs::read(chain_path)?;

    let archive = PkcsArchiveBuilder::from_config(config).build_archive(&key_pem, &chain, passphrase)?;
    write_secret(out_path, &archive)?;
    info!("PKCS#12归档已写入: {}", out_path.display());

    Ok(PkcsArchive::inspect(&archive, passphrase)?)
}

/// 查看 PKCS#12 归档内容
pub fn inspect_archive(path: &Path, passphrase: Option<&str>) -> ClientResult<ArchiveSummary> {
    let archive = fs::read(path)?;
    Ok(PkcsArchive::inspect(&archive, passphrase)?)
}

/// 根据应用配置创建网关客户端
pub fn client_from_config(config: &AppConfig) -> ClientResult<SwishClient> {
    config.validate()?;
    let merchant_id = config.require_merchant_id()?;
    let archive_path = config
        .archive_path
        .as_ref()
        .ok_or_else(|| ClientError::Config("未配置归档路径 archive_path".to_string()))?;

    let archive = fs::read(archive_path)?;
    let passphrase = config.archive_passphrase();
    let resolver = CertificateChainResolver::from_config(&config.provisioning.to_provisioning_config()?);
    SwishClient::from_archive_with_resolver(
        config.resolved_base_url()?,
        &archive,
        passphrase.as_deref(),
        merchant_id,
        &config.transport,
        &resolver,
    )
}

/// 查询支付状态
pub async fn payment_status(config: &AppConfig, id: &str) -> ClientResult<PaymentStatus> {
    client_from_config(config)?.payment_status(id).await
}

/// 查询退款状态
pub async fn refund_status(config: &AppConfig, id: &str) -> ClientResult<RefundStatus> {
    client_from_config(config)?.refund_status(id).await
}

fn write_secret(path: &Path, contents: &[u8]) -> ClientResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;

    // 只有所有者可读写
    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}
