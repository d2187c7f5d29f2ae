//! # Swish 命令行工具
//!
//! 商户证书开通与网关状态查询

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swish::commands;
use swish::{AppConfig, ClientResult};

#[derive(Parser)]
#[command(name = "swish", version, about = "Swish 商户证书开通与网关客户端")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 生成 RSA 密钥对与证书签名请求
    GenerateCsr {
        /// 证书主题，例如 "CN=1231181189, C=SE"
        subject: String,
        /// 输出目录
        out_dir: PathBuf,
        /// RSA 密钥长度，默认取自配置
        bits: Option<u32>,
    },
    /// 将私钥与签发的证书链打包为 PKCS#12 归档
    BuildArchive {
        key: PathBuf,
        chain: PathBuf,
        out: PathBuf,
        passphrase: Option<String>,
    },
    /// 查看 PKCS#12 归档内容
    Inspect {
        archive: PathBuf,
        passphrase: Option<String>,
    },
    /// 查询支付状态
    PaymentStatus { id: String },
    /// 查询退款状态
    RefundStatus { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("命令执行失败（错误码 {}）: {}", e.code(), e);
        return Err(e.into());
    }
    Ok(())
}

async fn run(command: Command, config: &AppConfig) -> ClientResult<()> {
    match command {
        Command::GenerateCsr { subject, out_dir, bits } => {
            let mut settings = config.provisioning.clone();
            if let Some(bits) = bits {
                settings.key_bits = bits;
            }
            let files = commands::generate_csr(&settings.to_provisioning_config()?, &subject, &out_dir)?;
            println!("私钥: {}", files.private_key.display());
            println!("CSR: {}", files.csr.display());
        }
        Command::BuildArchive {
            key,
            chain,
            out,
            passphrase,
        } => {
            let provisioning = config.provisioning.to_provisioning_config()?;
            let summary = commands::build_archive(&provisioning, &key, &chain, &out, passphrase.as_deref())?;
            println!("归档: {}（{} 个证书）", out.display(), summary.certificate_count);
        }
        Command::Inspect { archive, passphrase } => {
            let summary = commands::inspect_archive(&archive, passphrase.as_deref())?;
            println!("私钥条目: {}", summary.key_entries);
            println!("友好名称: {}", summary.friendly_name.as_deref().unwrap_or("-"));
            for (index, subject) in summary.subjects.iter().enumerate() {
                println!("证书 {}: {}", index, subject);
            }
        }
        Command::PaymentStatus { id } => {
            let status = commands::payment_status(config, &id).await?;
            println!("{:#?}", status);
        }
        Command::RefundStatus { id } => {
            let status = commands::refund_status(config, &id).await?;
            println!("{:#?}", status);
        }
    }
    Ok(())
}
