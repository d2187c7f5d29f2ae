//! # PKCS#12 归档
//!
//! 将 PEM 私钥与证书链打包为 PKCS#12 归档，并提供归档的重新导入与摘要查看。
//!
//! ## 私钥条目绑定
//!
//! 私钥绑定的证书由 [`LeafSelection`] 决定。默认按公钥匹配选择叶子证书，
//! 输入证书的顺序不影响结果；[`LeafSelection::FirstInChain`] 保留按位置选择的方式，
//! 仅适用于叶子在前的输入。

use crate::config::{LeafSelection, ProvisioningConfig};
use crate::error::{IdentityError, IdentityResult};
use crate::keypair::AsymmetricKeyPair;
use crate::types::{certificate_subject, ArchiveSummary, ImportedCertificate, ImportedIdentity};
use p12_keystore::{Certificate, EncryptionAlgorithm, KeyStore, KeyStoreEntry, MacAlgorithm, PrivateKeyChain};
use rustls::pki_types::CertificateDer;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use x509_parser::prelude::{FromDer, X509Certificate};

const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";
const PEM_MARKER: &[u8] = b"-----BEGIN";

/// 解析证书链
///
/// 输入可以是包含一个或多个 `CERTIFICATE` 块的 PEM 文本，也可以是一张或多张首尾相接的 DER 证书。
/// 空输入返回空列表，DER 输入末尾的多余字节视为解析失败。
pub fn parse_certificate_chain(input: &[u8]) -> IdentityResult<Vec<CertificateDer<'static>>> {
    if input.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let certificates: Vec<CertificateDer<'static>> = if input
        .windows(PEM_MARKER.len())
        .any(|window| window == PEM_MARKER)
    {
        let certificates = pem::parse_many(input)
            .map_err(|e| IdentityError::CertificateParse(format!("PEM解析失败: {}", e)))?
            .into_iter()
            .filter(|block| block.tag() == CERTIFICATE_PEM_TAG)
            .map(|block| CertificateDer::from(block.into_contents()))
            .collect::<Vec<_>>();

        for certificate in &certificates {
            X509Certificate::from_der(certificate.as_ref())
                .map_err(|e| IdentityError::CertificateParse(e.to_string()))?;
        }
        certificates
    } else {
        split_der_certificates(input)?
    };

    debug!("解析到{}张证书", certificates.len());
    Ok(certificates)
}

fn split_der_certificates(input: &[u8]) -> IdentityResult<Vec<CertificateDer<'static>>> {
    let mut certificates = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let (remainder, _) = X509Certificate::from_der(rest).map_err(|e| {
            IdentityError::CertificateParse(format!(
                "第{}张DER证书解析失败: {}",
                certificates.len() + 1,
                e
            ))
        })?;
        let consumed = rest.len() - remainder.len();
        certificates.push(CertificateDer::from(rest[..consumed].to_vec()));
        rest = remainder;
    }

    Ok(certificates)
}

/// 从绑定私钥的证书出发，按颁发者逐级排出证书链
///
/// 返回 (链内证书下标, 链外证书下标)。链在自签名证书处或找不到颁发者时结束。
fn order_chain(
    certificates: &[CertificateDer<'static>],
    keyed_index: usize,
) -> IdentityResult<(Vec<usize>, Vec<usize>)> {
    let parsed = certificates
        .iter()
        .map(|der| {
            X509Certificate::from_der(der.as_ref())
                .map(|(_, certificate)| certificate)
                .map_err(|e| IdentityError::ArchiveBuild(e.to_string()))
        })
        .collect::<IdentityResult<Vec<_>>>()?;

    let mut chain = vec![keyed_index];
    let mut current = keyed_index;
    while parsed[current].subject().as_raw() != parsed[current].issuer().as_raw() {
        let issuer = parsed[current].issuer().as_raw();
        let next = (0..parsed.len())
            .find(|index| !chain.contains(index) && parsed[*index].subject().as_raw() == issuer);
        match next {
            Some(index) => {
                chain.push(index);
                current = index;
            }
            None => break,
        }
    }

    let detached = (0..certificates.len()).filter(|index| !chain.contains(index)).collect();
    Ok((chain, detached))
}

fn unique_alias(store: &KeyStore, base: &str) -> String {
    let mut alias = base.to_string();
    let mut suffix = 2;
    while store.entry(&alias).is_some() {
        alias = format!("{} #{}", base, suffix);
        suffix += 1;
    }
    alias
}

/// PKCS#12 归档构建器
#[derive(Debug, Clone, Default)]
pub struct PkcsArchiveBuilder {
    leaf_selection: LeafSelection,
}

impl PkcsArchiveBuilder {
    /// 使用默认绑定策略创建构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据开通配置创建构建器
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self {
            leaf_selection: config.leaf_selection,
        }
    }

    /// 设置私钥条目绑定策略
    pub fn with_leaf_selection(mut self, selection: LeafSelection) -> Self {
        self.leaf_selection = selection;
        self
    }

    /// 构建 PKCS#12 归档
    ///
    /// 证书包与私钥包使用 PBES2 (PBKDF2-HMAC-SHA256, AES-256-CBC) 加密，完整性 MAC 使用 HMAC-SHA256。
    ///
    /// # 参数
    ///
    /// * `private_key_pem` - PKCS#1 或 PKCS#8 PEM 私钥
    /// * `certificate_chain` - PEM 或 DER 证书链
    /// * `passphrase` - 归档口令，`None` 或空字符串生成空口令归档
    ///
    /// # 返回值
    ///
    /// 返回 DER 编码的 PKCS#12 归档
    pub fn build_archive(
        &self,
        private_key_pem: &str,
        certificate_chain: &[u8],
        passphrase: Option<&str>,
    ) -> IdentityResult<Vec<u8>> {
        let certificates = parse_certificate_chain(certificate_chain)
            .map_err(|e| IdentityError::ArchiveBuild(e.to_string()))?;
        if certificates.is_empty() {
            return Err(IdentityError::ArchiveBuild("证书链为空".to_string()));
        }

        let key_pair = AsymmetricKeyPair::from_private_key_pem(private_key_pem)
            .map_err(|e| IdentityError::ArchiveBuild(format!("未找到可用私钥: {}", e)))?;

        let keyed_index = self.select_keyed_certificate(&key_pair, &certificates)?;
        let keyed = &certificates[keyed_index];
        let alias = certificate_subject(keyed.as_ref())
            .map_err(|e| IdentityError::ArchiveBuild(e.to_string()))?;

        info!(
            "构建PKCS#12归档: {}，证书数量: {}",
            alias,
            certificates.len()
        );

        let (chain, detached) = order_chain(&certificates, keyed_index)?;
        let to_entry = |index: usize| {
            Certificate::from_der(certificates[index].as_ref())
                .map_err(|e| IdentityError::ArchiveBuild(format!("证书转换失败: {}", e)))
        };

        let pkcs8 = key_pair
            .to_pkcs8_der()
            .map_err(|e| IdentityError::ArchiveBuild(e.to_string()))?;
        let local_key_id = Sha256::digest(keyed.as_ref()).to_vec();
        let chain_entries = chain
            .iter()
            .map(|index| to_entry(*index))
            .collect::<IdentityResult<Vec<_>>>()?;
        let key_chain = PrivateKeyChain::new(&pkcs8, local_key_id, chain_entries);

        let mut store = KeyStore::new();
        store.add_entry(&alias, KeyStoreEntry::PrivateKeyChain(key_chain));

        // 不在颁发链上的证书单独存为证书条目
        for index in detached {
            let subject = certificate_subject(certificates[index].as_ref())
                .map_err(|e| IdentityError::ArchiveBuild(e.to_string()))?;
            let entry_alias = unique_alias(&store, &subject);
            debug!("证书不在颁发链上，单独存储: {}", entry_alias);
            store.add_entry(&entry_alias, KeyStoreEntry::Certificate(to_entry(index)?));
        }

        let archive = store
            .writer(passphrase.unwrap_or_default())
            .encryption_algorithm(EncryptionAlgorithm::PbeWithHmacSha256AndAes256)
            .mac_algorithm(MacAlgorithm::HmacSha256)
            .write()
            .map_err(|e| IdentityError::ArchiveBuild(format!("归档序列化失败: {}", e)))?;

        debug!("PKCS#12归档构建完成，链长度: {}", chain.len());
        Ok(archive)
    }

    fn select_keyed_certificate(
        &self,
        key_pair: &AsymmetricKeyPair,
        certificates: &[CertificateDer<'static>],
    ) -> IdentityResult<usize> {
        let matching = certificates
            .iter()
            .position(|der| key_pair.matches_certificate_der(der.as_ref()))
            .ok_or_else(|| IdentityError::ArchiveBuild("没有与私钥匹配的证书".to_string()))?;

        match self.leaf_selection {
            LeafSelection::MatchPrivateKey => Ok(matching),
            LeafSelection::FirstInChain => {
                if matching != 0 {
                    warn!("第一张证书与私钥不匹配，私钥将绑定到非叶子证书");
                }
                Ok(0)
            }
        }
    }
}

/// PKCS#12 归档读取
pub struct PkcsArchive;

impl PkcsArchive {
    /// 打开 PKCS#12 归档
    ///
    /// 校验 MAC，要求恰好一个私钥条目，并把与私钥匹配的证书标记为 `has_private_key`。
    /// 支持 PBES2/AES 与 SHA-256 MAC 的现代归档，也能读取 RC2/3DES 加密的旧式归档。
    pub fn open(archive: &[u8], passphrase: Option<&str>) -> IdentityResult<ImportedIdentity> {
        let password = passphrase.unwrap_or_default();
        let store = KeyStore::from_pkcs12(archive, password)
            .map_err(|e| IdentityError::ArchiveOpen(format!("归档解析失败，口令错误或归档已损坏: {}", e)))?;

        let mut key_chains = Vec::new();
        let mut detached = Vec::new();
        for (alias, entry) in store.entries() {
            match entry {
                KeyStoreEntry::PrivateKeyChain(chain) => key_chains.push((alias, chain)),
                KeyStoreEntry::Certificate(certificate) => detached.push(certificate),
                KeyStoreEntry::Secret(_) => debug!("忽略密钥条目: {}", alias),
            }
        }

        if key_chains.len() != 1 {
            return Err(IdentityError::ArchiveOpen(format!(
                "归档必须恰好包含一个私钥条目，实际为{}",
                key_chains.len()
            )));
        }
        let (alias, key_chain) = key_chains.remove(0);

        let private_key_der = key_chain.key().to_vec();
        let key_pair = AsymmetricKeyPair::from_pkcs8_der(&private_key_der)
            .map_err(|e| IdentityError::ArchiveOpen(e.to_string()))?;

        let certificates = key_chain
            .chain()
            .iter()
            .chain(detached)
            .map(|certificate| {
                let der = CertificateDer::from(certificate.as_der().to_vec());
                if key_pair.matches_certificate_der(der.as_ref()) {
                    ImportedCertificate::with_private_key(der)
                } else {
                    ImportedCertificate::new(der)
                }
            })
            .collect::<Vec<_>>();

        info!(
            "打开PKCS#12归档: 证书数量 {}，友好名称 {}",
            certificates.len(),
            alias
        );

        Ok(ImportedIdentity {
            certificates,
            private_key_der,
            friendly_name: Some(alias.clone()),
        })
    }

    /// 查看归档摘要
    pub fn inspect(archive: &[u8], passphrase: Option<&str>) -> IdentityResult<ArchiveSummary> {
        let identity = Self::open(archive, passphrase)?;
        let subjects = identity
            .certificates
            .iter()
            .map(ImportedCertificate::subject)
            .collect::<IdentityResult<Vec<_>>>()?;

        Ok(ArchiveSummary {
            key_entries: 1,
            certificate_count: identity.certificates.len(),
            friendly_name: identity.friendly_name,
            subjects,
        })
    }
}
