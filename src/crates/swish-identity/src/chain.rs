//! # 证书链解析
//!
//! 从导入的证书集合中区分叶子证书与颁发机构证书，沿颁发者链接向上遍历，
//! 确定信任锚。发现的颁发机构证书作为结果返回，由传输层在握手时作为附加证书出示，
//! 不写入任何全局信任存储。

use crate::config::{ProvisioningConfig, MAX_CHAIN_DEPTH_LIMIT};
use crate::types::{ImportedCertificate, ResolvedChain};
use rustls::pki_types::CertificateDer;
use tracing::{debug, info, warn};
use x509_parser::prelude::{FromDer, X509Certificate};

/// 证书链解析器
#[derive(Debug, Clone)]
pub struct CertificateChainResolver {
    max_depth: u8,
}

impl Default for CertificateChainResolver {
    fn default() -> Self {
        Self {
            max_depth: MAX_CHAIN_DEPTH_LIMIT,
        }
    }
}

impl CertificateChainResolver {
    /// 使用默认深度创建解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据开通配置创建解析器
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self::default().with_max_depth(config.max_chain_depth)
    }

    /// 设置最大遍历深度（颁发机构证书数量上限）
    pub fn with_max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth.clamp(1, MAX_CHAIN_DEPTH_LIMIT);
        self
    }

    /// 解析信任锚
    ///
    /// 没有与私钥关联的证书或找不到任何颁发者时返回 `None`。
    pub fn resolve_trust_anchor(&self, certificates: &[ImportedCertificate]) -> Option<CertificateDer<'static>> {
        self.resolve(certificates).map(|resolved| resolved.anchor)
    }

    /// 解析完整证书路径
    ///
    /// # 参数
    ///
    /// * `certificates` - 导入的证书集合，顺序任意
    ///
    /// # 返回值
    ///
    /// 返回叶子证书、依次向上的颁发机构证书和信任锚
    pub fn resolve(&self, certificates: &[ImportedCertificate]) -> Option<ResolvedChain> {
        let Some(seed) = certificates.iter().find(|cert| cert.has_private_key) else {
            warn!("证书链解析失败: 没有与私钥关联的证书");
            return None;
        };

        let (_, leaf) = match X509Certificate::from_der(seed.der.as_ref()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("证书链解析失败: 叶子证书无法解析: {}", e);
                return None;
            }
        };

        let pool: Vec<(&CertificateDer<'static>, X509Certificate<'_>)> = certificates
            .iter()
            .filter(|cert| !cert.has_private_key)
            .filter_map(|cert| match X509Certificate::from_der(cert.der.as_ref()) {
                Ok((_, parsed)) => Some((&cert.der, parsed)),
                Err(e) => {
                    debug!("跳过无法解析的证书: {}", e);
                    None
                }
            })
            .collect();

        let mut used = vec![false; pool.len()];
        let mut authorities: Vec<CertificateDer<'static>> = Vec::new();
        let mut current = &leaf;

        while authorities.len() < self.max_depth as usize {
            if is_self_signed(current) {
                debug!("到达自签名证书: {}", current.subject());
                break;
            }

            let next = pool.iter().enumerate().find(|(index, (_, candidate))| {
                !used[*index]
                    && candidate.subject().as_raw() == current.issuer().as_raw()
                    && current.verify_signature(Some(candidate.public_key())).is_ok()
            });

            match next {
                Some((index, (der, candidate))) => {
                    debug!("找到颁发者: {}", candidate.subject());
                    used[index] = true;
                    authorities.push((*der).clone());
                    current = candidate;
                }
                None => {
                    debug!("未找到{}的颁发者", current.subject());
                    break;
                }
            }
        }

        let Some(anchor) = authorities.last().cloned() else {
            warn!("证书链解析失败: 未找到任何颁发机构证书");
            return None;
        };

        info!(
            "证书链解析完成: 颁发机构数量 {}，信任锚 {}",
            authorities.len(),
            current.subject()
        );

        Some(ResolvedChain {
            leaf: seed.der.clone(),
            authorities,
            anchor,
        })
    }
}

fn is_self_signed(certificate: &X509Certificate<'_>) -> bool {
    certificate.subject().as_raw() == certificate.issuer().as_raw()
        && certificate.verify_signature(None).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mint_chain, other_key_pair, self_signed, shared_key_pair};
    use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};

    fn imported(minted: &crate::test_support::MintedChain) -> Vec<ImportedCertificate> {
        vec![
            ImportedCertificate::new(minted.root.clone()),
            ImportedCertificate::with_private_key(minted.leaf.clone()),
            ImportedCertificate::new(minted.intermediate.clone()),
        ]
    }

    #[test]
    fn test_no_key_bearing_certificate_returns_none() {
        let minted = mint_chain(shared_key_pair());
        let certificates = vec![
            ImportedCertificate::new(minted.leaf.clone()),
            ImportedCertificate::new(minted.root.clone()),
        ];
        assert!(CertificateChainResolver::new().resolve_trust_anchor(&certificates).is_none());
        assert!(CertificateChainResolver::new().resolve_trust_anchor(&[]).is_none());
    }

    #[test]
    fn test_resolves_full_path_in_any_order() {
        let minted = mint_chain(shared_key_pair());
        let resolved = CertificateChainResolver::new().resolve(&imported(&minted)).unwrap();

        assert_eq!(resolved.leaf, minted.leaf);
        assert_eq!(resolved.authorities, vec![minted.intermediate.clone(), minted.root.clone()]);
        assert_eq!(resolved.anchor, minted.root);
    }

    #[test]
    fn test_stops_when_issuer_missing() {
        let minted = mint_chain(shared_key_pair());
        let certificates = vec![
            ImportedCertificate::with_private_key(minted.leaf.clone()),
            ImportedCertificate::new(minted.intermediate.clone()),
        ];
        let anchor = CertificateChainResolver::new().resolve_trust_anchor(&certificates);
        assert_eq!(anchor, Some(minted.intermediate));
    }

    #[test]
    fn test_leaf_without_authorities_returns_none() {
        let leaf = self_signed(shared_key_pair(), "Lonely");
        let certificates = vec![ImportedCertificate::with_private_key(leaf)];
        assert!(CertificateChainResolver::new().resolve(&certificates).is_none());
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let minted = mint_chain(shared_key_pair());
        let resolved = CertificateChainResolver::new()
            .with_max_depth(1)
            .resolve(&imported(&minted))
            .unwrap();
        assert_eq!(resolved.authorities, vec![minted.intermediate.clone()]);
        assert_eq!(resolved.anchor, minted.intermediate);
    }

    #[test]
    fn test_ignores_unrelated_and_impostor_certificates() {
        let minted = mint_chain(shared_key_pair());

        // 与中间证书同名但密钥不同
        let impostor_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "Test Intermediate CA");
        dn.push(DnType::CountryName, "SE");
        params.distinguished_name = dn;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let impostor = params.self_signed(&impostor_key).unwrap().der().clone();

        let certificates = vec![
            ImportedCertificate::new(impostor),
            ImportedCertificate::new(self_signed(other_key_pair(), "Unrelated")),
            ImportedCertificate::with_private_key(minted.leaf.clone()),
            ImportedCertificate::new(minted.intermediate.clone()),
            ImportedCertificate::new(minted.root.clone()),
        ];

        let resolved = CertificateChainResolver::new().resolve(&certificates).unwrap();
        assert_eq!(resolved.authorities, vec![minted.intermediate.clone(), minted.root.clone()]);
    }
}
