//! 单元测试共用的密钥与证书链

use crate::keypair::{AsymmetricKeyPair, KeyPairGenerator};
use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, Issuer, KeyPair};
use rustls::pki_types::CertificateDer;
use std::sync::OnceLock;

/// 共享的 2048 位密钥对
pub(crate) fn shared_key_pair() -> &'static AsymmetricKeyPair {
    static KEY: OnceLock<AsymmetricKeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPairGenerator::generate(2048).unwrap())
}

/// 另一把与 [`shared_key_pair`] 不同的密钥对
pub(crate) fn other_key_pair() -> &'static AsymmetricKeyPair {
    static KEY: OnceLock<AsymmetricKeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPairGenerator::generate(2048).unwrap())
}

/// 根证书 → 中间证书 → 叶子证书
pub(crate) struct MintedChain {
    pub root: CertificateDer<'static>,
    pub intermediate: CertificateDer<'static>,
    pub leaf: CertificateDer<'static>,
}

impl MintedChain {
    /// 叶子在前的 PEM 文本
    pub fn leaf_first_pem(&self) -> String {
        to_pem(&[&self.leaf, &self.intermediate, &self.root])
    }

    /// 根证书在前的 PEM 文本
    pub fn root_first_pem(&self) -> String {
        to_pem(&[&self.root, &self.intermediate, &self.leaf])
    }
}

fn name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::CountryName, "SE");
    dn
}

fn ca_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name = name(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

/// 为给定叶子密钥签发一条三级证书链
pub(crate) fn mint_chain(leaf_key: &AsymmetricKeyPair) -> MintedChain {
    let root_key = KeyPair::generate().unwrap();
    let root_params = ca_params("Test Root CA");
    let root = root_params.self_signed(&root_key).unwrap();
    let root_issuer = Issuer::new(root_params, &root_key);

    let intermediate_key = KeyPair::generate().unwrap();
    let intermediate_params = ca_params("Test Intermediate CA");
    let intermediate = intermediate_params
        .signed_by(&intermediate_key, &root_issuer)
        .unwrap();
    let intermediate_issuer = Issuer::new(intermediate_params, &intermediate_key);

    let mut leaf_params = CertificateParams::new(vec!["merchant.example".to_string()]).unwrap();
    leaf_params.distinguished_name = name("1231181189");
    let leaf_signing_key = leaf_key.to_rcgen_key_pair(&rcgen::PKCS_RSA_SHA256).unwrap();
    let leaf = leaf_params
        .signed_by(&leaf_signing_key, &intermediate_issuer)
        .unwrap();

    MintedChain {
        root: root.der().clone(),
        intermediate: intermediate.der().clone(),
        leaf: leaf.der().clone(),
    }
}

/// 为给定密钥签发自签名证书
pub(crate) fn self_signed(key: &AsymmetricKeyPair, common_name: &str) -> CertificateDer<'static> {
    let mut params = CertificateParams::default();
    params.distinguished_name = name(common_name);
    let signing_key = key.to_rcgen_key_pair(&rcgen::PKCS_RSA_SHA256).unwrap();
    params.self_signed(&signing_key).unwrap().der().clone()
}

/// 将多张 DER 证书编码为 PEM 文本
pub(crate) fn to_pem(certificates: &[&CertificateDer<'static>]) -> String {
    certificates
        .iter()
        .map(|der| pem::encode(&pem::Pem::new("CERTIFICATE", der.to_vec())))
        .collect()
}
