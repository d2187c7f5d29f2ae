//! # 证书主题解析
//!
//! 解析 `CN=Merchant, C=NL` 形式的主题字符串，保留属性顺序。

use crate::error::{IdentityError, IdentityResult};
use rcgen::{DistinguishedName, DnType};
use std::fmt;
use std::str::FromStr;

/// 主题属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectAttribute {
    /// 通用名称
    CommonName,
    /// 国家（两位字母代码）
    Country,
    /// 组织
    Organization,
    /// 组织单位
    OrganizationalUnit,
    /// 地区
    Locality,
    /// 州或省
    StateOrProvince,
}

impl SubjectAttribute {
    /// 属性短名称
    pub fn short_name(&self) -> &'static str {
        match self {
            SubjectAttribute::CommonName => "CN",
            SubjectAttribute::Country => "C",
            SubjectAttribute::Organization => "O",
            SubjectAttribute::OrganizationalUnit => "OU",
            SubjectAttribute::Locality => "L",
            SubjectAttribute::StateOrProvince => "ST",
        }
    }

    fn dn_type(&self) -> DnType {
        match self {
            SubjectAttribute::CommonName => DnType::CommonName,
            SubjectAttribute::Country => DnType::CountryName,
            SubjectAttribute::Organization => DnType::OrganizationName,
            SubjectAttribute::OrganizationalUnit => DnType::OrganizationalUnitName,
            SubjectAttribute::Locality => DnType::LocalityName,
            SubjectAttribute::StateOrProvince => DnType::StateOrProvinceName,
        }
    }
}

impl FromStr for SubjectAttribute {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CN" => Ok(SubjectAttribute::CommonName),
            "C" => Ok(SubjectAttribute::Country),
            "O" => Ok(SubjectAttribute::Organization),
            "OU" => Ok(SubjectAttribute::OrganizationalUnit),
            "L" => Ok(SubjectAttribute::Locality),
            "ST" => Ok(SubjectAttribute::StateOrProvince),
            other => Err(IdentityError::InvalidSubject(format!("未知的主题属性: {}", other))),
        }
    }
}

/// 已解析的证书主题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectName {
    attributes: Vec<(SubjectAttribute, String)>,
}

impl SubjectName {
    /// 解析主题字符串
    ///
    /// # 参数
    ///
    /// * `subject` - 逗号分隔的 `KEY=value` 列表，键不区分大小写
    ///
    /// # 返回值
    ///
    /// 返回按输入顺序排列的主题属性
    pub fn parse(subject: &str) -> IdentityResult<Self> {
        if subject.trim().is_empty() {
            return Err(IdentityError::InvalidSubject("主题不能为空".to_string()));
        }

        let mut attributes: Vec<(SubjectAttribute, String)> = Vec::new();
        for part in subject.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| IdentityError::InvalidSubject(format!("缺少'=': {}", part.trim())))?;

            let attribute: SubjectAttribute = key.trim().parse()?;
            let value = value.trim();
            if value.is_empty() {
                return Err(IdentityError::InvalidSubject(format!(
                    "属性{}的值为空",
                    attribute.short_name()
                )));
            }

            if attribute == SubjectAttribute::Country
                && !(value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()))
            {
                return Err(IdentityError::InvalidSubject(format!(
                    "国家代码必须是两位字母: {}",
                    value
                )));
            }

            if attributes.iter().any(|(existing, _)| *existing == attribute) {
                return Err(IdentityError::InvalidSubject(format!(
                    "重复的主题属性: {}",
                    attribute.short_name()
                )));
            }

            attributes.push((attribute, value.to_string()));
        }

        Ok(Self { attributes })
    }

    /// 属性列表
    pub fn attributes(&self) -> &[(SubjectAttribute, String)] {
        &self.attributes
    }

    /// 通用名称
    pub fn common_name(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attribute, _)| *attribute == SubjectAttribute::CommonName)
            .map(|(_, value)| value.as_str())
    }

    /// 转换为 rcgen 可分辨名称
    pub fn to_distinguished_name(&self) -> DistinguishedName {
        let mut name = DistinguishedName::new();
        for (attribute, value) in &self.attributes {
            name.push(attribute.dn_type(), value.as_str());
        }
        name
    }
}

impl FromStr for SubjectName {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .attributes
            .iter()
            .map(|(attribute, value)| format!("{}={}", attribute.short_name(), value))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}
