//! # 错误代码模块测试
//!
//! 测试错误代码常量的正确性和一致性

use swish_transport::error_codes::*;
use swish_transport::{DomainErrorOutcome, ResponseError, TransportError};

#[test]
fn test_error_codes_uniqueness() {
    let codes = vec![
        identity::EMPTY_CERTIFICATE_CHAIN,
        identity::INVALID_IDENTITY,
        tls::PROTOCOL_VERSIONS_FAILED,
        tls::INVALID_TRUST_ANCHOR,
        tls::CONFIG_FAILED,
        http::CLIENT_BUILD_FAILED,
        response::DOMAIN_OUTCOME,
        response::DECODE_FAILED,
        config::INVALID_TRANSPORT_CONFIG,
        config::MISSING_TRUST_ANCHOR,
    ];

    for i in 0..codes.len() {
        for j in (i + 1)..codes.len() {
            assert_ne!(
                codes[i], codes[j],
                "错误代码不应重复: {} == {}",
                codes[i], codes[j]
            );
        }
    }
}

#[test]
fn test_error_code_ranges() {
    // 身份错误代码应在 7001-7099 范围内
    assert!((7001..7100).contains(&identity::INVALID_IDENTITY));
    // TLS 错误代码应在 7101-7199 范围内
    assert!((7101..7200).contains(&tls::CONFIG_FAILED));
    // 响应错误代码应在 7301-7399 范围内
    assert!((7301..7400).contains(&response::DECODE_FAILED));
}

#[test]
fn test_errors_map_to_codes() {
    assert_eq!(
        TransportError::EmptyCertificateChain.code(),
        identity::EMPTY_CERTIFICATE_CHAIN
    );
    assert_eq!(
        TransportError::HttpClient(String::new()).code(),
        http::CLIENT_BUILD_FAILED
    );
    assert_eq!(
        ResponseError::Domain(DomainErrorOutcome::new("401", "authentication/certificate problem")).code(),
        response::DOMAIN_OUTCOME
    );
}
