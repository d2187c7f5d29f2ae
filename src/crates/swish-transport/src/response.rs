//! # 响应错误映射
//!
//! 将一次完成的 HTTP 交换（状态码与响应体）映射为成功的类型化结果或类型化的业务错误。
//! 映射对所有状态码都有定义，结构无效的响应体一律视为解码错误。

use crate::error_codes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// 网关返回的业务错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainErrorOutcome {
    /// 错误代码（HTTP 状态码字符串或网关校验错误代码，例如 `RP06`）
    pub code: String,

    /// 错误描述
    pub message: String,

    /// 网关提供的附加信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<String>,
}

impl DomainErrorOutcome {
    /// 创建业务错误
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            additional_information: None,
        }
    }
}

/// 响应映射错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// 网关返回业务错误
    #[error("网关错误 {}: {}", .0.code, .0.message)]
    Domain(DomainErrorOutcome),

    /// 响应体无法解码
    #[error("响应解码失败（状态码 {status}）: {reason}")]
    Decode {
        /// HTTP 状态码
        status: u16,
        /// 失败原因
        reason: String,
    },
}

impl ResponseError {
    /// 获取错误码
    pub fn code(&self) -> u32 {
        match self {
            ResponseError::Domain(_) => error_codes::response::DOMAIN_OUTCOME,
            ResponseError::Decode { .. } => error_codes::response::DECODE_FAILED,
        }
    }

    /// 业务错误（解码错误时为 `None`）
    pub fn outcome(&self) -> Option<&DomainErrorOutcome> {
        match self {
            ResponseError::Domain(outcome) => Some(outcome),
            ResponseError::Decode { .. } => None,
        }
    }
}

/// 422 响应中的单个校验错误对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayValidationError {
    /// 校验错误代码
    pub error_code: String,

    /// 校验错误描述
    pub error_message: String,

    /// 附加信息
    #[serde(default)]
    pub additional_information: Option<String>,
}

/// 映射响应并解码成功负载
///
/// # 参数
///
/// * `status` - HTTP 状态码
/// * `body` - 响应体
///
/// # 返回值
///
/// 200/201 时返回解码后的负载，其余状态码返回对应的业务错误
pub fn map_response<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ResponseError> {
    match status {
        200 | 201 => serde_json::from_slice(body).map_err(|e| {
            warn!("响应体解码失败: 状态码 {}，{}", status, e);
            ResponseError::Decode {
                status,
                reason: e.to_string(),
            }
        }),
        _ => Err(error_for_status(status, body)),
    }
}

/// 检查仅含响应头的成功响应（例如带 Location 头的 201 Created）
pub fn check_status(status: u16, body: &[u8]) -> Result<(), ResponseError> {
    match status {
        200 | 201 => Ok(()),
        _ => Err(error_for_status(status, body)),
    }
}

fn error_for_status(status: u16, body: &[u8]) -> ResponseError {
    let message = match status {
        400 => "malformed request",
        401 => "authentication/certificate problem",
        403 => "identity mismatch",
        404 => "resource not found",
        415 => "unsupported content type",
        422 => return validation_error(body),
        500 => "server fault",
        _ => "unknown status code",
    };

    debug!("网关返回状态码 {}: {}", status, message);
    ResponseError::Domain(DomainErrorOutcome::new(status.to_string(), message))
}

fn validation_error(body: &[u8]) -> ResponseError {
    let errors: Vec<GatewayValidationError> = match serde_json::from_slice(body) {
        Ok(errors) => errors,
        Err(e) => {
            warn!("422响应体解码失败: {}", e);
            return ResponseError::Decode {
                status: 422,
                reason: e.to_string(),
            };
        }
    };

    match errors.into_iter().next() {
        Some(first) => {
            debug!("网关校验错误: {}", first.error_code);
            ResponseError::Domain(DomainErrorOutcome {
                code: first.error_code,
                message: first.error_message,
                additional_information: first.additional_information,
            })
        }
        None => ResponseError::Decode {
            status: 422,
            reason: "校验错误列表为空".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        id: String,
        amount: f64,
    }

    #[test]
    fn test_fixed_status_codes() {
        let cases = [
            (400, "malformed request"),
            (401, "authentication/certificate problem"),
            (403, "identity mismatch"),
            (404, "resource not found"),
            (415, "unsupported content type"),
            (500, "server fault"),
        ];

        for (status, message) in cases {
            let err = map_response::<Payload>(status, b"{\"ignored\": true}").unwrap_err();
            assert_eq!(err, ResponseError::Domain(DomainErrorOutcome::new(status.to_string(), message)));
        }
    }

    #[test]
    fn test_401_ignores_body() {
        for body in [&b""[..], b"not json", b"[]", b"{\"errorCode\":\"X\"}"] {
            let err = map_response::<Payload>(401, body).unwrap_err();
            assert_eq!(err.outcome().map(|o| o.code.as_str()), Some("401"));
        }
    }

    #[test]
    fn test_success_decodes_payload() {
        let payload: Payload = map_response(201, br#"{"id":"AB23","amount":100.0}"#).unwrap();
        assert_eq!(
            payload,
            Payload {
                id: "AB23".to_string(),
                amount: 100.0
            }
        );
    }

    #[test]
    fn test_success_with_invalid_body_is_decode_error() {
        let err = map_response::<Payload>(201, b"not json").unwrap_err();
        assert!(matches!(err, ResponseError::Decode { status: 201, .. }));
        assert_eq!(err.code(), error_codes::response::DECODE_FAILED);

        let err = map_response::<Payload>(200, br#"{"id": 5}"#).unwrap_err();
        assert!(matches!(err, ResponseError::Decode { status: 200, .. }));
    }

    #[test]
    fn test_validation_error_takes_first_element() {
        let body = br#"[
            {"errorCode":"RP06","errorMessage":"A payment request already exist for that payer","additionalInformation":null},
            {"errorCode":"AM02","errorMessage":"Amount value is too large"}
        ]"#;
        let err = map_response::<Payload>(422, body).unwrap_err();
        let outcome = err.outcome().unwrap();
        assert_eq!(outcome.code, "RP06");
        assert!(outcome.message.contains("A payment request already exist for that payer"));
    }

    #[test]
    fn test_invalid_validation_bodies_are_decode_errors() {
        for body in [&b"[]"[..], b"", b"{\"errorCode\":\"RP06\"}", b"[{\"errorCode\":\"RP06\"}]"] {
            let err = map_response::<Payload>(422, body).unwrap_err();
            assert!(
                matches!(err, ResponseError::Decode { status: 422, .. }),
                "422响应体 {:?} 应为解码错误",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_unknown_status_codes() {
        for status in [0, 202, 204, 302, 409, 418, 503, u16::MAX] {
            let err = check_status(status, b"").unwrap_err();
            assert_eq!(
                err,
                ResponseError::Domain(DomainErrorOutcome::new(status.to_string(), "unknown status code"))
            );
        }
    }

    #[test]
    fn test_check_status_accepts_header_only_success() {
        assert!(check_status(201, b"").is_ok());
        assert!(check_status(200, b"").is_ok());
        assert!(check_status(404, b"").is_err());
    }

    #[test]
    fn test_mapping_is_total() {
        for status in 0..=u16::MAX {
            let result = map_response::<serde_json::Value>(status, b"null");
            match status {
                200 | 201 => assert!(result.is_ok()),
                422 => assert!(matches!(result, Err(ResponseError::Decode { .. }))),
                _ => assert!(matches!(result, Err(ResponseError::Domain(_)))),
            }
        }
    }
}
