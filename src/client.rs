//! # Swish 网关客户端
//!
//! 在双向 TLS 安全传输之上提供支付请求与退款操作。
//!
//! ## 流程
//!
//! 1. 打开 PKCS#12 归档并解析证书链
//! 2. 构建客户端身份与安全 HTTP 客户端
//! 3. 发送请求，响应经 [`swish_transport::map_response`] 映射为类型化结果

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Deserializer, Serialize};
use swish_identity::{CertificateChainResolver, PkcsArchive};
use swish_transport::{
    check_status, map_response, ClientIdentity, SecureTransportConfig, SecureTransportFactory, TransportConfig,
};
use tracing::{debug, info, warn};
use url::Url;

/// 支付请求资源路径
const PAYMENT_REQUESTS_PATH: &str = "paymentrequests";

/// 退款资源路径
const REFUNDS_PATH: &str = "refunds";

/// m-commerce 支付令牌响应头
const PAYMENT_REQUEST_TOKEN_HEADER: &str = "PaymentRequestToken";

/// Swish 网关环境
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwishEnvironment {
    /// 生产环境
    Production,
    /// 商户模拟测试环境
    #[default]
    Test,
}

impl SwishEnvironment {
    /// 环境的 API 基础地址
    pub fn base_url(&self) -> ClientResult<Url> {
        let raw = match self {
            SwishEnvironment::Production => "https://cpc.getswish.net/swish-cpcapi/api/v1/",
            SwishEnvironment::Test => "https://mss.cpc.getswish.net/swish-cpcapi/api/v1/",
        };
        Ok(Url::parse(raw)?)
    }
}

/// e-commerce 支付请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ECommercePaymentRequest {
    /// 商户侧支付参考号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_payment_reference: Option<String>,
    /// 回调地址（必须为 https）
    pub callback_url: String,
    /// 付款人别名（手机号）
    pub payer_alias: String,
    /// 金额，例如 `100.00`
    pub amount: String,
    /// 币种，例如 `SEK`
    pub currency: String,
    /// 付款附言
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ECommercePaymentRequest {
    /// 创建 e-commerce 支付请求，付款人别名会被规范化
    pub fn new(
        callback_url: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
        payer_alias: &str,
    ) -> Self {
        Self {
            payee_payment_reference: None,
            callback_url: callback_url.into(),
            payer_alias: normalize_payer_alias(payer_alias),
            amount: amount.into(),
            currency: currency.into(),
            message: None,
        }
    }

    /// 设置商户侧支付参考号
    pub fn with_payee_payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payee_payment_reference = Some(reference.into());
        self
    }

    /// 设置付款附言
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// m-commerce 支付请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MCommercePaymentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_payment_reference: Option<String>,
    pub callback_url: String,
    pub amount: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MCommercePaymentRequest {
    /// 创建 m-commerce 支付请求
    pub fn new(callback_url: impl Into<String>, amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            payee_payment_reference: None,
            callback_url: callback_url.into(),
            amount: amount.into(),
            currency: currency.into(),
            message: None,
        }
    }

    pub fn with_payee_payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payee_payment_reference = Some(reference.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// 退款请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    /// 原支付的参考号
    pub original_payment_reference: String,
    /// 回调地址
    pub callback_url: String,
    /// 退款付出方别名，未设置时使用商户号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_alias: Option<String>,
    pub amount: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RefundRequest {
    /// 创建退款请求
    pub fn new(
        original_payment_reference: impl Into<String>,
        callback_url: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            original_payment_reference: original_payment_reference.into(),
            callback_url: callback_url.into(),
            payer_alias: None,
            amount: amount.into(),
            currency: currency.into(),
            payer_payment_reference: None,
            message: None,
        }
    }

    pub fn with_payer_payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payer_payment_reference = Some(reference.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// 支付请求体：业务字段加上收款方别名
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingRequest<'a, T: Serialize> {
    payee_alias: &'a str,
    #[serde(flatten)]
    request: &'a T,
}

/// 支付或退款创建结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResponse {
    /// 状态查询地址（Location 响应头）
    pub location: String,
    /// 资源标识（Location 的最后一段）
    pub id: String,
}

/// m-commerce 支付创建结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MCommercePaymentResponse {
    pub location: String,
    pub id: String,
    /// 用于唤起 Swish 应用的令牌
    pub token: String,
}

/// 支付或退款状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Created,
    Paid,
    Declined,
    Error,
    Cancelled,
    Validated,
    Debited,
    /// 未识别的状态
    #[serde(other)]
    Unknown,
}

/// 支付状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub id: String,
    #[serde(default)]
    pub payee_payment_reference: Option<String>,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub payer_alias: Option<String>,
    #[serde(default)]
    pub payee_alias: Option<String>,
    #[serde(default, deserialize_with = "amount_from_string_or_number")]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: PaymentState,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_paid: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub additional_information: Option<String>,
}

/// 退款状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundStatus {
    pub id: String,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub original_payment_reference: Option<String>,
    #[serde(default)]
    pub payer_payment_reference: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub payer_alias: Option<String>,
    #[serde(default)]
    pub payee_alias: Option<String>,
    #[serde(default, deserialize_with = "amount_from_string_or_number")]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: PaymentState,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_paid: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub additional_information: Option<String>,
}

// 网关在不同版本中以字符串或数字返回金额
fn amount_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Amount>::deserialize(deserializer)?.map(|amount| match amount {
        Amount::Text(text) => text,
        Amount::Number(number) => number.to_string(),
    }))
}

/// Swish 网关客户端
#[derive(Debug, Clone)]
pub struct SwishClient {
    http: reqwest::Client,
    base_url: Url,
    merchant_id: String,
}

impl SwishClient {
    /// 由 PKCS#12 归档创建客户端
    ///
    /// # 参数
    ///
    /// * `environment` - 网关环境
    /// * `archive` - PKCS#12 归档字节
    /// * `passphrase` - 归档口令，`None` 视为空口令
    /// * `merchant_id` - 商户 Swish 号
    /// * `transport` - 传输配置
    pub fn from_archive(
        environment: SwishEnvironment,
        archive: &[u8],
        passphrase: Option<&str>,
        merchant_id: impl Into<String>,
        transport: &TransportConfig,
    ) -> ClientResult<Self> {
        Self::from_archive_at(environment.base_url()?, archive, passphrase, merchant_id, transport)
    }

    /// 由 PKCS#12 归档创建指向自定义基础地址的客户端
    pub fn from_archive_at(
        base_url: Url,
        archive: &[u8],
        passphrase: Option<&str>,
        merchant_id: impl Into<String>,
        transport: &TransportConfig,
    ) -> ClientResult<Self> {
        Self::from_archive_with_resolver(
            base_url,
            archive,
            passphrase,
            merchant_id,
            transport,
            &CertificateChainResolver::new(),
        )
    }

    /// 由 PKCS#12 归档创建客户端，使用指定的证书链解析器查找信任锚
    pub fn from_archive_with_resolver(
        base_url: Url,
        archive: &[u8],
        passphrase: Option<&str>,
        merchant_id: impl Into<String>,
        transport: &TransportConfig,
        resolver: &CertificateChainResolver,
    ) -> ClientResult<Self> {
        let imported = PkcsArchive::open(archive, passphrase)?;
        let resolved = resolver.resolve(&imported.certificates);
        if resolved.is_none() {
            warn!("未能解析信任锚，仅出示叶子证书");
        }

        let identity = ClientIdentity::from_resolved(&imported, resolved.as_ref())?;
        let config = SecureTransportConfig::from_config(transport, resolved.map(|chain| chain.anchor))?;
        let secure = SecureTransportFactory::new(config).build_client(&identity, None)?;
        if secure.is_insecure() {
            warn!("服务器证书校验已关闭，仅用于测试环境");
        }

        Ok(Self::with_http_client(base_url, secure.http().clone(), merchant_id))
    }

    /// 使用已构建的 HTTP 客户端创建网关客户端
    pub fn with_http_client(mut base_url: Url, http: reqwest::Client, merchant_id: impl Into<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let merchant_id = merchant_id.into();
        info!("创建Swish网关客户端: {}，商户号 {}", base_url, merchant_id);
        Self {
            http,
            base_url,
            merchant_id,
        }
    }

    /// 商户号
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// 基础地址
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 创建 e-commerce 支付请求
    pub async fn create_ecommerce_payment(&self, request: &ECommercePaymentRequest) -> ClientResult<PaymentResponse> {
        let response = self.post_payment(request).await?;
        let location = created_location(&response);
        Self::ensure_created(response).await?;

        let (location, id) = location?;
        info!("e-commerce支付请求已创建: {}", id);
        Ok(PaymentResponse { location, id })
    }

    /// 创建 m-commerce 支付请求
    pub async fn create_mcommerce_payment(
        &self,
        request: &MCommercePaymentRequest,
    ) -> ClientResult<MCommercePaymentResponse> {
        let response = self.post_payment(request).await?;
        let token = header_value(&response, PAYMENT_REQUEST_TOKEN_HEADER);
        let location = created_location(&response);
        Self::ensure_created(response).await?;

        let (location, id) = location?;
        let token = token.ok_or(ClientError::MissingHeader(PAYMENT_REQUEST_TOKEN_HEADER))?;
        info!("m-commerce支付请求已创建: {}", id);
        Ok(MCommercePaymentResponse { location, id, token })
    }

    /// 查询支付状态
    pub async fn payment_status(&self, id: &str) -> ClientResult<PaymentStatus> {
        self.get(PAYMENT_REQUESTS_PATH, id).await
    }

    /// 创建退款
    pub async fn create_refund(&self, request: &RefundRequest) -> ClientResult<PaymentResponse> {
        let mut request = request.clone();
        if request.payer_alias.is_none() {
            request.payer_alias = Some(self.merchant_id.clone());
        }

        let response = self.post(REFUNDS_PATH, &request).await?;
        let location = created_location(&response);
        Self::ensure_created(response).await?;

        let (location, id) = location?;
        info!("退款已创建: {}", id);
        Ok(PaymentResponse { location, id })
    }

    /// 查询退款状态
    pub async fn refund_status(&self, id: &str) -> ClientResult<RefundStatus> {
        self.get(REFUNDS_PATH, id).await
    }

    async fn post_payment<T: Serialize>(&self, request: &T) -> ClientResult<reqwest::Response> {
        let body = OutgoingRequest {
            payee_alias: &self.merchant_id,
            request,
        };
        self.post(PAYMENT_REQUESTS_PATH, &body).await
    }

    async fn post<T: Serialize>(&self, resource: &str, body: &T) -> ClientResult<reqwest::Response> {
        let url = self.base_url.join(resource)?;
        debug!("POST {}", url);
        Ok(self.http.post(url).json(body).send().await?)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, resource: &str, id: &str) -> ClientResult<T> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ClientError::InvalidArgument("标识不能为空".to_string()));
        }

        let mut url = self.base_url.join(resource)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .push(id);

        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(map_response(status, &body)?)
    }

    async fn ensure_created(response: reqwest::Response) -> ClientResult<()> {
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(check_status(status, &body)?)
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// 读取 Location 响应头并取最后一段作为资源标识
fn created_location(response: &reqwest::Response) -> ClientResult<(String, String)> {
    let location = header_value(response, "Location").ok_or(ClientError::MissingHeader("Location"))?;
    let id = location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or(ClientError::MissingHeader("Location"))?
        .to_string();
    Ok((location, id))
}

/// 规范化付款人别名
///
/// 去除空白、`+` 与 `-`，`00` 国际前缀被去除，以 `0` 开头的本地号码转换为 `46` 开头。
pub fn normalize_payer_alias(alias: &str) -> String {
    let digits: String = alias
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '+' && *c != '-')
        .collect();

    if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("46{}", rest)
    } else {
        digits
    }
}

/// 生成唤起 Swish 应用的地址
///
/// # 参数
///
/// * `token` - m-commerce 支付令牌
/// * `callback_url` - 支付完成后返回的地址
///
/// # 返回值
///
/// `swish://paymentrequest?token=…&callbackurl=…`，参数经过 URL 编码
pub fn generate_swish_url(token: &str, callback_url: &str) -> ClientResult<String> {
    if token.trim().is_empty() {
        return Err(ClientError::InvalidArgument("支付令牌不能为空".to_string()));
    }
    if callback_url.trim().is_empty() {
        return Err(ClientError::InvalidArgument("回调地址不能为空".to_string()));
    }

    let token: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
    let callback: String = url::form_urlencoded::byte_serialize(callback_url.as_bytes()).collect();
    Ok(format!("swish://paymentrequest?token={}&callbackurl={}", token, callback))
}
