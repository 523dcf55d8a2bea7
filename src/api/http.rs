use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Blocking client carrying the configured user agent and timeout
pub fn build_client(http: &HttpConfig) -> Result<Client> {
    Client::builder()
        .user_agent(&http.user_agent)
        .timeout(Duration::from_secs(http.timeout_secs))
        .build()
        .map_err(Error::Client)
}

/// Send the request, turning transport failures and non-2xx statuses into errors
pub fn send(service: &'static str, request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .map_err(|source| Error::Request { service, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status { service, status });
    }

    Ok(response)
}

pub fn fetch_text(service: &'static str, request: RequestBuilder) -> Result<String> {
    send(service, request)?
        .text()
        .map_err(|source| Error::Request { service, source })
}

pub fn fetch_json<T: DeserializeOwned>(service: &'static str, request: RequestBuilder) -> Result<T> {
    let body = fetch_text(service, request)?;
    decode_json(service, &body)
}

/// Parse a JSON body, failing on a top-level `error` member (MediaWiki and
/// Nominatim report failures that way, often with a 200 status)
pub fn decode_json<T: DeserializeOwned>(service: &'static str, body: &str) -> Result<T> {
    let value: Value =
        serde_json::from_str(body).map_err(|source| Error::Decode { service, source })?;

    if let Some(error) = value.get("error") {
        return Err(upstream_error(service, error));
    }

    serde_json::from_value(value).map_err(|source| Error::Decode { service, source })
}

fn upstream_error(service: &'static str, error: &Value) -> Error {
    let text = |key: &str| error.get(key).and_then(Value::as_str).map(str::to_string);

    match error {
        Value::String(info) => Error::Upstream {
            service,
            code: "error".to_string(),
            info: info.clone(),
        },
        _ => Error::Upstream {
            service,
            code: text("code")
                .or_else(|| error.get("code").map(Value::to_string))
                .unwrap_or_else(|| "error".to_string()),
            info: text("info")
                .or_else(|| text("message"))
                .unwrap_or_else(|| error.to_string()),
        },
    }
}
