use crate::browser::BrowserCookie;
use async_trait::async_trait;
use friendnet_core::{ApiConfig, FriendNetError, Operation, Result};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One page request against the GraphQL endpoint, before form encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub token: String,
    pub operation: Operation,
    /// Compact JSON object; keys whose value would be empty are absent.
    pub variables: String,
}

impl PageRequest {
    pub fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("fb_dtsg", self.token.as_str()),
            ("fb_api_req_friendly_name", self.operation.friendly_name.as_str()),
            ("variables", self.variables.as_str()),
            ("doc_id", self.operation.doc_id.as_str()),
        ]
    }

    pub fn variables_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.variables)?)
    }
}

/// Sends one page request and returns the raw response body.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    async fn post(&self, request: &PageRequest) -> Result<String>;
}

/// `reqwest` transport carrying the cookies harvested from the browser.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig, cookies: &[BrowserCookie], referer: &str) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| FriendNetError::Config(format!("invalid endpoint {}: {e}", config.endpoint)))?;

        let jar = Arc::new(Jar::default());
        for cookie in cookies {
            let mut header = format!("{}={}; Path=/", cookie.name, cookie.value);
            if let Some(domain) = &cookie.domain {
                header.push_str("; Domain=");
                header.push_str(domain);
            }
            jar.add_cookie_str(&header, &endpoint);
        }
        debug!("Copied {} browser cookies into HTTP session", cookies.len());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        if let Ok(value) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, value);
        }

        let client = Client::builder()
            .cookie_provider(jar)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FriendNetError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl GraphQlTransport for HttpTransport {
    async fn post(&self, request: &PageRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-fb-friendly-name", &request.operation.friendly_name)
            .form(&request.form_fields())
            .send()
            .await
            .map_err(|e| {
                FriendNetError::Network(format!(
                    "{} request failed: {e}",
                    request.operation.friendly_name
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FriendNetError::Network(format!(
                "{} returned HTTP {}",
                request.operation.friendly_name, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FriendNetError::Network(format!("failed to read response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_carry_token_and_operation() {
        let request = PageRequest {
            token: "tok".to_string(),
            operation: Operation::new("Query", "42"),
            variables: r#"{"scale":1}"#.to_string(),
        };
        let fields = request.form_fields();
        assert_eq!(fields[0], ("fb_dtsg", "tok"));
        assert_eq!(fields[1], ("fb_api_req_friendly_name", "Query"));
        assert_eq!(fields[3], ("doc_id", "42"));
        assert_eq!(request.variables_json().unwrap()["scale"], 1);
    }

    #[test]
    fn test_http_transport_accepts_browser_cookies() {
        let cookies = vec![
            BrowserCookie::new("c_user", "100"),
            BrowserCookie {
                name: "xs".to_string(),
                value: "secret".to_string(),
                domain: Some(".facebook.com".to_string()),
            },
        ];
        let transport = HttpTransport::new(
            &ApiConfig::default(),
            &cookies,
            "https://www.facebook.com/friends/list",
        );
        assert!(transport.is_ok());
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let config = ApiConfig {
            endpoint: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpTransport::new(&config, &[], ""),
            Err(FriendNetError::Config(_))
        ));
    }
}
