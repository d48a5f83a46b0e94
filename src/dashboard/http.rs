//! [`DashboardApi`] over HTTP
//!
//! Keeps the session cookie in a cookie store and sends the current nonce
//! with every request. Whenever a response carries `X-WP-Nonce`, that nonce
//! replaces the one held.

use super::client::{ClientError, DashboardApi, TicketList};
use crate::api::schema::{
    CreateReplyRequest, CreateTicketRequest, ListQuery, LoginRequest, LoginResponse, ReplyJson,
    TicketJson, UserStatus,
};
use crate::api::{NONCE_HEADER, TOTAL_HEADER, TOTAL_PAGES_HEADER};
use crate::web::DashboardConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

static CONFIG_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"window\.SupportDashboard\s*=\s*(\{.*?\});").expect("valid regex"));

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn header_number<T: std::str::FromStr + Default>(headers: &HeaderMap, name: &str) -> T {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// Read the `SupportDashboard` object out of a rendered page
pub fn extract_config(html: &str) -> Result<DashboardConfig, ClientError> {
    let json = CONFIG_SCRIPT
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ClientError::Decode("page has no SupportDashboard object".to_string()))?;
    serde_json::from_str(&json.as_str().replace("<\\/", "</"))
        .map_err(|e| ClientError::Decode(e.to_string()))
}

#[derive(Debug)]
pub struct HttpDashboardApi {
    client: Client,
    api_url: Url,
    nonce: Mutex<String>,
}

impl HttpDashboardApi {
    /// `api_url` is the REST base, e.g. `http://localhost:8080/wp-json/`
    pub fn new(api_url: Url, nonce: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            api_url,
            nonce: Mutex::new(nonce.into()),
        })
    }

    /// Load the dashboard page and configure the client from it
    pub async fn from_page(page_url: Url) -> Result<Self, ClientError> {
        let client = Client::builder().cookie_store(true).build()?;
        let html = client.get(page_url.clone()).send().await?.error_for_status()?.text().await?;
        let config = extract_config(&html)?;
        let api_url = page_url
            .join(&config.api_url)
            .map_err(|e| ClientError::Decode(format!("bad api_url '{}': {e}", config.api_url)))?;
        Ok(Self {
            client,
            api_url,
            nonce: Mutex::new(config.nonce),
        })
    }

    pub fn nonce(&self) -> String {
        self.nonce.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn url(&self, route: &str) -> Result<Url, ClientError> {
        self.api_url
            .join(route)
            .map_err(|e| ClientError::Decode(format!("bad route '{route}': {e}")))
    }

    fn adopt_nonce(&self, headers: &HeaderMap) {
        if let Some(nonce) = headers.get(NONCE_HEADER).and_then(|v| v.to_str().ok()) {
            *self.nonce.lock().unwrap_or_else(PoisonError::into_inner) = nonce.to_string();
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.header(NONCE_HEADER, self.nonce()).send().await?;
        self.adopt_nonce(response.headers());
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: ErrorBody = response.json().await.unwrap_or_default();
        debug!(status = status.as_u16(), code = %body.code, "request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            code: body.code,
            message: if body.message.is_empty() {
                status.to_string()
            } else {
                body.message
            },
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        Ok(self.send(request).await?.json().await?)
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn user_status(&self) -> Result<UserStatus, ClientError> {
        let url = self.url("tickefic/v1/user-status")?;
        self.json(self.client.get(url)).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let url = self.url("tickefic/v1/login")?;
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.json(self.client.post(url).json(&body)).await
    }

    async fn list_tickets(&self, query: &ListQuery) -> Result<TicketList, ClientError> {
        let url = self.url("wp/v2/tickefic/tickets")?;
        let response = self.send(self.client.get(url).query(query)).await?;
        let total = header_number(response.headers(), TOTAL_HEADER);
        let total_pages = header_number(response.headers(), TOTAL_PAGES_HEADER);
        Ok(TicketList {
            tickets: response.json().await?,
            total,
            total_pages,
        })
    }

    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<TicketJson, ClientError> {
        let url = self.url("wp/v2/tickefic/tickets")?;
        self.json(self.client.post(url).json(request)).await
    }

    async fn list_replies(&self, ticket: u64) -> Result<Vec<ReplyJson>, ClientError> {
        let url = self.url("wp/v2/comments")?;
        let query = [("post", ticket.to_string()), ("order", "asc".to_string())];
        self.json(self.client.get(url).query(&query)).await
    }

    async fn post_reply(&self, request: &CreateReplyRequest) -> Result<ReplyJson, ClientError> {
        let url = self.url("wp/v2/comments")?;
        self.json(self.client.post(url).json(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_config_from_page() {
        let html = r#"<script>window.SupportDashboard = {"nonce":"ab12","api_url":"/wp-json/"};</script>"#;
        let config = extract_config(html).unwrap();
        assert_eq!(config.nonce, "ab12");
        assert_eq!(config.api_url, "/wp-json/");
    }

    #[test]
    fn test_extract_config_missing() {
        assert!(matches!(extract_config("<p>nothing</p>"), Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_routes_join_the_base() {
        let api = HttpDashboardApi::new(Url::parse("http://localhost:8080/wp-json/").unwrap(), "n").unwrap();
        assert_eq!(
            api.url("wp/v2/comments").unwrap().as_str(),
            "http://localhost:8080/wp-json/wp/v2/comments"
        );
        assert_eq!(api.nonce(), "n");
    }
}
