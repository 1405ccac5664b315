//! Thin blocking transport shared by the provider clients.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;
use wfs_core::{ErrorInfo, WfsError};

const USER_AGENT: &str = concat!("wfs/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How the token travels with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Bearer,
    PrivateToken,
}

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: Client,
}

impl Transport {
    pub(crate) fn new(token: &str, auth: Auth, extra: &[(&'static str, &'static str)]) -> Result<Self, WfsError> {
        let mut headers = HeaderMap::new();
        let (name, value) = match auth {
            Auth::Bearer => (AUTHORIZATION, format!("Bearer {token}")),
            Auth::PrivateToken => (HeaderName::from_static("private-token"), token.to_string()),
        };
        let mut value = HeaderValue::from_str(&value).map_err(|err| {
            WfsError::Config(
                ErrorInfo::new("token-header", err.to_string()).with_hint("the token contains invalid characters"),
            )
        })?;
        value.set_sensitive(true);
        headers.insert(name, value);
        for (name, value) in extra {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        if !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|err| WfsError::Provider(ErrorInfo::new("http-client", err.to_string())))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, WfsError> {
        let response = checked(url, self.get(url).query(query).send())?;
        response
            .json()
            .map_err(|err| WfsError::Serde(ErrorInfo::new("response-decode", err.to_string()).with_context("url", url)))
    }

    pub(crate) fn get_bytes(&self, url: &str) -> Result<Vec<u8>, WfsError> {
        let response = checked(url, self.get(url).send())?;
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|err| transport_error(url, err))
    }

    pub(crate) fn get_text(&self, url: &str) -> Result<String, WfsError> {
        let response = checked(url, self.get(url).send())?;
        response.text().map_err(|err| transport_error(url, err))
    }
}

/// Turns a send result into a response carrying a 2xx status.
fn checked(url: &str, sent: reqwest::Result<Response>) -> Result<Response, WfsError> {
    let response = sent.map_err(|err| transport_error(url, err))?;
    let status = response.status();
    debug!(url, status = status.as_u16(), "provider response");
    if status.is_success() {
        return Ok(response);
    }
    Err(WfsError::Provider(
        ErrorInfo::new("http-status", format!("provider answered {status}"))
            .with_context("url", url)
            .with_context("status", status.as_u16().to_string()),
    ))
}

pub(crate) fn transport_error(url: &str, err: reqwest::Error) -> WfsError {
    WfsError::Provider(ErrorInfo::new("http-transport", err.to_string()).with_context("url", url))
}

/// Reads a token from the environment.
pub(crate) fn token_from_env(var: &str) -> Result<String, WfsError> {
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(WfsError::Config(
            ErrorInfo::new("token-missing", format!("{var} is not set"))
                .with_context("variable", var)
                .with_hint("export it or add it to a .env file"),
        )),
    }
}
