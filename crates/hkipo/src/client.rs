//! HTTP access to the two upstream hosts

use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::{Method, Request, Url};
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::Error;

pub const IPO_LIST_PATH: &str = "/Home/GetHKIPOInfoMore";
pub const IPO_DETAIL_PATH: &str = "/Home/NewStockBrief";
pub const GREY_LIST_PATH: &str = "/Home/GetGreyList";
pub const PLACING_RESULT_PATH: &str = "/jybapp/IPOService/GetPlacingResult";

/// Query parameter used to defeat upstream caches
const CACHE_BUSTER_PARAM: &str = "v";
const TOKEN_HEADER: &str = "RequestVerificationToken";
const TOKEN_HEADER_NAME: &str = "requestverificationtoken";

/// Short random id tying together the log lines of one request
pub fn request_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// Append `path` to `base` and add the query, plus `v=<cache_buster>` unless
/// the caller already set `v`
///
/// A path prefix on `base` (`https://host/api`) is kept.
pub fn build_url(
    base: &str,
    path: &str,
    query: &[(&str, String)],
    cache_buster: f64,
) -> Result<Url, Error> {
    let mut base =
        Url::parse(base).map_err(|e| Error::Config(format!("invalid base URL {base}: {e}")))?;
    if !base.path().ends_with('/') {
        let prefix = format!("{}/", base.path());
        base.set_path(&prefix);
    }

    let mut url = base
        .join(path.trim_start_matches('/'))
        .map_err(|e| Error::Config(format!("invalid path {path}: {e}")))?;

    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
        if !query.iter().any(|(key, _)| *key == CACHE_BUSTER_PARAM) {
            pairs.append_pair(CACHE_BUSTER_PARAM, &cache_buster.to_string());
        }
    }

    Ok(url)
}

/// Client bound to one upstream host
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    name: &'static str,
    base_url: String,
    token: Option<HeaderValue>,
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(name: &'static str, base_url: &str, config: &UpstreamConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/html, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let token = config
            .verification_token()
            .map(|token| {
                let mut value = HeaderValue::from_str(&token)
                    .map_err(|e| Error::Config(format!("invalid {TOKEN_HEADER}: {e}")))?;
                value.set_sensitive(true);
                Ok::<_, Error>(value)
            })
            .transpose()?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the raw body
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, Error> {
        let request = self.request(Method::GET, path, query, None)?;
        self.send(request).await
    }

    /// POST a JSON body to `path` and return the raw response body
    pub async fn post_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<String, Error> {
        let request = self.request(Method::POST, path, query, Some(body))?;
        self.send(request).await
    }

    /// Build the request for `path` with the cache buster and, when configured,
    /// the verification token
    pub fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Request, Error> {
        let url = build_url(&self.base_url, path, query, rand::random::<f64>())?;
        let mut builder = self.http.request(method.clone(), url.clone());

        if let Some(token) = &self.token {
            builder = builder.header(HeaderName::from_static(TOKEN_HEADER_NAME), token.clone());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder.build().map_err(|e| Error::Request {
            method: method.to_string(),
            url: url.to_string(),
            message: format!("failed to build request: {e}"),
        })
    }

    async fn send(&self, request: Request) -> Result<String, Error> {
        let id = request_id();
        let started = Instant::now();
        let method = request.method().clone();
        let url = request.url().clone();
        log::debug!("[{id}] {} {method} {url}", self.name);

        let response = self.http.execute(request).await.map_err(|e| {
            log::warn!(
                "[{id}] {method} {url} failed after {}ms: {e}",
                started.elapsed().as_millis()
            );
            Error::Request {
                method: method.to_string(),
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!(
                "[{id}] {method} {url} returned {status} after {}ms",
                started.elapsed().as_millis()
            );
            return Err(Error::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| Error::Request {
            method: method.to_string(),
            url: url.to_string(),
            message: format!("failed to read body: {e}"),
        })?;

        log::info!(
            "[{id}] {method} {} {status} {}B in {}ms",
            url.path(),
            text.len(),
            started.elapsed().as_millis()
        );

        Ok(text)
    }
}

/// One client per upstream host
#[derive(Debug, Clone)]
pub struct Clients {
    /// Listing, detail and grey-market endpoints
    pub aipo: UpstreamClient,
    /// Placing results
    pub jyb: UpstreamClient,
}

impl Clients {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, Error> {
        Ok(Self {
            aipo: UpstreamClient::new("aipo", &config.aipo_base_url, config)?,
            jyb: UpstreamClient::new("jyb", &config.jyb_base_url, config)?,
        })
    }
}
