use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, Response, Url};
use serde::{Deserialize, Deserializer};

use super::{
    DataLake, FileProperties, PathEntry, SharedKeySigner, account_url, is_valid_account_name,
};
use crate::error::{Result, ViewerError};

const API_VERSION: &str = "2021-06-08";
const CONTINUATION_HEADER: &str = "x-ms-continuation";
const ERROR_CODE_HEADER: &str = "x-ms-error-code";

/// REST client for one ADLS Gen2 storage account
#[derive(Debug)]
pub struct DataLakeServiceClient {
    endpoint: Url,
    signer: SharedKeySigner,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PathList {
    #[serde(default)]
    paths: Vec<PathItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathItem {
    name: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_directory: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// The service sends flags as `"true"` strings; accept booleans too
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn init_error(details: String) -> ViewerError {
    ViewerError::StorageInit {
        details,
        hint: "Check the storage account name and the account key stored in Key Vault"
            .to_string(),
    }
}

impl DataLakeServiceClient {
    /// Build a client for `https://{account_name}.dfs.core.windows.net`
    ///
    /// No request is made here; a wrong key only shows up on the first call.
    pub fn new(account_name: &str, account_key: &str) -> Result<Self> {
        if !is_valid_account_name(account_name) {
            return Err(init_error(format!(
                "invalid storage account name '{}': expected 3-24 lowercase letters or digits",
                account_name
            )));
        }

        let endpoint = Url::parse(&account_url(account_name))
            .map_err(|e| init_error(format!("invalid account URL: {}", e)))?;
        Self::with_endpoint(account_name, account_key, endpoint)
    }

    /// Client for an explicit endpoint; requests are still signed for `account_name`
    pub(crate) fn with_endpoint(
        account_name: &str,
        account_key: &str,
        endpoint: Url,
    ) -> Result<Self> {
        let signer = SharedKeySigner::new(account_name, account_key)?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| init_error(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized storage client for {}", endpoint);

        Ok(Self {
            endpoint,
            signer,
            http,
        })
    }

    /// URL of `/{file_system}/{path...}` with every segment percent-encoded
    fn resource_url(&self, file_system: &str, path: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ViewerError::StorageRequest {
                    details: format!("cannot build paths on {}", self.endpoint),
                }
            })?;
            segments.pop_if_empty().push(file_system);
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    fn list_url(
        &self,
        file_system: &str,
        directory: &str,
        continuation: Option<&str>,
    ) -> Result<Url> {
        let mut url = self.resource_url(file_system, "")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("resource", "filesystem");
            query.append_pair("recursive", "true");
            let directory = directory.trim_matches('/');
            if !directory.is_empty() {
                query.append_pair("directory", directory);
            }
            if let Some(token) = continuation {
                query.append_pair("continuation", token);
            }
        }
        Ok(url)
    }

    /// Sign and send a request without a body
    async fn send(&self, method: Method, url: Url) -> Result<Response> {
        let mut headers = HeaderMap::new();
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        headers.insert(
            "x-ms-date",
            HeaderValue::from_str(&date).map_err(|e| ViewerError::StorageRequest {
                details: e.to_string(),
            })?,
        );
        headers.insert("x-ms-version", HeaderValue::from_static(API_VERSION));

        let authorization = self.signer.authorization(&method, &url, &headers)?;
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&authorization).map_err(|e| ViewerError::StorageRequest {
                details: e.to_string(),
            })?,
        );

        tracing::debug!("{} {}", method, url);

        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ViewerError::StorageRequest {
                details: format!("HTTP request failed: {}", e),
            })?;

        if response.status().is_success() {
            return Ok(response);
        }

        Err(status_error(response).await)
    }
}

/// Turn a failed response into an error, using the service error body if any
async fn status_error(response: Response) -> ViewerError {
    let status = response.status().as_u16();
    let header_code = response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    let details = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error }) => match (error.code, error.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (Some(code), None) => code,
            (None, Some(message)) => message,
            (None, None) => body,
        },
        Err(_) => header_code.unwrap_or(body),
    };

    ViewerError::StorageStatus { status, details }
}

/// Read `Content-Length` and `Last-Modified` from a properties response
pub(crate) fn properties_from_headers(headers: &HeaderMap) -> FileProperties {
    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let last_modified = headers
        .get(header::LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    FileProperties {
        content_length,
        last_modified,
    }
}

fn parse_path_list(body: &str) -> Result<Vec<PathEntry>> {
    let list: PathList =
        serde_json::from_str(body).map_err(|e| ViewerError::StorageInvalidResponse {
            details: format!("Failed to parse path listing: {}", e),
        })?;

    Ok(list
        .paths
        .into_iter()
        .map(|item| PathEntry {
            name: item.name,
            is_directory: item.is_directory,
        })
        .collect())
}

#[async_trait]
impl DataLake for DataLakeServiceClient {
    async fn list_paths(&self, file_system: &str, directory: &str) -> Result<Vec<PathEntry>> {
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let url = self.list_url(file_system, directory, continuation.as_deref())?;
            let response = self.send(Method::GET, url).await?;

            let next = response
                .headers()
                .get(CONTINUATION_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let body = response
                .text()
                .await
                .map_err(|e| ViewerError::StorageRequest {
                    details: format!("Failed to read path listing: {}", e),
                })?;
            entries.extend(parse_path_list(&body)?);

            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        tracing::debug!(
            "Listed {} paths under '{}' in '{}'",
            entries.len(),
            directory,
            file_system
        );
        Ok(entries)
    }

    async fn file_properties(&self, file_system: &str, path: &str) -> Result<FileProperties> {
        let url = self.resource_url(file_system, path)?;
        let response = self.send(Method::HEAD, url).await?;
        Ok(properties_from_headers(response.headers()))
    }
}
