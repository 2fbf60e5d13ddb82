//! Shared Key request signing for Azure Storage

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, Url};
use sha2::Sha256;

use crate::error::{Result, ViewerError};

type HmacSha256 = Hmac<Sha256>;

/// Standard headers that take part in the signature, in signing order
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Signs storage requests with an account name and its base64 account key
pub struct SharedKeySigner {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeySigner")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeySigner {
    pub fn new(account: &str, account_key: &str) -> Result<Self> {
        let key = STANDARD
            .decode(account_key.trim())
            .map_err(|e| ViewerError::StorageInit {
                details: format!("account key is not valid base64: {}", e),
                hint: "Check that the Key Vault secret holds the storage account access key"
                    .to_string(),
            })?;

        if key.is_empty() {
            return Err(ViewerError::StorageInit {
                details: "account key is empty".to_string(),
                hint: "Check that the Key Vault secret holds the storage account access key"
                    .to_string(),
            });
        }

        Ok(Self {
            account: account.to_string(),
            key,
        })
    }

    /// Value for the `Authorization` header of a request
    pub fn authorization(&self, method: &Method, url: &Url, headers: &HeaderMap) -> Result<String> {
        let string_to_sign = self.string_to_sign(method, url, headers);

        let mut mac = <HmacSha256 as KeyInit>::new_from_slice(&self.key).map_err(|e| {
            ViewerError::StorageRequest {
                details: format!("failed to initialize request signer: {}", e),
            }
        })?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!("SharedKey {}:{}", self.account, signature))
    }

    pub(crate) fn string_to_sign(&self, method: &Method, url: &Url, headers: &HeaderMap) -> String {
        let mut out = String::new();
        out.push_str(method.as_str());
        out.push('\n');

        for name in SIGNED_HEADERS {
            let value = headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            // A zero Content-Length is signed as an empty string
            if name == header::CONTENT_LENGTH.as_str() && value == "0" {
                out.push('\n');
                continue;
            }
            out.push_str(value);
            out.push('\n');
        }

        out.push_str(&canonicalized_headers(headers));
        out.push_str(&self.canonicalized_resource(url));
        out
    }

    fn canonicalized_resource(&self, url: &Url) -> String {
        let mut resource = format!("/{}{}", self.account, url.path());

        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in url.query_pairs() {
            params
                .entry(name.to_lowercase())
                .or_default()
                .push(value.into_owned());
        }

        for (name, mut values) in params {
            values.sort();
            resource.push('\n');
            resource.push_str(&name);
            resource.push(':');
            resource.push_str(&values.join(","));
        }

        resource
    }
}

fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut ms_headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if name.starts_with("x-ms-") {
            let value = value.to_str().unwrap_or_default().trim().to_string();
            ms_headers.insert(name.to_string(), value);
        }
    }

    ms_headers
        .into_iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect()
}
