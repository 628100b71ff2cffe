//! S3-compatible object store (AWS S3, Cloudflare R2, MinIO)
//!
//! Objects live at `<endpoint>/<bucket>/<key>` (path-style addressing).
//! Requests are signed with AWS Signature Version 4 over the host, payload
//! hash and timestamp headers.

use super::ObjectStore;
use crate::constants::{
    REGISTRY_ACCESS_KEY_ID_ENV_KEY, REGISTRY_REGION_ENV_KEY,
    REGISTRY_SECRET_ACCESS_KEY_ENV_KEY,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Region used when none is configured; R2 accepts `auto`
pub const DEFAULT_REGION: &str = "auto";

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Access key pair for an S3-compatible endpoint
#[derive(Clone)]
pub struct S3Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl S3Credentials {
    /// Key pair from explicit values
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Key pair from `USVISA_REGISTRY_ACCESS_KEY_ID` and
    /// `USVISA_REGISTRY_SECRET_ACCESS_KEY`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first variable that is unset
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            required_env(REGISTRY_ACCESS_KEY_ID_ENV_KEY)?,
            required_env(REGISTRY_SECRET_ACCESS_KEY_ENV_KEY)?,
        ))
    }
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| Error::Config(format!("Environment variable: {key} is not set.")))
}

/// Object store speaking the S3 REST protocol
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    endpoint: Url,
    region: String,
    credentials: S3Credentials,
    client: Client,
}

impl S3ObjectStore {
    /// Store at `endpoint` (e.g. `https://<account>.r2.cloudflarestorage.com`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the endpoint is not an absolute
    /// `http(s)` URL
    pub fn new(endpoint: &str, credentials: S3Credentials) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/')).map_err(|e| {
            Error::Config(format!("Invalid registry endpoint '{endpoint}': {e}"))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            return Err(Error::Config(format!(
                "Registry endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        Ok(Self {
            endpoint,
            region: DEFAULT_REGION.to_string(),
            credentials,
            client: Client::new(),
        })
    }

    /// Store at `endpoint` with credentials and optional region from the
    /// environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a malformed endpoint or missing keys
    pub fn from_env(endpoint: &str) -> Result<Self> {
        let store = Self::new(endpoint, S3Credentials::from_env()?)?;
        Ok(match std::env::var(REGISTRY_REGION_ENV_KEY) {
            Ok(region) if !region.trim().is_empty() => store.with_region(region.trim()),
            _ => store,
        })
    }

    /// Sign for `region` instead of [`DEFAULT_REGION`]
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Signing region
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<String> {
        if bucket.is_empty() || bucket.contains('/') || key.is_empty() {
            return Err(Error::Registry(format!(
                "Invalid object location {bucket}/{key}"
            )));
        }
        let base = self.endpoint.path().trim_end_matches('/');
        Ok(format!(
            "{base}/{}/{}",
            uri_encode(bucket, false),
            uri_encode(key.trim_start_matches('/'), true)
        ))
    }

    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    fn request(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<RequestBuilder> {
        let path = self.object_path(bucket, key)?;
        let mut url = self.endpoint.clone();
        url.set_path(&path);

        let payload_hash = hex::encode(Sha256::digest(payload));
        let signed = sign(&SigningInput {
            method: method.as_str(),
            path: &path,
            host: &self.host(),
            payload_hash: &payload_hash,
            region: &self.region,
            credentials: &self.credentials,
            now: Utc::now(),
        });

        Ok(self
            .client
            .request(method, url)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("authorization", signed.authorization))
    }

    fn send(&self, request: RequestBuilder, bucket: &str, key: &str) -> Result<Response> {
        request
            .send()
            .map_err(|e| Error::Registry(format!("Request for {bucket}/{key} failed: {e}")))
    }
}

fn unexpected(response: Response, bucket: &str, key: &str) -> Error {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    Error::Registry(format!(
        "Registry returned {status} for {bucket}/{key}: {}",
        body.trim()
    ))
}

impl ObjectStore for S3ObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let request = self.request(Method::GET, bucket, key, &[])?;
        let response = self.send(request, bucket, key)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(unexpected(response, bucket, key));
        }
        let bytes = response
            .bytes()
            .map_err(|e| Error::Registry(format!("Failed to read {bucket}/{key}: {e}")))?;
        tracing::debug!(bucket, key, bytes = bytes.len(), "Downloaded object");
        Ok(Some(bytes.to_vec()))
    }

    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len();
        let request = self.request(Method::PUT, bucket, key, &bytes)?.body(bytes);
        let response = self.send(request, bucket, key)?;
        if !response.status().is_success() {
            return Err(unexpected(response, bucket, key));
        }
        tracing::debug!(bucket, key, bytes = size, "Uploaded object");
        Ok(())
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let request = self.request(Method::HEAD, bucket, key, &[])?;
        let response = self.send(request, bucket, key)?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(false)
        } else if response.status().is_success() {
            Ok(true)
        } else {
            Err(unexpected(response, bucket, key))
        }
    }
}

struct SigningInput<'a> {
    method: &'a str,
    path: &'a str,
    host: &'a str,
    payload_hash: &'a str,
    region: &'a str,
    credentials: &'a S3Credentials,
    now: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq)]
struct Signed {
    amz_date: String,
    authorization: String,
}

/// Signature Version 4 over the canonical request for an unqueried object
fn sign(input: &SigningInput<'_>) -> Signed {
    let amz_date = input.now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = input.now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/s3/aws4_request", input.region);

    let canonical_request = format!(
        "{method}\n{path}\n\n\
         host:{host}\nx-amz-content-sha256:{hash}\nx-amz-date:{amz_date}\n\n\
         {SIGNED_HEADERS}\n{hash}",
        method = input.method,
        path = input.path,
        host = input.host,
        hash = input.payload_hash,
    );
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let secret = format!("AWS4{}", input.credentials.secret_access_key);
    let key = [date.as_str(), input.region, "s3", "aws4_request"]
        .iter()
        .fold(secret.into_bytes(), |key, part| hmac(&key, part.as_bytes()));
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    Signed {
        authorization: format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, \
             SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            input.credentials.access_key_id
        ),
        amz_date,
    }
}

fn hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    // Any key length is valid for HMAC
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return Vec::new();
    };
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encode everything outside the unreserved set, optionally keeping `/`
fn uri_encode(value: &str, keep_slash: bool) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(char::from(byte));
            }
            b'/' if keep_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
