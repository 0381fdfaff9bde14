//! AWS Signature Version 4
//!
//! Reference: <https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_sigv-create-signed-request.html>

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take key of any size"),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// RFC 3986 encoding of a query key/value or path segment
pub(crate) fn uri_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Build the canonical query string: encoded pairs sorted by key, then value
pub(crate) fn canonical_query(params: &[(&str, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedRequest {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

/// Request signer for one set of credentials
#[derive(Clone)]
pub(crate) struct Signer {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    region: String,
    service: String,
}

impl Signer {
    pub(crate) fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
            region: region.into(),
            service: service.into(),
        }
    }

    pub(crate) fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Sign a request
    ///
    /// `path` must already be URI-encoded and `query` must be the output of
    /// [`canonical_query`]; both are sent exactly as signed.
    pub(crate) fn sign(
        &self,
        method: &str,
        host: &str,
        path: &str,
        query: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> SignedRequest {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        // 1. Canonical request
        let mut headers = vec![("host", host.to_string()), ("x-amz-date", amz_date.clone())];
        if let Some(token) = &self.session_token {
            headers.push(("x-amz-security-token", token.clone()));
        }
        headers.sort_by(|a, b| a.0.cmp(b.0));

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(k, _)| *k)
            .collect::<Vec<_>>()
            .join(";");
        let hashed_payload = hex::encode(Sha256::digest(payload));
        let canonical_request = format!(
            "{method}\n{path}\n{query}\n{canonical_headers}\n{signed_headers}\n{hashed_payload}"
        );

        // 2. String to sign
        let credential_scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let hashed_canonical_request = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign =
            format!("{ALGORITHM}\n{amz_date}\n{credential_scope}\n{hashed_canonical_request}");

        // 3. Signing key and signature
        let secret_date = hmac_sha256(
            format!("AWS4{}", self.secret_access_key).as_bytes(),
            date.as_bytes(),
        );
        let secret_region = hmac_sha256(&secret_date, self.region.as_bytes());
        let secret_service = hmac_sha256(&secret_region, self.service.as_bytes());
        let secret_signing = hmac_sha256(&secret_service, b"aws4_request");
        let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

        // 4. Authorization header
        SignedRequest {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.access_key_id, credential_scope, signed_headers, signature
            ),
            amz_date,
            security_token: self.session_token.clone(),
        }
    }
}
