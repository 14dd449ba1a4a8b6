//! Service-account authorization for the Sheets backend.
//!
//! # Responsibility
//! - Parse Google service-account key files.
//! - Exchange a signed JWT assertion for an OAuth access token.
//!
//! # Invariants
//! - Assertions request exactly `SHEETS_SCOPES`, are addressed to the key's
//!   `token_uri` and expire one hour after issue.

use crate::repo::google_sheet::{read_json, SHEETS_SCOPES};
use crate::repo::worksheet::RepoResult;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::info;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a downloaded service-account JSON key the exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Signs an RS256 assertion issued at `issued_at` (unix seconds).
    pub fn sign_assertion(&self, issued_at: i64) -> jsonwebtoken::errors::Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: SHEETS_SCOPES.join(" "),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&header, &claims, &key)
    }

    /// Trades a signed assertion for a bearer token at `token_uri`.
    pub fn exchange_assertion(&self, agent: &ureq::Agent, assertion: &str) -> RepoResult<String> {
        let response: TokenResponse = read_json(
            agent
                .post(&self.token_uri)
                .set("Accept", "application/json")
                .send_form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)]),
        )?;
        info!(
            "event=sheets_token module=repo status=ok client={}",
            self.client_email
        );
        Ok(response.access_token)
    }
}
