//! Akamai API client credential rotation.
//!
//! Create-and-overlap: a new credential is created for the API client, then
//! the old credential's expiry is shortened to a 7-day grace window so
//! in-flight consumers keep working while the new value propagates. Some
//! account classes reject expiry mutation; that surfaces as an error
//! response (not a typed field), and the fallback is immediate deletion of
//! the old credential.
//!
//! Requests are signed with the EdgeGrid EG1-HMAC-SHA256 scheme using the
//! host, access_token, and client_token from the token's .edgerc location;
//! the current client_secret is the value read from the source-of-truth
//! location.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{AutoRotation, RotationResult};
use crate::config::expand_tilde;
use crate::error::{ProviderErrorKind, Result, ToknError};
use crate::locations::parse_edgerc_section;
use crate::registry::Token;

const CREDENTIALS_PATH: &str = "/identity-management/v3/api-clients/self/credentials";
const OVERLAP_DAYS: i64 = 7;

type HmacSha256 = Hmac<Sha256>;

/// Signing material for one .edgerc section. The client_secret is supplied
/// separately: it is the live value the orchestrator read from the token's
/// source-of-truth location.
#[derive(Debug, Clone)]
struct EdgeGridCredentials {
    host: String,
    client_token: String,
    access_token: String,
}

pub struct AkamaiProvider {
    base_override: Option<String>,
    client: reqwest::Client,
}

impl AkamaiProvider {
    pub fn new() -> Self {
        Self {
            base_override: None,
            client: reqwest::Client::new(),
        }
    }

    /// Send requests to a fixed base instead of the .edgerc host (used by
    /// tests; signatures are still computed against the .edgerc host).
    pub fn with_base(base: String) -> Self {
        Self {
            base_override: Some(base),
            client: reqwest::Client::new(),
        }
    }

    /// Locate the token's .edgerc location and pull the signing fields out
    /// of the addressed section.
    fn edgerc_credentials(&self, token: &Token) -> Result<EdgeGridCredentials> {
        let spec = token
            .locations
            .iter()
            .find(|l| l.kind == "edgerc")
            .ok_or_else(|| {
                ToknError::provider(
                    "akamai",
                    ProviderErrorKind::Permission,
                    "token has no edgerc location to supply signing credentials",
                )
            })?;

        let path = expand_tilde(&spec.path);
        let section = spec.meta("section").unwrap_or("default");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ToknError::provider(
                "akamai",
                ProviderErrorKind::Permission,
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;

        let values = parse_edgerc_section(&content, section).ok_or_else(|| {
            ToknError::provider(
                "akamai",
                ProviderErrorKind::Permission,
                format!("no [{}] section in {}", section, path.display()),
            )
        })?;

        let field = |name: &str| -> Result<String> {
            values.get(name).cloned().ok_or_else(|| {
                ToknError::provider(
                    "akamai",
                    ProviderErrorKind::Permission,
                    format!("section [{}] is missing {}", section, name),
                )
            })
        };

        Ok(EdgeGridCredentials {
            host: field("host")?,
            client_token: field("client_token")?,
            access_token: field("access_token")?,
        })
    }

    async fn signed_request(
        &self,
        creds: &EdgeGridCredentials,
        client_secret: &str,
        request_method: reqwest::Method,
        request_path: &str,
        body: Option<&Value>,
    ) -> Result<(u16, Value)> {
        let base = self
            .base_override
            .clone()
            .unwrap_or_else(|| format!("https://{}", creds.host));
        let body_text = body.map(|v| v.to_string()).unwrap_or_default();

        let auth = sign_request(
            creds,
            client_secret,
            request_method.as_str(),
            request_path,
            &body_text,
            &Utc::now().format("%Y%m%dT%H:%M:%S+0000").to_string(),
            &Uuid::new_v4().to_string(),
        )?;

        let mut request = self
            .client
            .request(request_method, format!("{}{}", base, request_path))
            .header("Authorization", auth)
            .header("Accept", "application/json");
        if body.is_some() {
            request = request
                .header("Content-Type", "application/json")
                .body(body_text);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToknError::from_http("akamai", e))?;
        let status = response.status().as_u16();
        let value = response.json().await.unwrap_or(Value::Null);
        Ok((status, value))
    }

    async fn find_current_credential(
        &self,
        creds: &EdgeGridCredentials,
        client_secret: &str,
    ) -> Result<u64> {
        let (status, body) = self
            .signed_request(creds, client_secret, reqwest::Method::GET, CREDENTIALS_PATH, None)
            .await?;
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "akamai",
                status,
                format!("credential list returned status {}", status),
            ));
        }

        body.as_array()
            .into_iter()
            .flatten()
            .find(|c| c["clientToken"].as_str() == Some(creds.client_token.as_str()))
            .and_then(|c| c["credentialId"].as_u64())
            .ok_or_else(|| {
                ToknError::provider(
                    "akamai",
                    ProviderErrorKind::Permission,
                    format!("no credential found for clientToken {}", creds.client_token),
                )
            })
    }

    async fn create_credential(
        &self,
        creds: &EdgeGridCredentials,
        client_secret: &str,
    ) -> Result<Value> {
        let (status, body) = self
            .signed_request(creds, client_secret, reqwest::Method::POST, CREDENTIALS_PATH, None)
            .await?;
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "akamai",
                status,
                format!("credential create returned status {}", status),
            ));
        }
        Ok(body)
    }

    /// Shorten the old credential's expiry to the overlap window. Returns
    /// false when the API rejected the mutation for this account class.
    async fn shorten_expiry(
        &self,
        creds: &EdgeGridCredentials,
        client_secret: &str,
        credential_id: u64,
    ) -> Result<bool> {
        let expires_on = (Utc::now() + Duration::days(OVERLAP_DAYS))
            .format("%Y-%m-%dT%H:%M:%S.000Z")
            .to_string();
        let request_path = format!("{}/{}", CREDENTIALS_PATH, credential_id);
        let body = json!({ "expiresOn": expires_on, "status": "ACTIVE" });

        let (status, _) = self
            .signed_request(
                creds,
                client_secret,
                reqwest::Method::PUT,
                &request_path,
                Some(&body),
            )
            .await?;
        match status {
            200..=299 => Ok(true),
            // Expiry mutation rejected for this credential's account class.
            400 | 403 => Ok(false),
            _ => Err(ToknError::from_status(
                "akamai",
                status,
                format!("expiry update returned status {}", status),
            )),
        }
    }

    async fn delete_credential(
        &self,
        creds: &EdgeGridCredentials,
        client_secret: &str,
        credential_id: u64,
    ) -> Result<()> {
        let request_path = format!("{}/{}", CREDENTIALS_PATH, credential_id);
        let (status, _) = self
            .signed_request(
                creds,
                client_secret,
                reqwest::Method::DELETE,
                &request_path,
                None,
            )
            .await?;
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "akamai",
                status,
                format!("credential delete returned status {}", status),
            ));
        }
        Ok(())
    }
}

impl Default for AkamaiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutoRotation for AkamaiProvider {
    fn service(&self) -> &'static str {
        "akamai"
    }

    async fn rotate(&self, current_value: &str, token: &Token) -> Result<RotationResult> {
        let creds = self.edgerc_credentials(token)?;

        let old_id = self.find_current_credential(&creds, current_value).await?;
        let new_cred = self.create_credential(&creds, current_value).await?;

        let new_value = new_cred["clientSecret"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ToknError::provider(
                    "akamai",
                    ProviderErrorKind::Api,
                    "create response carried no clientSecret",
                )
            })?;

        if !self.shorten_expiry(&creds, current_value, old_id).await? {
            // Overlap refused: revoke the old credential outright.
            self.delete_credential(&creds, current_value, old_id).await?;
        }

        let mut result = RotationResult::new(new_value);
        result.new_expiry = new_cred["expiresOn"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        if let Some(client_token) = new_cred["clientToken"].as_str() {
            result
                .extra
                .insert("client_token".to_string(), client_token.to_string());
        }
        Ok(result)
    }
}

/// Build the EG1-HMAC-SHA256 Authorization header.
fn sign_request(
    creds: &EdgeGridCredentials,
    client_secret: &str,
    request_method: &str,
    request_path: &str,
    body: &str,
    timestamp: &str,
    nonce: &str,
) -> Result<String> {
    let auth_data = format!(
        "EG1-HMAC-SHA256 client_token={};access_token={};timestamp={};nonce={};",
        creds.client_token, creds.access_token, timestamp, nonce
    );

    // Only POST bodies participate in the content hash.
    let content_hash = if request_method == "POST" && !body.is_empty() {
        BASE64.encode(Sha256::digest(body.as_bytes()))
    } else {
        String::new()
    };

    let data_to_sign = format!(
        "{}\thttps\t{}\t{}\t\t{}\t{}",
        request_method, creds.host, request_path, content_hash, auth_data
    );

    let signing_key = hmac_base64(client_secret.as_bytes(), timestamp.as_bytes())?;
    let signature = hmac_base64(signing_key.as_bytes(), data_to_sign.as_bytes())?;

    Ok(format!("{}signature={}", auth_data, signature))
}

fn hmac_base64(key: &[u8], data: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ToknError::Other(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LocationSpec, RotationType};
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_edgerc(dir: &Path) -> std::path::PathBuf {
        let path = dir.join(".edgerc");
        std::fs::write(
            &path,
            "[default]\n\
             client_secret = old-akamai-secret\n\
             host = akab-host.luna.akamaiapis.net\n\
             access_token = akab-access\n\
             client_token = akab-client\n",
        )
        .unwrap();
        path
    }

    fn sample_token(edgerc_path: &Path) -> Token {
        let mut spec = LocationSpec::new("edgerc", edgerc_path.to_string_lossy());
        spec.metadata
            .insert("section".to_string(), "default".to_string());
        Token {
            service: "akamai".to_string(),
            rotation_type: RotationType::Auto,
            locations: vec![spec],
            expires_at: Utc::now() + Duration::days(10),
            last_rotated_at: None,
            notes: String::new(),
            extra: Default::default(),
        }
    }

    fn listing() -> Value {
        json!([
            { "credentialId": 7, "clientToken": "akab-client", "status": "ACTIVE" },
            { "credentialId": 8, "clientToken": "akab-other", "status": "ACTIVE" }
        ])
    }

    fn created() -> Value {
        json!({
            "credentialId": 9,
            "clientSecret": "new-akamai-secret",
            "clientToken": "akab-client-new",
            "expiresOn": "2027-02-28T00:00:00.000Z"
        })
    }

    #[test]
    fn signature_is_deterministic_and_well_formed() {
        let creds = EdgeGridCredentials {
            host: "akab-host.luna.akamaiapis.net".to_string(),
            client_token: "akab-client".to_string(),
            access_token: "akab-access".to_string(),
        };

        let header = sign_request(
            &creds,
            "secret",
            "GET",
            CREDENTIALS_PATH,
            "",
            "20260830T12:00:00+0000",
            "nonce-1234",
        )
        .unwrap();

        assert!(header.starts_with("EG1-HMAC-SHA256 client_token=akab-client;"));
        assert!(header.contains("access_token=akab-access;"));
        assert!(header.contains("timestamp=20260830T12:00:00+0000;"));
        assert!(header.contains(";signature="));

        let again = sign_request(
            &creds,
            "secret",
            "GET",
            CREDENTIALS_PATH,
            "",
            "20260830T12:00:00+0000",
            "nonce-1234",
        )
        .unwrap();
        assert_eq!(header, again);
    }

    #[tokio::test]
    async fn overlap_path_keeps_old_credential_alive() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let edgerc = write_edgerc(dir.path());

        Mock::given(method("GET"))
            .and(path(CREDENTIALS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(CREDENTIALS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(created()))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/7", CREDENTIALS_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AkamaiProvider::with_base(server.uri());
        let result = provider
            .rotate("old-akamai-secret", &sample_token(&edgerc))
            .await
            .unwrap();

        assert_eq!(result.new_value, "new-akamai-secret");
        assert_eq!(result.extra.get("client_token").unwrap(), "akab-client-new");
        assert!(result.new_expiry.is_some());
    }

    #[tokio::test]
    async fn rejected_expiry_mutation_falls_back_to_deletion() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let edgerc = write_edgerc(dir.path());

        Mock::given(method("GET"))
            .and(path(CREDENTIALS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(CREDENTIALS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(created()))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/7", CREDENTIALS_PATH)))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": "expiry mutation not supported for this account"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/7", CREDENTIALS_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AkamaiProvider::with_base(server.uri());
        let result = provider
            .rotate("old-akamai-secret", &sample_token(&edgerc))
            .await
            .unwrap();
        assert_eq!(result.new_value, "new-akamai-secret");
    }

    #[tokio::test]
    async fn missing_edgerc_location_is_a_provider_error() {
        let provider = AkamaiProvider::new();
        let mut token = sample_token(Path::new("/nonexistent"));
        token.locations = vec![LocationSpec::new("doppler", "AKAMAI_SECRET")];

        let err = provider.rotate("secret", &token).await.unwrap_err();
        assert!(matches!(err, ToknError::Provider { .. }));
    }
}
