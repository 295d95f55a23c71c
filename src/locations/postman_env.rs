//! Postman environment location handler.
//!
//! A remote collection of named variables: the path is the variable key and
//! the `environment_id` metadata names the collection. Writes replace only
//! the addressed variable; the snapshot captures the entire environment so
//! restore is lossless even if sibling variables were somehow touched.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{LocationHandler, Snapshot};
use crate::error::{LocationErrorKind, Result, ToknError};
use crate::registry::LocationSpec;

const API_BASE: &str = "https://api.getpostman.com";

pub struct PostmanEnvHandler {
    base: String,
    client: reqwest::Client,
}

impl PostmanEnvHandler {
    pub fn new() -> Self {
        Self::with_base(API_BASE.to_string())
    }

    /// Point the handler at a different API base (used by tests).
    pub fn with_base(base: String) -> Self {
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    fn api_key(&self, spec: &LocationSpec) -> Result<String> {
        std::env::var("POSTMAN_API_KEY").map_err(|_| {
            ToknError::location(
                spec.to_string(),
                LocationErrorKind::PermissionDenied,
                "POSTMAN_API_KEY environment variable not set",
            )
        })
    }

    fn environment_id<'a>(&self, spec: &'a LocationSpec) -> Result<&'a str> {
        spec.meta("environment_id").ok_or_else(|| {
            ToknError::location(
                spec.to_string(),
                LocationErrorKind::NotFound,
                "location metadata is missing environment_id",
            )
        })
    }

    /// Fetch the whole environment object.
    async fn get_environment(&self, spec: &LocationSpec) -> Result<Value> {
        let api_key = self.api_key(spec)?;
        let environment_id = self.environment_id(spec)?;

        let response = self
            .client
            .get(format!("{}/environments/{}", self.base, environment_id))
            .header("X-API-Key", api_key)
            .send()
            .await
            .map_err(|e| {
                ToknError::location(spec.to_string(), LocationErrorKind::PermissionDenied, e.to_string())
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ToknError::location(
                spec.to_string(),
                LocationErrorKind::NotFound,
                format!("environment {} not found", environment_id),
            ));
        }
        if !status.is_success() {
            return Err(ToknError::location(
                spec.to_string(),
                LocationErrorKind::PermissionDenied,
                format!("Postman API returned status {}", status.as_u16()),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            ToknError::location(spec.to_string(), LocationErrorKind::PermissionDenied, e.to_string())
        })?;
        Ok(body["environment"].clone())
    }

    /// Replace the environment wholesale with the given values array.
    async fn put_environment(&self, spec: &LocationSpec, environment: &Value) -> Result<()> {
        let api_key = self.api_key(spec)?;
        let environment_id = self.environment_id(spec)?;

        let response = self
            .client
            .put(format!("{}/environments/{}", self.base, environment_id))
            .header("X-API-Key", api_key)
            .json(&json!({ "environment": environment }))
            .send()
            .await
            .map_err(|e| {
                ToknError::location(spec.to_string(), LocationErrorKind::WriteFailed, e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(ToknError::location(
                spec.to_string(),
                LocationErrorKind::WriteFailed,
                format!("Postman API returned status {}", response.status().as_u16()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LocationHandler for PostmanEnvHandler {
    async fn read(&self, spec: &LocationSpec) -> Result<String> {
        let environment = self.get_environment(spec).await?;

        let values = environment["values"].as_array().cloned().unwrap_or_default();
        for var in &values {
            if var["key"].as_str() == Some(&spec.path) {
                return Ok(var["value"].as_str().unwrap_or_default().to_string());
            }
        }
        Err(ToknError::location(
            spec.to_string(),
            LocationErrorKind::NotFound,
            format!("variable '{}' not present in environment", spec.path),
        ))
    }

    async fn write(&self, spec: &LocationSpec, value: &str) -> Result<()> {
        let mut environment = self.get_environment(spec).await?;

        let values = environment["values"]
            .as_array_mut()
            .ok_or_else(|| {
                ToknError::location(
                    spec.to_string(),
                    LocationErrorKind::WriteFailed,
                    "environment has no values array",
                )
            })?;

        let mut found = false;
        for var in values.iter_mut() {
            if var["key"].as_str() == Some(&spec.path) {
                var["value"] = Value::String(value.to_string());
                found = true;
                break;
            }
        }
        if !found {
            values.push(json!({ "key": spec.path, "value": value, "enabled": true }));
        }

        self.put_environment(spec, &environment).await
    }

    async fn backup(&self, spec: &LocationSpec) -> Result<Snapshot> {
        // Snapshot the whole environment so restore can undo a write exactly,
        // sibling variables included.
        let environment = self.get_environment(spec).await?;
        Ok(Snapshot::new(serde_json::to_string(&environment)?))
    }

    async fn restore(&self, spec: &LocationSpec, snapshot: &Snapshot) -> Result<()> {
        let environment: Value = serde_json::from_str(snapshot.content())?;
        self.put_environment(spec, &environment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn env_body() -> Value {
        json!({
            "environment": {
                "name": "integration",
                "values": [
                    { "key": "API_SECRET", "value": "old-secret", "enabled": true },
                    { "key": "OTHER_VAR", "value": "keep-me", "enabled": true }
                ]
            }
        })
    }

    fn spec_for(env_id: &str) -> LocationSpec {
        let mut spec = LocationSpec::new("postman-env", "API_SECRET");
        spec.metadata
            .insert("environment_id".to_string(), env_id.to_string());
        spec
    }

    #[tokio::test]
    async fn read_returns_the_addressed_variable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/environments/env-1"))
            .and(header("X-API-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(env_body()))
            .mount(&server)
            .await;

        unsafe { std::env::set_var("POSTMAN_API_KEY", "test-key") };
        let handler = PostmanEnvHandler::with_base(server.uri());
        let value = handler.read(&spec_for("env-1")).await.unwrap();
        assert_eq!(value, "old-secret");
    }

    #[tokio::test]
    async fn write_preserves_sibling_variables() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/environments/env-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(env_body()))
            .mount(&server)
            .await;

        let expected = json!({
            "environment": {
                "name": "integration",
                "values": [
                    { "key": "API_SECRET", "value": "new-secret", "enabled": true },
                    { "key": "OTHER_VAR", "value": "keep-me", "enabled": true }
                ]
            }
        });
        Mock::given(method("PUT"))
            .and(path("/environments/env-2"))
            .and(body_json_string(expected.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        unsafe { std::env::set_var("POSTMAN_API_KEY", "test-key") };
        let handler = PostmanEnvHandler::with_base(server.uri());
        handler.write(&spec_for("env-2"), "new-secret").await.unwrap();
    }

    #[tokio::test]
    async fn missing_environment_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/environments/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        unsafe { std::env::set_var("POSTMAN_API_KEY", "test-key") };
        let handler = PostmanEnvHandler::with_base(server.uri());
        let err = handler.read(&spec_for("gone")).await.unwrap_err();
        assert!(matches!(
            err,
            ToknError::Location {
                kind: LocationErrorKind::NotFound,
                ..
            }
        ));
    }
}
