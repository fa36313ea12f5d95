//! # Kowalski queue client
//!
//! Blocking client of the Kowalski API used to manage ZTF ToO queues:
//!
//! | call | endpoint |
//! | --- | --- |
//! | authenticate | `POST /api/auth` with `{username, password}` → `{status, token}` |
//! | ping | `GET /` |
//! | submit | `PUT /api/triggers/ztf` with a [`Trigger`] |
//! | delete | `DELETE /api/triggers/ztf` with `{user, queue_name}` |
//! | list | `GET /api/triggers/ztf?user=...` → `{status, data}` |
//!
//! Every response carries a `status` field; anything but `"success"` is turned into
//! [`ApiError::Request`]. HTTP error codes are not raised by the transport so that the
//! server message can be reported.
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use ureq::Agent;

use crate::config::KowalskiConfig;

use super::{ApiError, QueueBackend, QueueRecord, Trigger};

const TRIGGERS_ENDPOINT: &str = "/api/triggers/ztf";

/// Envelope shared by every Kowalski response.
#[derive(Debug, Deserialize)]
struct KowalskiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl KowalskiResponse {
    fn into_success(self) -> Result<Self, ApiError> {
        if self.status == "success" {
            Ok(self)
        } else {
            Err(ApiError::Request {
                status: self.status,
                message: self.message.unwrap_or_default(),
            })
        }
    }
}

fn transport(error: ureq::Error) -> ApiError {
    ApiError::Transport(error.to_string())
}

fn decode(error: ureq::Error) -> ApiError {
    ApiError::Decode(error.to_string())
}

fn read_response(
    response: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> Result<KowalskiResponse, ApiError> {
    let mut response = response.map_err(transport)?;
    response
        .body_mut()
        .read_json::<KowalskiResponse>()
        .map_err(decode)
}

#[derive(Debug, Clone)]
pub struct KowalskiClient {
    agent: Agent,
    base_url: String,
    token: String,
}

impl KowalskiClient {
    /// Authenticate against the configured Kowalski instance and check that it answers.
    ///
    /// Arguments
    /// ---------
    /// * `config`: endpoint, timeout and credentials; missing credentials are an
    ///   [`ApiError::Authentication`] error.
    pub fn connect(config: &KowalskiConfig) -> Result<Self, ApiError> {
        let (Some(username), Some(password)) = (&config.username, &config.password) else {
            return Err(ApiError::Authentication(
                "no Kowalski credentials configured (PLANOBS_KOWALSKI_USER / PLANOBS_KOWALSKI_PASSWORD)"
                    .into(),
            ));
        };

        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout)))
            .http_status_as_error(false)
            .build()
            .into();
        let base_url = config.base_url();

        let reply = read_response(
            agent
                .post(format!("{base_url}/api/auth"))
                .send_json(json!({ "username": username, "password": password })),
        )
        .map_err(|e| ApiError::Authentication(e.to_string()))?;

        let token = match reply.into_success() {
            Ok(KowalskiResponse {
                token: Some(token), ..
            }) => token,
            Ok(_) => return Err(ApiError::Authentication("no token in response".into())),
            Err(e) => return Err(ApiError::Authentication(e.to_string())),
        };

        let client = KowalskiClient {
            agent,
            base_url,
            token,
        };
        client.ping()?;
        log::info!("Connected to Kowalski at {}", client.base_url);
        Ok(client)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Check that the API answers with a successful status.
    pub fn ping(&self) -> Result<(), ApiError> {
        read_response(
            self.agent
                .get(self.url("/"))
                .header("Authorization", self.bearer())
                .call(),
        )
        .and_then(KowalskiResponse::into_success)
        .map(|_| ())
        .map_err(|e| ApiError::PingFailed(e.to_string()))
    }
}

impl QueueBackend for KowalskiClient {
    fn submit(&self, trigger: &Trigger) -> Result<(), ApiError> {
        read_response(
            self.agent
                .put(self.url(TRIGGERS_ENDPOINT))
                .header("Authorization", self.bearer())
                .send_json(trigger),
        )?
        .into_success()?;
        Ok(())
    }

    fn delete(&self, user: &str, queue_name: &str) -> Result<(), ApiError> {
        read_response(
            self.agent
                .delete(self.url(TRIGGERS_ENDPOINT))
                .header("Authorization", self.bearer())
                .force_send_body()
                .send_json(json!({ "user": user, "queue_name": queue_name })),
        )?
        .into_success()?;
        Ok(())
    }

    fn list(&self, user: &str) -> Result<Vec<QueueRecord>, ApiError> {
        let reply = read_response(
            self.agent
                .get(self.url(TRIGGERS_ENDPOINT))
                .header("Authorization", self.bearer())
                .query("user", user)
                .call(),
        )?
        .into_success()?;

        match reply.data {
            Some(data) => {
                serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod kowalski_test {
    use super::*;

    #[test]
    fn test_response_status() {
        let ok: KowalskiResponse =
            serde_json::from_str(r#"{"status": "success", "data": [{"queue_name": "ToO_a_0", "user": "DESY"}]}"#)
                .unwrap();
        let ok = ok.into_success().unwrap();
        let records: Vec<QueueRecord> = serde_json::from_value(ok.data.unwrap()).unwrap();
        assert_eq!(records[0].queue_name, "ToO_a_0");
        assert_eq!(records[0].extra["user"], "DESY");

        let rejected: KowalskiResponse =
            serde_json::from_str(r#"{"status": "error", "message": "queue not found"}"#).unwrap();
        assert_eq!(
            rejected.into_success().unwrap_err(),
            ApiError::Request {
                status: "error".into(),
                message: "queue not found".into()
            }
        );
    }

    #[test]
    fn test_connect_without_credentials() {
        assert!(matches!(
            KowalskiClient::connect(&KowalskiConfig::default()),
            Err(ApiError::Authentication(_))
        ));
    }

    #[test]
    fn test_unreachable_server() {
        let config = KowalskiConfig {
            protocol: "http".into(),
            host: "127.0.0.1".into(),
            port: 9,
            timeout: 1,
            username: Some("user".into()),
            password: Some("password".into()),
        };
        assert!(matches!(
            KowalskiClient::connect(&config),
            Err(ApiError::Authentication(_))
        ));
    }
}
