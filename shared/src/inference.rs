//! Gateway to the hosted text-generation model.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::InferenceSettings;
use crate::error::InferenceError;
use crate::sigv4::{self, SigningKey};

const JSON: &str = "application/json";
const SIGNING_SERVICE: &str = "bedrock";

#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Send `prompt` as a single user turn and return the endpoint's full JSON response.
    async fn invoke(&self, prompt: &str) -> Result<Value, InferenceError>;
}

#[derive(Clone)]
pub enum Credentials {
    ApiKey(String),
    AccessKey {
        access_key_id: String,
        secret_access_key: String,
    },
}

impl Credentials {
    /// API key wins over the access key pair when both are configured.
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self, InferenceError> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        if let Some(key) = non_empty(&settings.api_key) {
            return Ok(Credentials::ApiKey(key));
        }
        match (
            non_empty(&settings.access_key_id),
            non_empty(&settings.secret_access_key),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Credentials::AccessKey {
                access_key_id,
                secret_access_key,
            }),
            _ => Err(InferenceError::Credentials(
                "set inference.api_key or inference.access_key_id and inference.secret_access_key"
                    .into(),
            )),
        }
    }
}

/// Request body for one single-turn invocation.
pub fn request_payload(prompt: &str, max_new_tokens: u32) -> Value {
    json!({
        "inferenceConfig": {
            "max_new_tokens": max_new_tokens
        },
        "messages": [
            {
                "role": "user",
                "content": [
                    { "text": prompt }
                ]
            }
        ]
    })
}

/// Client for the model runtime's `InvokeModel` operation.
pub struct BedrockClient {
    http: Client,
    invoke_url: Url,
    region: String,
    max_new_tokens: u32,
    credentials: Credentials,
}

impl BedrockClient {
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self, InferenceError> {
        let credentials = Credentials::from_settings(settings)?;
        let raw = format!(
            "{}/model/{}/invoke",
            settings.endpoint_url(),
            urlencoding::encode(&settings.model_id)
        );
        let invoke_url =
            Url::parse(&raw).map_err(|e| InferenceError::Endpoint(format!("{raw}: {e}")))?;
        Ok(Self {
            http: Client::new(),
            invoke_url,
            region: settings.region.clone(),
            max_new_tokens: settings.max_new_tokens,
            credentials,
        })
    }

    pub fn invoke_url(&self) -> &Url {
        &self.invoke_url
    }
}

#[async_trait]
impl InferenceGateway for BedrockClient {
    async fn invoke(&self, prompt: &str) -> Result<Value, InferenceError> {
        let body = serde_json::to_vec(&request_payload(prompt, self.max_new_tokens))
            .map_err(InferenceError::Decode)?;

        let mut req = self
            .http
            .post(self.invoke_url.clone())
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON);
        req = match &self.credentials {
            Credentials::ApiKey(key) => req.bearer_auth(key),
            Credentials::AccessKey {
                access_key_id,
                secret_access_key,
            } => {
                let key = SigningKey {
                    access_key_id,
                    secret_access_key,
                    region: &self.region,
                    service: SIGNING_SERVICE,
                };
                sigv4::sign_request("POST", &self.invoke_url, Some(JSON), &body, &key, Utc::now())
                    .into_iter()
                    .fold(req, |req, (name, value)| req.header(name, value))
            }
        };

        debug!("\u{2192} model request: url = {}", self.invoke_url);
        let res = req.body(body).send().await.map_err(|e| {
            error!("network error to model endpoint: {e}");
            InferenceError::Transport(e)
        })?;

        let status = res.status();
        let bytes = res.bytes().await.map_err(InferenceError::Transport)?;
        debug!(
            %status,
            "\u{2190} body = {}",
            String::from_utf8_lossy(&bytes[..bytes.len().min(1024)])
        );

        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(InferenceError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_prompt_and_budget() {
        let p = request_payload("analyze", 1000);
        assert_eq!(p["inferenceConfig"]["max_new_tokens"], 1000);
        assert_eq!(p["messages"].as_array().unwrap().len(), 1);
        assert_eq!(p["messages"][0]["role"], "user");
        assert_eq!(p["messages"][0]["content"][0]["text"], "analyze");
    }

    #[test]
    fn credentials_are_required() {
        let settings = InferenceSettings::default();
        assert!(matches!(
            Credentials::from_settings(&settings),
            Err(InferenceError::Credentials(_))
        ));

        let settings = InferenceSettings {
            access_key_id: Some("AKID".into()),
            secret_access_key: Some("secret".into()),
            ..Default::default()
        };
        assert!(matches!(
            Credentials::from_settings(&settings),
            Ok(Credentials::AccessKey { .. })
        ));
    }

    #[test]
    fn model_id_is_escaped_in_path() {
        let settings = InferenceSettings {
            api_key: Some("k".into()),
            ..Default::default()
        };
        let client = BedrockClient::from_settings(&settings).unwrap();
        assert_eq!(
            client.invoke_url().as_str(),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/amazon.nova-lite-v1%3A0/invoke"
        );
    }
}
