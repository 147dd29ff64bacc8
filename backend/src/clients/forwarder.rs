//! POSTs normalized notifications to the downstream processing endpoint.

use serde::Serialize;
use serde_json::Value;

use super::{read_body, ClientError};

const SERVICE: &str = "Downstream endpoint";

#[derive(Debug, Clone, Default)]
pub struct Forwarder {
    http: reqwest::Client,
}

impl Forwarder {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Deliver `payload` once. The downstream reply is returned as JSON, or as
    /// a JSON string when it is not JSON.
    pub async fn forward<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let body = read_body(SERVICE, response).await?;
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_forward_returns_downstream_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/calendar"))
            .and(body_json(json!({"hello": "world"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stored": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/functions/v1/calendar", server.uri());
        let result = Forwarder::default()
            .forward(&url, &json!({"hello": "world"}))
            .await
            .expect("should forward");
        assert_eq!(result, json!({"stored": 3}));
    }

    #[tokio::test]
    async fn test_forward_plain_text_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let result = Forwarder::default()
            .forward(&server.uri(), &json!({}))
            .await
            .expect("should forward");
        assert_eq!(result, Value::String("ok".to_string()));
    }

    #[tokio::test]
    async fn test_forward_failure_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("function crashed"))
            .expect(1)
            .mount(&server)
            .await;

        let err = Forwarder::default()
            .forward(&server.uri(), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Upstream { status: 503, ref body, .. } if body == "function crashed"
        ));
    }
}
