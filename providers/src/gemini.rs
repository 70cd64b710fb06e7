//! Gemini `generateContent` (non-streaming) wire format.
//!
//! Request:
//!
//! ```text
//! POST {base}/models/{model}:generateContent?key={credential}
//! { "contents": [ { "role": "user", "parts": [ { "text": "..." } ] } ] }
//! ```
//!
//! Success bodies carry `candidates[].content.parts[].text`; failures carry
//! `error.message`. Both shapes are read leniently: anything that is valid JSON
//! but not the expected shape simply yields no reply text.

use crate::{CancellationToken, HttpReply, Transport, TransportError, client_builder};
use parley_types::Credential;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Single-turn request body: one user content entry, no history.
#[must_use]
pub fn build_request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }]
    })
}

/// Parse a response body as JSON without assuming its shape.
pub fn parse_response_body(body: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(body)
}

/// Concatenate every text part of the first candidate, trimmed.
///
/// Returns an empty string when there are no candidates, no parts, or the body
/// does not have the expected shape.
#[must_use]
pub fn extract_reply(body: &Value) -> String {
    let response = match GenerateContentResponse::deserialize(body) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(%e, "Response body is not a generateContent payload");
            return String::new();
        }
    };

    let Some(content) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
    else {
        return String::new();
    };

    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    text.trim().to_string()
}

/// `error.message` from an error body, if present and non-blank.
#[must_use]
pub fn error_message(body: &Value) -> Option<String> {
    ErrorEnvelope::deserialize(body)
        .ok()?
        .error?
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = client_builder().build()?;
        let client = Self {
            client,
            base_url,
            model: model.into(),
        };
        // Reject a malformed base URL up front instead of on the first turn.
        client.method_url()?;
        Ok(client)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint without the credential, safe to log.
    pub fn method_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        ))
    }

    fn endpoint(&self, credential: &Credential) -> Result<Url, url::ParseError> {
        let mut url = self.method_url()?;
        url.query_pairs_mut()
            .append_pair("key", credential.expose());
        Ok(url)
    }

    async fn exchange(&self, url: Url, prompt: &str) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&build_request_body(prompt))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

impl Transport for GeminiClient {
    async fn send(
        &self,
        credential: &Credential,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<HttpReply, TransportError> {
        let url = self.endpoint(credential)?;
        tracing::debug!(model = %self.model, prompt_bytes = prompt.len(), "Sending generateContent");

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TransportError::Aborted),
            result = self.exchange(url, prompt) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn builds_single_turn_body() {
        let body = build_request_body("Hello");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "Hello");
        assert!(body.get("system_instruction").is_none());
    }

    #[test]
    fn extracts_all_text_parts_of_first_candidate() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "  Hi" }, { "inlineData": {} }, { "text": " there \n" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        assert_eq!(extract_reply(&body), "Hi there");
    }

    #[test]
    fn empty_candidates_yield_empty_reply() {
        assert_eq!(extract_reply(&json!({ "candidates": [] })), "");
        assert_eq!(extract_reply(&json!({})), "");
        assert_eq!(extract_reply(&json!({ "candidates": [{}] })), "");
        assert_eq!(
            extract_reply(&json!({ "candidates": [{ "content": { "parts": [{ "text": "   " }] } }] })),
            ""
        );
    }

    #[test]
    fn unexpected_shape_yields_empty_reply() {
        assert_eq!(extract_reply(&json!([1, 2, 3])), "");
        assert_eq!(extract_reply(&json!({ "candidates": "nope" })), "");
    }

    #[test]
    fn reads_error_message() {
        let body = json!({ "error": { "code": 429, "message": "quota exceeded" } });
        assert_eq!(error_message(&body).as_deref(), Some("quota exceeded"));
        assert!(error_message(&json!({ "error": {} })).is_none());
        assert!(error_message(&json!({ "error": { "message": " " } })).is_none());
        assert!(error_message(&json!("oops")).is_none());
    }

    #[test]
    fn rejects_non_json_body() {
        assert!(parse_response_body("<html>bad gateway</html>").is_err());
        assert!(parse_response_body("").is_err());
    }

    #[test]
    fn method_url_has_no_credential() {
        let client = GeminiClient::new("https://example.test/v1beta/", "gemini-2.0-flash").unwrap();
        let url = client.method_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(
            GeminiClient::new("not a url", "gemini-2.0-flash"),
            Err(TransportError::Endpoint(_))
        ));
    }

    #[tokio::test]
    async fn posts_prompt_with_key_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "AIza-test"))
            .and(header("content-type", "application/json"))
            .and(body_json(build_request_body("Hello")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Hi there" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(format!("{}/v1beta", server.uri()), "gemini-2.0-flash").unwrap();
        let credential = Credential::new("AIza-test").unwrap();
        let reply = client
            .send(&credential, "Hello", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply.status, 200);
        let body = parse_response_body(&reply.body).unwrap();
        assert_eq!(extract_reply(&body), "Hi there");
    }

    #[tokio::test]
    async fn reports_error_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({ "error": { "message": "quota exceeded" } })),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "gemini-2.0-flash").unwrap();
        let credential = Credential::new("AIza-test").unwrap();
        let reply = client
            .send(&credential, "Hello", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply.status, 429);
        assert!(!reply.is_success());
        let body = parse_response_body(&reply.body).unwrap();
        assert_eq!(error_message(&body).as_deref(), Some("quota exceeded"));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "gemini-2.0-flash").unwrap();
        let credential = Credential::new("AIza-test").unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = client.send(&credential, "Hello", &cancel).await;
        assert!(matches!(result, Err(TransportError::Aborted)));
    }
}
