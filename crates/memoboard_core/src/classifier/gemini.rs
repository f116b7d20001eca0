//! Gemini-backed sentiment classifier.
//!
//! Sends one `generateContent` request with a JSON response schema and reads
//! `{sentiment, colorHex}` from the first candidate.

use super::{ClassifierError, SentimentClassifier};
use crate::config::ClassifierConfig;
use crate::model::sentiment::{Sentiment, SentimentResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client for the Gemini generative language API.
pub struct GeminiClassifier {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

/// JSON payload the model is asked to produce.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentPayload {
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    color_hex: Option<String>,
}

impl GeminiClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Builds a classifier sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, config: &ClassifierConfig) -> Self {
        Self {
            client,
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[async_trait]
impl SentimentClassifier for GeminiClassifier {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn classify(&self, text: &str) -> Result<SentimentResult, ClassifierError> {
        let api_key = self.api_key.as_deref().ok_or(ClassifierError::NotConfigured)?;

        let resp = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", api_key)
            .json(&request_body(text))
            .send()
            .await?;

        if !resp.status().is_success() {
            let code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                code,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        parse_generate_response(parsed)
    }
}

fn request_body(text: &str) -> Value {
    let tags = Sentiment::ALL
        .iter()
        .map(|tag| tag.as_str())
        .collect::<Vec<_>>();
    json!({
        "contents": [{
            "parts": [{ "text": build_prompt(text) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "sentiment": { "type": "STRING", "enum": tags },
                    "colorHex": { "type": "STRING" }
                },
                "required": ["sentiment", "colorHex"]
            }
        }
    })
}

fn build_prompt(text: &str) -> String {
    // Debug formatting quotes and escapes the note so it cannot close the
    // surrounding instruction.
    format!(
        "Analyze the sentiment of this text: {text:?}. Return a JSON object with 'sentiment' \
         (one of: happy, sad, angry, neutral, love) and a soft pastel 'colorHex' that matches \
         the emotion (e.g., light pink for love, light blue for sad, etc.)."
    )
}

fn parse_generate_response(
    response: GenerateContentResponse,
) -> Result<SentimentResult, ClassifierError> {
    let raw = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| ClassifierError::Malformed("response has no text candidate".to_string()))?;

    let payload: SentimentPayload = serde_json::from_str(raw.trim())
        .map_err(|err| ClassifierError::Malformed(format!("candidate is not JSON: {err}")))?;

    SentimentResult::from_raw(payload.sentiment.as_deref(), payload.color_hex.as_deref())
        .ok_or_else(|| {
            ClassifierError::Malformed(format!(
                "invalid sentiment/color pair: sentiment={:?} colorHex={:?}",
                payload.sentiment, payload.color_hex
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::{parse_generate_response, request_body, GeminiClassifier, GenerateContentResponse};
    use crate::classifier::{ClassifierError, SentimentClassifier};
    use crate::config::ClassifierConfig;
    use crate::model::sentiment::Sentiment;
    use serde_json::json;

    fn response(text: &str) -> GenerateContentResponse {
        serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
        .expect("fixture should deserialize")
    }

    #[test]
    fn parses_schema_conforming_candidate() {
        let parsed =
            parse_generate_response(response(r##"{"sentiment":"love","colorHex":"#ffe4e6"}"##))
                .expect("candidate should parse");
        assert_eq!(parsed.sentiment, Sentiment::Love);
        assert_eq!(parsed.color_hex, "#ffe4e6");
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = parse_generate_response(response(r#"{"sentiment":"sad"}"#)).expect_err("response should be malformed");
        assert!(matches!(err, ClassifierError::Malformed(_)));

        let err = parse_generate_response(response("not json")).expect_err("response should be malformed");
        assert!(matches!(err, ClassifierError::Malformed(_)));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).expect("fixture should deserialize");
        assert!(matches!(
            parse_generate_response(empty).expect_err("response should be malformed"),
            ClassifierError::Malformed(_)
        ));
    }

    #[test]
    fn request_body_constrains_sentiment_enum() {
        let body = request_body("a \"quoted\" note");
        let tags = &body["generationConfig"]["responseSchema"]["properties"]["sentiment"]["enum"];
        assert_eq!(tags.as_array().map(Vec::len), Some(5));
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().expect("value should be a string");
        assert!(prompt.contains(r#"\"quoted\""#));
    }

    #[test]
    fn blank_api_key_is_not_configured() {
        let mut config = ClassifierConfig::default();
        config.api_key = Some("   ".to_string());
        assert!(!GeminiClassifier::new(&config).is_configured());

        config.api_key = Some("key".to_string());
        assert!(GeminiClassifier::new(&config).is_configured());
    }

    #[tokio::test]
    async fn unconfigured_classify_fails_without_network() {
        let classifier = GeminiClassifier::new(&ClassifierConfig::default());
        let err = classifier.classify("hello").await.expect_err("classification should fail");
        assert!(matches!(err, ClassifierError::NotConfigured));
    }
}
