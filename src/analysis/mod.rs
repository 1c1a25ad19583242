//! Transcript analysis backend.
//!
//! The store treats analysis output as opaque documents; this module is the
//! collaborator that produces them. Two strategies implement
//! [`TranscriptAnalyzer`]: a live OpenAI-compatible chat-completions client
//! and a canned strategy serving the fixed payloads in [`fallback`]. The
//! strategy is chosen once, at construction, from config.
//!
//! Analysis calls never fail: upstream errors are logged and replaced with
//! the fallback payload. The only rejected inputs are an empty transcript or
//! question, which [`validate_transcript`]/[`validate_question`] catch
//! before any call is made.

pub mod fallback;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::{AnalyzerConfig, AnalyzerMode};
use crate::error::AppError;

/// One prior turn in a Q&A exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Strategy interface for the four analysis operations.
#[async_trait]
pub trait TranscriptAnalyzer: Send + Sync {
    /// Key points, action items, and decisions.
    async fn summarize(&self, transcript: &str) -> Value;

    /// Overall sentiment, per-segment trends, tension points, morale.
    async fn sentiment(&self, transcript: &str) -> Value;

    /// Effectiveness score, strengths, improvement areas, recommendations.
    async fn coach(&self, transcript: &str) -> Value;

    /// Answer a follow-up question given the transcript and prior turns.
    async fn chat(&self, transcript: &str, question: &str, history: &[ChatTurn]) -> String;
}

/// Select the analysis strategy from config, once.
pub fn build_analyzer(config: &AnalyzerConfig) -> Box<dyn TranscriptAnalyzer> {
    match config.mode {
        AnalyzerMode::Canned => Box::new(CannedAnalyzer),
        AnalyzerMode::Live => Box::new(LiveAnalyzer::new(config)),
    }
}

/// Request-boundary check: analysis is never attempted without a transcript.
pub fn validate_transcript(transcript: &str) -> Result<(), AppError> {
    if transcript.trim().is_empty() {
        return Err(AppError::Validation("no transcript provided".into()));
    }
    Ok(())
}

/// Request-boundary check for Q&A: both transcript and question required.
pub fn validate_question(transcript: &str, question: &str) -> Result<(), AppError> {
    validate_transcript(transcript)?;
    if question.trim().is_empty() {
        return Err(AppError::Validation("no question provided".into()));
    }
    Ok(())
}

// ============================================================================
// Canned strategy
// ============================================================================

/// Serves the fixed payloads directly; no network. The default mode.
pub struct CannedAnalyzer;

#[async_trait]
impl TranscriptAnalyzer for CannedAnalyzer {
    async fn summarize(&self, _transcript: &str) -> Value {
        fallback::summary()
    }

    async fn sentiment(&self, _transcript: &str) -> Value {
        fallback::sentiment()
    }

    async fn coach(&self, _transcript: &str) -> Value {
        fallback::coaching()
    }

    async fn chat(&self, _transcript: &str, question: &str, _history: &[ChatTurn]) -> String {
        fallback::answer_for(question)
    }
}

// ============================================================================
// Live strategy
// ============================================================================

const SUMMARY_SYSTEM: &str = "You are a meeting summarization assistant.";
const SENTIMENT_SYSTEM: &str = "You are a meeting sentiment analysis assistant.";
const COACH_SYSTEM: &str = "You are a meeting effectiveness coach.";
const CHAT_SYSTEM: &str = "You are an assistant that helps answer questions about meeting \
     transcripts. You have access to the full transcript and can provide specific information \
     from it.";

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct LiveAnalyzer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl LiveAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// One completion round-trip. Errors are strings — the callers only log
    /// them before falling back.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens,
        };

        log::info!(
            "Sending analysis request: model={}, messages={}",
            self.model,
            request.messages.len()
        );

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| format!("failed to call analysis backend: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("analysis backend returned {}: {}", status, body));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse backend response: {}", e))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| "backend response contained no choices".to_string())
    }

    /// Run one structured-analysis prompt and extract its JSON document.
    /// Any failure along the way yields the given fallback payload.
    async fn analyze_or_fallback(
        &self,
        operation: &str,
        system: &str,
        prompt: String,
        fallback_payload: Value,
    ) -> Value {
        let messages = vec![
            ChatMessage {
                role: "system".into(),
                content: system.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: prompt,
            },
        ];

        match self.complete(messages, 0.3, 1000).await {
            Ok(content) => match extract_json_from_response(&content) {
                Some(document) => document,
                None => {
                    log::warn!("{}: unparsable backend content, using fallback", operation);
                    fallback_payload
                }
            },
            Err(e) => {
                log::warn!("{}: {}, using fallback", operation, e);
                fallback_payload
            }
        }
    }
}

#[async_trait]
impl TranscriptAnalyzer for LiveAnalyzer {
    async fn summarize(&self, transcript: &str) -> Value {
        let prompt = format!(
            "You are an AI assistant specialized in summarizing meeting transcripts.\n\
             Analyze the following meeting transcript and provide:\n\
             1. Key Discussion Points: the main topics discussed\n\
             2. Action Items: tasks that were assigned, including who is responsible\n\
             3. Decisions Made: decisions that were finalized during the meeting\n\n\
             Meeting Transcript:\n{}\n\n\
             Respond with JSON only, shaped as:\n\
             {{\"key_points\": [{{\"point\": \"...\"}}], \
             \"action_items\": [{{\"task\": \"...\", \"assignee\": \"...\"}}], \
             \"decisions\": [{{\"decision\": \"...\"}}]}}",
            transcript
        );
        self.analyze_or_fallback("summarize", SUMMARY_SYSTEM, prompt, fallback::summary())
            .await
    }

    async fn sentiment(&self, transcript: &str) -> Value {
        let prompt = format!(
            "You are an AI assistant specialized in analyzing the emotional tone of meetings.\n\
             Analyze the following meeting transcript and provide:\n\
             1. Overall Sentiment: positive, negative, or neutral\n\
             2. Sentiment Trends: how the tone changed through the meeting\n\
             3. Tension Points: moments of disagreement or tension\n\
             4. Team Morale Indicators: signs of engagement or disengagement\n\n\
             Meeting Transcript:\n{}\n\n\
             Respond with JSON only, shaped as:\n\
             {{\"overall_sentiment\": \"positive\", \"sentiment_score\": 0.75, \
             \"sentiment_trends\": [{{\"segment\": \"Beginning\", \"tone\": \"...\", \"score\": 0.8}}], \
             \"tension_points\": [{{\"topic\": \"...\", \"description\": \"...\"}}], \
             \"morale_indicators\": [{{\"indicator\": \"...\", \"type\": \"positive\"}}]}}",
            transcript
        );
        self.analyze_or_fallback("sentiment", SENTIMENT_SYSTEM, prompt, fallback::sentiment())
            .await
    }

    async fn coach(&self, transcript: &str) -> Value {
        let prompt = format!(
            "You are an AI meeting coach specialized in improving meeting effectiveness.\n\
             Analyze the following meeting transcript and provide:\n\
             1. Meeting Effectiveness Score: 1-10\n\
             2. Strengths: what went well\n\
             3. Areas for Improvement\n\
             4. Specific Recommendations\n\
             5. Participation Balance: speaking time distribution\n\n\
             Meeting Transcript:\n{}\n\n\
             Respond with JSON only, shaped as:\n\
             {{\"effectiveness_score\": 7, \"strengths\": [{{\"strength\": \"...\"}}], \
             \"improvement_areas\": [{{\"area\": \"...\"}}], \
             \"recommendations\": [{{\"recommendation\": \"...\"}}], \
             \"participation_balance\": {{\"balanced\": true, \"description\": \"...\", \
             \"dominant_speakers\": [\"...\"]}}}}",
            transcript
        );
        self.analyze_or_fallback("coach", COACH_SYSTEM, prompt, fallback::coaching())
            .await
    }

    async fn chat(&self, transcript: &str, question: &str, history: &[ChatTurn]) -> String {
        let mut messages = vec![ChatMessage {
            role: "system".into(),
            content: CHAT_SYSTEM.into(),
        }];
        for turn in history {
            messages.push(ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".into(),
            content: format!(
                "Based on the following meeting transcript, please answer this question: {}\n\n\
                 Meeting Transcript:\n{}",
                question, transcript
            ),
        });

        match self.complete(messages, 0.5, 500).await {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("chat: {}, using fallback", e);
                fallback::answer_for(question)
            }
        }
    }
}

/// Extract JSON from LLM response (handles markdown code blocks)
fn extract_json_from_response(response: &str) -> Option<Value> {
    let trimmed = response.trim();

    // Try direct parse first
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        return Some(json);
    }

    // Try to extract from markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after_marker = &trimmed[start + 7..];
        if let Some(end) = after_marker.find("```") {
            let json_str = after_marker[..end].trim();
            if let Ok(json) = serde_json::from_str::<Value>(json_str) {
                return Some(json);
            }
        }
    }

    // Try to find a JSON object embedded in surrounding prose
    if let Some(start) = trimmed.find('{') {
        let mut depth = 0;
        let mut end = start;
        for (i, c) in trimmed[start..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        if end > start {
            if let Ok(json) = serde_json::from_str::<Value>(&trimmed[start..end]) {
                return Some(json);
            }
        }
    }

    None
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
