use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SummarizerSettings;
use crate::error::AnalyzeError;
use crate::model::AiAnalysis;

const SUMMARY_PROMPT: &str = r#"Context: You are a content analysis assistant. Your task is to read the text of a website and summarize it objectively.
Return ONLY a valid JSON object.

Your output JSON MUST contain EXACTLY the following keys:
{
  "general_summary": "A general summary (2-3 sentences) of what this page is and its main purpose.",
  "main_subject": "What is the main subject, or the central product/service offered?",
  "target_audience": "Who is this site for? (e.g. 'Developers', 'Retail companies', 'End consumers')."
}"#;

/// Text in, structured summary out. Implementations may fail freely;
/// [`Analyzer`] absorbs every failure.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<AiAnalysis, AnalyzeError>;
}

/// Safe-fail front of the summarizer.
pub struct Analyzer {
    summarizer: Option<Arc<dyn Summarizer>>,
    max_input_chars: usize,
}

impl Analyzer {
    pub fn new(summarizer: Arc<dyn Summarizer>, max_input_chars: usize) -> Self {
        Analyzer {
            summarizer: Some(summarizer),
            max_input_chars,
        }
    }

    /// No credential: every call returns an empty analysis.
    pub fn disabled() -> Self {
        Analyzer {
            summarizer: None,
            max_input_chars: 0,
        }
    }

    pub fn from_settings(settings: &SummarizerSettings) -> anyhow::Result<Self> {
        match &settings.api_key {
            Some(key) => {
                let client = GeminiSummarizer::new(settings, key.clone())?;
                Ok(Analyzer::new(Arc::new(client), settings.max_input_chars))
            }
            None => {
                warn!("No summarizer API key configured; AI analysis will be empty.");
                Ok(Analyzer::disabled())
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.summarizer.is_some()
    }

    /// Never fails: any problem yields an empty [`AiAnalysis`] and a log line.
    pub async fn analyze(&self, combined_text: &str) -> AiAnalysis {
        let Some(summarizer) = &self.summarizer else {
            warn!("AI analysis skipped: {}", AnalyzeError::MissingCredential);
            return AiAnalysis::default();
        };
        if combined_text.trim().is_empty() {
            warn!("AI analysis skipped: no page text to summarize");
            return AiAnalysis::default();
        }

        let text = truncate_chars(combined_text, self.max_input_chars);
        match summarizer.summarize(text).await {
            Ok(analysis) => {
                info!("AI analysis received");
                analysis
            }
            Err(e) => {
                warn!("AI analysis failed, returning empty: {}", e);
                AiAnalysis::default()
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Gemini ──

pub struct GeminiSummarizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
}

impl GeminiSummarizer {
    pub fn new(settings: &SummarizerSettings, api_key: String) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing summarizer API key");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        let model = settings.model.trim_start_matches("models/");
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            settings.base_url.trim_end_matches('/'),
            model
        );
        Ok(GeminiSummarizer {
            client,
            endpoint,
            api_key: api_key.trim().to_string(),
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str) -> Result<AiAnalysis, AnalyzeError> {
        let prompt = format!("{}\n\nWebsite text:\n{}", SUMMARY_PROMPT, text);
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                candidate_count: 1,
                temperature: self.temperature,
                response_mime_type: "application/json",
            },
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            return Err(AnalyzeError::Status {
                status: status.as_u16(),
                body: raw.chars().take(500).collect(),
            });
        }
        parse_response(&raw)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u32,
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Exactly the three keys the prompt asks for.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SummaryPayload {
    general_summary: String,
    main_subject: String,
    target_audience: String,
}

/// Pull the model's JSON answer out of a `generateContent` response body.
pub fn parse_response(raw: &str) -> Result<AiAnalysis, AnalyzeError> {
    let resp: GenerateResponse =
        serde_json::from_str(raw).map_err(|e| AnalyzeError::Malformed(e.to_string()))?;
    let text = resp
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| AnalyzeError::Malformed("no candidate text".into()))?;

    let payload: SummaryPayload = serde_json::from_str(strip_code_fence(&text))?;
    Ok(AiAnalysis {
        general_summary: Some(payload.general_summary),
        main_subject: Some(payload.main_subject),
        target_audience: Some(payload.target_audience),
    })
}

/// Some models wrap JSON in ```json fences despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    match t.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => t,
    }
}

// ── Tests ──
