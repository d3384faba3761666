use std::time::Duration;

use jobscout_core::config::{ApplicantProfile, CoverLetterConfig};
use jobscout_core::error::AppError;
use jobscout_core::models::JobRecord;
use jobscout_core::traits::LetterWriter;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_DESCRIPTION_CHARS: usize = 6000;
const DEFAULT_SYSTEM_PROMPT: &str = "You are a career assistant who writes concise, specific cover letters. Write in the first person, refer to the actual requirements of the posting, and do not invent experience the applicant has not described. Reply with the letter text only.";

/// OpenAI-compatible chat-completion client that writes cover letters.
///
/// Works with any OpenAI-compatible API, including:
/// - OpenAI directly (`https://api.openai.com/v1`)
/// - Gemini via compatibility layer (`https://generativelanguage.googleapis.com/v1beta/openai`)
#[derive(Clone)]
pub struct OpenAiLetterWriter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    max_tokens: u32,
    temperature: f32,
    max_description_chars: usize,
    system_prompt: String,
    applicant: Option<ApplicantProfile>,
}

impl OpenAiLetterWriter {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AppError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEFAULT_LLM_TIMEOUT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs: DEFAULT_LLM_TIMEOUT.as_secs(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_description_chars: DEFAULT_MAX_DESCRIPTION_CHARS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            applicant: None,
        })
    }

    /// Build a writer from the `cover_letter` config section.
    pub fn from_config(api_key: &str, config: &CoverLetterConfig) -> Result<Self, AppError> {
        let writer = Self::with_base_url(api_key, &config.model, &config.base_url)?
            .with_timeout(config.timeout())?;
        let writer = Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_description_chars: config.max_description_chars,
            applicant: config.applicant.clone(),
            ..writer
        };
        Ok(match &config.system_prompt {
            Some(p) => writer.with_system_prompt(p.clone()),
            None => writer,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AppError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;
        self.timeout_secs = timeout.as_secs();
        Ok(self)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_applicant(mut self, applicant: ApplicantProfile) -> Self {
        self.applicant = Some(applicant);
        self
    }

    /// The user message sent for `record`.
    pub fn build_prompt(&self, record: &JobRecord) -> String {
        let description = truncate_chars(record.description(), self.max_description_chars);
        let mut prompt = format!(
            "Write a tailored cover letter for the following job posting.\n\n\
             Job title: {}\nCompany: {}\nLocation: {}\n\nJob description:\n{}",
            record.title(),
            record.company(),
            record.location(),
            description,
        );

        if let Some(applicant) = &self.applicant {
            if !applicant.name.trim().is_empty() {
                prompt.push_str(&format!("\n\nApplicant name: {}", applicant.name.trim()));
            }
            if !applicant.summary.trim().is_empty() {
                prompt.push_str(&format!(
                    "\n\nApplicant background:\n{}",
                    applicant.summary.trim()
                ));
            }
        }
        prompt
    }
}

/// Cut `text` to at most `max` characters, on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Pull the trimmed text of the first choice out of a completion response.
fn first_choice_text(response: ChatResponse) -> Result<String, AppError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AppError::LlmError {
            message: "Empty response from LLM".into(),
            status_code: 200,
        });
    }
    Ok(text)
}

impl LetterWriter for OpenAiLetterWriter {
    async fn write_letter(&self, record: &JobRecord) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: self.build_prompt(record),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {}", e))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status_code, body));

            return Err(AppError::LlmError {
                message,
                status_code,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse LLM response: {}", e)))?;

        first_choice_text(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use jobscout_core::models::SourceKind;
    use jobscout_core::testutil::{make_test_record, test_date};

    use super::*;

    fn writer() -> OpenAiLetterWriter {
        OpenAiLetterWriter::new("sk-test", "gpt-4o-mini").unwrap()
    }

    #[test]
    fn test_prompt_embeds_posting() {
        let record = make_test_record(SourceKind::JustJoin, "Rust Engineer", "Other Inc");
        let prompt = writer().build_prompt(&record);
        assert!(prompt.contains("Job title: Rust Engineer"));
        assert!(prompt.contains("Company: Other Inc"));
        assert!(prompt.contains("Location: Warsaw, PL"));
        assert!(prompt.contains("Rust Engineer at Other Inc"));
        assert!(!prompt.contains("Applicant"));
    }

    #[test]
    fn test_prompt_includes_applicant() {
        let record = make_test_record(SourceKind::LinkedIn, "Rust Engineer", "Other Inc");
        let prompt = writer()
            .with_applicant(ApplicantProfile {
                name: "Ada".into(),
                summary: "Five years of systems programming.".into(),
            })
            .build_prompt(&record);
        assert!(prompt.contains("Applicant name: Ada"));
        assert!(prompt.contains("Five years of systems programming."));
    }

    #[test]
    fn test_prompt_truncates_long_description() {
        let long = "ł".repeat(10_000);
        let record = JobRecord::new(SourceKind::JustJoin, "Dev", "https://x/1", test_date())
            .with_description(long);
        let config = CoverLetterConfig {
            max_description_chars: 100,
            ..Default::default()
        };
        let prompt = OpenAiLetterWriter::from_config("sk-test", &config)
            .unwrap()
            .build_prompt(&record);
        assert_eq!(prompt.matches('ł').count(), 100);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("żółw", 2), "żó");
    }

    #[test]
    fn test_request_carries_budget_and_temperature() {
        let request = ChatRequest {
            model: "m".into(),
            messages: vec![],
            max_tokens: 500,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_first_choice_is_trimmed() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "\n  Dear team,\n...\n  "}}, {"message": {"content": "other"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(response).unwrap(), "Dear team,\n...");
    }

    #[test]
    fn test_empty_choices_is_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            first_choice_text(response),
            Err(AppError::LlmError { .. })
        ));

        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(first_choice_text(response).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_error() {
        let writer =
            OpenAiLetterWriter::with_base_url("sk-test", "gpt-4o-mini", "http://127.0.0.1:1/v1")
                .unwrap();
        let record = make_test_record(SourceKind::JustJoin, "Dev", "Other Inc");
        let err = writer.write_letter(&record).await.unwrap_err();
        assert!(matches!(err, AppError::NetworkError(_)));
    }
}
