// ABOUTME: AssemblyAI transcription client used by the voice analysis endpoint
// ABOUTME: Uploads audio, submits a transcription job, and polls it under a time budget
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::config::TranscriptionConfig;
use crate::errors::{AppError, AppResult};
use crate::models::SentimentScore;

const PROVIDER_NAME: &str = "assemblyai";

/// TCP connect timeout in seconds
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Per-request timeout in seconds; generous because uploads carry whole
/// audio files
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Completed transcription with per-sentence sentiment
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub sentiment: Vec<SentimentScore>,
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Deserialize)]
struct TranscriptStatus {
    status: String,
    text: Option<String>,
    error: Option<String>,
    sentiment_analysis_results: Option<Vec<SentimentResult>>,
}

#[derive(Deserialize)]
struct SentimentResult {
    text: String,
    sentiment: String,
    confidence: f64,
}

/// Client for the transcription service
#[derive(Clone)]
pub struct TranscriptionClient {
    client: Client,
    config: TranscriptionConfig,
}

impl TranscriptionClient {
    #[must_use]
    pub fn new(config: TranscriptionConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Transcribe raw audio bytes into text with sentiment scores
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when no transcription key is set, a provider
    /// error for upload/submit/poll failures, and `ProviderTimeout` when the
    /// job does not finish inside the configured budget.
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn transcribe(&self, audio: Vec<u8>) -> AppResult<Transcription> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AppError::config_missing("TRANSCRIPTION_API_KEY is not set")
        })?;

        let upload_url = self.upload(api_key, audio).await?;
        let job_id = self.submit(api_key, &upload_url).await?;
        self.poll(api_key, &job_id).await
    }

    async fn upload(&self, api_key: &str, audio: Vec<u8>) -> AppResult<String> {
        let response = self
            .client
            .post(format!("{}/upload", self.config.base_url))
            .header("authorization", api_key)
            .body(audio)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let response = check_status(response).await?;
        let body: UploadResponse = response.json().await.map_err(|e| {
            AppError::provider_unparseable(PROVIDER_NAME, format!("upload response: {e}"))
        })?;
        Ok(body.upload_url)
    }

    async fn submit(&self, api_key: &str, upload_url: &str) -> AppResult<String> {
        let response = self
            .client
            .post(format!("{}/transcript", self.config.base_url))
            .header("authorization", api_key)
            .json(&serde_json::json!({
                "audio_url": upload_url,
                "sentiment_analysis": true,
            }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let response = check_status(response).await?;
        let body: SubmitResponse = response.json().await.map_err(|e| {
            AppError::provider_unparseable(PROVIDER_NAME, format!("submit response: {e}"))
        })?;
        debug!("Submitted transcription job {}", body.id);
        Ok(body.id)
    }

    async fn poll(&self, api_key: &str, job_id: &str) -> AppResult<Transcription> {
        let deadline = Instant::now() + Duration::from_secs(self.config.budget_secs);
        let interval = Duration::from_secs(self.config.poll_interval_secs.max(1));

        loop {
            let response = self
                .client
                .get(format!("{}/transcript/{job_id}", self.config.base_url))
                .header("authorization", api_key)
                .send()
                .await
                .map_err(|e| transport_error(&e))?;

            let response = check_status(response).await?;
            let status: TranscriptStatus = response.json().await.map_err(|e| {
                AppError::provider_unparseable(PROVIDER_NAME, format!("status response: {e}"))
            })?;

            match status.status.as_str() {
                "completed" => {
                    let sentiment = status
                        .sentiment_analysis_results
                        .unwrap_or_default()
                        .into_iter()
                        .map(|r| SentimentScore {
                            text: r.text,
                            sentiment: r.sentiment,
                            confidence: r.confidence,
                        })
                        .collect();
                    return Ok(Transcription {
                        text: status.text.unwrap_or_default(),
                        sentiment,
                    });
                }
                "error" => {
                    let detail = status
                        .error
                        .unwrap_or_else(|| "no detail given".to_string());
                    return Err(AppError::provider(
                        PROVIDER_NAME,
                        format!("transcription job failed: {detail}"),
                    ));
                }
                _ => {
                    if Instant::now() + interval > deadline {
                        return Err(AppError::provider_timeout(PROVIDER_NAME));
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::provider_http(
        PROVIDER_NAME,
        status.as_u16(),
        truncate(&body, 200),
    ))
}

fn transport_error(e: &reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::provider_timeout(PROVIDER_NAME)
    } else {
        AppError::provider_transport(PROVIDER_NAME, e.to_string())
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
