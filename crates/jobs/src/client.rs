use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::JobClientConfig;
use crate::error::JobError;
use crate::request::ExtractionJobRequest;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What the service told us when it accepted a job.
///
/// The job id is only for log correlation; nothing keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAcknowledgement {
    pub job_id: Option<String>,
}

/// Sends extraction jobs to the processing service.
///
/// One call to [`submit`](Self::submit) issues at most one HTTP request. There
/// is no retry: a failure is logged and returned to the caller.
#[derive(Debug, Clone)]
pub struct JobClient {
    http: reqwest::Client,
    config: JobClientConfig,
}

impl JobClient {
    pub fn new(config: JobClientConfig) -> Result<Self, JobError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| JobError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &JobClientConfig {
        &self.config
    }

    /// Build the job for a download URI.
    pub fn build_request(&self, download_uri: Option<&str>) -> Result<ExtractionJobRequest, JobError> {
        match download_uri {
            Some(uri) if !uri.is_empty() => Ok(ExtractionJobRequest::new(&self.config, uri)),
            _ => Err(JobError::MissingSource),
        }
    }

    /// Build and send a job for `download_uri`, logging the outcome.
    pub async fn submit(
        &self,
        object_path: &str,
        download_uri: Option<&str>,
    ) -> Result<JobAcknowledgement, JobError> {
        let result = match self.build_request(download_uri) {
            Ok(request) => self.send(&request).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(ack) => info!(
                object_path,
                job_id = ?ack.job_id,
                endpoint = %self.config.endpoint,
                "job_submitted"
            ),
            Err(err) if err.is_transport() => error!(
                object_path,
                reason = err.reason(),
                error = %err,
                endpoint = %self.config.endpoint,
                "job_submission_failed"
            ),
            Err(err) => warn!(
                object_path,
                reason = err.reason(),
                error = %err,
                endpoint = %self.config.endpoint,
                "job_submission_failed"
            ),
        }

        result
    }

    /// Send an already built job and interpret the acknowledgement.
    pub async fn send(&self, request: &ExtractionJobRequest) -> Result<JobAcknowledgement, JobError> {
        let body = request.form_body()?;

        let response = self
            .http
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| JobError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| JobError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(JobError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_acknowledgement(&text)
    }
}

/// Interpret a success-status body: `{ "results": { "job_id"?, "error"? } }`.
pub fn parse_acknowledgement(body: &str) -> Result<JobAcknowledgement, JobError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| JobError::MalformedAcknowledgement(format!("body is not JSON: {e}")))?;

    let results = value
        .get("results")
        .and_then(Value::as_object)
        .ok_or_else(|| JobError::MalformedAcknowledgement("missing results object".into()))?;

    if let Some(error) = results.get("error").filter(|e| is_truthy(e)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(JobError::Application(message));
    }

    let job_id = results.get("job_id").and_then(|id| match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Ok(JobAcknowledgement { job_id })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
