//! Recorded network traffic (HAR 1.2) as a source of intercepted responses
use crate::subtitles::InterceptedResponse;
use crate::{HistoryError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct HarFile {
    log: HarLog,
}

#[derive(Debug, Deserialize)]
struct HarLog {
    #[serde(default)]
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    request: HarRequest,
    response: HarResponse,
}

#[derive(Debug, Deserialize)]
struct HarRequest {
    method: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct HarResponse {
    status: i64,
    #[serde(default)]
    content: HarContent,
}

#[derive(Debug, Default, Deserialize)]
struct HarContent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// Load every response with a body from a HAR file
pub async fn load_har(path: &Path) -> Result<Vec<InterceptedResponse>> {
    let content = tokio::fs::read_to_string(path).await?;
    let responses = parse_har(&content)?;
    info!("🌐 Loaded {} recorded responses from {}", responses.len(), path.display());
    Ok(responses)
}

/// Parse HAR JSON into intercepted responses, skipping entries without a usable body
pub fn parse_har(content: &str) -> Result<Vec<InterceptedResponse>> {
    let har: HarFile = serde_json::from_str(content)
        .map_err(|e| HistoryError::Capture(format!("Invalid HAR file: {}", e)))?;

    Ok(har.log.entries.into_iter().filter_map(entry_to_response).collect())
}

fn entry_to_response(entry: HarEntry) -> Option<InterceptedResponse> {
    let HarEntry { request, response } = entry;
    let text = response.content.text?;

    let body = match response.content.encoding.as_deref() {
        Some("base64") => {
            let decoded = STANDARD
                .decode(text.trim())
                .map_err(|e| warn!("Skipping {}: invalid base64 body: {}", request.url, e))
                .ok()?;
            String::from_utf8(decoded)
                .map_err(|e| warn!("Skipping {}: body is not UTF-8: {}", request.url, e))
                .ok()?
        }
        _ => text,
    };

    Some(InterceptedResponse {
        url: request.url,
        method: request.method,
        status: u16::try_from(response.status).unwrap_or(0),
        body,
    })
}

/// Send recorded responses into an interception channel, in recorded order
pub async fn replay(responses: Vec<InterceptedResponse>, events: mpsc::Sender<InterceptedResponse>) {
    let total = responses.len();
    for response in responses {
        if events.send(response).await.is_err() {
            debug!("Interception channel closed, stopping replay");
            return;
        }
    }
    debug!("Replayed {} recorded responses", total);
}
