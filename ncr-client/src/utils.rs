use reqwest::header::{HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE, LINK};
use serde::Deserialize;

pub(crate) const MANIFEST_UNKNOWN_CODE: &str = "MANIFEST_UNKNOWN";

pub(crate) fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok().map(|ct| ct.to_string()))
}

pub(crate) fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|cl| cl.to_str().ok().and_then(|cl| cl.parse().ok()))
}

pub(crate) fn docker_content_digest(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HeaderName::from_static("docker-content-digest"))
        .and_then(|cd| cd.to_str().ok().map(|cd| cd.to_string()))
}

// Media types may carry parameters, "application/json; charset=utf-8".
pub(crate) fn verify_content_type(content_type: &Option<String>, accepted: &[String]) -> bool {
    match content_type {
        Some(ct) => {
            let essence = ct.split(';').next().unwrap_or_default().trim();
            accepted.iter().any(|a| a == essence)
        }
        None => true,
    }
}

/// Target of a `Link: <...>; rel="next"` pagination header.
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|link| {
            let mut parts = link.split(';');
            let target = parts.next()?.trim();
            let is_next = parts.any(|param| {
                let param = param.trim().replace(' ', "");
                param == "rel=\"next\"" || param == "rel=next"
            });
            is_next
                .then(|| target.trim_start_matches('<').trim_end_matches('>').to_string())
        })
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ErrorInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorInfo {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Self>(body)
            .ok()
            .filter(|response| !response.errors.is_empty())
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| match &e.message {
                Some(message) => format!("{} ({})", e.code, message),
                None => e.code.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
