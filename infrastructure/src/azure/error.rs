//! Classification of upstream HTTP failures

use relay_application::UpstreamError;

/// Body markers of a content-policy rejection.
const CONTENT_FILTER_MARKERS: [&str; 2] = ["content_filter", "ResponsibleAIPolicyViolation"];

/// Map a non-success response onto an [`UpstreamError`].
pub fn classify_status(status: u16, body: &str) -> UpstreamError {
    match status {
        429 => UpstreamError::RateLimited(body.to_string()),
        400 if is_content_filter(body) => UpstreamError::ContentFiltered(body.to_string()),
        _ => UpstreamError::Api {
            status,
            message: body.to_string(),
        },
    }
}

pub fn is_content_filter(body: &str) -> bool {
    CONTENT_FILTER_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Failures while sending the request or reading the body.
pub fn connection_error(error: reqwest::Error) -> UpstreamError {
    UpstreamError::Connection(error.to_string())
}
