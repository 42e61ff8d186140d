/// What a transport hands back for a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub status: u16,
    pub elapsed_ms: u64,
    pub size_bytes: usize,
    pub raw_body: String,
    /// History version recorded for this send.
    pub version: u64,
}

impl ResponseSummary {
    /// Size in kilobytes with one decimal, e.g. `1.5 KB`.
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size_bytes as f64 / 1024.0)
    }

    /// Pretty-printed JSON when the body parses as JSON, otherwise the body as is.
    pub fn pretty_body(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.raw_body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| self.raw_body.clone())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
