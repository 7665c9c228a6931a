use serde::Deserialize;

/// Success bodies are wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub imported: u64,
    #[serde(default)]
    pub failed: u64,
}
