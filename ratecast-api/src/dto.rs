//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};

/// Form body of `POST /subscribe`.
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeForm {
    /// Address to subscribe; absent and empty are treated alike
    pub email: Option<String>,
}

/// Response for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is answering
    pub status: String,
    /// Number of subscribers currently held by the registry
    pub subscribers: usize,
}
