use std::collections::HashMap;

use serde::{Deserialize, Serialize};

mod tracer;
pub use tracer::Tracer;

mod metric;
pub use metric::Metric;

fn default_service_name() -> String {
    "ton-gasless".to_string()
}

/// OTLP collector used to export traces and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub endpoint: String,
    pub token: Option<String>,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Configuration {
    fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(token) = &self.token {
            headers.insert("Authorization".to_string(), format!("Basic {}", token));
        }

        headers
    }
}
