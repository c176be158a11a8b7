//! Startup probe of the Ollama instance serving embeddings.
//!
//! Fetches the locally downloaded models from `/api/tags` and reports whether
//! the configured embedding model is among them.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<OllamaModel>,
}

/// Outcome of [`probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Reachable and the embedding model is pulled.
    Ready,
    /// Reachable but the embedding model is missing.
    ModelMissing { available: Vec<String> },
    Offline(String),
}

/// Whether `model` names one of `available`, ignoring an implicit `:latest`.
pub fn has_model(available: &[String], model: &str) -> bool {
    let bare = model.trim_end_matches(":latest");
    available
        .iter()
        .any(|name| name == model || name.trim_end_matches(":latest") == bare)
}

async fn fetch_models(base_url: &str) -> Result<Vec<OllamaModel>, String> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .map_err(|e| format!("Ollama unreachable at {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("Ollama returned HTTP {}", response.status()));
    }

    let tags: TagsResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse Ollama response: {}", e))?;
    Ok(tags.models)
}

pub async fn probe(base_url: &str, model: &str) -> ProbeStatus {
    match fetch_models(base_url).await {
        Err(e) => ProbeStatus::Offline(e),
        Ok(models) => {
            let available: Vec<String> = models.into_iter().map(|m| m.name).collect();
            if has_model(&available, model) {
                ProbeStatus::Ready
            } else {
                ProbeStatus::ModelMissing { available }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_tag_is_implicit() {
        let available = vec!["nomic-embed-text:latest".to_string(), "llama3:8b".to_string()];
        assert!(has_model(&available, "nomic-embed-text"));
        assert!(has_model(&available, "nomic-embed-text:latest"));
        assert!(!has_model(&available, "llama3"));
        assert!(has_model(&available, "llama3:8b"));
    }

    #[test]
    fn tags_response_parses() {
        let raw = r#"{"models":[{"name":"nomic-embed-text:latest","size":274302450}]}"#;
        let tags: TagsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(tags.models[0].name, "nomic-embed-text:latest");
    }

    #[tokio::test]
    async fn unreachable_host_is_offline() {
        let status = probe("http://127.0.0.1:9", "nomic-embed-text").await;
        assert!(matches!(status, ProbeStatus::Offline(_)));
    }
}
