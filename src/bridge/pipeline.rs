//! Per-question flow: fetch, compose, infer, extract, persist.

use std::sync::Arc;

use crate::ai::{AiError, ModelProvider};
use crate::store::{ResourceStore, ResourceUri, StoreError};

use super::{compose_prompt, extract_with_rule, fetch_resource_text, persist_payload, Extraction};

/// Resource texts a prompt is grounded on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingContext {
    pub input: String,
    pub types: String,
    pub object_uid: String,
}

impl GroundingContext {
    /// Render the prompt for `question`.
    #[must_use]
    pub fn prompt_for(&self, question: &str) -> String {
        compose_prompt(question, &self.input, &self.types, &self.object_uid)
    }
}

/// Outcome of one processed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Model output, unmodified.
    pub raw: String,
    /// Payload sent to the Store.
    pub payload: String,
    /// Rule that produced the payload.
    pub extraction: Extraction,
    /// Whether the Store accepted and wrote the payload.
    pub saved: bool,
}

/// Errors that abort a question.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A context resource could not be fetched.
    #[error("Failed to fetch context: {0}")]
    Fetch(#[source] StoreError),

    /// The model call failed.
    #[error("Model call failed: {0}")]
    Model(#[from] AiError),

    /// The persistence call failed at the transport level.
    #[error("Failed to persist answer: {source}")]
    Persist {
        /// Model answer that could not be persisted.
        raw_answer: String,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    /// Model answer obtained before the failure, if any.
    #[must_use]
    pub fn raw_answer(&self) -> Option<&str> {
        match self {
            Self::Persist { raw_answer, .. } => Some(raw_answer),
            Self::Fetch(_) | Self::Model(_) => None,
        }
    }
}

/// Drives the pipeline for one question at a time.
///
/// The Store and model are supplied by the caller and shared across
/// questions; nothing else persists between calls.
#[derive(Clone)]
pub struct Assistant {
    store: Arc<dyn ResourceStore>,
    model: Arc<dyn ModelProvider>,
}

impl Assistant {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, model: Arc<dyn ModelProvider>) -> Self {
        Self { store, model }
    }

    /// Fetch the three context resources.
    ///
    /// # Errors
    ///
    /// Returns the first Store error encountered.
    pub async fn fetch_context(&self) -> Result<GroundingContext, StoreError> {
        let store = self.store.as_ref();
        let (input, types, object_uid) = tokio::try_join!(
            fetch_resource_text(store, ResourceUri::Input),
            fetch_resource_text(store, ResourceUri::Types),
            fetch_resource_text(store, ResourceUri::ObjectUid),
        )?;
        Ok(GroundingContext {
            input,
            types,
            object_uid,
        })
    }

    /// Process one question to completion.
    ///
    /// A model answer without usable JSON is not an error: it comes back
    /// with `saved == false`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when a resource fetch, the model call or the
    /// persistence transport fails.
    #[tracing::instrument(skip(self), fields(question_len = question.len()))]
    pub async fn answer(&self, question: &str) -> Result<Answer, PipelineError> {
        let context = self.fetch_context().await.map_err(PipelineError::Fetch)?;
        let prompt = context.prompt_for(question);
        tracing::debug!(prompt_len = prompt.len(), "Prompt composed");

        let raw = self.model.generate(&prompt).await?;
        tracing::debug!(answer_len = raw.len(), "Model answered");

        let (payload, extraction) = extract_with_rule(&raw);
        tracing::debug!(?extraction, payload_len = payload.len(), "Payload extracted");

        let saved = match persist_payload(self.store.as_ref(), payload).await {
            Ok(saved) => saved,
            Err(source) => {
                return Err(PipelineError::Persist {
                    raw_answer: raw,
                    source,
                })
            }
        };

        if saved {
            tracing::info!("Answer persisted");
        } else {
            tracing::warn!("Answer rejected by the store");
        }

        Ok(Answer {
            payload: payload.to_string(),
            raw,
            extraction,
            saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ToolResult, JSON_ONLY_INSTRUCTION};
    use crate::store::{Catalog, LocalStore, ResourceContent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(AiError::RequestFailed)
        }
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl ResourceStore for ReadOnlyStore {
        async fn read_resource(
            &self,
            uri: ResourceUri,
        ) -> Result<Vec<ResourceContent>, StoreError> {
            Ok(vec![ResourceContent::text(uri, uri.name())])
        }

        async fn call_tool(
            &self,
            _name: &str,
            _arguments: serde_json::Value,
        ) -> Result<ToolResult, StoreError> {
            Err(StoreError::Remote("read-only".to_string()))
        }

        async fn list(&self) -> Result<Catalog, StoreError> {
            Ok(Catalog::default())
        }
    }

    fn seeded_store(dir: &std::path::Path) -> Arc<LocalStore> {
        std::fs::write(dir.join("input.json"), r#"{"fields":[]}"#).unwrap();
        std::fs::write(dir.join("data_types.json"), r#""string: text""#).unwrap();
        std::fs::write(dir.join("object_uid.json"), r#"{"uid":"abc"}"#).unwrap();
        Arc::new(LocalStore::new(dir))
    }

    #[tokio::test]
    async fn test_fenced_answer_is_persisted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = seeded_store(temp_dir.path());
        let model = ScriptedModel::replying(
            "```json\n{\"fields\":[{\"name\":\"email\",\"type\":\"string\",\"uid\":\"\"}]}\n```",
        );
        let assistant = Assistant::new(store.clone(), model.clone());

        let answer = assistant
            .answer("add field email of type string")
            .await
            .unwrap();

        assert!(answer.saved);
        assert_eq!(answer.extraction, Extraction::Fenced);
        assert_eq!(
            answer.payload,
            r#"{"fields":[{"name":"email","type":"string","uid":""}]}"#
        );

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains(r#"{"fields":[]}"#));
        assert!(prompts[0].contains(r#""string: text""#));
        assert!(prompts[0].ends_with(JSON_ONLY_INSTRUCTION));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.output_path()).unwrap()).unwrap();
        assert_eq!(written["fields"][0]["name"], "email");
    }

    #[tokio::test]
    async fn test_prose_answer_is_not_saved_but_returned() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = seeded_store(temp_dir.path());
        let model = ScriptedModel::replying("I cannot do that.");
        let assistant = Assistant::new(store.clone(), model);

        let answer = assistant.answer("delete everything").await.unwrap();
        assert!(!answer.saved);
        assert_eq!(answer.raw, "I cannot do that.");
        assert!(!store.output_path().exists());
    }

    #[tokio::test]
    async fn test_missing_resource_aborts_before_model() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::new(temp_dir.path()));
        let model = ScriptedModel::replying("{}");
        let assistant = Assistant::new(store, model.clone());

        let err = assistant.answer("anything").await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(_)));
        assert!(err.raw_answer().is_none());
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = seeded_store(temp_dir.path());
        let model = Arc::new(ScriptedModel {
            reply: Err("quota exceeded".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let assistant = Assistant::new(store, model);

        let err = assistant.answer("q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Model(AiError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_persist_transport_error_keeps_raw_answer() {
        let model = ScriptedModel::replying("{\"a\": 1}");
        let assistant = Assistant::new(Arc::new(ReadOnlyStore), model);

        let err = assistant.answer("q").await.unwrap_err();
        assert_eq!(err.raw_answer(), Some("{\"a\": 1}"));
    }

    #[tokio::test]
    async fn test_fetch_context_reads_all_resources() {
        let model = ScriptedModel::replying("");
        let assistant = Assistant::new(Arc::new(ReadOnlyStore), model);

        let context = assistant.fetch_context().await.unwrap();
        assert_eq!(
            context,
            GroundingContext {
                input: "input".to_string(),
                types: "types".to_string(),
                object_uid: "object_uid".to_string(),
            }
        );
    }
}
