use serde::{Deserialize, Serialize};

use crate::foundation::error::{SceneError, SceneResult};
use crate::scene::document::SceneDocument;

/// Endpoint path the generation service answers on.
pub const GENERATE_SCENES_PATH: &str = "/generate/scenes";

/// Optional hints forwarded to the generator untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// One generation request: a free-text description plus options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub description: String,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Build a request; the description is trimmed.
    pub fn new(description: impl AsRef<str>) -> Self {
        Self {
            description: description.as_ref().trim().to_owned(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Reject an empty description before any service is contacted.
    pub fn validate(&self) -> SceneResult<()> {
        if self.description.trim().is_empty() {
            return Err(SceneError::generation("Please enter a description"));
        }
        Ok(())
    }

    /// JSON body sent to the service.
    pub fn to_json(&self) -> SceneResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| SceneError::serde(e.to_string()))
    }
}

/// Raw reply of the generation service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceReply {
    /// Whether the service reported success (HTTP 2xx or equivalent).
    pub ok: bool,
    /// Response body, expected to be JSON.
    pub body: String,
}

#[derive(Deserialize)]
struct FailureBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "suggestedPrompt")]
    suggested_prompt: Option<String>,
}

/// Decode a service reply into a scene document or a [`SceneError::Generation`].
///
/// A failure reply keeps the service's message and suggested description. A successful reply
/// that is not a loadable scene is also a generation error.
pub fn parse_service_response(reply: &ServiceReply) -> SceneResult<SceneDocument> {
    let value: serde_json::Value = serde_json::from_str(&reply.body).map_err(|e| {
        if reply.ok {
            SceneError::generation(format!("generator returned invalid JSON: {e}"))
        } else {
            SceneError::generation("Generation failed")
        }
    })?;

    let has_error = value.get("error").is_some_and(|e| !e.is_null());
    if !reply.ok || has_error {
        let body: FailureBody = serde_json::from_value(value).unwrap_or(FailureBody {
            error: None,
            suggested_prompt: None,
        });
        return Err(SceneError::Generation {
            message: body
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Generation failed".to_owned()),
            suggestion: body.suggested_prompt.filter(|s| !s.trim().is_empty()),
        });
    }

    SceneDocument::from_value(value)
        .map_err(|e| SceneError::generation(format!("generator returned an unusable scene: {e}")))
}

/// Something that turns a description into a scene document.
pub trait SceneGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> SceneResult<SceneDocument>;
}

/// Carries one JSON request to the generation service and returns its reply.
pub trait GenerationTransport {
    fn post_json(&mut self, path: &str, body: &serde_json::Value) -> SceneResult<ServiceReply>;
}

/// [`SceneGenerator`] backed by a JSON request/response transport.
#[derive(Debug)]
pub struct ServiceGenerator<T> {
    transport: T,
}

impl<T: GenerationTransport> ServiceGenerator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: GenerationTransport> SceneGenerator for ServiceGenerator<T> {
    #[tracing::instrument(level = "debug", skip_all, fields(description = %request.description))]
    fn generate(&mut self, request: &GenerationRequest) -> SceneResult<SceneDocument> {
        request.validate()?;
        let body = request.to_json()?;
        let reply = self
            .transport
            .post_json(GENERATE_SCENES_PATH, &body)
            .map_err(|e| match e {
                SceneError::Generation { .. } => e,
                other => SceneError::generation(format!("generation service unreachable: {other}")),
            })?;
        parse_service_response(&reply)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/service.rs"]
mod tests;
