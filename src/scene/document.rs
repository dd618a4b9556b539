use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::core::Canvas;
use crate::foundation::error::{SceneError, SceneResult};
use crate::geometry::path::PathGeometry;
use crate::scene::model::{Action, ActionKind, ObjectKind, SceneDef, SceneObject};

/// Non-fatal problem found while loading a scene.
///
/// The scene stays renderable; the affected action or object simply contributes nothing.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum LoadWarning {
    /// An action targets an object id that does not exist.
    #[error("action '{action_id}' targets missing object '{object_id}'")]
    UnresolvedObject {
        action_id: String,
        object_id: String,
    },
    /// A `followPath` action references a missing or non-path object.
    #[error("action '{action_id}' follows missing or non-path object '{path_id}'")]
    UnresolvedPath { action_id: String, path_id: String },
    /// An action ends before it starts; treated as instantaneous.
    #[error("action '{action_id}' ends before it starts; snapping at start")]
    InvertedWindow { action_id: String },
    /// An action type that no interpolator handles.
    #[error("action '{action_id}' has unsupported type '{type_name}'")]
    UnknownActionType {
        action_id: String,
        type_name: String,
    },
    /// Two objects share an id; the first one wins lookups.
    #[error("duplicate object id '{0}'")]
    DuplicateObjectId(String),
    /// Two actions share an id; they share narration bookkeeping.
    #[error("duplicate action id '{0}'")]
    DuplicateActionId(String),
    /// A path object whose `d` cannot be parsed.
    #[error("path object '{object_id}' has unusable path data: {reason}")]
    InvalidPathData { object_id: String, reason: String },
}

/// Validated, immutable scene document.
///
/// Replacing the document is the only way to change a scene; there is no incremental patching.
#[derive(Clone, Debug)]
pub struct SceneDocument {
    canvas: Canvas,
    duration: f64,
    objects: Vec<SceneObject>,
    actions: Vec<Action>,
    code: Option<String>,
    scene_id: String,
    object_index: HashMap<String, usize>,
    start_order: Vec<usize>,
    warnings: Vec<LoadWarning>,
}

impl SceneDocument {
    /// Parse and validate a scene from JSON text.
    pub fn from_json_str(s: &str) -> SceneResult<Self> {
        let def: SceneDef = serde_json::from_str(s)
            .map_err(|e| SceneError::validation(format!("parse scene document JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse and validate a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SceneResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| SceneError::validation(format!("parse scene document JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse and validate a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SceneError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate an already-parsed JSON value (e.g. a generation service response).
    pub fn from_value(value: serde_json::Value) -> SceneResult<Self> {
        let def: SceneDef = serde_json::from_value(value)
            .map_err(|e| SceneError::validation(format!("parse scene document JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Build from parts, running the same validation as the JSON loaders.
    pub fn new(
        canvas: Canvas,
        duration: f64,
        objects: Vec<SceneObject>,
        actions: Vec<Action>,
    ) -> SceneResult<Self> {
        Self::from_def(SceneDef {
            width: canvas.width,
            height: canvas.height,
            duration,
            objects,
            actions,
            code: None,
            scene_id: String::new(),
        })
    }

    #[tracing::instrument(skip(def), fields(scene_id = %def.scene_id))]
    pub(crate) fn from_def(def: SceneDef) -> SceneResult<Self> {
        if !def.duration.is_finite() || def.duration <= 0.0 {
            return Err(SceneError::validation("scene duration must be > 0 seconds"));
        }
        if def.width == 0 || def.height == 0 {
            return Err(SceneError::validation("scene width/height must be > 0"));
        }

        let mut warnings = Vec::new();

        let mut object_index = HashMap::with_capacity(def.objects.len());
        for (i, obj) in def.objects.iter().enumerate() {
            if object_index.contains_key(&obj.id) {
                warnings.push(LoadWarning::DuplicateObjectId(obj.id.clone()));
                continue;
            }
            object_index.insert(obj.id.clone(), i);
        }

        for obj in &def.objects {
            if obj.kind != ObjectKind::Path {
                continue;
            }
            let reason = match obj.props.d.as_deref() {
                None => Some("missing 'd'".to_owned()),
                Some(d) => PathGeometry::from_svg(d).err().map(|e| e.to_string()),
            };
            if let Some(reason) = reason {
                warnings.push(LoadWarning::InvalidPathData {
                    object_id: obj.id.clone(),
                    reason,
                });
            }
        }

        let mut actions = def.actions;
        let mut seen_actions = HashSet::with_capacity(actions.len());
        for action in &mut actions {
            if !action.start.is_finite() || !action.end.is_finite() {
                return Err(SceneError::validation(format!(
                    "action '{}' must have finite start/end",
                    action.id
                )));
            }
            if !seen_actions.insert(action.id.clone()) {
                warnings.push(LoadWarning::DuplicateActionId(action.id.clone()));
            }
            if action.end < action.start {
                warnings.push(LoadWarning::InvertedWindow {
                    action_id: action.id.clone(),
                });
                action.end = action.start;
            }
            if !object_index.contains_key(&action.object_id) {
                warnings.push(LoadWarning::UnresolvedObject {
                    action_id: action.id.clone(),
                    object_id: action.object_id.clone(),
                });
            }
            match &action.kind {
                ActionKind::FollowPath { path_id } => {
                    let is_path = path_id
                        .as_ref()
                        .and_then(|p| object_index.get(p))
                        .is_some_and(|&i| def.objects[i].kind == ObjectKind::Path);
                    if !is_path {
                        warnings.push(LoadWarning::UnresolvedPath {
                            action_id: action.id.clone(),
                            path_id: path_id.clone().unwrap_or_default(),
                        });
                    }
                }
                ActionKind::Unknown { type_name } => {
                    warnings.push(LoadWarning::UnknownActionType {
                        action_id: action.id.clone(),
                        type_name: type_name.clone(),
                    });
                }
                _ => {}
            }
        }

        let mut start_order: Vec<usize> = (0..actions.len()).collect();
        start_order.sort_by(|&a, &b| {
            actions[a]
                .start
                .total_cmp(&actions[b].start)
                .then(a.cmp(&b))
        });

        for w in &warnings {
            tracing::warn!(warning = %w, "scene loaded with warning");
        }
        tracing::debug!(
            objects = def.objects.len(),
            actions = actions.len(),
            warnings = warnings.len(),
            "scene document validated"
        );

        Ok(Self {
            canvas: Canvas {
                width: def.width,
                height: def.height,
            },
            duration: def.duration,
            objects: def.objects,
            actions,
            code: def.code,
            scene_id: def.scene_id,
            object_index,
            start_order,
            warnings,
        })
    }

    /// Serialize back to pretty JSON (the shape accepted by the loaders).
    pub fn to_json_pretty(&self) -> SceneResult<String> {
        let def = SceneDef {
            width: self.canvas.width,
            height: self.canvas.height,
            duration: self.duration,
            objects: self.objects.clone(),
            actions: self.actions.clone(),
            code: self.code.clone(),
            scene_id: self.scene_id.clone(),
        };
        serde_json::to_string_pretty(&def).map_err(|e| SceneError::serde(e.to_string()))
    }

    /// Canvas size in pixels.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Duration in seconds, always > 0.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Objects in draw order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Actions in document order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Actions in application order: ascending start, ties by document order.
    pub fn actions_by_start(&self) -> impl Iterator<Item = &Action> + '_ {
        self.start_order.iter().map(|&i| &self.actions[i])
    }

    /// Source code the generator produced alongside the scene, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Scene identifier, possibly empty.
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// Non-fatal problems found at load time.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Look up an object by id (first occurrence wins).
    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.object_index.get(id).map(|&i| &self.objects[i])
    }

    /// Index of an object in draw order.
    pub fn object_position(&self, id: &str) -> Option<usize> {
        self.object_index.get(id).copied()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
