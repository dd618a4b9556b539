use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Drawable object template. Never mutated by evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Identifier, unique within a scene.
    pub id: String,
    /// Object kind (`"type"` in JSON).
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Baseline transform plus type-specific fields.
    #[serde(default)]
    pub props: ObjectProps,
}

/// Kind of drawable object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectKind {
    /// Rounded rectangle anchored at its top-left corner.
    Rect,
    /// Bar chart bar; drawn like [`ObjectKind::Rect`].
    Bar,
    /// Filled circle centered at `(x, y)`.
    Circle,
    /// Circle with a radial highlight gradient.
    Sphere,
    /// Single line of text with its baseline at `(x, y)`.
    Text,
    /// Stroked SVG path.
    Path,
    /// Line segment with an arrow head.
    Arrow,
    /// Pair of x/y axis lines.
    Axis,
    /// External raster image.
    Image,
    /// Any other type string; kept for round-tripping, drawn as nothing.
    Other(String),
}

impl ObjectKind {
    /// Canonical type string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rect => "rect",
            Self::Bar => "bar",
            Self::Circle => "circle",
            Self::Sphere => "sphere",
            Self::Text => "text",
            Self::Path => "path",
            Self::Arrow => "arrow",
            Self::Axis => "axis",
            Self::Image => "image",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ObjectKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "rect" => Self::Rect,
            "bar" => Self::Bar,
            "circle" => Self::Circle,
            "sphere" => Self::Sphere,
            "text" => Self::Text,
            "path" => Self::Path,
            "arrow" => Self::Arrow,
            "axis" => Self::Axis,
            "image" => Self::Image,
            _ => Self::Other(s),
        }
    }
}

impl From<ObjectKind> for String {
    fn from(k: ObjectKind) -> Self {
        match k {
            ObjectKind::Other(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

/// Object properties as written by the scene author or generator.
///
/// Every field is optional. Unrecognized keys are preserved in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,

    /// CSS color string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Highlight color for spheres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color2: Option<String>,
    /// Box width, or stroke width for paths and arrows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_lenient_string"
    )]
    pub text: Option<String>,
    /// CSS font shorthand, e.g. `"bold 32px Inter"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Flat coordinate list (`[x1, y1, x2, y2]` for arrows).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f64>>,
    /// SVG path data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// Image source, relative to the asset root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Generators sometimes emit numeric labels; accept them as text.
fn de_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Canvas sides may arrive as `800.0`; any whole, non-negative number that fits is accepted.
fn de_canvas_side<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = f64::deserialize(deserializer)?;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
        return Err(serde::de::Error::custom(format!(
            "canvas size must be a positive whole number, got {v}"
        )));
    }
    Ok(v as u32)
}

/// Baseline transform fields of an object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Baseline {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Degrees.
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

impl ObjectProps {
    /// Baseline transform with absent fields defaulted to `(0, 0, 1, 0, 1)`.
    pub fn baseline(&self) -> Baseline {
        let d = Baseline::default();
        Baseline {
            x: self.x.unwrap_or(d.x),
            y: self.y.unwrap_or(d.y),
            scale: self.scale.unwrap_or(d.scale),
            rotation: self.rotation.unwrap_or(d.rotation),
            opacity: self.opacity.unwrap_or(d.opacity),
        }
    }
}

/// Timed transform applied to one object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ActionDef", into = "ActionDef")]
pub struct Action {
    /// Identifier, unique within a scene.
    pub id: String,
    /// Target object id. Unresolved targets make the action a no-op.
    pub object_id: String,
    /// Parsed kind and target values.
    pub kind: ActionKind,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds; `end == start` snaps at `start`.
    pub end: f64,
    /// Narration spoken when playback reaches `start`.
    pub narrative: Option<String>,
    params: serde_json::Value,
}

impl Action {
    /// Build an action, deriving [`ActionKind`] from `type_name` and raw `params`.
    pub fn new(
        id: impl Into<String>,
        object_id: impl Into<String>,
        type_name: &str,
        start: f64,
        end: f64,
        params: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            object_id: object_id.into(),
            kind: ActionKind::parse(type_name, &params),
            start,
            end,
            narrative: None,
            params,
        }
    }

    /// Attach narration text.
    pub fn with_narrative(mut self, text: impl Into<String>) -> Self {
        self.narrative = Some(text.into());
        self
    }

    /// Narration text, treating an empty string as absent.
    pub fn narration(&self) -> Option<&str> {
        self.narrative.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Raw params as loaded.
    pub fn params(&self) -> &serde_json::Value {
        &self.params
    }
}

/// Closed set of action kinds with their typed target values.
///
/// Target fields are optional: a missing target makes the action contribute nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionKind {
    /// Move `(x, y)` toward `to`.
    Translate { to: Option<PointTarget> },
    /// Interpolate uniform scale.
    Scale { scale: Option<f64> },
    /// Interpolate rotation in degrees.
    Rotate { rotation: Option<f64> },
    /// Interpolate opacity.
    Fade { opacity: Option<f64> },
    /// Place the object along a `path` object's curve.
    FollowPath { path_id: Option<String> },
    /// Unrecognized type string. Listed as a step, never applied.
    Unknown { type_name: String },
}

/// Translation target; a missing coordinate keeps its current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointTarget {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

#[derive(Default, Deserialize)]
struct TranslateParams {
    #[serde(default)]
    to: Option<PointTarget>,
}

#[derive(Default, Deserialize)]
struct ScaleParams {
    #[serde(default)]
    scale: Option<f64>,
}

#[derive(Default, Deserialize)]
struct RotateParams {
    #[serde(default)]
    rotation: Option<f64>,
}

#[derive(Default, Deserialize)]
struct FadeParams {
    #[serde(default)]
    opacity: Option<f64>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FollowPathParams {
    #[serde(default)]
    path_id: Option<String>,
}

fn params_or_default<T: Default + serde::de::DeserializeOwned>(
    type_name: &str,
    params: &serde_json::Value,
) -> T {
    if params.is_null() {
        return T::default();
    }
    serde_json::from_value(params.clone()).unwrap_or_else(|e| {
        tracing::warn!(type_name, error = %e, "malformed action params; action is a no-op");
        T::default()
    })
}

impl ActionKind {
    /// Map a type string and raw params to a kind. Never fails.
    pub fn parse(type_name: &str, params: &serde_json::Value) -> Self {
        match type_name {
            "translate" => {
                let p: TranslateParams = params_or_default(type_name, params);
                Self::Translate { to: p.to }
            }
            "scale" => {
                let p: ScaleParams = params_or_default(type_name, params);
                Self::Scale { scale: p.scale }
            }
            "rotate" => {
                let p: RotateParams = params_or_default(type_name, params);
                Self::Rotate {
                    rotation: p.rotation,
                }
            }
            "fade" => {
                let p: FadeParams = params_or_default(type_name, params);
                Self::Fade { opacity: p.opacity }
            }
            "followPath" => {
                let p: FollowPathParams = params_or_default(type_name, params);
                Self::FollowPath { path_id: p.path_id }
            }
            other => Self::Unknown {
                type_name: other.to_owned(),
            },
        }
    }

    /// Type string as it appears in JSON.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Translate { .. } => "translate",
            Self::Scale { .. } => "scale",
            Self::Rotate { .. } => "rotate",
            Self::Fade { .. } => "fade",
            Self::FollowPath { .. } => "followPath",
            Self::Unknown { type_name } => type_name,
        }
    }
}

/// JSON shape of an action.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionDef {
    id: String,
    object_id: String,
    #[serde(rename = "type")]
    kind: String,
    start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<f64>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    params: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    narrative: Option<String>,
}

impl From<ActionDef> for Action {
    fn from(def: ActionDef) -> Self {
        let kind = ActionKind::parse(&def.kind, &def.params);
        Self {
            id: def.id,
            object_id: def.object_id,
            kind,
            start: def.start,
            end: def.end.unwrap_or(def.start),
            narrative: def.narrative,
            params: def.params,
        }
    }
}

impl From<Action> for ActionDef {
    fn from(a: Action) -> Self {
        Self {
            id: a.id,
            object_id: a.object_id,
            kind: a.kind.type_name().to_owned(),
            start: a.start,
            end: Some(a.end),
            params: a.params,
            narrative: a.narrative,
        }
    }
}

/// JSON shape of a whole scene document.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SceneDef {
    #[serde(deserialize_with = "de_canvas_side")]
    pub(crate) width: u32,
    #[serde(deserialize_with = "de_canvas_side")]
    pub(crate) height: u32,
    pub(crate) duration: f64,
    #[serde(default)]
    pub(crate) objects: Vec<SceneObject>,
    #[serde(default)]
    pub(crate) actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) scene_id: String,
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
