use crate::animation::interp::{apply_action, progress};
use crate::geometry::path::PathGeometry;
use crate::scene::document::SceneDocument;
use crate::scene::model::{ActionKind, Baseline, ObjectKind, ObjectProps, SceneObject};

/// Visual state of one object at one point in time.
///
/// Borrows the immutable template for type-specific fields; only the transform is derived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedObjectState<'a> {
    pub object: &'a SceneObject,
    pub state: Baseline,
}

impl<'a> ResolvedObjectState<'a> {
    pub fn id(&self) -> &'a str {
        &self.object.id
    }

    pub fn kind(&self) -> &'a ObjectKind {
        &self.object.kind
    }

    pub fn props(&self) -> &'a ObjectProps {
        &self.object.props
    }

    /// Whether a sink should draw this object at all.
    pub fn is_visible(&self) -> bool {
        self.state.opacity > 0.0
    }
}

/// Time-independent data derived once per document: parsed path geometry per object.
///
/// Pair a resolver with the document it was built from; resolving a different document
/// treats every `followPath` as unresolved or mismatched.
#[derive(Clone, Debug, Default)]
pub struct SceneResolver {
    paths: Vec<Option<PathGeometry>>,
}

impl SceneResolver {
    #[tracing::instrument(skip(doc), fields(objects = doc.objects().len()))]
    pub fn new(doc: &SceneDocument) -> Self {
        let paths = doc
            .objects()
            .iter()
            .map(|obj| {
                if obj.kind != ObjectKind::Path {
                    return None;
                }
                let d = obj.props.d.as_deref()?;
                PathGeometry::from_svg(d).ok()
            })
            .collect();
        Self { paths }
    }

    /// Geometry of the path object with id `id`, if it exists and parsed.
    pub fn path(&self, doc: &SceneDocument, id: &str) -> Option<&PathGeometry> {
        let idx = doc.object_position(id)?;
        self.paths.get(idx)?.as_ref()
    }

    /// Resolve every object at time `t`, in document object order.
    #[tracing::instrument(level = "debug", skip_all, fields(t = t))]
    pub fn resolve<'a>(&self, doc: &'a SceneDocument, t: f64) -> Vec<ResolvedObjectState<'a>> {
        let mut out = Vec::with_capacity(doc.objects().len());
        self.resolve_into(doc, t, &mut out);
        out
    }

    /// Same as [`SceneResolver::resolve`], reusing `out`'s allocation.
    pub fn resolve_into<'a>(
        &self,
        doc: &'a SceneDocument,
        t: f64,
        out: &mut Vec<ResolvedObjectState<'a>>,
    ) {
        out.clear();
        out.extend(doc.objects().iter().map(|object| ResolvedObjectState {
            object,
            state: object.props.baseline(),
        }));

        for action in doc.actions_by_start() {
            let Some(idx) = doc.object_position(&action.object_id) else {
                continue;
            };
            let Some(p) = progress(action.start, action.end, t) else {
                continue;
            };
            let path = match &action.kind {
                ActionKind::FollowPath {
                    path_id: Some(path_id),
                } => self.path(doc, path_id),
                _ => None,
            };
            apply_action(&action.kind, &mut out[idx].state, p, path);
        }
    }
}

/// One-shot resolution without a cached resolver.
pub fn resolve(doc: &SceneDocument, t: f64) -> Vec<ResolvedObjectState<'_>> {
    SceneResolver::new(doc).resolve(doc, t)
}

#[cfg(test)]
#[path = "../../tests/unit/eval/resolver.rs"]
mod tests;
