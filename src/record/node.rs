//! Structured persistence records.
//!
//! A record is the JSON shape `{type, meta?, attributes, children, storage?}`.
//! Conversions for scenes, layers (surfaces) and shapes live here; the
//! viewport conversion lives next to [`crate::Viewport`].

use serde_json::{Map, Value};

use crate::foundation::core::Rgba8;
use crate::foundation::error::EaselError;
use crate::record::validate::{RecordPathElem, ValidationContext};
use crate::scene::node::Container;
use crate::scene::scene::Scene;
use crate::scene::shape::Shape;
use crate::scene::surface::{RenderSettings, Surface};

/// Node kind tag stored under `"type"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Viewport,
    Scene,
    Layer,
    Shape,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Viewport => "viewport",
            Self::Scene => "scene",
            Self::Layer => "layer",
            Self::Shape => "shape",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Value>,
}

impl NodeRecord {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            meta: Map::new(),
            attributes: Map::new(),
            children: Vec::new(),
            storage: None,
        }
    }

    pub(crate) fn with_storage(mut self, storage_type: &str) -> Self {
        self.storage = Some(serde_json::json!({ "type": storage_type }));
        self
    }

    pub(crate) fn set_attr(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_owned(), value.into());
    }
}

/// Record a `TypeMismatch` when `rec` is not of `expected` kind.
pub(crate) fn expect_kind(rec: &NodeRecord, expected: NodeKind, ctx: &mut ValidationContext) -> bool {
    if rec.kind == expected {
        return true;
    }
    ctx.add_error(EaselError::type_mismatch(format!(
        "expected a {expected} record, found {}",
        rec.kind
    )));
    false
}

/// Boolean attribute with a default; a non-boolean value is recorded as an issue.
pub(crate) fn bool_attr(
    rec: &NodeRecord,
    key: &'static str,
    default: bool,
    ctx: &mut ValidationContext,
) -> bool {
    match rec.attributes.get(key) {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            ctx.push(RecordPathElem::Field("attributes"));
            ctx.push(RecordPathElem::Field(key));
            ctx.add_error(EaselError::validation(format!(
                "expected a boolean, found {other}"
            )));
            ctx.pop();
            ctx.pop();
            default
        }
    }
}

/// Typed attribute decoded with serde; decoding failures are recorded.
pub(crate) fn typed_attr<T: serde::de::DeserializeOwned>(
    rec: &NodeRecord,
    key: &'static str,
    ctx: &mut ValidationContext,
) -> Option<T> {
    let raw = rec.attributes.get(key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            ctx.push(RecordPathElem::Field("attributes"));
            ctx.push(RecordPathElem::Field(key));
            ctx.add_error(EaselError::serde(e.to_string()));
            ctx.pop();
            ctx.pop();
            None
        }
    }
}

/// Visit each child with its path segment pushed.
pub(crate) fn each_child<'r>(
    rec: &'r NodeRecord,
    ctx: &mut ValidationContext,
    mut f: impl FnMut(&'r NodeRecord, &mut ValidationContext),
) {
    ctx.push(RecordPathElem::Field("children"));
    for (i, child) in rec.children.iter().enumerate() {
        ctx.push(RecordPathElem::Index(i));
        f(child, ctx);
        ctx.pop();
    }
    ctx.pop();
}

impl Shape {
    pub fn to_record(&self) -> NodeRecord {
        let mut rec = NodeRecord::new(NodeKind::Shape);
        if let Ok(Value::Object(attrs)) = serde_json::to_value(self) {
            rec.attributes = attrs;
        }
        rec
    }

    pub fn from_record(rec: &NodeRecord, ctx: &mut ValidationContext) -> Option<Shape> {
        if !expect_kind(rec, NodeKind::Shape, ctx) {
            return None;
        }
        each_child(rec, ctx, |child, ctx| {
            ctx.add_error(EaselError::type_mismatch(format!(
                "shape records have no children, found a {} record",
                child.kind
            )));
        });
        match serde_json::from_value(Value::Object(rec.attributes.clone())) {
            Ok(shape) => Some(shape),
            Err(e) => {
                ctx.push(RecordPathElem::Field("attributes"));
                ctx.add_error(EaselError::serde(e.to_string()));
                ctx.pop();
                None
            }
        }
    }
}

impl Surface {
    pub fn to_record(&self) -> NodeRecord {
        let mut rec = NodeRecord::new(NodeKind::Layer);
        rec.set_attr("visible", self.is_visible());
        rec.set_attr("listening", self.is_listening());
        if let Some(clear) = self.settings().clear_rgba
            && let Ok(v) = serde_json::to_value(clear)
        {
            rec.set_attr("clear_rgba", v);
        }
        rec.children = self.children().iter().map(Shape::to_record).collect();
        rec
    }

    /// Rebuild an unowned, zero-sized layer; invalid shapes are skipped and recorded.
    pub fn from_record(rec: &NodeRecord, ctx: &mut ValidationContext) -> Option<Surface> {
        if !expect_kind(rec, NodeKind::Layer, ctx) {
            return None;
        }
        let clear_rgba = typed_attr::<Rgba8>(rec, "clear_rgba", ctx);
        let mut surface = Surface::new().with_settings(RenderSettings {
            clear_rgba,
            ..RenderSettings::default()
        });
        surface.set_visible(bool_attr(rec, "visible", true, ctx));
        surface.set_listening(bool_attr(rec, "listening", true, ctx));

        let mut shapes = Vec::new();
        each_child(rec, ctx, |child, ctx| {
            if let Some(shape) = Shape::from_record(child, ctx) {
                shapes.push(shape);
            }
        });
        for shape in shapes {
            // surfaces accept every shape
            let _ = surface.add(shape);
        }
        Some(surface)
    }
}

impl Scene {
    pub fn to_record(&self) -> NodeRecord {
        let mut rec = NodeRecord::new(NodeKind::Scene).with_storage("ordered");
        rec.set_attr("visible", self.is_visible());
        rec.children = self.children().iter().map(Surface::to_record).collect();
        rec
    }

    pub fn from_record(rec: &NodeRecord, ctx: &mut ValidationContext) -> Option<Scene> {
        if !expect_kind(rec, NodeKind::Scene, ctx) {
            return None;
        }
        let mut scene = Scene::new();
        scene.set_visible(bool_attr(rec, "visible", true, ctx));

        let mut layers = Vec::new();
        each_child(rec, ctx, |child, ctx| {
            if let Some(layer) = Surface::from_record(child, ctx) {
                layers.push(layer);
            }
        });
        for layer in layers {
            if let Err(e) = scene.add(layer) {
                ctx.add_error(e);
            }
        }
        Some(scene)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/record/node.rs"]
mod tests;
