//! Simple in-memory tree implementation of [`NodeItem`] for tests and quick
//! prototypes.
//!
//! Focus:
//! - Ergonomic builder for quick test tree creation
//! - Identity equality (navigation hands out clones of the same node)
//! - Thread-safe (Arc + RwLock) for parallel evaluator tests
//!
//! Example:
//! ```
//! use metapath::simple::{doc, assembly, field, flag, Datatype};
//! use metapath::NodeItem;
//!
//! let document = doc()
//!     .child(
//!         assembly("root")
//!             .child(field("field1", Datatype::String, "value1"))
//!             .child(field("field2", Datatype::String, "value2").flag(flag(
//!                 "flag",
//!                 Datatype::String,
//!                 "field2-flag",
//!             ))),
//!     )
//!     .build();
//!
//! let root = document.children()[0].clone();
//! assert_eq!(root.name(), Some("root"));
//! assert_eq!(root.children().len(), 2);
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock, RwLock, Weak};

use chrono::{DateTime, NaiveDate};

use crate::item::AtomicValue;
use crate::model::{NodeItem, NodeKind};
use crate::runtime::{Error, ErrorKind};

/// Declared datatype of a field or flag. Decides how the raw bound value is
/// projected to an [`AtomicValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    String,
    Boolean,
    Integer,
    Decimal,
    Date,
    DateTime,
    YearMonthDuration,
    DayTimeDuration,
    Uuid,
    Uri,
    UntypedAtomic,
}

impl Datatype {
    fn project(self, raw: &str) -> Result<AtomicValue, Error> {
        match self {
            Datatype::String => Ok(AtomicValue::String(raw.to_string())),
            Datatype::UntypedAtomic => Ok(AtomicValue::UntypedAtomic(raw.to_string())),
            Datatype::Uri => Ok(AtomicValue::AnyUri(raw.to_string())),
            Datatype::Uuid => uuid::Uuid::parse_str(raw.trim())
                .map(AtomicValue::Uuid)
                .map_err(|_| invalid_lexical("uuid", raw)),
            Datatype::Boolean => match raw.trim() {
                "true" | "1" => Ok(AtomicValue::Boolean(true)),
                "false" | "0" => Ok(AtomicValue::Boolean(false)),
                other => Err(invalid_lexical("boolean", other)),
            },
            Datatype::Integer => raw
                .trim()
                .parse::<i64>()
                .map(AtomicValue::Integer)
                .map_err(|_| invalid_lexical("integer", raw)),
            Datatype::Decimal => raw
                .trim()
                .parse::<f64>()
                .map(AtomicValue::Decimal)
                .map_err(|_| invalid_lexical("decimal", raw)),
            Datatype::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(|date| AtomicValue::Date { date, tz: None })
                .map_err(|_| invalid_lexical("date", raw)),
            Datatype::DateTime => DateTime::parse_from_rfc3339(raw.trim())
                .map(AtomicValue::DateTime)
                .map_err(|_| invalid_lexical("dateTime", raw)),
            Datatype::YearMonthDuration => {
                AtomicValue::parse_year_month_duration(raw.trim())
                    .map(AtomicValue::YearMonthDuration)
            }
            Datatype::DayTimeDuration => AtomicValue::parse_day_time_duration(raw.trim())
                .map(AtomicValue::DayTimeDuration),
        }
    }
}

fn invalid_lexical(type_name: &str, raw: &str) -> Error {
    Error::new(
        ErrorKind::InvalidType,
        format!("'{raw}' is not a valid {type_name} value"),
    )
}

#[derive(Debug)]
struct Inner {
    kind: NodeKind,
    name: Option<String>,
    value: Option<String>,
    datatype: Datatype,
    base_uri: Option<String>,
    parent: RwLock<Option<Weak<Inner>>>,
    children: RwLock<Vec<SimpleNode>>,
    flags: RwLock<Vec<SimpleNode>>,
    atomic: OnceLock<Result<AtomicValue, Error>>,
}

/// A simple Arc-backed node implementation.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}

impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name)
            .field("value", &self.0.value)
            .finish()
    }
}

impl SimpleNode {
    fn new(
        kind: NodeKind,
        name: Option<String>,
        value: Option<String>,
        datatype: Datatype,
        base_uri: Option<String>,
    ) -> Self {
        SimpleNode(Arc::new(Inner {
            kind,
            name,
            value,
            datatype,
            base_uri,
            parent: RwLock::new(None),
            children: RwLock::new(Vec::new()),
            flags: RwLock::new(Vec::new()),
            atomic: OnceLock::new(),
        }))
    }
}

impl NodeItem for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    fn raw_value(&self) -> Option<&str> {
        self.0.value.as_deref()
    }

    fn base_uri(&self) -> Option<String> {
        if let Some(uri) = &self.0.base_uri {
            return Some(uri.clone());
        }
        self.parent().and_then(|p| p.base_uri())
    }

    fn parent(&self) -> Option<Self> {
        let guard = self.0.parent.read().ok()?;
        guard.as_ref().and_then(Weak::upgrade).map(SimpleNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0
            .children
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn flags(&self) -> Vec<Self> {
        self.0.flags.read().map(|f| f.clone()).unwrap_or_default()
    }

    fn to_atomic(&self) -> Result<AtomicValue, Error> {
        self.0
            .atomic
            .get_or_init(|| match self.0.kind {
                NodeKind::Field | NodeKind::Flag => {
                    let raw = self.0.value.as_deref().unwrap_or("");
                    self.0.datatype.project(raw)
                }
                // Assemblies and documents atomize to the concatenation of
                // their descendant field values, untyped.
                _ => Ok(AtomicValue::UntypedAtomic(collect_text(self))),
            })
            .clone()
    }
}

fn collect_text(node: &SimpleNode) -> String {
    let mut out = String::new();
    for child in node.children() {
        match child.kind() {
            NodeKind::Field => {
                if let Some(v) = child.raw_value() {
                    out.push_str(v);
                }
            }
            _ => out.push_str(&collect_text(&child)),
        }
    }
    out
}

/// Deferred tree description; nodes materialize on [`SimpleNodeBuilder::build`]
/// so that the assembly directly under a document comes out as
/// [`NodeKind::RootAssembly`].
pub struct SimpleNodeBuilder {
    kind: NodeKind,
    name: Option<String>,
    value: Option<String>,
    datatype: Datatype,
    base_uri: Option<String>,
    children: Vec<SimpleNodeBuilder>,
    flags: Vec<SimpleNodeBuilder>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<String>, value: Option<String>, datatype: Datatype) -> Self {
        Self {
            kind,
            name,
            value,
            datatype,
            base_uri: None,
            children: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn child(mut self, child: SimpleNodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn flag(mut self, flag: SimpleNodeBuilder) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn base_uri(mut self, uri: &str) -> Self {
        self.base_uri = Some(uri.to_string());
        self
    }

    pub fn build(self) -> SimpleNode {
        self.materialize(None)
    }

    fn materialize(self, parent: Option<&SimpleNode>) -> SimpleNode {
        let kind = match (self.kind, parent.map(NodeItem::kind)) {
            (NodeKind::Assembly, Some(NodeKind::Document)) => NodeKind::RootAssembly,
            (kind, _) => kind,
        };
        let node = SimpleNode::new(kind, self.name, self.value, self.datatype, self.base_uri);
        if let Some(p) = parent {
            if let Ok(mut guard) = node.0.parent.write() {
                *guard = Some(Arc::downgrade(&p.0));
            }
        }
        let children: Vec<SimpleNode> = self
            .children
            .into_iter()
            .map(|c| c.materialize(Some(&node)))
            .collect();
        if let Ok(mut guard) = node.0.children.write() {
            *guard = children;
        }
        let flags: Vec<SimpleNode> = self
            .flags
            .into_iter()
            .map(|f| f.materialize(Some(&node)))
            .collect();
        if let Ok(mut guard) = node.0.flags.write() {
            *guard = flags;
        }
        node
    }
}

/// Document node builder.
pub fn doc() -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Document, None, None, Datatype::UntypedAtomic)
}

/// Assembly builder; becomes a root assembly when placed directly under a
/// document.
pub fn assembly(name: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(
        NodeKind::Assembly,
        Some(name.to_string()),
        None,
        Datatype::UntypedAtomic,
    )
}

pub fn field(name: &str, datatype: Datatype, value: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(
        NodeKind::Field,
        Some(name.to_string()),
        Some(value.to_string()),
        datatype,
    )
}

pub fn flag(name: &str, datatype: Datatype, value: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(
        NodeKind::Flag,
        Some(name.to_string()),
        Some(value.to_string()),
        datatype,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimpleNode {
        doc()
            .child(
                assembly("root")
                    .child(field("field1", Datatype::String, "value1"))
                    .child(field("field2", Datatype::Integer, "42").flag(flag(
                        "flag",
                        Datatype::String,
                        "field2-flag",
                    ))),
            )
            .build()
    }

    #[test]
    fn kinds_and_navigation() {
        let document = sample();
        assert_eq!(document.kind(), NodeKind::Document);
        let root = document.children()[0].clone();
        assert_eq!(root.kind(), NodeKind::RootAssembly);
        assert!(root.kind().is_assembly());
        let children = root.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name(), Some("field1"));
        assert_eq!(children[1].parent(), Some(root.clone()));
        assert_eq!(root.parent(), Some(document));
        let flag = children[1].flag_named("flag").unwrap();
        assert_eq!(flag.kind(), NodeKind::Flag);
        assert_eq!(flag.raw_value(), Some("field2-flag"));
        // Flags never show up on the child axis.
        assert!(children[1].children().is_empty());
    }

    #[test]
    fn atomic_projection_is_memoized_and_typed() {
        let document = sample();
        let root = document.children()[0].clone();
        let field2 = root.children()[1].clone();
        assert_eq!(field2.to_atomic().unwrap(), AtomicValue::Integer(42));
        assert_eq!(field2.to_atomic().unwrap(), AtomicValue::Integer(42));
    }

    #[test]
    fn uuid_values_project_through_the_datatype() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let node = doc()
            .child(assembly("r").child(field("f", Datatype::Uuid, id)))
            .build();
        let f = node.children()[0].children()[0].clone();
        assert_eq!(
            f.to_atomic().unwrap(),
            AtomicValue::Uuid(uuid::Uuid::parse_str(id).unwrap())
        );
        let bad = doc()
            .child(assembly("r").child(field("f", Datatype::Uuid, "not-a-uuid")))
            .build();
        let err = bad.children()[0].children()[0].to_atomic().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
    }

    #[test]
    fn invalid_lexical_value_is_a_type_error() {
        let node = doc()
            .child(assembly("r").child(field("f", Datatype::Integer, "abc")))
            .build();
        let f = node.children()[0].children()[0].clone();
        let err = f.to_atomic().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
    }
}
