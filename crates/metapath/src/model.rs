//! Node item tree contract.
//!
//! The evaluator navigates a document tree of nested assemblies, fields and
//! flags. The tree itself is owned and constructed by an external binding
//! layer; this module only defines the contract that layer implements.
//! [`simple`] provides an in-memory implementation for tests and prototypes.

pub mod simple;

use crate::item::AtomicValue;
use crate::runtime::Error;

/// Structural kind of a node item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    /// The single assembly directly under a document node.
    RootAssembly,
    Assembly,
    Field,
    Flag,
}

impl NodeKind {
    /// Root assemblies are assemblies for the purpose of node tests.
    pub fn is_assembly(self) -> bool {
        matches!(self, NodeKind::RootAssembly | NodeKind::Assembly)
    }
}

/// Navigable handle into the bound document tree.
///
/// Handles are cheap to clone and compare by node identity. Navigation
/// produces fresh handles on every step; implementations memoize the atomic
/// projection (`to_atomic`) so it is computed at most once per node and is
/// idempotent regardless of how often it is requested.
pub trait NodeItem: Clone + Eq + core::fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> NodeKind;

    /// Effective name. Document nodes are unnamed.
    fn name(&self) -> Option<&str>;

    /// Raw bound value for fields and flags; `None` for assemblies and
    /// documents.
    fn raw_value(&self) -> Option<&str>;

    /// Base URI of the containing document, if the binding layer tracks one.
    fn base_uri(&self) -> Option<String> {
        None
    }

    fn parent(&self) -> Option<Self>;

    /// Named-model children (assemblies and fields) in declaration order.
    /// Flags are never returned here; they are reached via [`Self::flags`].
    fn children(&self) -> Vec<Self>;

    fn flags(&self) -> Vec<Self>;

    /// Projection to an atomic value through the node's declared datatype
    /// adapter. Must be memoized by the implementation.
    fn to_atomic(&self) -> Result<AtomicValue, Error>;

    fn flag_named(&self, name: &str) -> Option<Self> {
        self.flags().into_iter().find(|f| f.name() == Some(name))
    }
}
