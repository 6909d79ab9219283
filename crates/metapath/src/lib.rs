//! Metapath: an XPath-3.1-derived expression language over hierarchically
//! bound documents of assemblies, fields and flags.
//!
//! Expressions are compiled once with [`compile`] and evaluated repeatedly
//! against document instances. The compiled expression and the static
//! context are immutable and shareable across threads; each concurrent
//! evaluation needs its own [`DynamicContext`].
//!
//! ```
//! use metapath::simple::{assembly, doc, field, flag, Datatype};
//! use metapath::{compile, DynamicContext, Item};
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
//! let expr = compile("./root/field2/@flag").unwrap();
//! let ctx = DynamicContext::default();
//! let result = expr
//!     .evaluate_as_string(Some(Item::Node(document)), &ctx)
//!     .unwrap();
//! assert_eq!(result, "field2-flag");
//! ```

pub mod compiler;
pub mod functions;
pub mod item;
pub mod model;
pub mod parser;
pub mod runtime;

mod evaluator;

pub use compiler::{MetapathExpression, compile, compile_with_context};
pub use item::{AtomicValue, Item, Sequence};
pub use model::simple;
pub use model::{NodeItem, NodeKind};
pub use parser::{MetapathParser, parse_metapath};
pub use runtime::{
    DocumentLoader, DynamicContext, DynamicContextBuilder, Error, ErrorKind, Focus,
    FunctionRegistry, StaticContext, StaticContextBuilder,
};
