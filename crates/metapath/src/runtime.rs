//! Evaluation runtime: error type, static/dynamic contexts, focus, the
//! function registry and the document-loader boundary.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use url::Url;

use crate::item::{Item, Sequence};
use crate::model::NodeItem;

/// Failure taxonomy. Every error raised anywhere in the crate carries
/// exactly one of these kinds; evaluation is fail-fast with no retry or
/// suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Parse-time failure; no AST is produced.
    Syntax,
    /// The CST→AST builder met a grammar production it does not implement.
    UnsupportedConstruct,
    /// No function registered under the requested name and arity.
    FunctionNotFound,
    /// A function received an operand of a dynamic type it cannot handle.
    InvalidArgumentType,
    /// Comparison or coercion between incompatible item types.
    InvalidType,
    /// `doc()` could not resolve or load a document.
    DocumentResolution,
    /// No base URI available to resolve a relative reference.
    UriResolution,
    /// A `$variable` reference with no binding in the dynamic context.
    UndefinedVariable,
    /// A path or focus-dependent function was evaluated without a focus.
    ContextAbsent,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::UnsupportedConstruct => "unsupported construct",
            ErrorKind::FunctionNotFound => "function not found",
            ErrorKind::InvalidArgumentType => "invalid argument type",
            ErrorKind::InvalidType => "invalid type",
            ErrorKind::DocumentResolution => "document resolution error",
            ErrorKind::UriResolution => "uri resolution error",
            ErrorKind::UndefinedVariable => "undefined variable",
            ErrorKind::ContextAbsent => "context item absent",
        };
        f.write_str(s)
    }
}

/// Single exported error type wrapping all internal typed failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn unsupported(construct: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnsupportedConstruct,
            format!("grammar production '{construct}' is not supported"),
        )
    }

    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidType, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgumentType, message)
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }
}

/// The (context item, position, size) triple active during axis and
/// predicate evaluation. Threaded explicitly through every recursive
/// evaluator call; never shared mutable state.
#[derive(Debug, Clone)]
pub struct Focus<N> {
    pub item: Item<N>,
    /// 1-based position within the current context sequence.
    pub position: usize,
    pub size: usize,
}

impl<N> Focus<N> {
    pub fn new(item: Item<N>, position: usize, size: usize) -> Self {
        Self {
            item,
            position,
            size,
        }
    }
}

/// Compile-time configuration: base URI and namespace bindings. Immutable
/// once built; the compiled expression embeds a snapshot, so a different
/// static context at evaluation time has no effect.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    base_uri: Option<Url>,
    namespaces: HashMap<String, String>,
}

impl StaticContext {
    pub fn builder() -> StaticContextBuilder {
        StaticContextBuilder::default()
    }

    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Fresh per-evaluation context with default built-in functions.
    pub fn new_dynamic_context<N: NodeItem>(&self) -> DynamicContext<N> {
        DynamicContext::default()
    }
}

#[derive(Debug, Default)]
pub struct StaticContextBuilder {
    ctx: StaticContext,
}

impl StaticContextBuilder {
    pub fn base_uri(mut self, uri: Url) -> Self {
        self.ctx.base_uri = Some(uri);
        self
    }

    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.ctx.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn build(self) -> StaticContext {
        self.ctx
    }
}

/// Document loader boundary consumed by `doc()` and `doc-available()`.
/// Loading is blocking and synchronous; timeout/retry policy belongs to the
/// implementation behind this trait.
pub trait DocumentLoader<N>: Send + Sync {
    /// Load the document node for an absolute URI.
    fn load(&self, uri: &Url) -> Result<N, Error>;

    fn is_available(&self, uri: &Url) -> bool {
        self.load(uri).is_ok()
    }
}

/// Per-call view handed to built-in functions: argument sequences come in
/// separately, this carries the ambient state.
pub struct CallCtx<'a, N> {
    pub static_ctx: &'a StaticContext,
    pub dyn_ctx: &'a DynamicContext<N>,
    pub focus: Option<&'a Focus<N>>,
}

pub type FunctionImpl<N> =
    Arc<dyn Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error> + Send + Sync>;

type FunctionOverload<N> = (usize, Option<usize>, FunctionImpl<N>);

/// Built-in function table keyed by name; each entry holds one or more
/// `(min_arity, max_arity, impl)` overloads. `max_arity == None` marks a
/// variadic family (e.g. `concat`). The table is assembled once and exposes
/// lookup only.
pub struct FunctionRegistry<N> {
    fns: HashMap<String, Vec<FunctionOverload<N>>>,
}

impl<N> Default for FunctionRegistry<N> {
    fn default() -> Self {
        Self {
            fns: HashMap::new(),
        }
    }
}

impl<N> FunctionRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, arity: usize, f: F)
    where
        F: 'static + Send + Sync + Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error>,
    {
        self.register_range(name, arity, Some(arity), f);
    }

    pub fn register_range<F>(&mut self, name: &str, min: usize, max: Option<usize>, f: F)
    where
        F: 'static + Send + Sync + Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error>,
    {
        let entry = self.fns.entry(name.to_string()).or_default();
        entry.push((min, max, Arc::new(f)));
        // Most specific overload first: higher min, then bounded before
        // variadic.
        entry.sort_by(|a, b| {
            b.0.cmp(&a.0).then_with(|| match (&a.1, &b.1) {
                (Some(am), Some(bm)) => am.cmp(bm),
                (Some(_), None) => core::cmp::Ordering::Less,
                (None, Some(_)) => core::cmp::Ordering::Greater,
                (None, None) => core::cmp::Ordering::Equal,
            })
        });
    }

    pub fn register_variadic<F>(&mut self, name: &str, min: usize, f: F)
    where
        F: 'static + Send + Sync + Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error>,
    {
        self.register_range(name, min, None, f);
    }

    /// Resolve a call site by name and argument count. Unknown names and
    /// known names with no matching arity both fail with
    /// [`ErrorKind::FunctionNotFound`].
    pub fn resolve(&self, name: &str, arity: usize) -> Result<&FunctionImpl<N>, Error> {
        let Some(overloads) = self.fns.get(name) else {
            return Err(Error::new(
                ErrorKind::FunctionNotFound,
                format!("no function named '{name}'"),
            ));
        };
        if let Some((_, _, f)) = overloads
            .iter()
            .find(|(min, max, _)| arity >= *min && max.is_none_or(|m| arity <= m))
        {
            return Ok(f);
        }
        let known = overloads
            .iter()
            .map(|(min, max, _)| match max {
                Some(m) if m == min => min.to_string(),
                Some(m) => format!("{min}..{m}"),
                None => format!("{min}.."),
            })
            .join(", ");
        Err(Error::new(
            ErrorKind::FunctionNotFound,
            format!("function '{name}' cannot be called with {arity} argument(s); known arities: {known}"),
        ))
    }
}

/// Per-evaluation environment. Compiled expressions and the static context
/// may be shared across threads; each concurrent evaluation needs its own
/// dynamic context.
pub struct DynamicContext<N> {
    pub variables: HashMap<String, Sequence<N>>,
    pub functions: Arc<FunctionRegistry<N>>,
    pub document_loader: Option<Arc<dyn DocumentLoader<N>>>,
    predicates_disabled: bool,
}

impl<N: NodeItem> Default for DynamicContext<N> {
    fn default() -> Self {
        Self {
            variables: HashMap::new(),
            functions: Arc::new(crate::functions::default_function_registry()),
            document_loader: None,
            predicates_disabled: false,
        }
    }
}

impl<N: NodeItem> DynamicContext<N> {
    pub fn builder() -> DynamicContextBuilder<N> {
        DynamicContextBuilder::default()
    }

    /// Skip predicate filter expressions entirely; used when callers only
    /// need structural shape, not filtered results.
    pub fn disable_predicate_evaluation(&mut self) {
        self.predicates_disabled = true;
    }

    pub fn predicates_disabled(&self) -> bool {
        self.predicates_disabled
    }
}

pub struct DynamicContextBuilder<N> {
    ctx: DynamicContext<N>,
}

impl<N: NodeItem> Default for DynamicContextBuilder<N> {
    fn default() -> Self {
        Self {
            ctx: DynamicContext::default(),
        }
    }
}

impl<N: NodeItem> DynamicContextBuilder<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Sequence<N>>) -> Self {
        self.ctx.variables.insert(name.into(), value.into());
        self
    }

    pub fn functions(mut self, registry: Arc<FunctionRegistry<N>>) -> Self {
        self.ctx.functions = registry;
        self
    }

    pub fn document_loader(mut self, loader: Arc<dyn DocumentLoader<N>>) -> Self {
        self.ctx.document_loader = Some(loader);
        self
    }

    pub fn disable_predicate_evaluation(mut self) -> Self {
        self.ctx.predicates_disabled = true;
        self
    }

    pub fn build(self) -> DynamicContext<N> {
        self.ctx
    }
}
