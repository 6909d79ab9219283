//! Typed abstract syntax tree for Metapath expressions.
//!
//! A closed set of expression kinds, constructed once by the CST→AST
//! builder and immutable thereafter. Expressions own their children and are
//! safe to share and evaluate concurrently, provided each evaluation uses
//! its own dynamic context.

/// Lexical name as written in the expression. Matching against node items
/// uses the local part (the effective name); the prefix is kept for
/// diagnostics and namespace-aware callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub prefix: Option<String>,
    pub local: String,
}

impl Name {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn parse(lexical: &str) -> Self {
        match lexical.split_once(':') {
            Some((p, l)) => Self {
                prefix: Some(p.to_string()),
                local: l.to_string(),
            },
            None => Self::local(lexical),
        }
    }
}

impl core::fmt::Display for Name {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
}

/// Navigation relationship of a path step. `children()` on the node
/// contract excludes flags, so flags are reachable only through
/// [`Axis::Flag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    Flag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Effective-name match.
    Name(Name),
    /// `*`: any named node applicable to the axis.
    Wildcard,
    /// `node()` and the `//` desugaring: any node, named or not.
    AnyNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStart {
    /// Leading `/`: evaluation starts at the document root.
    Root,
    /// Relative to the current focus item.
    Relative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub start: PathStart,
    /// Leading non-step expression, e.g. the `$var` in `$var/field`.
    pub input: Option<Box<Expr>>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    VarRef(Name),
    ContextItem,
    FunctionCall {
        name: Name,
        args: Vec<Expr>,
    },
    /// Comma operator: concatenation of the operand sequences.
    Sequence(Vec<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    GeneralComparison {
        left: Box<Expr>,
        op: CompOp,
        right: Box<Expr>,
    },
    ValueComparison {
        left: Box<Expr>,
        op: CompOp,
        right: Box<Expr>,
    },
    Arithmetic {
        left: Box<Expr>,
        op: ArithOp,
        right: Box<Expr>,
    },
    StringConcat(Vec<Expr>),
    Path(PathExpr),
    /// Filter applied to a non-step primary, e.g. `$seq[2]`.
    Predicate {
        base: Box<Expr>,
        predicates: Vec<Expr>,
    },
}
