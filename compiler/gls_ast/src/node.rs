//! Syntax tree nodes.
//!
//! Nodes live in a flat arena (`SyntaxTree`) and reference their children by
//! `NodeId` indices. Two numbering schemes coexist on purpose:
//!
//! - `NodeId` is the storage handle. It is stable across text edits and is
//!   how the tree itself links parent to child.
//! - `Uid` is the traversal-order number used by every analysis pass. It is
//!   assigned post-order (a node's uid exceeds every descendant's) and is
//!   invalidated by any structural edit until `NodeIndex::recompute` runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena index of a node within its `SyntaxTree`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense post-order traversal number.
///
/// Unique within one recomputation epoch. Because numbering is post-order,
/// `a.uid > b.uid` whenever `a` is an ancestor of `b`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct Uid(pub u32);

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// GLSL storage qualifier on a declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    #[default]
    None,
    Uniform,
    Attribute,
    Varying,
    Const,
}

impl Qualifier {
    /// Keyword spelling, empty for `None`.
    pub fn keyword(self) -> &'static str {
        match self {
            Qualifier::None => "",
            Qualifier::Uniform => "uniform",
            Qualifier::Attribute => "attribute",
            Qualifier::Varying => "varying",
            Qualifier::Const => "const",
        }
    }
}

/// Node kind tag for the supported GLSL grammar subset.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Translation unit root.
    Root,
    /// Function definition: children are params, then the body `Block`.
    /// `text` holds the function name, `type_name` the return type.
    FunctionDef,
    /// Forward declaration: children are params only.
    FunctionProto,
    /// Function parameter. `text` = name, `type_name` = declared type.
    Param,
    /// One declaration statement; children are `Declarator`s.
    /// `type_name` holds the declared type, `qualifier` the storage class.
    DeclarationList,
    /// A single declared name; optional child is the initializer expression.
    Declarator,
    /// Struct type definition; children are `StructField`s. `text` = type name.
    StructDef,
    /// Struct member. `text` = name, `type_name` = member type.
    StructField,
    /// Brace-delimited statement block. Opens a scope.
    Block,
    /// `if` statement: children are condition, then-branch, optional else.
    If,
    /// `for` statement: init, condition, increment, body. Opens a scope.
    For,
    /// `while` statement: condition, body.
    While,
    Return,
    Break,
    Continue,
    Discard,
    /// Expression evaluated for effect; single child.
    ExprStatement,
    /// Assignment; `text` holds the operator (`=`, `+=`, ...).
    Assign,
    /// Binary expression; `text` holds the operator.
    Binary,
    /// Prefix unary expression; `text` holds the operator.
    Unary,
    /// Ternary conditional: condition, consequent, alternate.
    Conditional,
    /// Array subscript: receiver, index expression.
    Index,
    /// Function or constructor call; `text` = callee name, children = args.
    Call,
    /// Field selection / swizzle: child is the receiver, `text` the member.
    FieldSelect,
    /// Identifier reference. `text` = name.
    Ident,
    /// Literal token, emitted verbatim from `text`.
    Literal,
    /// Named type occurrence inside a declaration. `text` = type name.
    TypeRef,
    /// `invariant <name>;` redeclaration. `text` = name.
    InvariantDecl,
    /// `precision <prec> <type>;`, carried verbatim in `text`.
    PrecisionDecl,
    /// Verbatim passthrough line (preprocessor remnants).
    Raw,
}

impl NodeKind {
    /// Whether entering this node opens a new lexical scope.
    pub fn opens_scope(self) -> bool {
        matches!(self, NodeKind::Block | NodeKind::For | NodeKind::StructDef)
    }

    /// Whether this node is a statement-position construct.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::DeclarationList
                | NodeKind::ExprStatement
                | NodeKind::If
                | NodeKind::For
                | NodeKind::While
                | NodeKind::Return
                | NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Discard
                | NodeKind::Block
                | NodeKind::Raw
        )
    }
}

/// One node of the syntax tree.
///
/// Text-bearing nodes carry a source `offset` so the translator can merge
/// offset-indexed side-table entries back into the regenerated text.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub uid: Option<Uid>,
    #[serde(default)]
    pub parent_uid: Option<Uid>,
    #[serde(default)]
    pub offset: Option<u32>,
    /// Identifier, literal or operator text, depending on `kind`.
    #[serde(default)]
    pub text: Option<String>,
    /// Declared or returned type name, where applicable.
    #[serde(default)]
    pub type_name: Option<String>,
    /// Array size expression text on an array declarator.
    #[serde(default)]
    pub array_size: Option<String>,
    #[serde(default)]
    pub qualifier: Qualifier,
    /// Leading annotation comments (region markers, see `marker`).
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Set by the optimizer: braces may be omitted on emission.
    #[serde(default)]
    pub brace_eliminable: bool,
    /// Set by the optimizer on synthesized consolidated declarations.
    #[serde(default)]
    pub hoisted_decl: bool,
    /// Declarations under a protected substitution span are off limits to
    /// slot reuse.
    #[serde(default)]
    pub protected: bool,
}

impl SyntaxNode {
    /// New node of the given kind with everything else empty.
    pub fn new(kind: NodeKind) -> Self {
        SyntaxNode {
            kind,
            uid: None,
            parent_uid: None,
            offset: None,
            text: None,
            type_name: None,
            array_size: None,
            qualifier: Qualifier::None,
            comments: Vec::new(),
            children: Vec::new(),
            brace_eliminable: false,
            hoisted_decl: false,
            protected: false,
        }
    }

    /// The node's text, or `""`.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// The node's type name, or `""`.
    pub fn type_name(&self) -> &str {
        self.type_name.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn qualifier_keywords() {
        assert_eq!(Qualifier::Uniform.keyword(), "uniform");
        assert_eq!(Qualifier::None.keyword(), "");
    }

    #[test]
    fn scope_opening_kinds() {
        assert!(NodeKind::Block.opens_scope());
        assert!(NodeKind::For.opens_scope());
        assert!(NodeKind::StructDef.opens_scope());
        assert!(!NodeKind::FunctionDef.opens_scope());
        assert!(!NodeKind::If.opens_scope());
    }

    #[test]
    fn uid_ordering_is_numeric() {
        assert!(Uid(4) > Uid(3));
        assert_eq!(Uid(7).to_string(), "#7");
    }
}
