//! Annotations produced by the checker.
//!
//! The program tree is immutable, so everything the checker learns is kept
//! here in side tables keyed by [`NodeId`]: the resolved type and mutability
//! of each expression, the resolved type and storage class of each
//! definition, and which definition every name reference resolved to.

use rustc_hash::FxHashMap;
use wabbit_ast::NodeId;
use wabbit_core::ValueType;

/// Where a definition's value lives at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Storage {
    /// Module-level global.
    #[default]
    Global,
    /// Local of the enclosing function (parameters included).
    Local,
}

/// Result of checking an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprInfo {
    /// Resolved type, `None` when an error made it unknowable.
    pub ty: Option<ValueType>,
    /// Whether this is a location (can appear on the left of an assignment).
    pub is_lvalue: bool,
    /// Whether this location may be assigned to.
    pub is_mutable: bool,
}

impl ExprInfo {
    /// A computed value.
    pub fn rvalue(ty: Option<ValueType>) -> Self {
        Self {
            ty,
            is_lvalue: false,
            is_mutable: false,
        }
    }

    /// A location with the given mutability.
    pub fn location(ty: Option<ValueType>, is_mutable: bool) -> Self {
        Self {
            ty,
            is_lvalue: true,
            is_mutable,
        }
    }

    /// A location whose name did not resolve.
    ///
    /// Treated as mutable so an assignment to it reports only the lookup failure.
    pub fn unresolved() -> Self {
        Self::location(None, true)
    }

    /// Check if this can be assigned to.
    pub fn is_assignable(&self) -> bool {
        self.is_lvalue && self.is_mutable
    }
}

/// Resolved facts about a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefInfo {
    pub ty: Option<ValueType>,
    pub storage: Storage,
}

/// Side tables filled in by the checker.
#[derive(Debug, Default)]
pub struct Annotations {
    exprs: FxHashMap<NodeId, ExprInfo>,
    defs: FxHashMap<NodeId, DefInfo>,
    resolutions: FxHashMap<NodeId, NodeId>,
    uses_memory: bool,
}

impl Annotations {
    pub fn with_capacity(nodes: usize) -> Self {
        let mut exprs = FxHashMap::default();
        exprs.reserve(nodes);
        Self {
            exprs,
            ..Self::default()
        }
    }

    pub(crate) fn record_expr(&mut self, id: NodeId, info: ExprInfo) {
        self.exprs.insert(id, info);
    }

    pub(crate) fn record_def(&mut self, id: NodeId, info: DefInfo) {
        self.defs.insert(id, info);
    }

    pub(crate) fn record_resolution(&mut self, reference: NodeId, definition: NodeId) {
        self.resolutions.insert(reference, definition);
    }

    pub(crate) fn mark_memory_use(&mut self) {
        self.uses_memory = true;
    }

    /// Checked information for an expression node.
    pub fn expr(&self, id: NodeId) -> Option<&ExprInfo> {
        self.exprs.get(&id)
    }

    /// Resolved type of an expression node.
    pub fn type_of(&self, id: NodeId) -> Option<ValueType> {
        self.exprs.get(&id).and_then(|info| info.ty)
    }

    /// Resolved facts about a definition or parameter node.
    pub fn def(&self, id: NodeId) -> Option<&DefInfo> {
        self.defs.get(&id)
    }

    /// The definition a named location or call resolved to.
    pub fn resolution(&self, reference: NodeId) -> Option<NodeId> {
        self.resolutions.get(&reference).copied()
    }

    /// Whether the program reads or writes linear memory.
    pub fn uses_memory(&self) -> bool {
        self.uses_memory
    }

    /// All annotated expressions.
    pub fn exprs(&self) -> impl Iterator<Item = (NodeId, &ExprInfo)> {
        self.exprs.iter().map(|(id, info)| (*id, info))
    }
}
