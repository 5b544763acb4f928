//! Nested name scopes.
//!
//! `ScopeStack` is a stack of owned frames. Entering a block or function body
//! pushes a frame, leaving it pops the frame, and lookups walk the stack from
//! the innermost frame outward to the root (global) frame. Declarations in an
//! inner frame shadow outer ones without touching them, so popping a frame
//! restores every outer binding exactly as it was.
//!
//! The stack is generic over what a name maps to: the checker binds names to
//! [`Symbol`](crate::check::Symbol)s.

use rustc_hash::FxHashMap;

/// A stack of name-to-value frames. The bottom frame is the global scope and
/// is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack<V> {
    frames: Vec<FxHashMap<String, V>>,
}

impl<V> Default for ScopeStack<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ScopeStack<V> {
    /// Create a stack holding only the global frame.
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
        }
    }

    // ==========================================================================
    // Frame Management
    // ==========================================================================

    /// Enter a new child scope.
    pub fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Leave the current scope, returning its bindings.
    ///
    /// Returns `None` (and leaves the stack untouched) when only the global
    /// frame remains.
    pub fn pop(&mut self) -> Option<FxHashMap<String, V>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Number of frames, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether the current scope is the global scope.
    pub fn is_global(&self) -> bool {
        self.frames.len() == 1
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Bind `name` in the current scope.
    ///
    /// Returns the binding it replaced in this same scope, if any. Bindings in
    /// enclosing scopes are shadowed, not replaced.
    pub fn declare(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.current_mut().insert(name.into(), value)
    }

    /// Bind `name` in the global scope, regardless of the current depth.
    pub fn declare_global(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.global_mut().insert(name.into(), value)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Resolve `name`, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Resolve `name` in the current scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&V> {
        self.frames.last().and_then(|frame| frame.get(name))
    }

    /// Resolve `name` in the global scope only.
    pub fn lookup_global(&self, name: &str) -> Option<&V> {
        self.frames.first().and_then(|frame| frame.get(name))
    }

    /// Whether `name` resolves to a binding in the global frame (no local
    /// frame shadows it).
    pub fn resolves_to_global(&self, name: &str) -> bool {
        self.frames
            .iter()
            .rposition(|frame| frame.contains_key(name))
            .is_some_and(|index| index == 0)
    }

    fn current_mut(&mut self) -> &mut FxHashMap<String, V> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn global_mut(&mut self) -> &mut FxHashMap<String, V> {
        &mut self.frames[0]
    }
}
