//! The declaration registry: the single source of truth for TOML's
//! structural rules.
//!
//! Every declared path is an entry keyed by *(parent scope, segment name)*.
//! Scopes are numbered tables: the root document is scope 0, and each table
//! declaration allocates a fresh scope for its children. Keying by scope id
//! instead of a joined path string keeps quoted keys containing `.` (or any
//! other byte) collision-free, and makes a "fresh, isolated registry" — as
//! array-of-tables entries and inline tables require — a matter of handing
//! out a new scope id.

#[cfg(test)]
#[path = "./registry_tests.rs"]
mod tests;

use foldhash::HashMap;

/// Identifies one table's namespace within the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct ScopeId(u32);

impl ScopeId {
    /// The root document's scope.
    pub(crate) const ROOT: ScopeId = ScopeId(0);
}

/// What a registered path was declared as.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum DeclKind {
    /// Leaf value kinds. All of these are final: no later statement may
    /// redeclare or extend them.
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    /// An inline `[...]` array value. Sealed; `[[x]]` may not extend it.
    Array,
    /// An inline `{...}` table value. Sealed at its closing brace: keys
    /// inside it are invisible here and the table cannot be reopened.
    InlineTable,
    /// A table declared by an explicit `[x]` header.
    Table,
    /// A super-table materialized by a dotted key or a nested header,
    /// promotable to `Table` exactly once.
    ImplicitTable,
    /// An array of tables declared by `[[x]]` headers, append-only.
    ArrayTable,
}

/// A registry entry. `scope` is the namespace of the declared table's
/// children; for leaf kinds it is unused and holds [`ScopeId::ROOT`].
/// For [`DeclKind::ArrayTable`] it tracks the *current* entry's scope and is
/// replaced on every append.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Decl {
    pub(crate) kind: DeclKind,
    pub(crate) scope: ScopeId,
}

#[derive(Hash, PartialEq, Eq)]
struct PathKey<'de> {
    parent: ScopeId,
    name: &'de str,
}

pub(crate) struct Registry<'de> {
    map: HashMap<PathKey<'de>, Decl>,
    next_scope: u32,
}

impl<'de> Registry<'de> {
    pub(crate) fn new() -> Self {
        Registry {
            map: HashMap::with_capacity_and_hasher(64, foldhash::fast::RandomState::default()),
            next_scope: 1,
        }
    }

    /// Allocates a scope unconnected to any entry. Used for inline tables,
    /// whose namespace exists for duplicate detection but is sealed from
    /// the outside.
    pub(crate) fn fresh_scope(&mut self) -> ScopeId {
        let id = self.next_scope;
        self.next_scope += 1;
        ScopeId(id)
    }

    pub(crate) fn get(&self, parent: ScopeId, name: &'de str) -> Option<Decl> {
        self.map.get(&PathKey { parent, name }).copied()
    }

    /// Registers a leaf declaration. The caller has verified vacancy.
    pub(crate) fn insert_leaf(&mut self, parent: ScopeId, name: &'de str, kind: DeclKind) {
        let previous = self.map.insert(
            PathKey { parent, name },
            Decl {
                kind,
                scope: ScopeId::ROOT,
            },
        );
        debug_assert!(previous.is_none(), "leaf inserted over an existing entry");
    }

    /// Registers a table-like declaration and returns the scope allocated
    /// for its children. The caller has verified vacancy.
    pub(crate) fn insert_table(&mut self, parent: ScopeId, name: &'de str, kind: DeclKind) -> ScopeId {
        let scope = self.fresh_scope();
        let previous = self
            .map
            .insert(PathKey { parent, name }, Decl { kind, scope });
        debug_assert!(previous.is_none(), "table inserted over an existing entry");
        scope
    }

    /// Replaces the kind of an existing entry, keeping its scope.
    /// Used for the one-shot implicit-to-explicit promotion.
    pub(crate) fn promote(&mut self, parent: ScopeId, name: &'de str, kind: DeclKind) {
        match self.map.get_mut(&PathKey { parent, name }) {
            Some(decl) => decl.kind = kind,
            None => debug_assert!(false, "promoted a missing entry"),
        }
    }

    /// Replaces the current scope of an existing entry. Used when an
    /// `[[x]]` header appends a new entry with a fresh namespace.
    pub(crate) fn set_scope(&mut self, parent: ScopeId, name: &'de str, scope: ScopeId) {
        match self.map.get_mut(&PathKey { parent, name }) {
            Some(decl) => decl.scope = scope,
            None => debug_assert!(false, "rescoped a missing entry"),
        }
    }
}
