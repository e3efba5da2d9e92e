//! Scopes, name spaces, and linkage.
//!
//! C resolves names in four disjoint name spaces: ordinary
//! identifiers, struct/union/enum tags, labels, and struct/union
//! members. Scopes carry the first two; labels live in a per-function
//! table owned by the parser, and members live on the record type
//! itself, so the four can never collide by construction.
//!
//! Scopes form a tree addressed by [`ScopeId`]. `find` walks up the
//! parent chain; the `in_current` variants do not. The distinguished
//! file scope is the root and never exits.

use crate::arena::{Arena, Id};
use crate::ast::Symbol;
use crate::types::{TypeId, Value};
use rustc_hash::FxHashMap;

pub type ScopeId = Id<Scope>;
pub type IdentId = Id<Ident>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Translation-unit scope.
    File,
    /// Function prototype scope; declarations here have no linkage.
    Proto,
    /// Block scope.
    Block,
}

/// Visibility of a name across translation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    None,
    Internal,
    External,
}

/// What a symbol-table entry denotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdentKind {
    /// A function designator or other non-object identifier.
    Plain,
    /// An object with storage; `offset` is a placeholder for later
    /// layout assignment.
    Object { storage: u32, offset: i32 },
    /// A typed constant, e.g. an enumerator.
    Constant(Value),
    /// A typedef name.
    TypeName,
    /// A struct/union/enum tag.
    Tag,
}

/// A symbol-table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident {
    pub name: Symbol,
    pub ty: TypeId,
    pub scope: ScopeId,
    pub linkage: Linkage,
    pub kind: IdentKind,
}

impl Ident {
    pub fn is_object(&self) -> bool {
        matches!(self.kind, IdentKind::Object { .. })
    }

    pub fn is_typedef(&self) -> bool {
        matches!(self.kind, IdentKind::TypeName)
    }
}

/// One scope: kind, parent link, and the ordinary and tag name spaces.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    ordinary: FxHashMap<Symbol, IdentId>,
    tags: FxHashMap<Symbol, IdentId>,
}

/// The scope tree plus the cursor for the scope currently being
/// parsed.
pub struct ScopeTree {
    scopes: Arena<Scope>,
    current: ScopeId,
    file: ScopeId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut scopes = Arena::new();
        let file = scopes.alloc(Scope {
            kind: ScopeKind::File,
            parent: None,
            ordinary: FxHashMap::default(),
            tags: FxHashMap::default(),
        });
        Self {
            scopes,
            current: file,
            file,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes[self.current].kind
    }

    pub fn file_scope(&self) -> ScopeId {
        self.file
    }

    /// Nesting depth of the current scope; the file scope has depth 1.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope = self.current;
        while let Some(parent) = self.scopes[scope].parent {
            depth += 1;
            scope = parent;
        }
        depth
    }

    /// Enter a fresh child scope of the current one.
    pub fn enter(&mut self, kind: ScopeKind) -> ScopeId {
        let child = self.scopes.alloc(Scope {
            kind,
            parent: Some(self.current),
            ordinary: FxHashMap::default(),
            tags: FxHashMap::default(),
        });
        self.current = child;
        child
    }

    /// Exit the current scope. The file scope is never exited.
    pub fn exit(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Look up an ordinary identifier, walking up the scope chain.
    pub fn find(&self, name: Symbol) -> Option<IdentId> {
        let mut scope = self.current;
        loop {
            if let Some(&id) = self.scopes[scope].ordinary.get(&name) {
                return Some(id);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    /// Look up an ordinary identifier in the current scope only.
    pub fn find_in_current(&self, name: Symbol) -> Option<IdentId> {
        self.scopes[self.current].ordinary.get(&name).copied()
    }

    /// Look up a tag, walking up the scope chain.
    pub fn find_tag(&self, name: Symbol) -> Option<IdentId> {
        let mut scope = self.current;
        loop {
            if let Some(&id) = self.scopes[scope].tags.get(&name) {
                return Some(id);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    /// Look up a tag in the current scope only.
    pub fn find_tag_in_current(&self, name: Symbol) -> Option<IdentId> {
        self.scopes[self.current].tags.get(&name).copied()
    }

    /// Bind an ordinary identifier in the current scope.
    pub fn insert(&mut self, name: Symbol, ident: IdentId) {
        self.scopes[self.current].ordinary.insert(name, ident);
    }

    /// Bind a tag in the current scope.
    pub fn insert_tag(&mut self, name: Symbol, ident: IdentId) {
        self.scopes[self.current].tags.insert(name, ident);
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRegistry;
    use string_interner::DefaultStringInterner;

    fn dummy_ident(idents: &mut Arena<Ident>, name: Symbol, scope: ScopeId, ty: TypeId) -> IdentId {
        idents.alloc(Ident {
            name,
            ty,
            scope,
            linkage: Linkage::None,
            kind: IdentKind::Object {
                storage: 0,
                offset: 0,
            },
        })
    }

    #[test]
    fn shadowing_and_walk_up() {
        let mut interner: DefaultStringInterner = DefaultStringInterner::new();
        let x = interner.get_or_intern("x");
        let y = interner.get_or_intern("y");

        let mut types = TypeRegistry::new();
        let int_ty = types.int();
        let mut idents = Arena::new();
        let mut tree = ScopeTree::new();

        let outer = dummy_ident(&mut idents, x, tree.current(), int_ty);
        tree.insert(x, outer);

        tree.enter(ScopeKind::Block);
        assert_eq!(tree.depth(), 2);
        // Walk-up finds the outer binding; current-scope lookup does not.
        assert_eq!(tree.find(x), Some(outer));
        assert_eq!(tree.find_in_current(x), None);

        let inner = dummy_ident(&mut idents, x, tree.current(), int_ty);
        tree.insert(x, inner);
        assert_eq!(tree.find(x), Some(inner));
        assert_eq!(tree.find(y), None);

        tree.exit();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.find(x), Some(outer));
    }

    #[test]
    fn tags_and_ordinary_names_never_collide() {
        let mut interner: DefaultStringInterner = DefaultStringInterner::new();
        let s = interner.get_or_intern("S");

        let mut types = TypeRegistry::new();
        let int_ty = types.int();
        let mut idents = Arena::new();
        let mut tree = ScopeTree::new();

        let obj = dummy_ident(&mut idents, s, tree.current(), int_ty);
        tree.insert(s, obj);
        assert_eq!(tree.find_tag(s), None);

        let tag = idents.alloc(Ident {
            name: s,
            ty: int_ty,
            scope: tree.current(),
            linkage: Linkage::None,
            kind: IdentKind::Tag,
        });
        tree.insert_tag(s, tag);
        assert_eq!(tree.find_tag(s), Some(tag));
        assert_eq!(tree.find(s), Some(obj));
    }

    #[test]
    fn file_scope_is_never_exited() {
        let mut tree = ScopeTree::new();
        tree.exit();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.current_kind(), ScopeKind::File);
    }
}
