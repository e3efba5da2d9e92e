//! The C type system.
//!
//! All types live in a [`TypeRegistry`] and are addressed by [`TypeId`].
//! Arithmetic types are interned by their specifier/qualifier masks and
//! shared structurally; struct/union types are identity-typed: every tag
//! definition gets a fresh record, and completing a forward-declared
//! record mutates it in place so that previously built pointer types see
//! the completed layout.
//!
//! Qualifier bits live on the type value. A qualified variant of a
//! record type shares the underlying record data, so identity (and
//! retroactive completion) survives qualification.

use crate::arena::{Arena, Id};
use crate::ast::Symbol;
use rustc_hash::FxHashMap;

// Type specifier bits. Accumulated by the declaration-specifier state
// machine and resolved into an arithmetic type.
pub const T_SIGNED: u32 = 1 << 0;
pub const T_UNSIGNED: u32 = 1 << 1;
pub const T_CHAR: u32 = 1 << 2;
pub const T_SHORT: u32 = 1 << 3;
pub const T_INT: u32 = 1 << 4;
pub const T_LONG: u32 = 1 << 5;
pub const T_LONG_LONG: u32 = 1 << 6;
pub const T_FLOAT: u32 = 1 << 7;
pub const T_DOUBLE: u32 = 1 << 8;
pub const T_BOOL: u32 = 1 << 9;
pub const T_COMPLEX: u32 = 1 << 10;
pub const T_VOID: u32 = 1 << 11;
// Discriminators for non-arithmetic specifiers.
pub const T_RECORD: u32 = 1 << 12;
pub const T_ENUM: u32 = 1 << 13;
pub const T_TYPEDEF_NAME: u32 = 1 << 14;

// Storage-class specifier bits.
pub const S_TYPEDEF: u32 = 1 << 0;
pub const S_EXTERN: u32 = 1 << 1;
pub const S_STATIC: u32 = 1 << 2;
pub const S_THREAD: u32 = 1 << 3;
pub const S_AUTO: u32 = 1 << 4;
pub const S_REGISTER: u32 = 1 << 5;

// Function specifier bits.
pub const F_INLINE: u32 = 1 << 0;
pub const F_NORETURN: u32 = 1 << 1;

// Qualifier bits.
pub const Q_CONST: u32 = 1 << 0;
pub const Q_RESTRICT: u32 = 1 << 1;
pub const Q_VOLATILE: u32 = 1 << 2;
pub const Q_ATOMIC: u32 = 1 << 3;

// Specifier compatibility masks: the bits each keyword may be combined
// with. `long` toggles to `long long` instead of conflicting.
pub const COMP_SIGNED: u32 = T_SHORT | T_INT | T_LONG | T_LONG_LONG;
pub const COMP_UNSIGNED: u32 = T_SHORT | T_INT | T_LONG | T_LONG_LONG;
pub const COMP_CHAR: u32 = T_SIGNED | T_UNSIGNED;
pub const COMP_SHORT: u32 = T_SIGNED | T_UNSIGNED | T_INT;
pub const COMP_INT: u32 = T_SIGNED | T_UNSIGNED | T_LONG | T_SHORT | T_LONG_LONG;
pub const COMP_LONG: u32 = T_SIGNED | T_UNSIGNED | T_LONG | T_INT;
pub const COMP_FLOAT: u32 = T_COMPLEX;
pub const COMP_DOUBLE: u32 = T_LONG | T_COMPLEX;
pub const COMP_COMPLEX: u32 = T_FLOAT | T_DOUBLE | T_LONG;
pub const COMP_THREAD: u32 = S_EXTERN | S_STATIC;

/// Integer promotion threshold: operands narrower than this widen to `int`.
pub const MACHINE_WORD: u32 = 4;

/// A typed literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

pub type TypeId = Id<Type>;
pub type RecordId = Id<RecordData>;

/// A struct or union member with its computed layout offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub name: Symbol,
    pub ty: TypeId,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

/// Shared struct/union data. Qualified variants of a record type all
/// point at the same `RecordData`, so completing a forward declaration
/// is visible through every handle.
#[derive(Debug)]
pub struct RecordData {
    pub kind: RecordKind,
    pub members: Vec<Member>,
    pub complete: bool,
    pub width: u32,
    pub align: u32,
}

/// A type: tagged kind plus qualifier bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub qual: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    /// Arithmetic type described by its specifier mask.
    Arith { spec: u32 },
    /// Enumerated type. Treated as `int` arithmetically but
    /// identity-typed via `tag`, and incomplete until the enumerator
    /// list closes.
    Enum { tag: u32, complete: bool },
    Pointer { pointee: TypeId },
    Array { elem: TypeId, len: Option<u32> },
    Function {
        ret: TypeId,
        params: Vec<TypeId>,
        variadic: bool,
    },
    Record { record: RecordId },
}

fn align_up(offset: u32, align: u32) -> u32 {
    (offset + align - 1) & !(align - 1)
}

fn arith_base_width(spec: u32) -> u32 {
    if spec & (T_BOOL | T_CHAR) != 0 {
        1
    } else if spec & T_SHORT != 0 {
        2
    } else if spec & (T_LONG | T_LONG_LONG) != 0 {
        8
    } else if spec & T_DOUBLE != 0 {
        8
    } else {
        4
    }
}

/// Constructs and interns types; answers completeness, layout, and
/// equality queries.
pub struct TypeRegistry {
    types: Arena<Type>,
    records: Arena<RecordData>,
    arith_cache: FxHashMap<(u32, u32), TypeId>,
    void_ty: TypeId,
    enum_counter: u32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut types = Arena::new();
        let void_ty = types.alloc(Type {
            kind: TypeKind::Void,
            qual: 0,
        });
        Self {
            types,
            records: Arena::new(),
            arith_cache: FxHashMap::default(),
            void_ty,
            enum_counter: 0,
        }
    }

    // ============================================================
    // Construction
    // ============================================================

    pub fn void(&self) -> TypeId {
        self.void_ty
    }

    /// The interned arithmetic type for a specifier mask.
    pub fn arith(&mut self, spec: u32) -> TypeId {
        self.arith_qual(spec, 0)
    }

    /// The interned arithmetic type for a specifier/qualifier pair.
    pub fn arith_qual(&mut self, spec: u32, qual: u32) -> TypeId {
        if let Some(&id) = self.arith_cache.get(&(spec, qual)) {
            return id;
        }
        let id = self.types.alloc(Type {
            kind: TypeKind::Arith { spec },
            qual,
        });
        self.arith_cache.insert((spec, qual), id);
        id
    }

    pub fn int(&mut self) -> TypeId {
        self.arith(T_INT)
    }

    /// A fresh, incomplete enumerated type.
    pub fn new_enum(&mut self) -> TypeId {
        self.enum_counter += 1;
        self.types.alloc(Type {
            kind: TypeKind::Enum {
                tag: self.enum_counter,
                complete: false,
            },
            qual: 0,
        })
    }

    pub fn complete_enum(&mut self, ty: TypeId) {
        if let TypeKind::Enum { complete, .. } = &mut self.types[ty].kind {
            *complete = true;
        }
    }

    pub fn pointer_to(&mut self, pointee: TypeId, qual: u32) -> TypeId {
        self.types.alloc(Type {
            kind: TypeKind::Pointer { pointee },
            qual,
        })
    }

    pub fn array_of(&mut self, elem: TypeId, len: Option<u32>) -> TypeId {
        self.types.alloc(Type {
            kind: TypeKind::Array { elem, len },
            qual: 0,
        })
    }

    pub fn function_of(&mut self, ret: TypeId, params: Vec<TypeId>, variadic: bool) -> TypeId {
        self.types.alloc(Type {
            kind: TypeKind::Function {
                ret,
                params,
                variadic,
            },
            qual: 0,
        })
    }

    /// A fresh, incomplete struct or union type.
    pub fn new_record(&mut self, kind: RecordKind) -> TypeId {
        let record = self.records.alloc(RecordData {
            kind,
            members: Vec::new(),
            complete: false,
            width: 0,
            align: 1,
        });
        self.types.alloc(Type {
            kind: TypeKind::Record { record },
            qual: 0,
        })
    }

    /// Install the member list of a record and compute its layout.
    /// Struct members get aligned running offsets; union members all
    /// sit at offset zero.
    pub fn complete_record(&mut self, ty: TypeId, members: Vec<(Symbol, TypeId)>) {
        let TypeKind::Record { record } = self.types[ty].kind else {
            return;
        };
        let kind = self.records[record].kind;

        let mut laid = Vec::with_capacity(members.len());
        let mut offset = 0u32;
        let mut max_align = 1u32;
        let mut max_width = 0u32;
        for (name, mty) in members {
            let width = self.width(mty);
            let align = self.align(mty).max(1);
            max_align = max_align.max(align);
            match kind {
                RecordKind::Struct => {
                    offset = align_up(offset, align);
                    laid.push(Member {
                        name,
                        ty: mty,
                        offset,
                    });
                    offset += width;
                }
                RecordKind::Union => {
                    laid.push(Member {
                        name,
                        ty: mty,
                        offset: 0,
                    });
                    max_width = max_width.max(width);
                }
            }
        }

        let width = match kind {
            RecordKind::Struct => align_up(offset, max_align),
            RecordKind::Union => align_up(max_width, max_align),
        };
        let data = &mut self.records[record];
        data.members = laid;
        data.complete = true;
        data.width = width;
        data.align = max_align;
    }

    /// Return `ty` with the extra qualifier bits applied. Qualifying a
    /// record type shares its record data.
    pub fn qualify(&mut self, ty: TypeId, qual: u32) -> TypeId {
        if qual == 0 || self.types[ty].qual & qual == qual {
            return ty;
        }
        let merged = self.types[ty].qual | qual;
        if let TypeKind::Arith { spec } = self.types[ty].kind {
            return self.arith_qual(spec, merged);
        }
        let kind = self.types[ty].kind.clone();
        self.types.alloc(Type { kind, qual: merged })
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.types[ty].kind
    }

    pub fn qual(&self, ty: TypeId) -> u32 {
        self.types[ty].qual
    }

    pub fn is_const(&self, ty: TypeId) -> bool {
        self.types[ty].qual & Q_CONST != 0
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        matches!(self.types[ty].kind, TypeKind::Void)
    }

    pub fn is_arith(&self, ty: TypeId) -> bool {
        matches!(
            self.types[ty].kind,
            TypeKind::Arith { .. } | TypeKind::Enum { .. }
        )
    }

    pub fn is_integer(&self, ty: TypeId) -> bool {
        match self.types[ty].kind {
            TypeKind::Arith { spec } => spec & (T_FLOAT | T_DOUBLE | T_COMPLEX) == 0,
            TypeKind::Enum { .. } => true,
            _ => false,
        }
    }

    pub fn is_float(&self, ty: TypeId) -> bool {
        match self.types[ty].kind {
            TypeKind::Arith { spec } => spec & (T_FLOAT | T_DOUBLE) != 0,
            _ => false,
        }
    }

    pub fn is_scalar(&self, ty: TypeId) -> bool {
        self.is_arith(ty) || self.is_pointer(ty)
    }

    pub fn is_pointer(&self, ty: TypeId) -> bool {
        matches!(self.types[ty].kind, TypeKind::Pointer { .. })
    }

    pub fn is_array(&self, ty: TypeId) -> bool {
        matches!(self.types[ty].kind, TypeKind::Array { .. })
    }

    pub fn is_function(&self, ty: TypeId) -> bool {
        matches!(self.types[ty].kind, TypeKind::Function { .. })
    }

    pub fn is_record(&self, ty: TypeId) -> bool {
        matches!(self.types[ty].kind, TypeKind::Record { .. })
    }

    pub fn pointee(&self, ty: TypeId) -> Option<TypeId> {
        match self.types[ty].kind {
            TypeKind::Pointer { pointee } => Some(pointee),
            _ => None,
        }
    }

    pub fn array_elem(&self, ty: TypeId) -> Option<TypeId> {
        match self.types[ty].kind {
            TypeKind::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }

    pub fn array_len(&self, ty: TypeId) -> Option<u32> {
        match self.types[ty].kind {
            TypeKind::Array { len, .. } => len,
            _ => None,
        }
    }

    /// Return type, parameter types, and variadic flag of a function type.
    pub fn function_parts(&self, ty: TypeId) -> Option<(TypeId, Vec<TypeId>, bool)> {
        match &self.types[ty].kind {
            TypeKind::Function {
                ret,
                params,
                variadic,
            } => Some((*ret, params.clone(), *variadic)),
            _ => None,
        }
    }

    /// The specifier mask of an arithmetic type; enums read as `int`.
    pub fn arith_spec(&self, ty: TypeId) -> Option<u32> {
        match self.types[ty].kind {
            TypeKind::Arith { spec } => Some(spec),
            TypeKind::Enum { .. } => Some(T_INT),
            _ => None,
        }
    }

    pub fn record_data(&self, ty: TypeId) -> Option<&RecordData> {
        match self.types[ty].kind {
            TypeKind::Record { record } => Some(&self.records[record]),
            _ => None,
        }
    }

    pub fn find_member(&self, ty: TypeId, name: Symbol) -> Option<Member> {
        self.record_data(ty)?
            .members
            .iter()
            .find(|m| m.name == name)
            .copied()
    }

    pub fn is_complete(&self, ty: TypeId) -> bool {
        match &self.types[ty].kind {
            TypeKind::Void => false,
            TypeKind::Arith { .. } => true,
            TypeKind::Enum { complete, .. } => *complete,
            TypeKind::Pointer { .. } => true,
            TypeKind::Array { len, .. } => len.is_some(),
            TypeKind::Function { .. } => true,
            TypeKind::Record { record } => self.records[*record].complete,
        }
    }

    pub fn width(&self, ty: TypeId) -> u32 {
        match &self.types[ty].kind {
            TypeKind::Void => 0,
            TypeKind::Arith { spec } => {
                let base = arith_base_width(*spec);
                if spec & T_COMPLEX != 0 {
                    base * 2
                } else {
                    base
                }
            }
            TypeKind::Enum { .. } => 4,
            TypeKind::Pointer { .. } => 8,
            TypeKind::Array { elem, len } => len.map_or(0, |n| n * self.width(*elem)),
            TypeKind::Function { .. } => 0,
            TypeKind::Record { record } => self.records[*record].width,
        }
    }

    pub fn align(&self, ty: TypeId) -> u32 {
        match &self.types[ty].kind {
            TypeKind::Void => 1,
            TypeKind::Arith { spec } => arith_base_width(*spec),
            TypeKind::Enum { .. } => 4,
            TypeKind::Pointer { .. } => 8,
            TypeKind::Array { elem, .. } => self.align(*elem),
            TypeKind::Function { .. } => 1,
            TypeKind::Record { record } => self.records[*record].align,
        }
    }

    // ============================================================
    // Equality and compatibility
    // ============================================================

    /// Structural equality. Records and enums compare by identity.
    pub fn equal(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        if self.types[a].qual != self.types[b].qual {
            return false;
        }
        self.equal_unqualified(a, b)
    }

    /// Equality ignoring top-level qualifiers.
    pub fn equal_unqualified(&self, a: TypeId, b: TypeId) -> bool {
        match (&self.types[a].kind, &self.types[b].kind) {
            (TypeKind::Void, TypeKind::Void) => true,
            (TypeKind::Arith { spec: sa }, TypeKind::Arith { spec: sb }) => sa == sb,
            (TypeKind::Enum { tag: ta, .. }, TypeKind::Enum { tag: tb, .. }) => ta == tb,
            (TypeKind::Pointer { pointee: pa }, TypeKind::Pointer { pointee: pb }) => {
                self.equal(*pa, *pb)
            }
            (
                TypeKind::Array { elem: ea, len: la },
                TypeKind::Array { elem: eb, len: lb },
            ) => la == lb && self.equal(*ea, *eb),
            (
                TypeKind::Function {
                    ret: ra,
                    params: pa,
                    variadic: va,
                },
                TypeKind::Function {
                    ret: rb,
                    params: pb,
                    variadic: vb,
                },
            ) => {
                va == vb
                    && self.equal(*ra, *rb)
                    && pa.len() == pb.len()
                    && pa.iter().zip(pb.iter()).all(|(x, y)| self.equal(*x, *y))
            }
            (TypeKind::Record { record: ra }, TypeKind::Record { record: rb }) => ra == rb,
            _ => false,
        }
    }

    /// Assignment/argument compatibility: identical types, any two
    /// arithmetic types, or pointers whose pointees match (or where
    /// either pointee is `void`).
    pub fn compatible(&self, a: TypeId, b: TypeId) -> bool {
        if self.equal_unqualified(a, b) {
            return true;
        }
        if self.is_arith(a) && self.is_arith(b) {
            return true;
        }
        match (self.pointee(a), self.pointee(b)) {
            (Some(pa), Some(pb)) => {
                self.is_void(pa) || self.is_void(pb) || self.equal_unqualified(pa, pb)
            }
            _ => false,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
