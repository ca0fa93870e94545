// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Static types as far as the checker infers them.

use crate::symbol::{SymbolId, SymbolKind, SymbolTable};

/// Embedded fields and interfaces are followed at most this deep.
const MAX_EMBED_DEPTH: usize = 8;

static INVALID: Type = Type::Invalid;

/// A static type. `Invalid` stands for anything the checker could not infer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Type {
    #[default]
    Invalid,
    /// Predeclared basic types: `int`, `string`, `bool`, ...
    Basic(String),
    /// The type of `nil`.
    Nil,
    /// A declared type, referenced through its `TypeName` symbol.
    Named(SymbolId),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(Box<Type>),
    Func(Box<Signature>),
    Interface(InterfaceType),
    Struct(Vec<StructField>),
    /// Results of a multi-value call.
    Tuple(Vec<Type>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<ParamInfo>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceType {
    pub methods: Vec<(String, Signature)>,
    pub embedded: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

impl Type {
    pub fn basic(name: &str) -> Type {
        Type::Basic(name.to_string())
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    /// The type a call with these results evaluates to.
    pub fn from_results(results: &[Type]) -> Type {
        match results {
            [single] => single.clone(),
            _ => Type::Tuple(results.to_vec()),
        }
    }

    /// Pointee of a pointer, or the type itself.
    pub fn deref(&self) -> &Type {
        match self {
            Type::Pointer(inner) => inner.as_ref(),
            other => other,
        }
    }
}

/// Resolve named types to their underlying type.
pub fn underlying<'a>(symbols: &'a SymbolTable, ty: &'a Type) -> &'a Type {
    let mut current = ty;
    for _ in 0..MAX_EMBED_DEPTH {
        match current {
            Type::Named(id) => match symbols.get(*id).map(|s| &s.kind) {
                Some(SymbolKind::TypeName { underlying, .. }) => current = underlying,
                _ => return &INVALID,
            },
            _ => return current,
        }
    }
    current
}

/// A method found on a type.
#[derive(Debug, Clone)]
pub enum MethodRef {
    /// A declared method with its own symbol.
    Concrete(SymbolId),
    /// A method of an interface type; calls through it have no static target.
    Interface(Signature),
}

/// Methods declared directly on a named type or a pointer to one.
pub fn concrete_method(symbols: &SymbolTable, ty: &Type, name: &str) -> Option<SymbolId> {
    let Type::Named(id) = ty.deref() else { return None };
    match &symbols.get(*id)?.kind {
        SymbolKind::TypeName { methods, .. } => {
            methods.iter().find(|(n, _)| n == name).map(|(_, m)| *m)
        }
        _ => None,
    }
}

/// Full method lookup: declared methods, interface methods and methods
/// promoted from embedded fields.
pub fn lookup_method(symbols: &SymbolTable, ty: &Type, name: &str) -> Option<MethodRef> {
    lookup_method_depth(symbols, ty, name, 0)
}

fn lookup_method_depth(symbols: &SymbolTable, ty: &Type, name: &str, depth: usize) -> Option<MethodRef> {
    if depth > MAX_EMBED_DEPTH {
        return None;
    }
    if let Some(id) = concrete_method(symbols, ty, name) {
        return Some(MethodRef::Concrete(id));
    }
    match underlying(symbols, ty.deref()) {
        Type::Interface(iface) => {
            if let Some((_, sig)) = iface.methods.iter().find(|(n, _)| n == name) {
                return Some(MethodRef::Interface(sig.clone()));
            }
            iface.embedded.iter().find_map(|e| lookup_method_depth(symbols, e, name, depth + 1))
        }
        Type::Struct(fields) => fields
            .iter()
            .filter(|f| f.embedded)
            .find_map(|f| lookup_method_depth(symbols, &f.ty, name, depth + 1)),
        _ => None,
    }
}

/// Type of field `name`, looking through pointers and embedded structs.
pub fn field_type(symbols: &SymbolTable, ty: &Type, name: &str) -> Option<Type> {
    field_type_depth(symbols, ty, name, 0)
}

fn field_type_depth(symbols: &SymbolTable, ty: &Type, name: &str, depth: usize) -> Option<Type> {
    if depth > MAX_EMBED_DEPTH {
        return None;
    }
    let Type::Struct(fields) = underlying(symbols, ty.deref()) else { return None };
    if let Some(field) = fields.iter().find(|f| f.name == name) {
        return Some(field.ty.clone());
    }
    fields
        .iter()
        .filter(|f| f.embedded)
        .find_map(|f| field_type_depth(symbols, &f.ty, name, depth + 1))
}

/// Element type produced by indexing.
pub fn index_type(symbols: &SymbolTable, ty: &Type) -> Type {
    match underlying(symbols, ty) {
        Type::Map(_, value) => (**value).clone(),
        Type::Slice(elem) | Type::Array(elem) => (**elem).clone(),
        Type::Pointer(inner) => match underlying(symbols, inner) {
            Type::Array(elem) => (**elem).clone(),
            _ => Type::Invalid,
        },
        Type::Basic(name) if name == "string" => Type::basic("byte"),
        _ => Type::Invalid,
    }
}

/// Key and value types bound by a `range` loop over `ty`.
pub fn range_types(symbols: &SymbolTable, ty: &Type) -> (Type, Type) {
    match underlying(symbols, ty) {
        Type::Map(key, value) => ((**key).clone(), (**value).clone()),
        Type::Slice(elem) | Type::Array(elem) => (Type::basic("int"), (**elem).clone()),
        Type::Pointer(inner) => match underlying(symbols, inner) {
            Type::Array(elem) => (Type::basic("int"), (**elem).clone()),
            _ => (Type::Invalid, Type::Invalid),
        },
        Type::Chan(elem) => ((**elem).clone(), Type::Invalid),
        Type::Basic(name) if name == "string" => (Type::basic("int"), Type::basic("rune")),
        Type::Basic(name) if name.starts_with("int") || name.starts_with("uint") => {
            (ty.clone(), Type::Invalid)
        }
        _ => (Type::Invalid, Type::Invalid),
    }
}
