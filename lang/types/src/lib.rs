//! Interning type registry: every distinct structural type gets exactly one
//! [`TypeHandle`], so type equality is a single integer comparison.

use std::collections::HashMap;

/// An opaque, `Copy` reference into a [`TypeRegistry`]. Equality of handles
/// coincides with structural equality of the types they name, because the
/// registry never hands out two handles for the same structural type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(u32);

/// A structural type descriptor. Variant declaration order fixes the total
/// order spec §4.3 calls for (void < number < string < array < function <
/// tuple < init-list); `derive(Ord)` then orders by contained fields, which
/// for nested handles means registry-insertion order — any strict total
/// order is sufficient for interning, so this one is free.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Void,
    Number,
    String,
    Array(TypeHandle),
    Function { ret: TypeHandle, params: Vec<(TypeHandle, bool)> },
    Tuple(Vec<TypeHandle>),
    /// Transient shape produced only by brace-enclosed literals; never
    /// named by user syntax, only ever appears as a node's static type
    /// before it converts into an array or tuple.
    InitList(Vec<TypeHandle>),
}

impl Type {
    pub fn is_void(&self) -> bool {
        return matches!(self, Type::Void);
    }

    pub fn is_init_list(&self) -> bool {
        return matches!(self, Type::InitList(_));
    }
}

/// Interns type descriptors. The three primitives are fixed at construction
/// and returned without insertion, as spec §4.3 requires.
pub struct TypeRegistry {
    types: Vec<Type>,
    lookup: HashMap<Type, TypeHandle>,
    void: TypeHandle,
    number: TypeHandle,
    string: TypeHandle,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self { types: Vec::new(), lookup: HashMap::new(), void: TypeHandle(0), number: TypeHandle(0), string: TypeHandle(0) };
        registry.void = registry.intern(Type::Void);
        registry.number = registry.intern(Type::Number);
        registry.string = registry.intern(Type::String);
        return registry;
    }

    pub fn void(&self) -> TypeHandle {
        return self.void;
    }

    pub fn number(&self) -> TypeHandle {
        return self.number;
    }

    pub fn string(&self) -> TypeHandle {
        return self.string;
    }

    pub fn array(&mut self, element: TypeHandle) -> TypeHandle {
        return self.intern(Type::Array(element));
    }

    pub fn function(&mut self, ret: TypeHandle, params: Vec<(TypeHandle, bool)>) -> TypeHandle {
        return self.intern(Type::Function { ret, params });
    }

    pub fn tuple(&mut self, elements: Vec<TypeHandle>) -> TypeHandle {
        return self.intern(Type::Tuple(elements));
    }

    pub fn init_list(&mut self, elements: Vec<TypeHandle>) -> TypeHandle {
        return self.intern(Type::InitList(elements));
    }

    /// Interns a structural type, returning the existing handle if this
    /// exact structure has been seen before.
    pub fn intern(&mut self, ty: Type) -> TypeHandle {
        if let Some(handle) = self.lookup.get(&ty) {
            return *handle;
        }
        let handle = TypeHandle(self.types.len() as u32);
        self.lookup.insert(ty.clone(), handle);
        self.types.push(ty);
        return handle;
    }

    pub fn get(&self, handle: TypeHandle) -> &Type {
        return &self.types[handle.0 as usize];
    }

    /// Implements `check_conversion` from spec §4.5, minus the lvalue rule
    /// (lvalue-ness is a node property, not part of the type, and is
    /// checked by the caller alongside this).
    pub fn convertible(&self, source: TypeHandle, target: TypeHandle) -> bool {
        if self.get(target).is_void() {
            return true;
        }
        if source == target {
            return true;
        }
        if let Type::InitList(children) = self.get(source).clone() {
            return self.init_list_convertible(&children, target);
        }
        if self.get(source) == &Type::Number && self.get(target) == &Type::String {
            return true;
        }
        return false;
    }

    fn init_list_convertible(&self, children: &[TypeHandle], target: TypeHandle) -> bool {
        return match self.get(target).clone() {
            Type::Array(element) => children.iter().all(|child| self.convertible(*child, element)),
            Type::Tuple(elements) => {
                elements.len() == children.len() && children.iter().zip(elements.iter()).all(|(child, element)| self.convertible(*child, *element))
            }
            _ => false,
        };
    }

    /// Human-readable rendering used in diagnostics.
    pub fn display(&self, handle: TypeHandle) -> String {
        return match self.get(handle).clone() {
            Type::Void => "void".to_string(),
            Type::Number => "number".to_string(),
            Type::String => "string".to_string(),
            Type::Array(element) => format!("{}[]", self.display(element)),
            Type::Function { ret, params } => {
                let params: Vec<String> = params.iter().map(|(p, by_ref)| format!("{}{}", self.display(*p), if *by_ref { "&" } else { "" })).collect();
                format!("{}({})", self.display(ret), params.join(", "))
            }
            Type::Tuple(elements) => format!("[{}]", elements.iter().map(|e| self.display(*e)).collect::<Vec<_>>().join(", ")),
            Type::InitList(elements) => format!("{{{}}}", elements.iter().map(|e| self.display(*e)).collect::<Vec<_>>().join(", ")),
        };
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        return Self::new();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interning_same_structure_yields_same_handle() {
        let mut registry = TypeRegistry::new();
        let a = registry.array(registry.number());
        let b = registry.array(registry.number());
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_structures_get_distinct_handles() {
        let mut registry = TypeRegistry::new();
        let numbers = registry.array(registry.number());
        let strings = registry.array(registry.string());
        assert_ne!(numbers, strings);
    }

    #[test]
    fn void_accepts_anything() {
        let mut registry = TypeRegistry::new();
        let numbers = registry.array(registry.number());
        assert!(registry.convertible(numbers, registry.void()));
    }

    #[test]
    fn number_converts_to_string_but_not_back() {
        let registry = TypeRegistry::new();
        assert!(registry.convertible(registry.number(), registry.string()));
        assert!(!registry.convertible(registry.string(), registry.number()));
    }

    #[test]
    fn init_list_converts_to_matching_array_and_tuple() {
        let mut registry = TypeRegistry::new();
        let list = registry.init_list(vec![registry.number(), registry.number()]);
        let array = registry.array(registry.number());
        assert!(registry.convertible(list, array));

        let list2 = registry.init_list(vec![registry.number(), registry.string()]);
        let tuple = registry.tuple(vec![registry.number(), registry.string()]);
        assert!(registry.convertible(list2, tuple));
        assert!(!registry.convertible(list2, array));
    }
}
