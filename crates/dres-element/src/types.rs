//! Interned types.
//!
//! Every type is stored once in the [`TypeInterner`] and referred to by a
//! [`TypeId`]. The three intrinsic types have fixed ids so they can be used
//! as constants before any interning happens.

use crate::element::ElementId;
use dres_syntax::ParameterKind;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::cell::RefCell;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const DYNAMIC: TypeId = TypeId(0);
    pub const BOTTOM: TypeId = TypeId(1);
    pub const VOID: TypeId = TypeId(2);

    const FIRST_USER: u32 = 3;

    #[inline]
    pub fn is_dynamic(self) -> bool {
        self == TypeId::DYNAMIC
    }

    #[inline]
    pub fn is_bottom(self) -> bool {
        self == TypeId::BOTTOM
    }

    #[inline]
    pub fn is_void(self) -> bool {
        self == TypeId::VOID
    }
}

impl Default for TypeId {
    fn default() -> Self {
        TypeId::DYNAMIC
    }
}

/// One parameter of a function type. Positional parameters carry an empty
/// name; named parameters are identified by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionParam {
    pub kind: ParameterKind,
    pub name: String,
    pub ty: TypeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Dynamic,
    /// The type of `null`, a subtype of everything.
    Bottom,
    Void,
    Interface {
        element: ElementId,
        args: SmallVec<[TypeId; 2]>,
    },
    Function {
        /// Declaring executable or type alias, `NONE` for synthesized signatures.
        element: ElementId,
        params: SmallVec<[FunctionParam; 4]>,
        return_type: TypeId,
    },
    TypeParameter {
        element: ElementId,
    },
    /// Sorted, deduplicated, at least two members, none of them unions.
    Union(SmallVec<[TypeId; 4]>),
}

impl TypeData {
    pub fn is_interface(&self) -> bool {
        matches!(self, TypeData::Interface { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, TypeData::Function { .. })
    }
}

/// Type interning table.
///
/// Interning goes through a shared reference so that a resolver holding the
/// element model immutably can still build new types.
pub struct TypeInterner {
    types: RefCell<Vec<TypeData>>,
    ids: RefCell<FxHashMap<TypeData, TypeId>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInterner")
            .field("len", &self.len())
            .finish()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let intrinsics = vec![TypeData::Dynamic, TypeData::Bottom, TypeData::Void];
        let mut ids = FxHashMap::default();
        for (i, data) in intrinsics.iter().enumerate() {
            ids.insert(data.clone(), TypeId(i as u32));
        }
        debug_assert_eq!(intrinsics.len() as u32, TypeId::FIRST_USER);
        Self {
            types: RefCell::new(intrinsics),
            ids: RefCell::new(ids),
        }
    }

    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= TypeId::FIRST_USER as usize
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(&id) = self.ids.borrow().get(&data) {
            return id;
        }
        let mut types = self.types.borrow_mut();
        let id = TypeId(types.len() as u32);
        types.push(data.clone());
        self.ids.borrow_mut().insert(data, id);
        id
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.types.borrow().get(id.0 as usize).cloned()
    }

    pub fn interface(&self, element: ElementId, args: impl IntoIterator<Item = TypeId>) -> TypeId {
        self.intern(TypeData::Interface {
            element,
            args: args.into_iter().collect(),
        })
    }

    pub fn function(
        &self,
        element: ElementId,
        params: impl IntoIterator<Item = FunctionParam>,
        return_type: TypeId,
    ) -> TypeId {
        self.intern(TypeData::Function {
            element,
            params: params.into_iter().collect(),
            return_type,
        })
    }

    pub fn type_parameter(&self, element: ElementId) -> TypeId {
        self.intern(TypeData::TypeParameter { element })
    }

    /// Union of `members`, flattening nested unions. A single distinct
    /// member is returned as is.
    pub fn union(&self, members: impl IntoIterator<Item = TypeId>) -> TypeId {
        let mut flat: SmallVec<[TypeId; 4]> = SmallVec::new();
        for member in members {
            match self.lookup(member) {
                Some(TypeData::Union(inner)) => flat.extend(inner),
                _ => flat.push(member),
            }
        }
        flat.sort_unstable();
        flat.dedup();
        match flat.len() {
            0 => TypeId::DYNAMIC,
            1 => flat[0],
            _ => self.intern(TypeData::Union(flat)),
        }
    }

    /// Class element of an interface type.
    pub fn interface_element(&self, id: TypeId) -> Option<ElementId> {
        match self.lookup(id)? {
            TypeData::Interface { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn type_arguments(&self, id: TypeId) -> SmallVec<[TypeId; 2]> {
        match self.lookup(id) {
            Some(TypeData::Interface { args, .. }) => args,
            _ => SmallVec::new(),
        }
    }

    /// Return type of a function type.
    pub fn return_type(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id)? {
            TypeData::Function { return_type, .. } => Some(return_type),
            _ => None,
        }
    }

    pub fn union_members(&self, id: TypeId) -> Option<SmallVec<[TypeId; 4]>> {
        match self.lookup(id)? {
            TypeData::Union(members) => Some(members),
            _ => None,
        }
    }
}
