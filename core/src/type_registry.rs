//! Stable, process-wide numeric identity for every type that can flow
//! through a [`crate::value::ValueBox`]. Mirrors the original engine's
//! `TypeInfo`/`get_type_info<T>()`, but leans on `std::any::TypeId` instead
//! of `typeid()` for the underlying identity check, and a small lazily
//! populated table for the "unique small id" the rest of the engine keys
//! its lookup tables on.

use once_cell::sync::OnceCell;
use std::any::{self, TypeId as StdTypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// A small, process-stable identity for a Rust type that has been registered
/// with the engine (either one of the built-in numeric kinds, or a host
/// type passed through the `Host` escape hatch of [`crate::value::Value`]).
///
/// Ids are assigned lazily the first time a type is queried, and are stable
/// for the lifetime of the process (they are *not* stable across runs, and
/// must never be serialized).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// Looks up (or lazily assigns) the [`TypeId`] for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        id_for(StdTypeId::of::<T>(), any::type_name::<T>())
    }

    /// Human readable name of this type, for error messages. Falls back to
    /// `"<unknown>"` for an id that was somehow never registered (shouldn't
    /// happen in practice since ids are only ever minted by [`Self::of`]).
    pub fn name(self) -> &'static str {
        name_of(self)
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({}, {:?})", self.0, self.name())
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A type-pair hash, used as the key for the binary operator table and the
/// conversion table. Packs two bare type ids into one machine word, matching
/// the original's `get_type_pair_hash`.
pub type TypePairKey = u64;

/// Packs an ordered pair of type ids into a single lookup key.
pub fn type_pair_hash(lhs: TypeId, rhs: TypeId) -> TypePairKey {
    (u64::from(lhs.0) << 32) | u64::from(rhs.0)
}

// The registry data lives behind a single process-wide static so that
// `TypeId::of::<T>()` can be called from anywhere without threading an
// engine handle through. The lookup table only ever grows, so ids are
// stable for the life of the process.
#[derive(Default)]
struct RegistryInner {
    ids: HashMap<StdTypeId, u32>,
    names: Vec<&'static str>,
}

static STORAGE: OnceCell<Mutex<RegistryInner>> = OnceCell::new();

fn id_for(std_id: StdTypeId, name: &'static str) -> TypeId {
    let mut inner = STORAGE.get_or_init(Default::default).lock().unwrap();
    if let Some(&id) = inner.ids.get(&std_id) {
        return TypeId(id);
    }
    let id = inner.names.len() as u32;
    inner.ids.insert(std_id, id);
    inner.names.push(name);
    TypeId(id)
}

fn name_of(id: TypeId) -> &'static str {
    STORAGE
        .get_or_init(Default::default)
        .lock()
        .unwrap()
        .names
        .get(id.0 as usize)
        .copied()
        .unwrap_or("<unknown>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_same_id() {
        let a = TypeId::of::<i64>();
        let b = TypeId::of::<i64>();
        assert_eq!(a, b);
    }

    #[test]
    fn different_types_different_ids() {
        assert_ne!(TypeId::of::<i64>(), TypeId::of::<f64>());
    }

    #[test]
    fn pair_hash_is_ordered() {
        let a = TypeId::of::<bool>();
        let b = TypeId::of::<char>();
        assert_ne!(type_pair_hash(a, b), type_pair_hash(b, a));
    }

    #[test]
    fn name_is_stable() {
        let id = TypeId::of::<String>();
        assert_eq!(id.name(), any::type_name::<String>());
    }
}
