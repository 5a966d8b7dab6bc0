//! Typed resource handles and the owning handle-to-resource container.
//!
//! Every GPU-side object the renderer hands out is referred to through a
//! [`Handle`]: an opaque integer id tagged with a marker type so that, for
//! example, a render pass handle cannot be passed where a framebuffer handle
//! is expected. Handles are plain `Copy` values; ownership of the underlying
//! resource lives in a [`ResourceContainer`], and destroying a resource is
//! always an explicit call on its owner.
//!
//! Misuse of a handle (looking up a null or already-removed handle, removing
//! a handle twice) is a bug in the calling code, not a runtime condition, so
//! the container fails these with panics rather than `Result`s.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use static_assertions::const_assert_eq;

// A handle stays pointer-sized no matter what marker it carries.
const_assert_eq!(std::mem::size_of::<Handle<()>>(), 8);

/// Opaque typed reference to a resource stored in a [`ResourceContainer`].
///
/// The id `0` is reserved as the null handle; [`Handle::default`] returns it.
/// The marker type `M` only exists at the type level, so handles over
/// uninhabited marker enums work fine.
pub struct Handle<M> {
    id: u64,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Handle<M> {
    /// The null handle, referring to no resource.
    pub const NULL: Self = Self {
        id: 0,
        _marker: PhantomData,
    };

    pub(crate) fn from_id(id: u64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Check whether this is the null handle.
    pub fn is_null(&self) -> bool {
        self.id == 0
    }

    /// Get the raw integer id. Useful for logging; never for arithmetic.
    pub fn id(&self) -> u64 {
        self.id
    }
}

// Manual impls: derives would put bounds on the marker type.

impl<M> Clone for Handle<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Handle<M> {}

impl<M> PartialEq for Handle<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for Handle<M> {}

impl<M> Hash for Handle<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<M> Default for Handle<M> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<M> fmt::Debug for Handle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle({})", self.id)
        }
    }
}

/// Owning map from handle to resource.
///
/// `T` is the stored resource type; `M` is the marker type of the handles the
/// container hands out (defaults to `T`). Backends use the two-parameter form
/// to store their private per-resource state behind the shared handle types
/// of the renderer boundary.
///
/// Ids are allocated strictly increasing starting at 1 and are never reused
/// for the lifetime of the container, so a stale handle can never silently
/// alias a newer resource.
#[derive(Debug)]
pub struct ResourceContainer<T, M = T> {
    entries: HashMap<u64, T>,
    next_id: u64,
    _marker: PhantomData<fn() -> M>,
}

impl<T, M> ResourceContainer<T, M> {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
            _marker: PhantomData,
        }
    }

    /// Transfer ownership of `value` into the container, returning a fresh
    /// handle to it.
    pub fn add(&mut self, value: T) -> Handle<M> {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, value);
        Handle::from_id(id)
    }

    /// Emplace a default-constructed resource and return both a mutable
    /// reference to it and its handle.
    ///
    /// Useful when the resource needs its own handle to finish initializing.
    pub fn add_default(&mut self) -> (&mut T, Handle<M>)
    where
        T: Default,
    {
        let handle = self.add(T::default());
        let value = self
            .entries
            .get_mut(&handle.id)
            .expect("freshly inserted entry must exist");
        (value, handle)
    }

    /// Look up a resource.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or does not refer to a live entry.
    pub fn get(&self, handle: Handle<M>) -> &T {
        assert!(!handle.is_null(), "cannot look up the null handle");
        self.entries
            .get(&handle.id)
            .unwrap_or_else(|| panic!("no resource for {handle:?}"))
    }

    /// Look up a resource mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or does not refer to a live entry.
    pub fn get_mut(&mut self, handle: Handle<M>) -> &mut T {
        assert!(!handle.is_null(), "cannot look up the null handle");
        self.entries
            .get_mut(&handle.id)
            .unwrap_or_else(|| panic!("no resource for {handle:?}"))
    }

    /// Check whether a handle refers to a live entry.
    pub fn contains(&self, handle: Handle<M>) -> bool {
        !handle.is_null() && self.entries.contains_key(&handle.id)
    }

    /// Remove a resource, nulling the caller's handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or the entry was already removed.
    pub fn remove(&mut self, handle: &mut Handle<M>) -> T {
        assert!(!handle.is_null(), "cannot remove the null handle");
        let value = self
            .entries
            .remove(&handle.id)
            .unwrap_or_else(|| panic!("double remove of {handle:?}"));
        *handle = Handle::NULL;
        value
    }

    /// Remove a resource, invoking `cleanup` with the entry still addressable
    /// before it is erased.
    ///
    /// This is how backend teardown runs exactly once per resource: the
    /// functor destroys the native object while the bookkeeping entry still
    /// exists, then the entry goes away.
    pub fn remove_with(&mut self, handle: &mut Handle<M>, cleanup: impl FnOnce(&mut T)) {
        assert!(!handle.is_null(), "cannot remove the null handle");
        let value = self
            .entries
            .get_mut(&handle.id)
            .unwrap_or_else(|| panic!("double remove of {handle:?}"));
        cleanup(value);
        self.entries.remove(&handle.id);
        *handle = Handle::NULL;
    }

    /// Drain the whole container, invoking `cleanup` on every remaining
    /// entry. Used at full renderer teardown.
    pub fn clear_with(&mut self, mut cleanup: impl FnMut(&mut T)) {
        for value in self.entries.values_mut() {
            cleanup(value);
        }
        self.entries.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the container has no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T, M> Default for ResourceContainer<T, M> {
    fn default() -> Self {
        Self::new()
    }
}
