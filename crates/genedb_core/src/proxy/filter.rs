//! Shows only chosen records.

use super::base::{Proxy, ProxyFilter};
use crate::access::DbRead;
use crate::model::{Handle, Person, Record};
use crate::types::EntityKind;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Which handles of one kind are visible.
#[derive(Clone, Default)]
pub enum HandleFilter {
    /// Everything.
    #[default]
    All,
    /// Only these handles.
    Only(HashSet<Handle>),
    /// Everything except these handles.
    Except(HashSet<Handle>),
    /// Handles the predicate accepts.
    Predicate(Arc<dyn Fn(Handle) -> bool + Send + Sync>),
}

impl HandleFilter {
    /// A filter from a closure.
    pub fn predicate<P>(predicate: P) -> Self
    where
        P: Fn(Handle) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Whether `handle` passes.
    #[must_use]
    pub fn allows(&self, handle: Handle) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(&handle),
            Self::Except(set) => !set.contains(&handle),
            Self::Predicate(p) => p(handle),
        }
    }
}

impl fmt::Debug for HandleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(set) => write!(f, "Only({} handles)", set.len()),
            Self::Except(set) => write!(f, "Except({} handles)", set.len()),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// One [`HandleFilter`] per kind; kinds without one show everything.
#[derive(Debug, Clone, Default)]
pub struct KindFilter {
    filters: HashMap<EntityKind, HandleFilter>,
}

impl KindFilter {
    /// Shows everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter of one kind.
    #[must_use]
    pub fn with(mut self, kind: EntityKind, filter: HandleFilter) -> Self {
        self.filters.insert(kind, filter);
        self
    }

    /// Filter of `kind`.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> &HandleFilter {
        static ALL: HandleFilter = HandleFilter::All;
        self.filters.get(&kind).unwrap_or(&ALL)
    }
}

impl ProxyFilter for KindFilter {
    fn include<T: Record>(&self, record: &T) -> bool {
        record.handle().is_some_and(|h| self.get(T::KIND).allows(h))
    }
}

/// A view of a database restricted to chosen handles.
pub type FilterProxyDb<D> = Proxy<D, KindFilter>;

impl<D: DbRead> FilterProxyDb<D> {
    /// Restricts `inner` with per-kind filters.
    pub fn new(inner: D, filters: KindFilter) -> Self {
        Self::with_filter(inner, filters)
    }

    /// Shows only `people` and the families they belong to, as parent or
    /// as child. Other kinds are unrestricted.
    pub fn for_people<I>(inner: D, people: I) -> Self
    where
        I: IntoIterator<Item = Handle>,
    {
        let people: HashSet<Handle> = people
            .into_iter()
            .filter(|h| inner.has_handle(EntityKind::Person, *h))
            .collect();
        let mut families = HashSet::new();
        for handle in &people {
            if let Ok(person) = inner.get_from_handle::<Person>(*handle) {
                families.extend(person.family_list);
                families.extend(person.parent_family_list);
            }
        }
        let filters = KindFilter::new()
            .with(EntityKind::Person, HandleFilter::Only(people))
            .with(EntityKind::Family, HandleFilter::Only(families));
        Self::with_filter(inner, filters)
    }
}
