//! Hides private data.

use super::base::{Proxy, ProxyFilter};
use crate::access::DbRead;
use crate::model::Record;

/// Filter of [`PrivateProxyDb`]: records flagged private are hidden and
/// private sub-objects are stripped from the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivateFilter;

impl ProxyFilter for PrivateFilter {
    fn include<T: Record>(&self, record: &T) -> bool {
        !record.is_private()
    }

    fn sanitize<T: Record>(&self, record: &mut T) {
        record.sanitize_private();
    }
}

/// A view of a database without private records or private details.
pub type PrivateProxyDb<D> = Proxy<D, PrivateFilter>;

impl<D: DbRead> PrivateProxyDb<D> {
    /// Hides the private data of `inner`.
    pub fn new(inner: D) -> Self {
        Self::with_filter(inner, PrivateFilter)
    }
}
