//! Secondary indices of a record table.
//!
//! - [`UniqueIndex`]: public id → handle, one handle per key.
//! - [`HashIndex`]: grouping key → handles (surname index).

mod hash;
mod traits;
mod unique;

pub use hash::HashIndex;
pub use traits::{Index, IndexKey};
pub use unique::UniqueIndex;
