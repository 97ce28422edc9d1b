//! Category lookup abstractions and concrete catalog adapters.

pub mod google_books;

use crate::protocol::LookupOutcome;

/// Interface implemented by concrete catalog adapters.
///
/// One call is one remote query; implementations do not cache or retry.
pub trait CategoryLookup {
    fn lookup(&self, identifier: &str) -> LookupOutcome;
}
