// # acme-hook-core
//
// Core library for the certbot DNS-01 hook.
//
// Two invocations of the hook binary cooperate through this crate:
// - create mode parses the validation domain ([`domain`]) and records the
//   ids of whatever it created ([`ledger`]);
// - delete mode replays the ledger to remove those records, then discards
//   the file.
//
// The provider HTTP client lives in its own crate (`acme-hook-onecloud`)
// and shares the [`error::Error`] type defined here.

pub mod domain;
pub mod error;
pub mod ledger;

// Re-export core types for convenience
pub use domain::ParsedDomain;
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerEntry};
