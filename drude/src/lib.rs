//! Core/Drude particle pairing.
//!
//! Atom types are classified as non-polarizable, core or Drude, and every
//! polarizable atom carries the tag of its bonded partner. The partner links
//! are discovered from the bond topology distributed over all processes and
//! then travel with their atoms through migration and ghost replication.

mod discovery;
mod error;
mod registry;
mod role;

pub use discovery::*;
pub use error::*;
pub use registry::*;
pub use role::*;
