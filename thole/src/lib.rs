//! Thole-damped Coulomb interaction between core/Drude induced dipoles.

mod error;
mod pair;
mod table;
mod tally;

pub use error::*;
pub use pair::*;
pub use table::*;
pub use tally::*;
