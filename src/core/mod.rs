//! lomy - Core traits, types, and constants.
//!
//! This module provides the message transport abstraction shared by the
//! plain and encrypted transports, the error taxonomy, and the fixed
//! wire/crypto constants. It has no dependencies beyond `thiserror`.

mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::*;
pub use traits::*;
