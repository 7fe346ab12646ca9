//! Statement text and bind values: identifiers from entity descriptors only, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
