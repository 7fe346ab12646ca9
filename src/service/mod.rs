//! Mapper: generic CRUD over an execution port using the safe SQL builder.

mod mapper;
pub use mapper::{EntityFactory, Mapper};
