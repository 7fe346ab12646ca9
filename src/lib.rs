//! Architect ORM: change-tracked entities and a generic SQL mapper.

pub mod case;
pub mod config;
pub mod entity;
pub mod error;
pub mod port;
pub mod service;
pub mod sql;
pub mod store;
pub mod testing;

pub use case::{column_to_property, property_to_column};
pub use config::DbConfig;
pub use entity::{Entity, EntityDescriptor, EntityState, FieldDescriptor, FieldType};
pub use error::{OrmError, OrmResult};
pub use port::{ExecutionPort, Row, TABLE_PREFIX_PLACEHOLDER};
pub use service::{EntityFactory, Mapper};
pub use store::PgExecutionPort;
