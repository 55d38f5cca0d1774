//! Domain models for the mapper.

mod entity;
mod model;
mod registry;
mod schema;

pub use entity::{Attributes, Entity, EntityId};
pub use model::{Model, ModelBuilder, ScopeFn, CREATED_AT, UPDATED_AT};
pub use registry::ModelRegistry;
pub use schema::{FieldDef, FieldKind, Rule, Schema, Violation};
