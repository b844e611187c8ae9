// src/schema/mod.rs
pub mod arrow;

pub use self::arrow::{build_arrow_schema, map_from_arrow_type, map_to_arrow_type};
