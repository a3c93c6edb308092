//! Schema references, summaries and hash-shared content.
mod schema_store;

pub use schema_store::SchemaContent;
pub use schema_store::SchemaPut;
pub use schema_store::SchemaRef;
pub use schema_store::SchemaStore;

#[cfg(test)]
mod schema_store_test;
