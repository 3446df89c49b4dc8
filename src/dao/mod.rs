/// Match archive storage and retrieval operations.
pub mod archive;
/// Persisted model definitions.
pub mod models;
/// Storage abstraction layer shared by archive backends.
pub mod storage;
