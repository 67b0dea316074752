pub mod cleaned_store;

pub use cleaned_store::{InMemoryCleanedStore, NdjsonCleanedStore};
