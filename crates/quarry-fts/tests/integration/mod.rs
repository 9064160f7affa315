mod backend_contract;
mod loader;
mod properties;
mod rebuild;
#[cfg(feature = "fts-tantivy")]
mod tantivy_backend;
