//! Engine module: collaborators (catalog, blob store), hashing, paths, CLI plumbing.

pub mod arg_parser;
pub mod catalog;
pub mod handlers;
pub mod hashing;
pub mod progress;
pub mod store;
pub mod tools;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use catalog::{MetadataCatalog, SqliteCatalog, open_catalog};
pub use handlers::handle_run;
pub use hashing::{hash_file, hash_to_hex};
pub use store::{BlobMeta, BlobStore, LocalBlobStore, MemoryBlobStore, StoreCalls, open_store};
pub use tools::{
    compile_excludes, guess_content_type, is_excluded, path_relative_to, path_to_db_string,
    should_include_in_walk,
};
