//! Hierarchical category catalog ("parent roles" and their sub-options).
//!
//! The shared catalog is both the admin-maintained category tree and the
//! option source registration steps validate against.

pub mod import;
pub mod router;
mod shared;
pub mod tree;

pub use import::{CategoryImportError, CategoryImporter};
pub use router::category_router;
pub use shared::SharedCategoryCatalog;
pub use tree::{Category, CategoryError, CategoryId, CategoryTree, NewCategory, MAX_DEPTH};
