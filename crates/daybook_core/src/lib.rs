//! Persistence core for daybook: user-created tasks and notes behind a
//! single repository contract, backed interchangeably by a single-file
//! SQLite database or by a directory of markdown files with frontmatter
//! headers.

pub mod db;
pub mod frontmatter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod slug;

pub use frontmatter::{Frontmatter, FrontmatterError};
pub use logging::{default_log_level, init_logging};
pub use model::item::{AnyItem, Item, ItemType, Note, Status, Tag, Task, ValidationError};
pub use model::ordering::{group_by_tag, sort_items, TagGroup};
pub use repo::sqlite_repo::SqliteRepository;
pub use repo::vault_repo::VaultRepository;
pub use repo::{
    open_repository, Listing, RepoError, RepoResult, Repository, SkippedRecord, StoreConfig,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
