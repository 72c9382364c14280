//! Test utilities shared by the kumiki integration tests.
//!
//! Provides fake executors, on-disk project fixtures, an in-memory source
//! tree, and guards for serialising environment mutations.

pub mod env_lock;
pub mod env_var_guard;
pub mod executor;
pub mod project;
pub mod source_tree;

pub use executor::{ExecutorOverride, FakeExecutor, fake_executor, override_executor};
pub use project::Project;
pub use source_tree::MemorySourceTree;
