#![forbid(unsafe_code)]

//! Environment constants shared by the kumiki library, its tests, and the
//! test helpers.

/// Environment variable override for the build executor program.
///
/// # Examples
///
/// ```
/// use executor_env::EXECUTOR_ENV;
/// assert_eq!(EXECUTOR_ENV, "KUMIKI_BUILD_TOOL");
/// ```
pub const EXECUTOR_ENV: &str = "KUMIKI_BUILD_TOOL";

/// Executor invoked when [`EXECUTOR_ENV`] is unset.
pub const DEFAULT_EXECUTOR: &str = "swift-build-tool";
