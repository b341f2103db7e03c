//! Built-in include handlers.
//!
//! - [`GitInclude`] (`!include`) fetches a repository and includes a
//!   navigation file from it
//! - [`LocalInclude`] (`%include`) includes a navigation file from the
//!   project itself

mod git;
mod local;
mod nav_file;

pub use git::{GitInclude, Locator};
pub use local::LocalInclude;
pub use nav_file::NAV_FILE_NAMES;
