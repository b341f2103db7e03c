//! Merge stage for resolved ultirepo navigation.
//!
//! After navigation resolution every include has a
//! [`Provenance`](ultirepo_nav::Provenance) record naming the directory its
//! pages live in. [`Merger`] copies the host site's docs directory and each
//! of those directories into one destination tree that MkDocs can build
//! from:
//!
//! ```text
//! .ultirepo/docs/
//! ├── index.md            <- host docs_dir
//! └── guide/
//!     ├── intro.md        <- <cache>/guide/site/intro.md
//!     └── usage.md
//! ```
//!
//! Navigation files (`nav.yml`, `nav.yaml`) and hidden entries are never
//! copied. When two sources provide the same destination path the first one
//! wins and the collision is reported in [`MergeReport::duplicates`].

mod error;
mod merger;

pub use error::MergeError;
pub use merger::{DuplicateFile, MERGE_MARKER, MergeReport, Merger};
