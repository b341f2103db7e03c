//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod resolve;
mod site;

pub(crate) use build::BuildArgs;
pub(crate) use resolve::ResolveArgs;
