//!
//! External collaborators and concurrency for the class-loading pipeline:
//! where classes come from (`ClasspathLocator`), where they end up
//! (`ClassRegistry`), and the worker pool (`Fleet`) that drives many
//! independent loads at once.
#![allow(dead_code)]

mod fleet;
mod locator;
mod registry;

pub use fleet::{Fleet, LoadOutcome};
pub use locator::{ClasspathLocator, FsClasspathLocator, LocateError};
pub use registry::{ClassRegistry, InMemoryClassRegistry};

#[cfg(test)]
mod test;
