//!
//! Raw Reader, Class Parser, and Format Checker: turns a `.class` byte
//! stream into a validated `cs_model::ClassFile`.
#![allow(dead_code)]

mod error;
mod format_check;
mod parser;
mod reader;

#[cfg(test)]
mod test;

pub use error::{FormatError, FormatErrorKind, ParseError, ParseErrorKind};
pub use format_check::format_check;
pub use parser::parse_class_file;
pub use reader::RawReader;

use cs_model::{u1, ClassFile, LoaderConfig};

/// An error from either stage of the pipeline, for callers that don't need
/// to distinguish a parse failure from a format-check failure.
#[derive(Debug)]
pub enum LoadError {
    Parse(ParseError),
    Format(FormatError),
    /// A class could not be located at all, e.g. by a `ClasspathLocator`.
    Io { name: String, message: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{}", e),
            Self::Format(e) => write!(f, "{}", e),
            Self::Io { name, message } => write!(f, "could not load {}: {}", name, message),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<ParseError> for LoadError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<FormatError> for LoadError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

/// Runs the full pipeline: parse, then format-check. The returned
/// `ClassFile` is ready to hand to a `ClassRegistry`.
pub fn load_class_file(data: &[u1], config: &LoaderConfig) -> Result<ClassFile, LoadError> {
    let class = parse_class_file(data, config)?;
    format_check(&class, config)?;
    if config.trace_format_check {
        let pool = &class.constant_pool;
        let name = class.this_class.get(pool).name_index.get(pool);
        log::info!(
            "Class {} has been format-checked.",
            String::from_utf8_lossy(name)
        );
    }
    Ok(class)
}
