use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Resolves a binary class name (e.g. `java/lang/String`) to the bytes of
/// its `.class` file. External collaborator: the core pipeline never
/// reaches for the filesystem or network directly.
pub trait ClasspathLocator: Send + Sync {
    fn locate(&self, name: &str) -> Result<Vec<u8>, LocateError>;
}

#[derive(Debug)]
pub enum LocateError {
    NotFound { name: String },
    Io { name: String, source: std::io::Error },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "class {} not found on classpath", name),
            Self::Io { name, source } => {
                write!(f, "I/O error locating class {}: {}", name, source)
            }
        }
    }
}

impl std::error::Error for LocateError {}

/// Resolves classes from a list of filesystem roots, mirroring the
/// `-cp dir1:dir2` convention: `name` is joined onto each root in turn
/// with a `.class` suffix, and the first hit wins.
pub struct FsClasspathLocator {
    roots: Vec<PathBuf>,
}

impl FsClasspathLocator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl ClasspathLocator for FsClasspathLocator {
    fn locate(&self, name: &str) -> Result<Vec<u8>, LocateError> {
        for root in &self.roots {
            let path = root.join(format!("{}.class", name));
            match fs::read(&path) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(LocateError::Io {
                        name: name.to_string(),
                        source,
                    })
                }
            }
        }
        Err(LocateError::NotFound {
            name: name.to_string(),
        })
    }
}
