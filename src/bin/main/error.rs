use std::{fmt, io, path::PathBuf};

#[derive(Debug)]
pub(super) enum HostError {
    Io { path: PathBuf, source: io::Error },
    /// The book directory holds no readable chapter.
    EmptyBook(PathBuf),
    Script { line: usize, reason: ScriptErrorKind },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum ScriptErrorKind {
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
    UnknownKey(String),
}

impl HostError {
    pub(super) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Self::EmptyBook(path) => write!(f, "{}: no chapters found", path.display()),
            Self::Script { line, reason } => write!(f, "script line {}: {}", line, reason),
        }
    }
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(command) => write!(f, "unknown command {:?}", command),
            Self::MissingArgument(name) => write!(f, "missing {}", name),
            Self::InvalidNumber(value) => write!(f, "invalid number {:?}", value),
            Self::UnknownKey(key) => write!(f, "unknown key {:?}", key),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
