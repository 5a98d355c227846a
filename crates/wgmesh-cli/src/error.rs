//! CLI error types.

use std::fmt;

use wgmesh_config::ConfigError;
use wgmesh_tools::ToolError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// A config was malformed or lacked required state.
    Config(ConfigError),
    /// A tool, file or network operation failed.
    Tool(ToolError),
    /// Invalid argument or definition file content.
    InvalidArgument(String),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Tool(e) => write!(f, "{e}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Tool(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ToolError> for CliError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Config(e) => Self::Config(e),
            other => Self::Tool(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_print_verbatim() {
        let err = CliError::from(ConfigError::no_valid_interface(
            "no [Interface] section found",
            "",
        ));
        assert_eq!(err.to_string(), "no valid interface: no [Interface] section found");
    }

    #[test]
    fn tool_config_errors_are_unwrapped() {
        let err = CliError::from(ToolError::from(ConfigError::precondition("no public key")));
        assert!(matches!(err, CliError::Config(ConfigError::Precondition(_))));
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
        assert_eq!(cli_err.to_string(), "IO error: file not found");
    }
}
