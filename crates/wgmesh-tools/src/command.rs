//! Running the WireGuard command line tools.
//!
//! `SafeCommand` only runs programs from a fixed allowlist, passes
//! arguments directly without a shell, and rejects arguments that contain
//! control characters. Input such as a private key goes over stdin, never
//! on the command line.

use std::fmt;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// Programs that may be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowedProgram {
    /// `wg`, for keys and version checks.
    Wg,
    /// `wg-quick`, for bringing interfaces up and down.
    WgQuick,
}

impl AllowedProgram {
    /// Default program name looked up on `PATH`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wg => "wg",
            Self::WgQuick => "wg-quick",
        }
    }
}

impl fmt::Display for AllowedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from building or running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An argument or program path was rejected before running anything.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// Which input was rejected.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The program could not be started.
    #[error("failed to run '{command}': {message}")]
    ExecutionFailed {
        /// The command line that was attempted.
        command: String,
        /// Description of the failure.
        message: String,
    },

    /// The command returned a non-zero exit code.
    #[error("command '{command}' exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        /// The command that was executed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// An I/O error occurred while talking to the child process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Creates an `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a non-zero exit error.
    #[must_use]
    pub fn non_zero_exit(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Returns `true` if the program was not found on the system.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

const FORBIDDEN_CHARS: &[char] = &['\0', '\n', '\r'];

/// Validates a command argument.
///
/// # Errors
///
/// Returns an error if the argument contains a null byte or line break.
pub fn validate_argument(arg: &str, field: &str) -> Result<(), CommandError> {
    match arg.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        Some(c) => Err(CommandError::invalid_argument(
            field,
            format!("forbidden character {c:?}"),
        )),
        None => Ok(()),
    }
}

/// Validates a program path override.
///
/// # Errors
///
/// Returns an error for empty paths, `..` components or shell
/// metacharacters.
pub fn validate_program_path(path: &str) -> Result<(), CommandError> {
    if path.is_empty() {
        return Err(CommandError::invalid_argument("program path", "empty"));
    }
    if path.contains("..") {
        return Err(CommandError::invalid_argument(
            "program path",
            "path traversal '..'",
        ));
    }
    if let Some(c) = path
        .chars()
        .find(|c| FORBIDDEN_CHARS.contains(c) || matches!(c, ';' | '&' | '|' | '$' | '`'))
    {
        return Err(CommandError::invalid_argument(
            "program path",
            format!("forbidden character {c:?}"),
        ));
    }
    Ok(())
}

/// Output from a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
    /// Exit status code, `-1` when killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Stdout as UTF-8, replacing invalid characters.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr as UTF-8, replacing invalid characters.
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// `true` when the exit code is 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A validated command builder.
#[derive(Debug)]
pub struct SafeCommand {
    program: AllowedProgram,
    program_path: Option<String>,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
    validation_errors: Vec<CommandError>,
}

impl SafeCommand {
    /// Creates a command for an allowed program.
    #[must_use]
    pub fn new(program: AllowedProgram) -> Self {
        Self {
            program,
            program_path: None,
            args: Vec::new(),
            stdin: None,
            validation_errors: Vec::new(),
        }
    }

    /// Runs the program from `path` instead of looking it up on `PATH`.
    #[must_use]
    pub fn with_program_path(mut self, path: &str) -> Self {
        match validate_program_path(path) {
            Ok(()) => self.program_path = Some(path.to_string()),
            Err(e) => self.validation_errors.push(e),
        }
        self
    }

    /// Applies an optional program path override.
    #[must_use]
    pub fn with_program_path_opt(self, path: Option<&str>) -> Self {
        match path {
            Some(path) => self.with_program_path(path),
            None => self,
        }
    }

    /// Adds an argument.
    #[must_use]
    pub fn arg(mut self, arg: &str) -> Self {
        match validate_argument(arg, "argument") {
            Ok(()) => self.args.push(arg.to_string()),
            Err(e) => self.validation_errors.push(e),
        }
        self
    }

    /// Adds several arguments.
    #[must_use]
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg.as_ref()))
    }

    /// Feeds `input` to the program's stdin.
    #[must_use]
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Returns `true` if any input was rejected.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.validation_errors.is_empty()
    }

    /// The rejected inputs.
    #[must_use]
    pub fn errors(&self) -> &[CommandError] {
        &self.validation_errors
    }

    fn program(&self) -> &str {
        self.program_path.as_deref().unwrap_or(self.program.as_str())
    }

    fn command_description(&self) -> String {
        let mut desc = self.program().to_string();
        for arg in &self.args {
            desc.push(' ');
            desc.push_str(arg);
        }
        desc
    }

    /// Runs the command and fails on a non-zero exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if validation failed, the program could not be
    /// started, or it exited unsuccessfully.
    pub async fn execute(self) -> Result<CommandOutput, CommandError> {
        let description = self.command_description();
        let output = self.execute_unchecked().await?;
        if !output.success() {
            return Err(CommandError::non_zero_exit(
                description,
                output.exit_code,
                output.stderr_lossy().trim(),
            ));
        }
        Ok(output)
    }

    /// Runs the command and returns its output whatever the exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if validation failed or the program could not be
    /// started.
    pub async fn execute_unchecked(self) -> Result<CommandOutput, CommandError> {
        let description = self.command_description();
        let Self {
            program,
            program_path,
            args,
            stdin,
            validation_errors,
        } = self;

        if let Some(error) = validation_errors.into_iter().next() {
            return Err(error);
        }

        let program = program_path.as_deref().unwrap_or(program.as_str());
        debug!(command = %description, "running command");

        let mut cmd = TokioCommand::new(program);
        cmd.args(&args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        if let Some(input) = stdin {
            let mut pipe = child.stdin.take().ok_or_else(|| CommandError::ExecutionFailed {
                command: description.clone(),
                message: "stdin was not captured".to_string(),
            })?;
            pipe.write_all(&input).await?;
            drop(pipe);
        }

        let output = child.wait_with_output().await?;
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(command = %description, exit_code, "command finished");

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }
}
