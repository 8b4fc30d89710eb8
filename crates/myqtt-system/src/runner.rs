//! Command specifications, captured outputs, and the real process runner.

use std::fmt::{self, Display, Formatter};
use std::process::Command;

use tracing::debug;

use crate::error::{SystemError, SystemResult};

/// A program invocation: the program name plus its arguments.
///
/// Arguments are passed to the OS verbatim; nothing is interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    /// Start a specification for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl Display for CommandSpec {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.program)?;
        for arg in &self.args {
            write!(formatter, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output carrying `stdout`.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and `stderr`.
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, Some(0))
    }

    /// Exit code, `-1` when the process died from a signal.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }

    /// Trimmed stdout and stderr joined for error reporting.
    #[must_use]
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}

/// Executes OS commands and returns their captured output.
pub trait CommandRunner: Send + Sync {
    /// Execute `spec` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Spawn`] only when the program cannot be started; a
    /// non-zero exit status is reported through [`CommandOutput::status`].
    fn run(&self, spec: &CommandSpec) -> SystemResult<CommandOutput>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    debug: bool,
}

impl ProcessRunner {
    /// Build a runner; with `debug` set every captured output is logged.
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> SystemResult<CommandOutput> {
        debug!(command = %spec, "executing command");
        let output = Command::new(spec.program())
            .args(spec.arguments())
            .output()
            .map_err(|source| SystemError::Spawn {
                command: spec.to_string(),
                source,
            })?;

        let captured = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if self.debug {
            debug!(
                command = %spec,
                status = captured.exit_code(),
                stdout = %captured.stdout.trim(),
                stderr = %captured.stderr.trim(),
                "command finished"
            );
        }
        Ok(captured)
    }
}

/// Run `spec` and turn a non-zero exit status into [`SystemError::CommandFailed`].
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or exits unsuccessfully.
pub fn run_checked(runner: &dyn CommandRunner, spec: &CommandSpec) -> SystemResult<CommandOutput> {
    let output = runner.run(spec)?;
    if output.is_success() {
        Ok(output)
    } else {
        Err(SystemError::CommandFailed {
            command: spec.to_string(),
            status: output.exit_code(),
            output: output.combined(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    struct FixedRunner(CommandOutput);

    impl CommandRunner for FixedRunner {
        fn run(&self, _spec: &CommandSpec) -> SystemResult<CommandOutput> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn spec_renders_program_and_arguments() {
        let spec = CommandSpec::new("service").args(["myqtt", "restart"]);
        assert_eq!(spec.to_string(), "service myqtt restart");
        assert_eq!(spec.program(), "service");
        assert_eq!(spec.arguments(), ["myqtt", "restart"]);
    }

    #[test]
    fn combined_output_skips_empty_streams() {
        assert_eq!(CommandOutput::success("  ok \n").combined(), "ok");
        assert_eq!(CommandOutput::failure(1, "boom\n").combined(), "boom");
        let both = CommandOutput {
            status: Some(2),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert_eq!(both.combined(), "out\nerr");
        assert_eq!(CommandOutput::default().exit_code(), -1);
    }

    #[test]
    fn run_checked_reports_exit_status() -> Result<()> {
        let ok = FixedRunner(CommandOutput::success("fine"));
        let output = run_checked(&ok, &CommandSpec::new("true"))?;
        assert_eq!(output.stdout, "fine");

        let failing = FixedRunner(CommandOutput::failure(4, "denied"));
        let err = run_checked(&failing, &CommandSpec::new("false").arg("-x"))
            .expect_err("non-zero exit must fail");
        match err {
            SystemError::CommandFailed {
                command,
                status,
                output,
            } => {
                assert_eq!(command, "false -x");
                assert_eq!(status, 4);
                assert_eq!(output, "denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_captures_real_output() -> Result<()> {
        let runner = ProcessRunner::new(true);
        let output = runner.run(&CommandSpec::new("sh").args(["-c", "echo hello; exit 3"]))?;
        assert_eq!(output.status, Some(3));
        assert_eq!(output.stdout.trim(), "hello");

        let missing = runner.run(&CommandSpec::new("/definitely/not/a/binary"));
        assert!(matches!(missing, Err(SystemError::Spawn { .. })));
        Ok(())
    }
}
