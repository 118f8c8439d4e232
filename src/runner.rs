// dbbackup/src/runner.rs
//! Subprocess abstraction so stages can be tested without spawning real tools.

use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;

use crate::errors::{AppError, Result};

/// Captured result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Turns a non-zero exit into an `AppError::Command` carrying the captured output.
    pub fn require_success(self, program: &str) -> Result<CommandOutput> {
        if self.success() {
            Ok(self)
        } else {
            Err(AppError::Command {
                program: program.to_string(),
                status: self.status,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

pub trait CommandRunner {
    /// Locates `program` on the execution PATH.
    fn resolve(&self, program: &str) -> Result<PathBuf>;

    /// Runs `program` with `args`, injecting `env` into the child environment,
    /// and waits for it to exit.
    fn execute(
        &self,
        program: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput>;
}

/// Production runner backed by `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn resolve(&self, program: &str) -> Result<PathBuf> {
        which(program).map_err(|_| AppError::ToolMissing(program.to_string()))
    }

    fn execute(
        &self,
        program: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        let output = cmd.output()?;
        Ok(CommandOutput {
            // -1 when the child was killed by a signal
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet, VecDeque};

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub program: String,
        pub args: Vec<String>,
        pub env: Vec<(String, String)>,
    }

    type Hook = Box<dyn Fn(&RecordedCall)>;

    /// Fake runner that records every invocation and replays scripted outputs.
    /// Unscripted programs resolve successfully and exit zero with empty output.
    #[derive(Default)]
    pub struct RecordingRunner {
        missing: HashSet<String>,
        responses: RefCell<HashMap<String, VecDeque<CommandOutput>>>,
        hooks: RefCell<HashMap<String, Hook>>,
        pub calls: RefCell<Vec<RecordedCall>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes `resolve(program)` fail with `ToolMissing`.
        pub fn mark_missing(mut self, program: &str) -> Self {
            self.missing.insert(program.to_string());
            self
        }

        /// Queues the next output returned when `program` is executed.
        pub fn script(&self, program: &str, output: CommandOutput) {
            self.responses
                .borrow_mut()
                .entry(program.to_string())
                .or_default()
                .push_back(output);
        }

        /// Runs `hook` on every execution of `program` (e.g. to fake the files
        /// a real tool would have written).
        pub fn on_execute(&self, program: &str, hook: impl Fn(&RecordedCall) + 'static) {
            self.hooks
                .borrow_mut()
                .insert(program.to_string(), Box::new(hook));
        }

        pub fn calls_for(&self, program: &str) -> Vec<RecordedCall> {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c.program == program)
                .cloned()
                .collect()
        }

        pub fn exit_ok() -> CommandOutput {
            CommandOutput {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
            }
        }

        pub fn exit_err(status: i32, stderr: &str) -> CommandOutput {
            CommandOutput {
                status,
                stdout: String::new(),
                stderr: stderr.to_string(),
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn resolve(&self, program: &str) -> Result<PathBuf> {
            if self.missing.contains(program) {
                Err(AppError::ToolMissing(program.to_string()))
            } else {
                Ok(PathBuf::from(program))
            }
        }

        fn execute(
            &self,
            program: &Path,
            args: &[&str],
            env: &[(&str, &str)],
        ) -> Result<CommandOutput> {
            let name = program
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let call = RecordedCall {
                program: name.clone(),
                args: args.iter().map(|a| a.to_string()).collect(),
                env: env
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            if let Some(hook) = self.hooks.borrow().get(&name) {
                hook(&call);
            }
            self.calls.borrow_mut().push(call);
            let scripted = self
                .responses
                .borrow_mut()
                .get_mut(&name)
                .and_then(|queue| queue.pop_front());
            Ok(scripted.unwrap_or_else(Self::exit_ok))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn require_success_passes_zero_exit() {
            let out = RecordingRunner::exit_ok();
            assert!(out.require_success("tool").is_ok());
        }

        #[test]
        fn require_success_surfaces_stderr() {
            let out = RecordingRunner::exit_err(2, "boom");
            let err = out.require_success("tool").unwrap_err();
            match err {
                AppError::Command { program, status, stderr, .. } => {
                    assert_eq!(program, "tool");
                    assert_eq!(status, 2);
                    assert_eq!(stderr, "boom");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn missing_tool_fails_resolution() {
            let runner = RecordingRunner::new().mark_missing("pg_dump");
            assert!(matches!(
                runner.resolve("pg_dump"),
                Err(AppError::ToolMissing(_))
            ));
            assert!(runner.resolve("mc").is_ok());
        }

        #[test]
        fn scripted_outputs_replay_in_order() {
            let runner = RecordingRunner::new();
            runner.script("mc", RecordingRunner::exit_err(1, "first"));
            runner.script("mc", RecordingRunner::exit_ok());
            let first = runner.execute(Path::new("mc"), &["mb"], &[]).unwrap();
            let second = runner.execute(Path::new("mc"), &["cp"], &[]).unwrap();
            assert_eq!(first.status, 1);
            assert_eq!(second.status, 0);
            assert_eq!(runner.calls_for("mc").len(), 2);
        }
    }
}
