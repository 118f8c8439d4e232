use thiserror::Error;

/// Failures surfaced by the command runner. Stage-level orchestration wraps
/// these with `anyhow` context.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required tool '{0}' not found in PATH. Please ensure it is installed.")]
    ToolMissing(String),

    #[error("Command '{program}' exited with status {status}\nStdout: {stdout}\nStderr: {stderr}")]
    Command {
        program: String,
        status: i32,
        stdout: String,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, AppError>;
