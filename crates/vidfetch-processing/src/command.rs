//! Typed builder for yt-dlp invocations.
//!
//! Arguments are collected as an ordered list of flags and flag/value pairs,
//! with the source URL always appended last, so every invocation site is
//! explicit about what it passes and argument order stays auditable.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct YtDlpCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl YtDlpCommand {
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Append a bare flag, e.g. `--no-playlist`.
    pub fn flag(mut self, flag: &'static str) -> Self {
        self.args.push(OsString::from(flag));
        self
    }

    /// Append a flag with a value, e.g. `-f <expr>`.
    pub fn option(mut self, flag: &'static str, value: impl AsRef<OsStr>) -> Self {
        self.args.push(OsString::from(flag));
        self.args.push(value.as_ref().to_os_string());
        self
    }

    /// Append the source URL. Must be the last argument.
    pub fn url(mut self, url: &str) -> Self {
        self.args.push(OsString::from(url));
        self
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn build(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Render the invocation for operator logs, quoting arguments with spaces.
    pub fn to_log_string(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|arg| {
                let arg = arg.to_string_lossy();
                if arg.contains(' ') {
                    format!("\"{}\"", arg)
                } else {
                    arg.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
