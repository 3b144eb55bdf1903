//! Subprocess execution for the package manager client.

use anyhow::{Context, Result, bail};
use log::debug;
use std::path::Path;
use std::process::{Command, Stdio};

use super::RealRuntime;

/// Render a command line for messages and logs.
pub(crate) fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn run_impl(&self, program: &str, args: &[String], cwd: &Path) -> Result<()> {
        let line = command_line(program, args);
        debug!("Running \"{}\" in {:?}", line, cwd);

        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to start \"{}\"", line))?;

        if !status.success() {
            match status.code() {
                Some(code) => bail!("\"{}\" exited with status {}", line, code),
                None => bail!("\"{}\" was terminated by a signal", line),
            }
        }
        Ok(())
    }
}
