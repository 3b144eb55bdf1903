//! The external package manager that performs the actual linking.

use anyhow::Result;
use log::info;
use std::fmt;
use std::path::Path;

use crate::runtime::Runtime;

/// Environment variable naming the client program to use.
pub const CLIENT_ENV: &str = "NLX_NPM_CLIENT";

const YARN_LOCK: &str = "yarn.lock";

/// How the client expects `link` to be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// `<client> link <dir>...` from the project.
    Npm,
    /// `yarn link` in each package, then `yarn link <name>...` from the project.
    Yarn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub program: String,
    pub kind: ClientKind,
}

impl Client {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let is_yarn = Path::new(&program)
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case("yarn"));
        let kind = if is_yarn { ClientKind::Yarn } else { ClientKind::Npm };
        Self { program, kind }
    }

    /// Pick the client for `project_dir`: the env override, else yarn when a
    /// `yarn.lock` is present, else npm.
    #[tracing::instrument(skip(runtime))]
    pub fn detect<R: Runtime>(runtime: &R, project_dir: &Path) -> Self {
        if let Ok(program) = runtime.env_var(CLIENT_ENV) {
            let program = program.trim();
            if !program.is_empty() {
                let client = Client::new(program);
                info!("Using {} for operations (from {})", client, CLIENT_ENV);
                return client;
            }
        }

        let client = if runtime.exists(&project_dir.join(YARN_LOCK)) {
            info!("yarn.lock file detected :: using yarn as npm client for reinstalls");
            Client::new("yarn")
        } else {
            Client::new("npm")
        };
        info!(
            "Using {} for operations. You can override this by setting an env var of {} as \"npm\" or \"yarn\".",
            client, CLIENT_ENV
        );
        client
    }

    pub fn is_yarn(&self) -> bool {
        self.kind == ClientKind::Yarn
    }

    /// Arguments restoring installed copies after an unlink.
    pub fn reinstall_args(&self) -> Vec<String> {
        match self.kind {
            ClientKind::Yarn => vec!["--ignore-scripts".into(), "--force".into()],
            ClientKind::Npm => vec!["install".into()],
        }
    }

    /// Run `<client> <args>` in `cwd`.
    pub fn run<R: Runtime>(&self, runtime: &R, args: &[String], cwd: &Path) -> Result<()> {
        runtime.run(&self.program, args, cwd)
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)
    }
}
