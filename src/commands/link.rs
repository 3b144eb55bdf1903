use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    client::ClientKind,
    package::CandidatePackage,
    runtime::{Runtime, display_relative},
};

use super::{config::Config, load_candidates, load_index, output::print_block, show::show_linked};

/// Link every package in `packages_dir` that the project depends on.
#[tracing::instrument(skip(runtime, config))]
pub fn link<R: Runtime>(runtime: &R, config: &Config, packages_dir: Option<&Path>) -> Result<()> {
    let index = load_index(runtime, config)?;
    let candidates = load_candidates(runtime, config, packages_dir)?;

    let shared = index.shared_packages(&candidates);
    debug!("Linking {} packages", shared.len());
    if shared.is_empty() {
        println!("No shared dependencies found");
        return Ok(());
    }

    let shared_dirs: Vec<String> = shared
        .iter()
        .map(|pkg| display_relative(&pkg.dir, &config.project_dir))
        .collect();
    print_block("Linking", &shared_dirs);

    let to_link = index.linkable(&candidates);
    if to_link.is_empty() {
        println!("All shared dependencies are already linked.");
        show_linked(&index);
        return Ok(());
    }

    match config.client.kind {
        ClientKind::Npm => link_with_npm(runtime, config, &to_link)?,
        ClientKind::Yarn => link_with_yarn(runtime, config, &to_link)?,
    }
    Ok(())
}

/// `<client> link <dir>...` from the project directory.
fn link_with_npm<R: Runtime>(runtime: &R, config: &Config, pkgs: &[&CandidatePackage]) -> Result<()> {
    let mut args = vec!["link".to_string()];
    args.extend(pkgs.iter().map(|pkg| pkg.dir.display().to_string()));

    config.client.run(runtime, &args, &config.project_dir)?;
    println!("Successfully linked");
    Ok(())
}

/// Register each package with `yarn link`, then link them all into the project.
fn link_with_yarn<R: Runtime>(runtime: &R, config: &Config, pkgs: &[&CandidatePackage]) -> Result<()> {
    let register = vec!["link".to_string()];
    for pkg in pkgs {
        debug!(
            "Linking {} with \"{} link\" from {:?}",
            pkg.name, config.client, pkg.dir
        );
        config.client.run(runtime, &register, &pkg.dir)?;
    }

    let mut args = vec!["link".to_string()];
    args.extend(pkgs.iter().map(|pkg| pkg.name.clone()));
    config.client.run(runtime, &args, &config.project_dir)?;

    println!("Done linking modules with yarn.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CLIENT_ENV, Client};
    use crate::commands::config::ConfigOverrides;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{configure_mock_runtime_basics, test_project};
    use mockall::Sequence;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn packages_dir() -> PathBuf {
        test_project().parent().unwrap().join("mono/packages")
    }

    /// Project depends on `ui` and `core`; the package dir holds `ui`, `core` and `docs`.
    /// `ui` is already linked from the package dir.
    fn configure_workspace(runtime: &mut MockRuntime) {
        let project = test_project();
        let packages = packages_dir();

        runtime
            .expect_read_to_string()
            .with(eq(project.join("package.json")))
            .returning(|_| {
                Ok(r#"{"name":"app","dependencies":{"ui":"^1.0.0"},"devDependencies":{"core":"^2.0.0"}}"#.into())
            });

        // node_modules/ui is a symlink to the package dir; node_modules/core is installed
        let ui_store = project.join("node_modules/ui");
        let core_store = project.join("node_modules/core");
        runtime
            .expect_exists()
            .with(eq(ui_store.clone()))
            .returning(|_| true);
        runtime
            .expect_exists()
            .with(eq(core_store.clone()))
            .returning(|_| true);
        runtime
            .expect_is_symlink()
            .with(eq(ui_store.clone()))
            .returning(|_| true);
        runtime
            .expect_is_symlink()
            .with(eq(core_store))
            .returning(|_| false);
        let ui_target = packages.join("ui");
        runtime
            .expect_canonicalize()
            .with(eq(ui_store))
            .returning(move |_| Ok(ui_target.clone()));
        runtime
            .expect_canonicalize()
            .returning(|p| Ok(p.to_path_buf()));

        // Cache already knows ui lives outside the project
        runtime
            .expect_exists()
            .with(eq(project.join("node_modules/.cache/nlx.json")))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(project.join("node_modules/.cache/nlx.json")))
            .returning(|_| Ok(r#"{"lastUpdated":1,"cache":{"ui":true}}"#.into()));

        // Package dir listing
        runtime
            .expect_read_dir()
            .with(eq(packages.clone()))
            .returning(|p| Ok(vec![p.join("ui"), p.join("core"), p.join("docs")]));
        runtime.expect_is_dir().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(packages.join("ui/package.json")))
            .returning(|_| Ok(r#"{"name":"ui"}"#.into()));
        runtime
            .expect_read_to_string()
            .with(eq(packages.join("core/package.json")))
            .returning(|_| Ok(r#"{"name":"core"}"#.into()));
        runtime
            .expect_read_to_string()
            .with(eq(packages.join("docs/package.json")))
            .returning(|_| Ok(r#"{"name":"docs"}"#.into()));

        runtime.expect_exists().returning(|_| false);
    }

    #[test]
    fn test_link_with_npm_links_unlinked_shared_dirs() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);
        configure_workspace(&mut runtime);

        let core_dir = packages_dir().join("core").display().to_string();
        runtime
            .expect_run()
            .withf(move |program, args, cwd| {
                program == "npm" && args == ["link".to_string(), core_dir.clone()] && cwd == test_project()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        link(&runtime, &config, Some(Path::new("../mono/packages"))).unwrap();
    }

    #[test]
    fn test_link_with_yarn_registers_then_links() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(test_project()));
        runtime
            .expect_env_var()
            .with(eq(CLIENT_ENV))
            .returning(|_| Ok("yarn".into()));
        configure_workspace(&mut runtime);

        let mut seq = Sequence::new();
        let core_dir = packages_dir().join("core");
        runtime
            .expect_run()
            .withf(move |program, args, cwd| {
                program == "yarn" && args == ["link".to_string()] && cwd == core_dir
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        runtime
            .expect_run()
            .withf(|program, args, cwd| {
                program == "yarn"
                    && args == ["link".to_string(), "core".to_string()]
                    && cwd == test_project()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        assert_eq!(config.client, Client::new("yarn"));
        link(&runtime, &config, Some(Path::new("../mono/packages"))).unwrap();
    }

    #[test]
    fn test_link_client_failure_is_reported() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);
        configure_workspace(&mut runtime);
        runtime
            .expect_run()
            .returning(|_, _, _| Err(anyhow::anyhow!("\"npm link\" exited with status 1")));

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        let err = link(&runtime, &config, Some(Path::new("../mono/packages"))).unwrap_err();
        assert!(err.to_string().contains("exited with status 1"));
    }

    #[test]
    fn test_link_without_shared_dependencies_runs_nothing() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);
        let packages = packages_dir();

        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_read_to_string()
            .with(eq(test_project().join("package.json")))
            .returning(|_| Ok(r#"{"name":"app","dependencies":{"react":"*"}}"#.into()));
        runtime
            .expect_read_dir()
            .with(eq(packages.clone()))
            .returning(|p| Ok(vec![p.join("ui")]));
        runtime.expect_is_dir().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(packages.join("ui/package.json")))
            .returning(|_| Ok(r#"{"name":"ui"}"#.into()));
        runtime.expect_run().never();

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        link(&runtime, &config, Some(Path::new("../mono/packages"))).unwrap();
    }

    #[test]
    fn test_link_when_everything_is_linked_runs_nothing() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);
        let project = test_project();
        let packages = packages_dir();
        let ui_store = project.join("node_modules/ui");

        runtime
            .expect_read_to_string()
            .with(eq(project.join("package.json")))
            .returning(|_| Ok(r#"{"name":"app","dependencies":{"ui":"*"}}"#.into()));
        runtime
            .expect_exists()
            .with(eq(project.join("node_modules/.cache/nlx.json")))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(project.join("node_modules/.cache/nlx.json")))
            .returning(|_| Ok(r#"{"lastUpdated":1,"cache":{"ui":true}}"#.into()));
        runtime
            .expect_exists()
            .with(eq(ui_store.clone()))
            .returning(|_| true);
        runtime.expect_is_symlink().returning(|_| true);
        let ui_target = packages.join("ui");
        runtime
            .expect_canonicalize()
            .with(eq(ui_store))
            .returning(move |_| Ok(ui_target.clone()));
        runtime
            .expect_canonicalize()
            .returning(|p| Ok(p.to_path_buf()));
        runtime
            .expect_read_dir()
            .with(eq(packages.clone()))
            .returning(|p| Ok(vec![p.join("ui")]));
        runtime.expect_is_dir().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(packages.join("ui/package.json")))
            .returning(|_| Ok(r#"{"name":"ui"}"#.into()));
        runtime.expect_exists().returning(|_| false);
        runtime.expect_run().never();

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        link(&runtime, &config, Some(Path::new("../mono/packages"))).unwrap();
    }
}
