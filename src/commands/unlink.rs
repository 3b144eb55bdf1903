use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::runtime::Runtime;

use super::{config::Config, load_candidates, load_index, output::print_block};

/// Unlink the shared dependencies that are currently linked, then reinstall.
#[tracing::instrument(skip(runtime, config))]
pub fn unlink<R: Runtime>(
    runtime: &R,
    config: &Config,
    packages_dir: Option<&Path>,
    reinstall: bool,
) -> Result<()> {
    let index = load_index(runtime, config)?;
    let candidates = load_candidates(runtime, config, packages_dir)?;

    let linked = index.unlinkable(&candidates);
    if linked.is_empty() {
        println!("No shared linked dependencies found");
        return Ok(());
    }

    debug!("Unlinking {} packages", linked.len());
    print_block("Unlinking", &linked);

    let mut args = vec!["unlink".to_string()];
    args.extend(linked.iter().map(|name| name.to_string()));
    config.client.run(runtime, &args, &config.project_dir)?;

    if config.client.is_yarn() {
        println!("Done unlinking packages with yarn.");
    } else {
        println!("Done unlinking packages.");
    }

    if !reinstall {
        debug!("Skipping reinstall");
        return Ok(());
    }

    println!(
        "Reinstalling for your convenience. You can cancel if needed and reinstall or re-link."
    );
    config
        .client
        .run(runtime, &config.client.reinstall_args(), &config.project_dir)
}
