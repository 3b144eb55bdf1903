use anyhow::Result;
use std::path::Path;

use crate::{package::DependencyIndex, runtime::Runtime};

use super::{config::Config, load_candidates, load_index, output::print_block};

/// Which lists `show` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFilter {
    /// Shared dependencies, then linked dependencies.
    #[default]
    All,
    /// Only declared dependencies that are currently linked.
    LinkedOnly,
    /// Only dependencies shared between the project and the package directory.
    SharedOnly,
}

/// Show shared and/or linked dependencies.
#[tracing::instrument(skip(runtime, config))]
pub fn show<R: Runtime>(
    runtime: &R,
    config: &Config,
    packages_dir: Option<&Path>,
    filter: ShowFilter,
) -> Result<()> {
    let index = load_index(runtime, config)?;

    match filter {
        ShowFilter::LinkedOnly => show_linked(&index),
        ShowFilter::SharedOnly => {
            let candidates = load_candidates(runtime, config, packages_dir)?;
            show_shared(&index.shared_names(&candidates));
        }
        ShowFilter::All => {
            let candidates = load_candidates(runtime, config, packages_dir)?;
            show_shared(&index.shared_names(&candidates));
            show_linked(&index);
        }
    }
    Ok(())
}

fn show_shared(names: &[&str]) {
    if names.is_empty() {
        println!("No shared dependencies found");
    } else {
        print_block("Shared", names);
    }
}

pub(crate) fn show_linked(index: &DependencyIndex) {
    let linked = index.linked_names();
    if linked.is_empty() {
        println!("No linked dependencies found");
    } else {
        print_block("Linked", &linked);
    }
}
