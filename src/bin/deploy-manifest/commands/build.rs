//! `deploy-manifest build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use deploy_manifest::util::fs::ensure_dir;
use deploy_manifest::TargetRegistry;

use super::{open_project, plugin_for};

pub fn execute(args: BuildArgs) -> Result<()> {
    ensure_dir(&args.deploy)?;
    let (raw, mut host) = open_project(&args.settings, &args.root, &args.deploy, args.dev)?;

    let mut plugin = plugin_for(raw, &mut host)?;
    plugin.audit(&host)?;
    let result = plugin.exec(&mut host)?;

    for path in &result.unlinked {
        eprintln!("     Removed {}", path);
    }

    let output = &plugin.settings()?.output;
    eprintln!(
        "    Finished {} ({} refs)",
        host.deploy_path(output).display(),
        result.matrix.iter().map(|g| g.refs.len()).sum::<usize>()
    );

    Ok(())
}
