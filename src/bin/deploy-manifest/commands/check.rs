//! `deploy-manifest check` command

use anyhow::Result;

use crate::cli::CheckArgs;

use super::{open_project, plugin_for};

pub fn execute(args: CheckArgs) -> Result<()> {
    let (raw, mut host) = open_project(&args.settings, &args.root, &args.deploy, false)?;

    let mut plugin = plugin_for(raw, &mut host)?;
    let report = plugin.audit(&host)?;
    let settings = &report.settings;

    eprintln!(
        "     Checked {} manifest -> {} ({} target globs, {} ref groups)",
        settings.manifest.type_name(),
        settings.output,
        settings.targets.len(),
        settings.refs.len()
    );
    if report.template_out_of_date {
        eprintln!("    Outdated template changed since the last build");
    }

    Ok(())
}
