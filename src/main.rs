mod cli;
mod settings;
mod view;
mod workflow;

use anyhow::Result;
use bedscan::logging;
use cli::{OutputFormat, parse_cli, print_json, print_plain};
use settings::ResolvedConfig;
use workflow::{SearchWorkflow, live_view_enabled};

fn main() -> Result<()> {
    let cli = parse_cli();
    let resolved = settings::load(&cli)?;

    // The live view owns the terminal; diagnostics stay quiet unless asked for.
    let fallback = live_view_enabled(resolved.view).then_some("off");
    logging::initialize(fallback);

    if cli.print_config {
        resolved.print_summary();
    }

    run_search(resolved)
}

/// Execute the search workflow and print output in the chosen format.
fn run_search(settings: ResolvedConfig) -> Result<()> {
    let format = settings.format;
    let workflow = SearchWorkflow::from_config(settings)?;
    let output = workflow.run()?;

    match format {
        OutputFormat::Plain => print_plain(&output),
        OutputFormat::Json => print_json(&output)?,
    }

    Ok(())
}
