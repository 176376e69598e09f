use anyhow::Result;
use bedscan::{Coordinate, SearchRequest, SearchStatus};
use serde_json::json;

/// Everything printed once the search has finished.
#[derive(Debug, Clone)]
pub(crate) struct SearchOutput {
    pub(crate) request: SearchRequest,
    pub(crate) status: SearchStatus,
    pub(crate) results: Vec<Coordinate>,
}

/// Print one `(x, y, z)` line per result, nearest first.
pub(crate) fn print_plain(output: &SearchOutput) {
    for coordinate in &output.results {
        println!("{coordinate}");
    }
}

/// Format the search output as a JSON string.
pub(crate) fn format_output_json(output: &SearchOutput) -> Result<String> {
    let results: Vec<_> = output
        .results
        .iter()
        .map(|c| json!({ "x": c.x(), "y": c.y(), "z": c.z() }))
        .collect();

    let payload = json!({
        "seed": output.request.seed,
        "floor": output.request.floor,
        "from": output.request.min,
        "to": output.request.max,
        "status": output.status,
        "results": results,
    });

    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Print the JSON representation of the search output.
pub(crate) fn print_json(output: &SearchOutput) -> Result<()> {
    println!("{}", format_output_json(output)?);
    Ok(())
}
