use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail, ensure};
use bedscan::engine::native::is_engine_library;
use bedscan::engine::scan::{DEFAULT_COLUMNS_PER_STEP, DEFAULT_DENSITY};
use bedscan::{DEFAULT_LAYER, Floor, ScanTuning, SearchRequest, app_dirs, parse_seed};
use serde::Deserialize;

use crate::cli::{CliArgs, OutputFormat};

use super::resolved::{EngineChoice, ResolvedConfig};

pub(super) const DEFAULT_RANGE: i32 = 256;

/// Mirror of the configuration file representation before CLI overrides and
/// validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawConfig {
    search: SearchSection,
    engine: EngineSection,
    output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SearchSection {
    /// Kept as text so hexadecimal and full-width unsigned seeds survive.
    seed: Option<String>,
    range: Option<i32>,
    layer: Option<i32>,
    floor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EngineSection {
    kind: Option<String>,
    library: Option<PathBuf>,
    columns_per_step: Option<usize>,
    density: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct OutputSection {
    format: Option<String>,
    view: Option<bool>,
}

impl RawConfig {
    /// Apply CLI overrides on top of the raw configuration values.
    pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(seed) = cli.seed.clone() {
            self.search.seed = Some(seed);
        }
        if let Some(range) = cli.range {
            self.search.range = Some(range);
        }
        if let Some(layer) = cli.layer {
            self.search.layer = Some(layer);
        }
        if let Some(floor) = cli.floor {
            self.search.floor = Some(Floor::from(floor).as_str().to_string());
        }

        if let Some(kind) = cli.engine {
            self.engine.kind = Some(kind.as_str().to_string());
        }
        if let Some(library) = cli.library.clone() {
            self.engine.library = Some(library);
        }
        if let Some(columns) = cli.columns_per_step {
            self.engine.columns_per_step = Some(columns);
        }
        if let Some(density) = cli.density {
            self.engine.density = Some(density);
        }

        if let Some(format) = cli.output {
            self.output.format = Some(format.as_str().to_string());
        }
        if cli.no_view {
            self.output.view = Some(false);
        } else if let Some(view) = cli.view {
            self.output.view = Some(view);
        }
    }

    /// Validate the merged values into the configuration the binary runs with.
    pub(super) fn resolve(self) -> Result<ResolvedConfig> {
        let seed_text = self
            .search
            .seed
            .ok_or_else(|| anyhow!("no seed configured; pass --seed or set search.seed"))?;
        let seed = parse_seed(&seed_text).with_context(|| format!("invalid seed '{seed_text}'"))?;

        let floor = match self.search.floor {
            Some(text) => text.parse::<Floor>()?,
            None => Floor::default(),
        };
        let range = self.search.range.unwrap_or(DEFAULT_RANGE);
        let layer = self.search.layer.unwrap_or(DEFAULT_LAYER);
        let request = SearchRequest::symmetric(seed, floor, range, layer)?;

        let engine = resolve_engine(self.engine)?;

        let format = match self.output.format.as_deref().map(str::trim) {
            None | Some("plain") => OutputFormat::Plain,
            Some("json") => OutputFormat::Json,
            Some(other) => bail!("unknown output format '{other}' (expected plain or json)"),
        };

        Ok(ResolvedConfig {
            seed_text,
            request,
            range,
            engine,
            format,
            view: self.output.view,
        })
    }
}

fn resolve_engine(section: EngineSection) -> Result<EngineChoice> {
    let kind = match section.kind.as_deref().map(str::trim) {
        Some(kind) => kind.to_ascii_lowercase(),
        None if section.library.is_some() => "native".to_string(),
        None => "scan".to_string(),
    };

    match kind.as_str() {
        "scan" => {
            let columns_per_step = section.columns_per_step.unwrap_or(DEFAULT_COLUMNS_PER_STEP);
            ensure!(columns_per_step > 0, "engine.columns_per_step must be at least 1");
            let density = section.density.unwrap_or(DEFAULT_DENSITY);
            ensure!(
                density.is_finite() && (0.0..=1.0).contains(&density),
                "engine.density must be between 0 and 1 (got {density})"
            );
            Ok(EngineChoice::Scan(ScanTuning {
                columns_per_step,
                density,
            }))
        }
        "native" => {
            let library = section
                .library
                .ok_or_else(|| anyhow!("the native engine needs engine.library or --library"))?;
            ensure!(
                is_engine_library(&library),
                "engine library {} is not a shared library (.so, .dylib or .dll)",
                library.display()
            );
            Ok(EngineChoice::Native(locate_library(library)))
        }
        other => bail!("unknown engine '{other}' (expected scan or native)"),
    }
}

/// Bare file names are looked up in the engine directory; anything with a
/// directory component is used as given.
fn locate_library(library: PathBuf) -> PathBuf {
    let bare = library.parent().is_none_or(|parent| parent.as_os_str().is_empty());
    if !bare || library.exists() {
        return library;
    }
    match app_dirs::get_engines_dir() {
        Ok(dir) => dir.join(library),
        Err(_) => library,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedscan::Coordinate;
    use clap::Parser;

    fn raw_with_seed(seed: &str) -> RawConfig {
        let mut raw = RawConfig::default();
        raw.search.seed = Some(seed.to_string());
        raw
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let cli = CliArgs::parse_from([
            "bedscan",
            "--seed",
            "42",
            "--range",
            "8",
            "--floor",
            "nether-floor",
            "--engine",
            "scan",
            "--density",
            "0.5",
            "--output",
            "json",
            "--no-view",
        ]);

        let mut config = raw_with_seed("7");
        config.search.range = Some(100);
        config.output.view = Some(true);
        config.apply_cli_overrides(&cli);

        assert_eq!(config.search.seed.as_deref(), Some("42"));
        assert_eq!(config.search.range, Some(8));
        assert_eq!(config.search.floor.as_deref(), Some("nether-floor"));
        assert_eq!(config.engine.kind.as_deref(), Some("scan"));
        assert_eq!(config.engine.density, Some(0.5));
        assert_eq!(config.output.format.as_deref(), Some("json"));
        assert_eq!(config.output.view, Some(false));
    }

    #[test]
    fn defaults_produce_a_symmetric_overworld_request() {
        let resolved = raw_with_seed("-12").resolve().expect("resolves");

        assert_eq!(resolved.request.seed, -12);
        assert_eq!(resolved.request.floor, Floor::Overworld);
        assert_eq!(
            resolved.request.min,
            Coordinate::new(-DEFAULT_RANGE, DEFAULT_LAYER, -DEFAULT_RANGE)
        );
        assert_eq!(
            resolved.request.max,
            Coordinate::new(DEFAULT_RANGE, DEFAULT_LAYER, DEFAULT_RANGE)
        );
        assert_eq!(resolved.format, OutputFormat::Plain);
        assert!(matches!(
            resolved.engine,
            EngineChoice::Scan(tuning) if tuning == ScanTuning::default()
        ));
    }

    #[test]
    fn missing_seed_is_rejected() {
        let err = RawConfig::default().resolve().err().expect("should fail");
        assert!(err.to_string().contains("no seed"));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(raw_with_seed("banana").resolve().is_err());

        let mut negative = raw_with_seed("1");
        negative.search.range = Some(-1);
        assert!(negative.resolve().is_err());

        let mut density = raw_with_seed("1");
        density.engine.density = Some(1.5);
        assert!(density.resolve().is_err());

        let mut columns = raw_with_seed("1");
        columns.engine.columns_per_step = Some(0);
        assert!(columns.resolve().is_err());

        let mut format = raw_with_seed("1");
        format.output.format = Some("yaml".into());
        assert!(format.resolve().is_err());
    }

    #[test]
    fn library_selects_the_native_engine() {
        let mut raw = raw_with_seed("1");
        raw.engine.library = Some(PathBuf::from("/opt/engines/bedrock.so"));
        let resolved = raw.resolve().expect("resolves");
        assert!(matches!(
            resolved.engine,
            EngineChoice::Native(ref path) if path == &PathBuf::from("/opt/engines/bedrock.so")
        ));

        let mut missing = raw_with_seed("1");
        missing.engine.kind = Some("native".into());
        assert!(missing.resolve().is_err());

        let mut not_a_library = raw_with_seed("1");
        not_a_library.engine.library = Some(PathBuf::from("engines/bedrock.wasm"));
        let err = not_a_library.resolve().err().expect("should fail");
        assert!(err.to_string().contains("not a shared library"));
    }

    #[test]
    fn bare_library_names_resolve_into_the_engine_directory() {
        let located = locate_library(PathBuf::from("no-such-engine-library.so"));
        assert!(located.ends_with("no-such-engine-library.so"));
        if let Ok(dir) = app_dirs::get_engines_dir() {
            assert!(located.starts_with(dir));
        }
    }
}
