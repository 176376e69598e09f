use std::fmt::Write;
use std::path::PathBuf;

use clap::{
    ArgAction, ColorChoice, CommandFactory, FromArgMatches, Parser, ValueEnum,
    builder::{
        BoolishValueParser, Styles,
        styling::{AnsiColor, Effects},
    },
};
use bedscan::{Floor, app_dirs};

/// Produce the full version banner including config and engine directories.
fn long_version() -> &'static str {
    let config_dir = match app_dirs::get_config_dir() {
        Ok(path) => path.display().to_string(),
        Err(err) => format!("unavailable ({err})"),
    };
    let engines_dir = match app_dirs::get_engines_dir() {
        Ok(path) => path.display().to_string(),
        Err(err) => format!("unavailable ({err})"),
    };

    let mut details = format!("bedscan {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(details);
    let _ = writeln!(details, "config directory: {config_dir}");
    let _ = writeln!(details, "engine directory: {engines_dir}");

    Box::leak(details.into_boxed_str())
}

/// Create the clap styles used for custom colour output.
fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
}

/// Parse command line arguments into the strongly typed [`CliArgs`] structure.
pub(crate) fn parse_cli() -> CliArgs {
    let mut matches = CliArgs::command().get_matches();
    CliArgs::from_arg_matches_mut(&mut matches).unwrap_or_else(|err| err.exit())
}

#[derive(Parser, Debug)]
#[command(
    name = "bedscan",
    version,
    long_version = long_version(),
    about = "Search a region around the origin and list matches nearest first",
    color = ColorChoice::Auto,
    styles = cli_styles()
)]
/// Command-line arguments accepted by the `bedscan` binary.
pub(crate) struct CliArgs {
    #[arg(
        short,
        long = "config",
        value_name = "FILE",
        env = "BEDSCAN_CONFIG",
        action = ArgAction::Append,
        help = "Additional configuration file to merge (default: none)"
    )]
    pub(crate) config: Vec<PathBuf>,
    #[arg(
        short = 'n',
        long = "no-config",
        help = "Skip loading default configuration files (default: disabled)"
    )]
    pub(crate) no_config: bool,
    #[arg(
        short = 's',
        long,
        value_name = "SEED",
        allow_hyphen_values = true,
        help = "World seed as a 64-bit integer, decimal or 0x-prefixed hex (default: from config)"
    )]
    pub(crate) seed: Option<String>,
    #[arg(
        short = 'r',
        long,
        value_name = "BLOCKS",
        help = "Search x and z within [-BLOCKS, BLOCKS] (default: 256)"
    )]
    pub(crate) range: Option<i32>,
    #[arg(
        short = 'y',
        long,
        value_name = "Y",
        allow_hyphen_values = true,
        help = "Layer to search (default: -60)"
    )]
    pub(crate) layer: Option<i32>,
    #[arg(
        short = 'f',
        long,
        value_enum,
        help = "Floor selector passed to the engine (default: overworld)"
    )]
    pub(crate) floor: Option<FloorArg>,
    #[arg(
        short = 'e',
        long,
        value_enum,
        help = "Engine to drive (default: native when a library is set, otherwise scan)"
    )]
    pub(crate) engine: Option<EngineArg>,
    #[arg(
        short = 'l',
        long,
        value_name = "PATH",
        help = "Engine library to load; bare names are looked up in the engine directory"
    )]
    pub(crate) library: Option<PathBuf>,
    #[arg(
        long = "columns-per-step",
        value_name = "NUM",
        help = "Columns the scan engine sweeps per step (default: 64)"
    )]
    pub(crate) columns_per_step: Option<usize>,
    #[arg(
        long,
        value_name = "FRACTION",
        help = "Fraction of cells the scan engine reports (default: 0.00390625)"
    )]
    pub(crate) density: Option<f64>,
    #[arg(
        long = "view",
        value_parser = BoolishValueParser::new(),
        help = "Show the live terminal view while searching (default: enabled on a terminal)"
    )]
    pub(crate) view: Option<bool>,
    #[arg(
        long = "no-view",
        conflicts_with = "view",
        help = "Never show the live terminal view (default: disabled)"
    )]
    pub(crate) no_view: bool,
    #[arg(
        short = 'p',
        long = "print-config",
        help = "Print the resolved configuration before running (default: disabled)"
    )]
    pub(crate) print_config: bool,
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        help = "Choose how to print the results (default: plain)"
    )]
    pub(crate) output: Option<OutputFormat>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
/// Floor selectors accepted via the command line.
pub(crate) enum FloorArg {
    Overworld,
    NetherFloor,
    NetherCeiling,
}

impl From<FloorArg> for Floor {
    fn from(value: FloorArg) -> Self {
        match value {
            FloorArg::Overworld => Floor::Overworld,
            FloorArg::NetherFloor => Floor::NetherFloor,
            FloorArg::NetherCeiling => Floor::NetherCeiling,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
/// Engines selectable from the command line.
pub(crate) enum EngineArg {
    Scan,
    Native,
}

impl EngineArg {
    /// Return the string representation consumed by configuration loading.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EngineArg::Scan => "scan",
            EngineArg::Native => "native",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
/// Output formats supported by the CLI utility.
pub(crate) enum OutputFormat {
    Plain,
    Json,
}

impl OutputFormat {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
        }
    }
}
