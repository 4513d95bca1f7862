use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use anyhow::Context;
use carbonmap::{
    choropleth::{Choropleth, Legend},
    config::Config,
    emissions::MetricKind,
    formatters::{
        CSVFormatter, GeoJSONFormatter, GeoJSONSeqFormatter, OutputFormatter, OutputGenerator,
    },
    geo::BBox,
    loader,
    selection::Selection,
    CarbonMap,
};
use clap::{Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::EnumString;

use crate::display::{choropleth_table, display_bindings, display_legend, display_years};
use crate::error::CarbonMapCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const LOADING_MAP_STRING: &str = "Loading emissions and map data";
const LOADING_EMISSIONS_STRING: &str = "Loading emissions data";

/// Defines the output formats we are able to produce data in.
#[derive(Clone, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    GeoJSON,
    GeoJSONSeq,
    Csv,
    Stdout,
}

impl OutputFormat {
    /// The file formatter for this format, `None` for the terminal table
    fn formatter(&self) -> Option<OutputFormatter> {
        match self {
            OutputFormat::GeoJSON => Some(OutputFormatter::GeoJSON(GeoJSONFormatter)),
            OutputFormat::GeoJSONSeq => Some(OutputFormatter::GeoJSONSeq(GeoJSONSeqFormatter)),
            OutputFormat::Csv => Some(OutputFormatter::Csv(CSVFormatter)),
            OutputFormat::Stdout => None,
        }
    }
}

fn write_output<U>(
    output_format: &OutputFormat,
    choropleth: &Choropleth,
    output_file: Option<U>,
) -> CarbonMapCliResult<()>
where
    U: AsRef<Path>,
{
    let mut writer: Box<dyn Write> = if let Some(output_file) = output_file {
        Box::new(File::create(output_file).context("Failed to write output")?)
    } else {
        Box::new(io::stdout().lock())
    };
    match output_format.formatter() {
        Some(formatter) => formatter.save(&mut writer, choropleth)?,
        None => writeln!(writer, "\n{}", choropleth_table(choropleth))?,
    }
    Ok(())
}

fn start_spinner(quiet: bool, message: &str) -> Option<Spinner> {
    (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            message.to_string() + RUNNING_TAIL_STRING,
        )
    })
}

fn stop_spinner(spinner: Option<Spinner>) {
    if let Some(mut s) = spinner {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    async fn run(&self, config: Config) -> CarbonMapCliResult<()>;
}

/// Overrides for the data sources given in the config file
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(long, help = "Path or URL of the emissions dataset")]
    emissions_source: Option<String>,
    #[arg(long, help = "URL of the boundary topology tried first")]
    boundary_primary: Option<String>,
    #[arg(long, help = "URL of the boundary topology tried if the first fails")]
    boundary_fallback: Option<String>,
}

impl SourceArgs {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(source) = &self.emissions_source {
            config.emissions_source = source.clone();
        }
        if let Some(source) = &self.boundary_primary {
            config.boundary_primary = source.clone();
        }
        if let Some(source) = &self.boundary_fallback {
            config.boundary_fallback = source.clone();
        }
        config
    }
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    #[arg(short, long, default_value = "2020", help = "Year to map")]
    year: String,
    #[arg(
        short,
        long,
        default_value = "total",
        value_name = "total|capita",
        help = "Emissions metric to map"
    )]
    metric: MetricKind,
}

impl From<&SelectionArgs> for Selection {
    fn from(args: &SelectionArgs) -> Self {
        Selection::new(args.year.clone(), args.metric)
    }
}

async fn load_map(
    sources: &SourceArgs,
    config: Config,
    quiet: bool,
) -> CarbonMapCliResult<CarbonMap> {
    let spinner = start_spinner(quiet, LOADING_MAP_STRING);
    let result = CarbonMap::new_with_config(sources.apply(config)).await;
    stop_spinner(spinner);
    Ok(result?)
}

/// The `map` command renders the choropleth for a selection and writes it in a given format.
#[derive(Args, Debug)]
pub struct MapCommand {
    #[command(flatten)]
    selection: SelectionArgs,
    #[arg(
        short = 'f',
        long,
        value_name = "geojson|geojsonseq|csv|stdout",
        help = "Output format for the results"
    )]
    output_format: OutputFormat,
    #[arg(short = 'o', long, help = "Output file to place the results")]
    output_file: Option<String>,
    #[arg(
        long,
        value_name = "LEFT,BOTTOM,RIGHT,TOP",
        allow_hyphen_values(true),
        help = "Only output countries intersecting the bounding box"
    )]
    bbox: Option<BBox>,
    #[command(flatten)]
    sources: SourceArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for MapCommand {
    async fn run(&self, config: Config) -> CarbonMapCliResult<()> {
        info!("Running `map` subcommand");
        let map = load_map(&self.sources, config, self.quiet).await?;
        let mut choropleth = map.choropleth(&(&self.selection).into())?;
        if let Some(bbox) = &self.bbox {
            choropleth = choropleth.filter_bbox(bbox);
            debug!("{} shape(s) within {bbox:?}", choropleth.shapes.len());
        }
        write_output(
            &self.output_format,
            &choropleth,
            self.output_file.as_deref(),
        )?;
        Ok(())
    }
}

/// The `resolve` command shows which emissions record each boundary feature binds to.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    #[command(flatten)]
    selection: SelectionArgs,
    #[arg(long, help = "Only show features without a match")]
    unresolved: bool,
    #[command(flatten)]
    sources: SourceArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for ResolveCommand {
    async fn run(&self, config: Config) -> CarbonMapCliResult<()> {
        info!("Running `resolve` subcommand");
        let map = load_map(&self.sources, config, self.quiet).await?;
        let bindings = map.resolve_all(&(&self.selection).into())?;
        display_bindings(&map.boundaries, &bindings, self.unresolved)?;
        Ok(())
    }
}

/// The `years` command lists the years and metrics in the emissions dataset.
#[derive(Args, Debug)]
pub struct YearsCommand {
    #[arg(long, help = "Path or URL of the emissions dataset")]
    emissions_source: Option<String>,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for YearsCommand {
    async fn run(&self, mut config: Config) -> CarbonMapCliResult<()> {
        info!("Running `years` subcommand");
        if let Some(source) = &self.emissions_source {
            config.emissions_source = source.clone();
        }
        let spinner = start_spinner(self.quiet, LOADING_EMISSIONS_STRING);
        let result = loader::load_emissions(&config).await;
        stop_spinner(spinner);
        display_years(&result?)?;
        Ok(())
    }
}

/// The `legend` command prints the colour legend for a metric.
#[derive(Args, Debug)]
pub struct LegendCommand {
    #[arg(
        short,
        long,
        default_value = "total",
        value_name = "total|capita",
        help = "Emissions metric"
    )]
    metric: MetricKind,
}

impl RunCommand for LegendCommand {
    async fn run(&self, _config: Config) -> CarbonMapCliResult<()> {
        info!("Running `legend` subcommand");
        display_legend(&Legend::for_metric(self.metric))?;
        Ok(())
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Carbonmap resolves world boundaries against CO₂ emissions data and maps them",
    long_about = None,
    name = "carbonmap"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress spinner to stdout. Results and logs (when `RUST_LOG`\n\
            is set) will still be printed.",
        global = true
    )]
    quiet: bool,
}

/// Commands contains the list of subcommands avaliable for use in the CLI.
/// Each command should implmement the RunCommand trait and specify the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// Output the choropleth for a year and metric
    Map(MapCommand),
    /// Show how each boundary feature was matched to emissions data
    Resolve(ResolveCommand),
    /// List the years and metrics available
    Years(YearsCommand),
    /// Print the colour legend for a metric
    Legend(LegendCommand),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use httpmock::prelude::*;
    use serde_json::Value;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::error::CarbonMapCliError;

    fn fixture(name: &str) -> String {
        format!("{}/../{name}", env!("CARGO_MANIFEST_DIR"))
    }

    async fn fixture_sources() -> (MockServer, SourceArgs) {
        let server = MockServer::start_async().await;
        let body = std::fs::read_to_string(fixture("test_topology.json")).unwrap();
        server
            .mock_async(|when, then| {
                when.method(GET).path("/countries-110m.json");
                then.status(200).body(body);
            })
            .await;
        let sources = SourceArgs {
            emissions_source: Some(fixture("test_emissions.json")),
            boundary_primary: Some(server.url("/countries-110m.json")),
            boundary_fallback: Some(server.url("/missing.json")),
        };
        (server, sources)
    }

    fn selection_args(year: &str, metric: MetricKind) -> SelectionArgs {
        SelectionArgs {
            year: year.into(),
            metric,
        }
    }

    #[tokio::test]
    async fn test_map_command() {
        let (_server, sources) = fixture_sources().await;
        let output_file = NamedTempFile::new().unwrap();
        let map_command = MapCommand {
            selection: selection_args("2019", MetricKind::Capita),
            output_format: OutputFormat::GeoJSON,
            output_file: Some(output_file.path().to_string_lossy().to_string()),
            bbox: None,
            sources,
            quiet: true,
        };
        let result = map_command.run(Config::default()).await;
        assert!(result.is_ok());

        let output = std::fs::read_to_string(output_file.path()).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["features"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_map_command_with_bbox() {
        let (_server, sources) = fixture_sources().await;
        let output_file = NamedTempFile::new().unwrap();
        let map_command = MapCommand {
            selection: selection_args("2020", MetricKind::Total),
            output_format: OutputFormat::GeoJSONSeq,
            output_file: Some(output_file.path().to_string_lossy().to_string()),
            bbox: Some(BBox([-10.0, 35.0, 30.0, 60.0])),
            sources,
            quiet: true,
        };
        map_command.run(Config::default()).await.unwrap();

        let output = std::fs::read_to_string(output_file.path()).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("France"));
    }

    #[tokio::test]
    async fn stdout_format_should_write_table() {
        let (_server, sources) = fixture_sources().await;
        let output_file = NamedTempFile::new().unwrap();
        let map_command = MapCommand {
            selection: selection_args("2020", MetricKind::Total),
            output_format: OutputFormat::Stdout,
            output_file: Some(output_file.path().to_string_lossy().to_string()),
            bbox: None,
            sources,
            quiet: true,
        };
        map_command.run(Config::default()).await.unwrap();

        let output = std::fs::read_to_string(output_file.path()).unwrap();
        assert!(output.contains("Matched via"));
        assert!(output.contains("France"));
        assert!(output.contains("Somaliland"));
    }

    #[tokio::test]
    async fn unknown_year_should_fail_map_command() {
        let (_server, sources) = fixture_sources().await;
        let map_command = MapCommand {
            selection: selection_args("1850", MetricKind::Total),
            output_format: OutputFormat::Stdout,
            output_file: None,
            bbox: None,
            sources,
            quiet: true,
        };
        let result = map_command.run(Config::default()).await;
        assert!(matches!(result, Err(CarbonMapCliError::CarbonMapError(_))));
    }

    #[tokio::test]
    async fn test_resolve_command() {
        let (_server, sources) = fixture_sources().await;
        let resolve_command = ResolveCommand {
            selection: selection_args("2020", MetricKind::Total),
            unresolved: true,
            sources,
            quiet: true,
        };
        assert!(resolve_command.run(Config::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_years_command() {
        let years_command = YearsCommand {
            emissions_source: Some(fixture("test_emissions.json")),
            quiet: true,
        };
        assert!(years_command.run(Config::default()).await.is_ok());
    }

    #[test]
    fn source_args_should_override_config() {
        let sources = SourceArgs {
            emissions_source: Some("local.json".into()),
            ..SourceArgs::default()
        };
        let config = sources.apply(Config::default());
        assert_eq!(config.emissions_source, "local.json");
        assert_eq!(config.boundary_primary, Config::default().boundary_primary);
    }

    #[test]
    fn output_type_should_deserialize_properly() {
        let output_format = OutputFormat::from_str("GeoJSON");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSON,
            "geojson format should be parsed correctly"
        );
        let output_format = OutputFormat::from_str("GeoJson");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSON,
            "parsing should be case insensitive"
        );
        let output_format = OutputFormat::from_str("stdout");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::Stdout,
            "correct variants should parse correctly"
        );
        let output_format = OutputFormat::from_str("geoparquet");
        assert!(output_format.is_err(), "non listed formats should fail");
    }

    #[test]
    fn cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn map_args_should_parse() {
        let cli = Cli::try_parse_from([
            "carbonmap", "map", "-y", "2019", "-m", "capita", "-f", "csv", "--bbox",
            "-10,35,30,60",
        ])
        .unwrap();
        let Some(Commands::Map(map_command)) = cli.command else {
            panic!("expected map command");
        };
        assert_eq!(map_command.selection.metric, MetricKind::Capita);
        assert_eq!(map_command.output_format, OutputFormat::Csv);
        assert_eq!(map_command.bbox, Some(BBox([-10.0, 35.0, 30.0, 60.0])));
    }
}
