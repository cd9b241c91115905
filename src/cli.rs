use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::{aggregate::JoinPredicate, config::PipelineConfig, io::svg::Colormap};

/// Ward / county spatial analysis CLI
#[derive(Parser, Debug)]
#[command(name = "wardmap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON pipeline config; flags override its values
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `EnvFilter` directive for the verbosity level.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// The config file (or the defaults) with `data` overrides applied.
    pub fn pipeline_config(&self, data: &DataArgs) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        data.apply(&mut config);
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join wards to counties, summarize and clip; print the results
    Report(ReportArgs),

    /// Render the ward population choropleth as SVG
    Map(MapArgs),
}

/// Input datasets and analysis keys shared by every command.
#[derive(Args, Debug, Default)]
pub struct DataArgs {
    /// Fine polygons (wards) shapefile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub wards: Option<PathBuf>,

    /// Coarse polygons (counties) shapefile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub counties: Option<PathBuf>,

    /// Outline shapefile drawn behind the map
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub outline: Option<PathBuf>,

    /// Skip the outline layer
    #[arg(long, conflicts_with = "outline")]
    pub no_outline: bool,

    /// Target CRS as an EPSG code
    #[arg(long)]
    pub epsg: Option<u32>,

    /// Coarse attribute identifying each group
    #[arg(long)]
    pub group_key: Option<String>,

    /// Numeric fine attribute to sum
    #[arg(long)]
    pub value_key: Option<String>,

    /// Spatial join predicate
    #[arg(long, value_enum)]
    pub predicate: Option<JoinPredicate>,
}

impl DataArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(path) = &self.wards { config.fine_path = path.clone() }
        if let Some(path) = &self.counties { config.coarse_path = path.clone() }
        if self.no_outline {
            config.outline_path = None;
        } else if let Some(path) = &self.outline {
            config.outline_path = Some(path.clone());
        }
        if let Some(epsg) = self.epsg { config.epsg = epsg }
        if let Some(key) = &self.group_key { config.group_key = key.clone() }
        if let Some(key) = &self.value_key { config.value_key = key.clone() }
        if let Some(predicate) = self.predicate { config.predicate = predicate }
    }
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Rows of the county table to print
    #[arg(long, default_value_t = 5)]
    pub head: usize,

    /// Write the group summary as CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub summary_csv: Option<PathBuf>,

    /// Write the clipped wards as a shapefile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub clipped_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output SVG file
    #[arg(short, long, default_value = "map.svg", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    #[arg(long, value_enum)]
    pub colormap: Option<Colormap>,

    /// Lower end of the color scale
    #[arg(long)]
    pub vmin: Option<f64>,

    /// Upper end of the color scale
    #[arg(long)]
    pub vmax: Option<f64>,
}
