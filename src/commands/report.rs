use std::io::Write;

use anyhow::{Context, Result};

use crate::{
    aggregate::{extremes, sjoin, summarize, JoinOptions},
    cli::{Cli, ReportArgs},
    clip::clip_by_region,
    collection::FeatureCollection,
    config::PipelineConfig,
};

use super::Inputs;

pub fn run(cli: &Cli, args: &ReportArgs) -> Result<()> {
    let config = cli.pipeline_config(&args.data)?;
    write_report(&config, args, &mut std::io::stdout().lock())
}

/// Run the join, summary and clip over the configured inputs and print the results to `out`.
pub fn write_report<W: Write>(config: &PipelineConfig, args: &ReportArgs, out: &mut W) -> Result<()> {
    let inputs = Inputs::read(config)?;
    writeln!(out, "{}", inputs.counties.head(args.head))?;

    let Inputs { wards, counties, .. } = inputs.normalize(config)?;
    writeln!(out, "CRS match: {}", wards.same_crs(&counties))?;

    let options = JoinOptions { predicate: config.predicate, ..JoinOptions::default() };
    let joined = sjoin(&wards, &counties, &options)?;
    let summary = summarize(joined.features(), &config.group_key, &config.value_key)?;
    writeln!(out, "{summary}")?;

    let clipped = clip_by_region(&wards, &counties, &config.group_key)?;
    writeln!(out, "wards: {}, joined rows: {}, clipped fragments: {}", wards.len(), joined.len(), clipped.len())?;
    writeln!(out, "Total {} after clipping: {}", config.value_key, clipped.total(&config.value_key)?)?;

    // joined rows carry the county columns; straddling wards appear once per county
    if let Some(ext) = extremes(joined.features(), &config.value_key)? {
        write_rows(out, joined.features(), &format!("Max {}: {}", config.value_key, ext.max), &ext.max_rows)?;
        write_rows(out, joined.features(), &format!("Min {}: {}", config.value_key, ext.min), &ext.min_rows)?;
    }

    if let Some(path) = &args.summary_csv {
        summary.write_csv(path).with_context(|| format!("[write] failed to write {}", path.display()))?;
        tracing::info!("[write] summary -> {}", path.display());
    }
    if let Some(path) = &args.clipped_out {
        clipped.features().to_shapefile(path).with_context(|| format!("[write] failed to write {}", path.display()))?;
    }
    Ok(())
}

fn write_rows<W: Write>(out: &mut W, features: &FeatureCollection, heading: &str, rows: &[usize]) -> Result<()> {
    writeln!(out, "{heading}")?;
    writeln!(out, "{}", features.take(rows)?.data())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use geo::{polygon, MultiPolygon};
    use polars::df;
    use tempfile::TempDir;

    use super::*;
    use crate::{cli::DataArgs, crs::Crs};

    fn square(x: f64, size: f64) -> MultiPolygon<f64> {
        let y = 850_000.0;
        MultiPolygon::new(vec![polygon![
            (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size), (x: x, y: y),
        ]])
    }

    /// Wards in ITM; counties stored in WGS84 so the report has to normalize them.
    /// Dunsilly straddles the county border; the others sit clear of it.
    fn fixtures(dir: &TempDir) -> PipelineConfig {
        let x = 600_000.0;
        let wards = FeatureCollection::new(
            vec![square(x, 9_000.0), square(x + 5_000.0, 10_000.0), square(x + 20_000.0, 10_000.0)],
            df!("WardName" => ["Glenravel", "Dunsilly", "Ballee"], "Population" => [50.0, 100.0, 30.0]).unwrap(),
            Some(Crs::Epsg(2157)),
        ).unwrap();
        let counties = FeatureCollection::new(
            vec![square(x, 10_000.0), square(x + 10_000.0, 20_000.0)],
            df!("CountyName" => ["ANTRIM", "DOWN"]).unwrap(),
            Some(Crs::Epsg(2157)),
        ).unwrap().reproject(&Crs::WGS84).unwrap();

        let config = PipelineConfig {
            fine_path: dir.path().join("wards.shp"),
            coarse_path: dir.path().join("counties.shp"),
            outline_path: None,
            ..PipelineConfig::default()
        };
        wards.to_shapefile(&config.fine_path).unwrap();
        counties.to_shapefile(&config.coarse_path).unwrap();
        config
    }

    fn args(dir: &TempDir) -> ReportArgs {
        ReportArgs {
            data: DataArgs::default(),
            head: 5,
            summary_csv: Some(dir.path().join("summary.csv")),
            clipped_out: Some(dir.path().join("clipped.shp")),
        }
    }

    #[test]
    fn report_compares_crs_after_normalizing() {
        let dir = TempDir::new().unwrap();
        let config = fixtures(&dir);
        let mut out = Vec::new();
        write_report(&config, &args(&dir), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("CRS match: true"), "{text}");
        assert!(text.contains("wards: 3, joined rows: 4, clipped fragments: 4"), "{text}");
        assert!(text.contains("Total Population after clipping: 280"), "{text}");
    }

    #[test]
    fn extreme_rows_come_from_the_join() {
        let dir = TempDir::new().unwrap();
        let config = fixtures(&dir);
        let mut out = Vec::new();
        write_report(&config, &args(&dir), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        // the largest ward lies in both counties, so it is listed once per county
        let (max, min) = text.split_once("Min Population: 30").unwrap();
        let max = &max[max.find("Max Population: 100").unwrap()..];
        assert_eq!(max.matches("Dunsilly").count(), 2, "{text}");
        assert!(!max.contains("Glenravel"), "{text}");
        assert!(max.contains("ANTRIM") && max.contains("DOWN"), "{text}");
        assert!(max.contains("index_right"), "{text}");
        assert!(min.contains("Ballee") && min.contains("DOWN"), "{text}");
    }

    #[test]
    fn exports_summary_and_clipped_wards() {
        let dir = TempDir::new().unwrap();
        let config = fixtures(&dir);
        let args = args(&dir);
        write_report(&config, &args, &mut Vec::new()).unwrap();

        let csv = fs::read_to_string(args.summary_csv.as_ref().unwrap()).unwrap();
        assert_eq!(csv.lines().next(), Some("CountyName,Population"));
        assert!(csv.contains("ANTRIM,150"));
        assert!(csv.contains("DOWN,130"));

        let clipped = FeatureCollection::from_shapefile(args.clipped_out.as_ref().unwrap()).unwrap();
        assert_eq!(clipped.len(), 4);
        assert_eq!(clipped.crs(), Some(&Crs::Epsg(2157)));
    }
}
