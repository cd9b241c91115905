use anyhow::{bail, Result};
use std::path::Path;

use crate::{
    cli::{Cli, MapArgs},
    render::{render_map, MapLayers},
};

use super::Inputs;

pub fn run(cli: &Cli, args: &MapArgs) -> Result<()> {
    if args.output == Path::new("-") { bail!("stdout is not supported."); }

    let mut config = cli.pipeline_config(&args.data)?;
    if let Some(colormap) = args.colormap { config.map.colormap = colormap }
    if let Some(vmin) = args.vmin { config.map.vmin = vmin }
    if let Some(vmax) = args.vmax { config.map.vmax = vmax }
    if config.map.vmin >= config.map.vmax {
        bail!("vmin ({}) must be below vmax ({})", config.map.vmin, config.map.vmax);
    }

    let inputs = Inputs::read(&config)?.normalize(&config)?;
    let layers = MapLayers {
        units: &inputs.wards,
        regions: Some(&inputs.counties),
        outline: inputs.outline.as_ref(),
        value_key: &config.value_key,
    };
    render_map(&layers, &config.map, &args.output)?;
    println!("Wrote map -> {}", args.output.display());
    Ok(())
}
