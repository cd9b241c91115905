pub mod map;
pub mod report;

use anyhow::{Context, Result};
use tracing::info;

use crate::{collection::FeatureCollection, config::PipelineConfig};

/// Raw inputs as read from disk, before reprojection.
pub(crate) struct Inputs {
    pub(crate) wards: FeatureCollection,
    pub(crate) counties: FeatureCollection,
    pub(crate) outline: Option<FeatureCollection>,
}

impl Inputs {
    pub(crate) fn read(config: &PipelineConfig) -> Result<Self> {
        let read = |path: &std::path::Path| FeatureCollection::from_shapefile(path)
            .with_context(|| format!("[load] failed to read {}", path.display()));

        Ok(Self {
            wards: read(&config.fine_path)?,
            counties: read(&config.coarse_path)?,
            outline: config.outline_path.as_deref().map(read).transpose()?,
        })
    }

    /// Reproject every layer into the configured CRS.
    pub(crate) fn normalize(self, config: &PipelineConfig) -> Result<Self> {
        let target = config.crs();
        info!("[reproject] normalizing inputs to {target}");
        Ok(Self {
            wards: self.wards.reproject(&target).context("[reproject] wards")?,
            counties: self.counties.reproject(&target).context("[reproject] counties")?,
            outline: self.outline.map(|outline| outline.reproject(&target)).transpose()
                .context("[reproject] outline")?,
        })
    }
}
