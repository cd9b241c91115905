use std::{fs, path::Path};

use tracing::info;

use crate::{common, crs::Crs, error::{Error, Result}};

use super::FeatureCollection;

impl FeatureCollection {
    /// Loads polygon geometries and attributes from a `.shp` file path,
    /// in the CRS declared by its `.prj` sidecar (if any).
    pub fn from_shapefile(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let is_shp = path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));
        if !is_shp {
            return Err(Error::unsupported(path, "expected a .shp file"));
        }

        let (shapes, records) = common::read_shapefile(path)?;
        let data = common::records_to_dataframe(&records)?;
        let crs = Crs::read_sidecar(path)?;

        info!("[load] {} features from {} ({})", shapes.len(), path.display(),
            crs.as_ref().map_or_else(|| "no CRS".to_string(), |crs| crs.to_string()));

        Self::new(shapes, data, crs)
    }

    /// Writes geometries and attributes to a `.shp` file path, with a `.prj` sidecar
    /// when the CRS has an EPSG code.
    pub fn to_shapefile(&self, path: &Path) -> Result<()> {
        common::write_shapefile(path, self.shapes(), self.data())?;
        if let Some(wkt) = self.crs().and_then(Crs::to_wkt) {
            fs::write(path.with_extension("prj"), wkt)?;
        }

        info!("[write] {} features -> {}", self.len(), path.display());
        Ok(())
    }
}

/// Load a shapefile and normalize it to the `target` CRS.
pub fn load(path: &Path, target: &Crs) -> Result<FeatureCollection> {
    FeatureCollection::from_shapefile(path)?.reproject(target)
}
