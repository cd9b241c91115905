//! Coordinate reference systems: a small EPSG registry and `.prj` sidecar handling.

use std::{borrow::Cow, fmt, fs, path::Path, sync::LazyLock};

use proj4rs::proj::Proj;
use regex::Regex;

use crate::error::{Error, Result};

/// A coordinate reference system, either by EPSG code or as a raw PROJ.4 definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Crs {
    Epsg(u32),
    Proj4(String),
}

/// Registry entry for a supported EPSG code.
struct CrsDef {
    epsg: u32,
    esri_name: &'static str,
    proj4: &'static str,
    geographic: bool,
}

const REGISTRY: &[CrsDef] = &[
    CrsDef {
        epsg: 4326,
        esri_name: "GCS_WGS_1984",
        proj4: "+proj=longlat +datum=WGS84 +no_defs +type=crs",
        geographic: true,
    },
    CrsDef {
        epsg: 4269,
        esri_name: "GCS_North_American_1983",
        proj4: "+proj=longlat +datum=NAD83 +no_defs +type=crs",
        geographic: true,
    },
    CrsDef {
        epsg: 4258,
        esri_name: "GCS_ETRS_1989",
        proj4: "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs +type=crs",
        geographic: true,
    },
    CrsDef {
        epsg: 2157,
        esri_name: "IRENET95_Irish_Transverse_Mercator",
        proj4: "+proj=tmerc +lat_0=53.5 +lon_0=-8 +k=0.99982 +x_0=600000 +y_0=750000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs +type=crs",
        geographic: false,
    },
    CrsDef {
        epsg: 29902,
        esri_name: "TM65_Irish_Grid",
        proj4: "+proj=tmerc +lat_0=53.5 +lon_0=-8 +k=1.000035 +x_0=200000 +y_0=250000 +ellps=mod_airy +towgs84=482.5,-130.6,564.6,-1.042,-0.214,-0.631,8.15 +units=m +no_defs +type=crs",
        geographic: false,
    },
    CrsDef {
        epsg: 29903,
        esri_name: "TM75_Irish_Grid",
        proj4: "+proj=tmerc +lat_0=53.5 +lon_0=-8 +k=1.000035 +x_0=200000 +y_0=250000 +ellps=mod_airy +towgs84=482.5,-130.6,564.6,-1.042,-0.214,-0.631,8.15 +units=m +no_defs +type=crs",
        geographic: false,
    },
    CrsDef {
        epsg: 27700,
        esri_name: "British_National_Grid",
        proj4: "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs +type=crs",
        geographic: false,
    },
    CrsDef {
        epsg: 3857,
        esri_name: "WGS_1984_Web_Mercator_Auxiliary_Sphere",
        proj4: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs",
        geographic: false,
    },
];

static AUTHORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:AUTHORITY|ID)\["EPSG",\s*"?(\d+)"?\]"#).expect("valid authority regex")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:PROJCS|GEOGCS|PROJCRS|GEOGCRS)\["([^"]+)""#).expect("valid name regex")
});

static UTM_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^WGS_1984_UTM_Zone_(\d{1,2})([NS])$").expect("valid UTM regex")
});

/// WGS84 UTM zones: 326zz (north) / 327zz (south).
fn utm_zone(epsg: u32) -> Option<(u32, bool)> {
    match epsg {
        32601..=32660 => Some((epsg - 32600, true)),
        32701..=32760 => Some((epsg - 32700, false)),
        _ => None,
    }
}

/// Nesting depth of WKT brackets at the end of `prefix`, ignoring quoted names.
fn bracket_depth(prefix: &str) -> i32 {
    let mut depth = 0;
    let mut quoted = false;
    for c in prefix.chars() {
        match c {
            '"' => quoted = !quoted,
            '[' | '(' if !quoted => depth += 1,
            ']' | ')' if !quoted => depth -= 1,
            _ => {}
        }
    }
    depth
}

impl Crs {
    /// Geographic WGS84 lon/lat, used for graticules.
    pub const WGS84: Crs = Crs::Epsg(4326);

    /// The EPSG code, if this CRS was defined by one.
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Proj4(_) => None,
        }
    }

    /// PROJ.4 definition string for this CRS.
    pub fn definition(&self) -> Result<Cow<'_, str>> {
        match self {
            Crs::Proj4(s) => Ok(Cow::Borrowed(s.as_str())),
            Crs::Epsg(code) => {
                if let Some(def) = REGISTRY.iter().find(|def| def.epsg == *code) {
                    return Ok(Cow::Borrowed(def.proj4));
                }
                let (zone, north) = utm_zone(*code)
                    .ok_or_else(|| Error::Projection(format!("unsupported EPSG code {code}")))?;
                let south = if north { "" } else { " +south" };
                Ok(Cow::Owned(format!("+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs")))
            }
        }
    }

    /// Build the `proj4rs` projection for this CRS.
    pub fn to_proj(&self) -> Result<Proj> {
        let definition = self.definition()?;
        Proj::from_proj_string(&definition)
            .map_err(|e| Error::Projection(format!("failed to build PROJ.4 {definition}: {e}")))
    }

    /// True for lon/lat systems, whose coordinates are degrees at the API boundary.
    pub fn is_geographic(&self) -> Result<bool> {
        match self {
            Crs::Epsg(code) => match REGISTRY.iter().find(|def| def.epsg == *code) {
                Some(def) => Ok(def.geographic),
                None => Ok(self.to_proj()?.is_latlong()),
            },
            Crs::Proj4(_) => Ok(self.to_proj()?.is_latlong()),
        }
    }

    /// Recognize a CRS from `.prj` WKT text: an EPSG authority on the root node wins,
    /// otherwise a known ESRI coordinate system name. Authorities of nested nodes
    /// (datum, spheroid, unit) never identify the CRS.
    pub fn from_wkt(wkt: &str) -> Option<Crs> {
        let root_code = AUTHORITY_RE.captures_iter(wkt)
            .filter(|caps| caps.get(0).is_some_and(|m| bracket_depth(&wkt[..m.start()]) == 1))
            .find_map(|caps| caps[1].parse::<u32>().ok());
        if let Some(code) = root_code {
            return Some(Crs::Epsg(code));
        }

        let name = NAME_RE.captures(wkt)?.get(1)?.as_str();
        if let Some(def) = REGISTRY.iter().find(|def| def.esri_name == name) {
            return Some(Crs::Epsg(def.epsg));
        }
        let caps = UTM_NAME_RE.captures(name)?;
        let zone = caps[1].parse::<u32>().ok().filter(|z| (1..=60).contains(z))?;
        Some(Crs::Epsg(if &caps[2] == "N" { 32600 + zone } else { 32700 + zone }))
    }

    /// Minimal WKT carrying the name and EPSG authority, for `.prj` sidecars.
    pub fn to_wkt(&self) -> Option<String> {
        let code = self.epsg()?;
        let (name, geographic) = match REGISTRY.iter().find(|def| def.epsg == code) {
            Some(def) => (def.esri_name.to_string(), def.geographic),
            None => {
                let (zone, north) = utm_zone(code)?;
                (format!("WGS_1984_UTM_Zone_{zone}{}", if north { "N" } else { "S" }), false)
            }
        };
        let kind = if geographic { "GEOGCS" } else { "PROJCS" };
        Some(format!(r#"{kind}["{name}",AUTHORITY["EPSG","{code}"]]"#))
    }

    /// Read the `.prj` sidecar next to a `.shp` path, if present.
    pub fn read_sidecar(shp_path: &Path) -> Result<Option<Crs>> {
        let prj = shp_path.with_extension("prj");
        if !prj.exists() { return Ok(None) }
        let text = fs::read_to_string(&prj)?;
        Ok(Crs::from_wkt(&text))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Proj4(s) => write!(f, "{s}"),
        }
    }
}
