// Integration tests for the load -> join/summarize -> clip -> render pipeline,
// run against shapefiles written to a temporary directory.

use std::{fs, path::Path};

use geo::{polygon, Area, Coord, CoordsIter, MultiPolygon};
use polars::df;
use tempfile::TempDir;

use wardmap::{
    clip_by_region, load, render_map, sjoin, summarize, Crs, Error, FeatureCollection, JoinOptions,
    JoinPredicate, MapConfig, MapLayers, Value,
};

const ITM: Crs = Crs::Epsg(2157);

fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size), (x: x, y: y),
    ]])
}

/// Three 10 km wards; the middle one straddles the two counties.
fn write_fixtures(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let (x, y) = (600_000.0, 850_000.0);
    let wards = FeatureCollection::new(
        vec![square(x, y, 10_000.0), square(x + 5_000.0, y, 10_000.0), square(x + 20_000.0, y, 10_000.0)],
        df!(
            "WardName" => ["Glenravel", "Dunsilly", "Ballee"],
            "Population" => [100.0, 50.0, 30.0],
        ).unwrap(),
        Some(ITM),
    ).unwrap();
    let counties = FeatureCollection::new(
        vec![square(x, y, 10_000.0), square(x + 10_000.0, y, 20_000.0)],
        df!("CountyName" => ["ANTRIM", "DOWN"]).unwrap(),
        Some(ITM),
    ).unwrap();

    let (wards_path, counties_path) = (dir.join("wards.shp"), dir.join("counties.shp"));
    wards.to_shapefile(&wards_path).unwrap();
    counties.to_shapefile(&counties_path).unwrap();
    (wards_path, counties_path)
}

#[test]
fn shapefile_round_trip_keeps_geometry_attributes_and_crs() {
    let dir = TempDir::new().unwrap();
    let (wards_path, _) = write_fixtures(dir.path());
    assert!(wards_path.with_extension("prj").exists());

    let wards = FeatureCollection::from_shapefile(&wards_path).unwrap();
    assert_eq!(wards.len(), 3);
    assert_eq!(wards.crs(), Some(&ITM));
    assert_eq!(wards.column_names(), vec!["Population", "WardName"]);
    assert_eq!(wards.value(1, "WardName").unwrap(), Value::Text("Dunsilly".into()));
    assert_eq!(wards.value(2, "Population").unwrap().as_f64(), Some(30.0));
    assert!((wards.geometry(0).unwrap().unsigned_area() - 1.0e8).abs() < 1e-3);
}

#[test]
fn missing_and_unsupported_inputs() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.shp");
    assert!(matches!(load(&missing, &ITM), Err(Error::FileNotFound(p)) if p == missing));

    let text = dir.path().join("wards.csv");
    fs::write(&text, "WardName,Population\n").unwrap();
    assert!(matches!(FeatureCollection::from_shapefile(&text), Err(Error::UnsupportedFormat { .. })));
}

#[test]
fn reprojection_round_trip_is_within_tolerance() {
    let dir = TempDir::new().unwrap();
    let (wards_path, _) = write_fixtures(dir.path());

    let itm = load(&wards_path, &ITM).unwrap();
    let wgs84 = itm.reproject(&Crs::WGS84).unwrap();
    let (lon, lat) = wgs84.geometry(0).unwrap().coords_iter().next().map(|c| (c.x, c.y)).unwrap();
    assert!((-8.5..-7.5).contains(&lon) && (54.0..55.0).contains(&lat), "({lon}, {lat})");

    let back = wgs84.reproject(&ITM).unwrap();
    for (a, b) in itm.shapes().iter().zip(back.shapes()) {
        for (p, q) in a.coords_iter().zip(b.coords_iter()) {
            let Coord { x, y } = p - q;
            assert!(x.abs() < 1e-3 && y.abs() < 1e-3, "{p:?} vs {q:?}");
        }
    }
}

#[test]
fn wards_join_summarize_and_clip() {
    let dir = TempDir::new().unwrap();
    let (wards_path, counties_path) = write_fixtures(dir.path());
    let wards = load(&wards_path, &ITM).unwrap();
    let counties = load(&counties_path, &ITM).unwrap();

    let options = JoinOptions { predicate: JoinPredicate::Overlaps, ..JoinOptions::default() };
    let joined = sjoin(&wards, &counties, &options).unwrap();
    assert_eq!(joined.pairs(), &[(0, 0), (1, 0), (1, 1), (2, 1)]);

    let summary = summarize(joined.features(), "CountyName", "Population").unwrap();
    assert_eq!(summary.iter().collect::<Vec<_>>(), vec![("ANTRIM", 150.0), ("DOWN", 80.0)]);

    let clipped = clip_by_region(&wards, &counties, "CountyName").unwrap();
    assert_eq!(clipped.sources(), &[0, 1, 1, 2]);
    let areas = clipped.features().shapes().iter().map(|s| s.unsigned_area()).collect::<Vec<_>>();
    for (area, expected) in areas.iter().zip([1.0e8, 5.0e7, 5.0e7, 1.0e8]) {
        assert!((area - expected).abs() < 1e-3, "{areas:?}");
    }
    assert_eq!(clipped.features().value(2, "CountyName").unwrap(), Value::Text("DOWN".into()));
    assert_eq!(clipped.total("Population").unwrap(), 230.0);

    let out = dir.path().join("clipped.shp");
    clipped.features().to_shapefile(&out).unwrap();
    let reread = FeatureCollection::from_shapefile(&out).unwrap();
    assert_eq!(reread.len(), 4);
    assert_eq!(reread.crs(), Some(&ITM));
}

#[test]
fn mismatched_crs_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (wards_path, counties_path) = write_fixtures(dir.path());
    let wards = load(&wards_path, &Crs::WGS84).unwrap();
    let counties = load(&counties_path, &ITM).unwrap();

    assert!(matches!(sjoin(&wards, &counties, &JoinOptions::default()), Err(Error::CrsMismatch { .. })));
    assert!(matches!(clip_by_region(&wards, &counties, "CountyName"), Err(Error::CrsMismatch { .. })));
}

#[test]
fn map_renders_to_svg_file() {
    let dir = TempDir::new().unwrap();
    let (wards_path, counties_path) = write_fixtures(dir.path());
    let wards = load(&wards_path, &ITM).unwrap();
    let counties = load(&counties_path, &ITM).unwrap();

    let out = dir.path().join("map.svg");
    let layers = MapLayers { units: &wards, regions: Some(&counties), outline: Some(&counties), value_key: "Population" };
    render_map(&layers, &MapConfig::default(), &out).unwrap();

    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains(r#"data-dpi="300""#));
    assert_eq!(svg.matches(r#"class="unit""#).count(), 3);
    assert_eq!(svg.matches(r#"class="outline""#).count(), 2);
    assert!(svg.contains("10 km"));
    assert!(svg.contains("Resident Population"));
}
