//! Common test fixtures for albedo pipeline tests.
//!
//! The scenario grid is 4x4 cells of 500 m with its north-west corner at
//! (0, 2000), so cell (row, col) covers
//! x in [col*500, col*500+500] and y in [2000-(row+1)*500, 2000-row*500].

use albedo_common::GridSpec;
use chrono::NaiveDate;

/// Nominal cell size of the daily snow products.
pub const CELL_SIZE: f64 = 500.0;

/// Area of one scenario cell.
pub const CELL_AREA: f64 = CELL_SIZE * CELL_SIZE;

/// The 4x4 scenario grid.
pub fn scenario_grid() -> GridSpec {
    GridSpec::new(4, 4, CELL_SIZE, 0.0, 2000.0)
}

/// A date in the middle of the melt season.
pub fn melt_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 7, 15).unwrap_or_default()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Common boundary definitions for testing (WKT).
pub mod boundaries {
    /// Covers cells (1,1), (1,2), (2,1) fully and 60% of cell (2,2).
    ///
    /// Area is 900 000 m², so at most 4 cells can be accounted.
    pub const FOUR_CELL_L: &str =
        "POLYGON((500 1500, 1500 1500, 1500 1000, 1300 1000, 1300 500, 500 500, 500 1500))";

    /// Exactly the footprint of cell (1,1).
    pub const SINGLE_CELL: &str = "POLYGON((500 1000, 1000 1000, 1000 1500, 500 1500, 500 1000))";

    /// Two disjoint squares that each cover half of cell (1,1).
    pub const SPLIT_CELL: &str = "MULTIPOLYGON(((500 1000, 750 1000, 750 1500, 500 1500, 500 1000)),\
         ((750 1000, 1000 1000, 1000 1500, 750 1500, 750 1000)))";

    /// Cell (1,1) with a centered 250 m hole (25% of the cell).
    pub const HOLLOW_CELL: &str = "POLYGON((500 1000, 1000 1000, 1000 1500, 500 1500, 500 1000),\
         (625 1125, 875 1125, 875 1375, 625 1375, 625 1125))";

    /// Bow-tie ring; crosses itself.
    pub const BOW_TIE: &str = "POLYGON((0 0, 1000 1000, 1000 0, 0 1000, 0 0))";

    /// The four-cell boundary as a GeoJSON feature collection.
    pub const FOUR_CELL_L_GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "scenario glacier"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[500, 1500], [1500, 1500], [1500, 1000], [1300, 1000],
                                 [1300, 500], [500, 500], [500, 1500]]]
            }
        }]
    }"#;
}

/// Rectangle covering cell (1,1) and a strip of `fraction` of cell (1,2).
pub fn sliver_boundary_wkt(fraction: f64) -> String {
    let east = 1000.0 + fraction * CELL_SIZE;
    format!(
        "POLYGON((500 1000, {east} 1000, {east} 1500, 500 1500, 500 1000))",
        east = east
    )
}
