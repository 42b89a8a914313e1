//! Internal airport -> coordinates table (spec §4.7 step 4). A small, fixed
//! set is sufficient for the core; a real deployment would back this with a
//! reference-data table instead of a compiled map.

use crate::domain::Coordinates;

pub fn lookup(iata: &str) -> Option<Coordinates> {
    let iata = iata.to_ascii_uppercase();
    TABLE
        .iter()
        .find(|(code, _, _)| *code == iata)
        .map(|(_, lat, lon)| Coordinates::new(*lat, *lon))
}

const TABLE: &[(&str, f64, f64)] = &[
    ("JFK", 40.6413, -73.7781),
    ("LAX", 33.9416, -118.4085),
    ("ORD", 41.9742, -87.9073),
    ("LHR", 51.4700, -0.4543),
    ("CDG", 49.0097, 2.5479),
    ("DXB", 25.2532, 55.3657),
    ("HND", 35.5494, 139.7798),
    ("SFO", 37.6213, -122.3790),
    ("ATL", 33.6407, -84.4277),
    ("SIN", 1.3644, 103.9915),
];
