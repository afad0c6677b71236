//! Bookable cities, grouped by country

use crate::core::{Coordinate, RouteError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub country: &'static str,
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
}

impl City {
    pub fn coordinate(&self) -> Result<Coordinate, RouteError> {
        Coordinate::new(self.lon, self.lat)
    }
}

const fn city(country: &'static str, name: &'static str, lon: f64, lat: f64) -> City {
    City {
        country,
        name,
        lon,
        lat,
    }
}

pub const CITIES: &[City] = &[
    city("United States", "Miami", -80.1918, 25.7617),
    city("United States", "New York", -74.0060, 40.7128),
    city("United States", "Los Angeles", -118.2437, 34.0522),
    city("Colombia", "Bogotá", -74.0721, 4.7110),
    city("Colombia", "Medellín", -75.5636, 6.2442),
    city("Colombia", "Cali", -76.5215, 3.4516),
    city("Colombia", "Cartagena", -75.4794, 10.3910),
    city("Spain", "Madrid", -3.7038, 40.4168),
    city("Spain", "Barcelona", 2.1734, 41.3851),
    city("Peru", "Lima", -77.0428, -12.0464),
];

pub const DEFAULT_ORIGIN: &str = "Miami";
pub const DEFAULT_DESTINATION: &str = "Bogotá";

/// Index of the city called `name` (case-insensitive)
pub fn find(name: &str) -> Option<usize> {
    CITIES
        .iter()
        .position(|c| c.name.to_lowercase() == name.to_lowercase())
}

pub fn get(index: usize) -> Option<&'static City> {
    CITIES.get(index)
}

/// Next index after `current`, wrapping; starts at the first city when unset
pub fn next_index(current: Option<usize>) -> usize {
    match current {
        Some(i) => (i + 1) % CITIES.len(),
        None => 0,
    }
}

/// Two cities denote the same place when their coordinates coincide
pub fn same_place(a: &City, b: &City) -> bool {
    a.lon == b.lon && a.lat == b.lat
}
