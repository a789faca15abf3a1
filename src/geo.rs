/// Reverse geocoding by coordinate: `(longitude, latitude)` to a country name.
pub trait CountryLookup: Send + Sync {
    fn lookup(&self, longitude: f64, latitude: f64) -> Option<String>;
}

impl<F> CountryLookup for F
where
    F: Fn(f64, f64) -> Option<String> + Send + Sync,
{
    fn lookup(&self, longitude: f64, latitude: f64) -> Option<String> {
        self(longitude, latitude)
    }
}

/// Lookup used when no geocoder is configured; every marker gets no country.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCountryLookup;

impl CountryLookup for NoCountryLookup {
    fn lookup(&self, _longitude: f64, _latitude: f64) -> Option<String> {
        None
    }
}
