use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate { latitude, longitude }
    }

    /// GeoJSON orders positions as `[longitude, latitude, ...]`.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [longitude, latitude, ..] if longitude.is_finite() && latitude.is_finite() => {
                Some(Coordinate::new(*latitude, *longitude))
            },
            _ => None,
        }
    }

    pub fn to_position(self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }
}

/// Axis-aligned envelope between a south-west and a north-east corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateBounds {
    pub sw: Coordinate,
    pub ne: Coordinate,
}

impl CoordinateBounds {
    pub fn new(sw: Coordinate, ne: Coordinate) -> Self {
        CoordinateBounds { sw, ne }
    }

    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        CoordinateBounds { sw: coordinate, ne: coordinate }
    }

    /// Envelope of all coordinates, or `None` for an empty iterator.
    pub fn from_coordinates<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = coordinates.into_iter();
        let mut bounds = CoordinateBounds::from_coordinate(*iter.next()?);
        for coordinate in iter {
            bounds.extend(*coordinate);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, coordinate: Coordinate) {
        self.sw.latitude = self.sw.latitude.min(coordinate.latitude);
        self.sw.longitude = self.sw.longitude.min(coordinate.longitude);
        self.ne.latitude = self.ne.latitude.max(coordinate.latitude);
        self.ne.longitude = self.ne.longitude.max(coordinate.longitude);
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.sw.latitude..=self.ne.latitude).contains(&coordinate.latitude)
            && (self.sw.longitude..=self.ne.longitude).contains(&coordinate.longitude)
    }

    pub fn contains_bounds(&self, other: &CoordinateBounds) -> bool {
        self.contains(&other.sw) && self.contains(&other.ne)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.sw.latitude + self.ne.latitude) / 2.0,
            (self.sw.longitude + self.ne.longitude) / 2.0,
        )
    }

    pub fn latitude_span(&self) -> f64 {
        self.ne.latitude - self.sw.latitude
    }

    pub fn longitude_span(&self) -> f64 {
        self.ne.longitude - self.sw.longitude
    }

    /// True when the envelope encloses no area.
    pub fn is_empty(&self) -> bool {
        self.latitude_span() <= 0.0 || self.longitude_span() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_longitude_first() {
        let coordinate = Coordinate::from_position(&[-116.16, 34.01]).unwrap();
        assert_eq!(coordinate.latitude, 34.01);
        assert_eq!(coordinate.longitude, -116.16);
        assert_eq!(coordinate.to_position(), vec![-116.16, 34.01]);
    }

    #[test]
    fn short_or_non_finite_positions_are_rejected() {
        assert!(Coordinate::from_position(&[1.0]).is_none());
        assert!(Coordinate::from_position(&[f64::NAN, 1.0]).is_none());
    }

    #[test]
    fn bounds_cover_every_coordinate() {
        let points = [
            Coordinate::new(34.0, -116.2),
            Coordinate::new(34.1, -116.0),
            Coordinate::new(33.9, -116.1),
        ];
        let bounds = CoordinateBounds::from_coordinates(&points).unwrap();
        assert_eq!(bounds.sw, Coordinate::new(33.9, -116.2));
        assert_eq!(bounds.ne, Coordinate::new(34.1, -116.0));
        assert!(points.iter().all(|p| bounds.contains(p)));
        assert!(!bounds.is_empty());
    }

    #[test]
    fn single_point_bounds_are_empty() {
        let bounds = CoordinateBounds::from_coordinate(Coordinate::new(1.0, 2.0));
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), Coordinate::new(1.0, 2.0));
    }

    #[test]
    fn no_coordinates_no_bounds() {
        assert!(CoordinateBounds::from_coordinates(&[]).is_none());
    }
}
