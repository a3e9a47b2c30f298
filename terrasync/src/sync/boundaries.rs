//! Geographic filtering of bucket directories.
//!
//! Scenery is organised in 10°×10° outer buckets (`Terrain/w010n50`) holding
//! 1°×1° inner buckets (`Terrain/w010n50/w004n52`). A bucket name gives the
//! south-west corner of the tile. Only directories whose name parses as a
//! bucket are ever filtered.

use crate::utils::errors::BoundaryError;

/// Size of an outer bucket, in degrees.
const OUTER_BUCKET_SPAN: i32 = 10;

/// Size of an inner bucket, in degrees.
const INNER_BUCKET_SPAN: i32 = 1;

/// South-west corner of a bucket, in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
    pub lat: i32,
    pub lon: i32,
}

impl Coordinate {
    /// Longitude and latitude ranges covered by the bucket, upper bounds
    /// exclusive: `((lon_min, lon_max), (lat_min, lat_max))`.
    pub fn bucket_span(&self, is_outer_bucket: bool) -> ((i32, i32), (i32, i32)) {
        let size = span(is_outer_bucket);
        ((self.lon, self.lon + size), (self.lat, self.lat + size))
    }
}

fn span(is_outer_bucket: bool) -> i32 {
    if is_outer_bucket {
        OUTER_BUCKET_SPAN
    } else {
        INNER_BUCKET_SPAN
    }
}

/// Parse a bucket name such as `w010n50` or `e005s12`.
///
/// The whole name must match `{w|e}DDD{n|s}DD`; `w` and `s` are negative.
pub fn name_to_coordinate(name: &str) -> Option<Coordinate> {
    let bytes = name.as_bytes();
    if bytes.len() != 7 {
        return None;
    }

    let lon_sign = match bytes[0] {
        b'e' => 1,
        b'w' => -1,
        _ => return None,
    };
    let lat_sign = match bytes[4] {
        b'n' => 1,
        b's' => -1,
        _ => return None,
    };

    let lon = digits(&bytes[1..4])?;
    let lat = digits(&bytes[5..7])?;

    Some(Coordinate {
        lat: lat_sign * lat,
        lon: lon_sign * lon,
    })
}

fn digits(bytes: &[u8]) -> Option<i32> {
    bytes.iter().try_fold(0i32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + i32::from(b - b'0'))
    })
}

/// Rectangular latitude/longitude filter.
///
/// `right < left` expresses a rectangle crossing the antimeridian; it is only
/// accepted when `left >= 0` and `right < 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadBoundaries {
    top: f64,
    left: f64,
    bottom: f64,
    right: f64,
}

impl DownloadBoundaries {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Result<Self, BoundaryError> {
        for lat in [top, bottom] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(BoundaryError::Latitude(lat));
            }
        }
        for lon in [left, right] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(BoundaryError::Longitude(lon));
            }
        }
        if top < bottom {
            return Err(BoundaryError::Inverted { top, bottom });
        }
        if right < left && !(left >= 0.0 && right < 0.0) {
            return Err(BoundaryError::BadWrap { left, right });
        }

        Ok(Self {
            top,
            left,
            bottom,
            right,
        })
    }

    /// The whole globe.
    pub fn world() -> Self {
        Self {
            top: 90.0,
            left: -180.0,
            bottom: -90.0,
            right: 180.0,
        }
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn wraps_antimeridian(&self) -> bool {
        self.right < self.left
    }

    /// Whether the bucket starting at `coord` overlaps the rectangle.
    ///
    /// A bucket is outside when its top edge is at or below `bottom`, or its
    /// bottom edge is above `top`; the same rule applies to longitude. When
    /// the rectangle wraps, a bucket east of the meridian is tested against
    /// `[left, 180]` and a bucket west of it against `[-180, right]`.
    pub fn is_inside(&self, coord: Coordinate, is_outer_bucket: bool) -> bool {
        let size = f64::from(span(is_outer_bucket));
        let lat = f64::from(coord.lat);
        let lon = f64::from(coord.lon);

        if lat + size <= self.bottom || lat > self.top {
            return false;
        }

        if self.wraps_antimeridian() {
            if lon >= 0.0 {
                lon + size > self.left
            } else {
                lon <= self.right
            }
        } else {
            !(lon + size <= self.left || lon > self.right)
        }
    }
}

impl Default for DownloadBoundaries {
    fn default() -> Self {
        Self::world()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_to_coordinate() {
        assert_eq!(
            name_to_coordinate("w010n05"),
            Some(Coordinate { lat: 5, lon: -10 })
        );
        assert_eq!(
            name_to_coordinate("e123s45"),
            Some(Coordinate { lat: -45, lon: 123 })
        );
        assert_eq!(name_to_coordinate("Terrain"), None);
        assert_eq!(name_to_coordinate("x010n05"), None);
        assert_eq!(name_to_coordinate("w01an05"), None);
        assert_eq!(name_to_coordinate("w010n05.stg"), None);
        assert_eq!(name_to_coordinate("w010n5"), None);
    }

    #[test]
    fn test_bucket_span() {
        let coord = name_to_coordinate("w010n05").unwrap();
        assert_eq!(coord.bucket_span(true), ((-10, 0), (5, 15)));
        assert_eq!(coord.bucket_span(false), ((-10, -9), (5, 6)));
    }

    #[test]
    fn test_world_contains_everything() {
        let world = DownloadBoundaries::new(90.0, -180.0, -90.0, 180.0).unwrap();
        for name in ["w010n05", "w180s90", "e170n80", "e000n00"] {
            let coord = name_to_coordinate(name).unwrap();
            assert!(world.is_inside(coord, true), "{name}");
            assert!(world.is_inside(coord, false), "{name}");
        }
    }

    #[test]
    fn test_half_open_edges() {
        // Alps: lat 45..48, lon 5..11
        let bounds = DownloadBoundaries::new(48.0, 5.0, 45.0, 11.0).unwrap();

        // inner buckets touching the rectangle from outside
        assert!(!bounds.is_inside(Coordinate { lat: 44, lon: 6 }, false));
        assert!(!bounds.is_inside(Coordinate { lat: 46, lon: 4 }, false));
        assert!(!bounds.is_inside(Coordinate { lat: 49, lon: 6 }, false));
        assert!(!bounds.is_inside(Coordinate { lat: 46, lon: 12 }, false));

        // buckets starting exactly on the top or right edge are kept
        assert!(bounds.is_inside(Coordinate { lat: 48, lon: 6 }, false));
        assert!(bounds.is_inside(Coordinate { lat: 46, lon: 11 }, false));

        // outer bucket e000n40 spans lon 0..10, lat 40..50
        assert!(bounds.is_inside(Coordinate { lat: 40, lon: 0 }, true));
        assert!(!bounds.is_inside(Coordinate { lat: 30, lon: 0 }, true));
    }

    #[test]
    fn test_antimeridian_wrap() {
        let bounds = DownloadBoundaries::new(90.0, 0.0, -90.0, -1.0).unwrap();
        assert!(bounds.wraps_antimeridian());
        // w010n05 as an outer bucket lies entirely west of the meridian
        let western = name_to_coordinate("w010n05").unwrap();
        assert!(bounds.is_inside(western, true));
        assert!(bounds.is_inside(Coordinate { lat: 0, lon: 20 }, true));

        // Pacific: 170E .. 170W
        let pacific = DownloadBoundaries::new(10.0, 170.0, -10.0, -170.0).unwrap();
        assert!(pacific.is_inside(Coordinate { lat: 0, lon: 175 }, false));
        assert!(pacific.is_inside(Coordinate { lat: 0, lon: -175 }, false));
        assert!(pacific.is_inside(Coordinate { lat: 0, lon: -170 }, false));
        assert!(!pacific.is_inside(Coordinate { lat: 0, lon: -160 }, false));
        assert!(!pacific.is_inside(Coordinate { lat: 0, lon: 160 }, false));
        assert!(!pacific.is_inside(Coordinate { lat: 0, lon: 169 }, false));
    }

    #[test]
    fn test_invalid_boundaries() {
        assert!(matches!(
            DownloadBoundaries::new(10.0, 0.0, 20.0, 5.0),
            Err(BoundaryError::Inverted { .. })
        ));
        assert!(matches!(
            DownloadBoundaries::new(91.0, 0.0, 0.0, 5.0),
            Err(BoundaryError::Latitude(_))
        ));
        assert!(matches!(
            DownloadBoundaries::new(10.0, -181.0, 0.0, 5.0),
            Err(BoundaryError::Longitude(_))
        ));
        assert!(matches!(
            DownloadBoundaries::new(10.0, -10.0, 0.0, -20.0),
            Err(BoundaryError::BadWrap { .. })
        ));
    }
}
