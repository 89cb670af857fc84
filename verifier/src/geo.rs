// Copyright (c) 2018-2025 The Botho Foundation

//! Geohash bucketing and great-circle distance.
//!
//! Reports disclose only the geohash cell of the vehicle. The speed check
//! compares cell centers.

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Cell size used by reports, about 150 m x 150 m.
pub const DEFAULT_GEOHASH_PRECISION: usize = 7;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Encode a position as a geohash of `precision` characters.
pub fn encode(lat: f64, lon: f64, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut out = String::with_capacity(precision);
    let mut even = true;
    let mut ch = 0usize;
    let mut bit = 0;

    while out.len() < precision {
        let (range, value) = if even {
            (&mut lon_range, lon)
        } else {
            (&mut lat_range, lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        if value > mid {
            ch |= 1 << (4 - bit);
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even = !even;

        if bit < 4 {
            bit += 1;
        } else {
            out.push(BASE32[ch] as char);
            bit = 0;
            ch = 0;
        }
    }
    out
}

/// Center `(lat, lon)` of a geohash cell, or `None` for an empty string or a
/// character outside the geohash alphabet.
pub fn decode_center(geohash: &str) -> Option<(f64, f64)> {
    if geohash.is_empty() {
        return None;
    }
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut even = true;

    for c in geohash.bytes() {
        let cd = BASE32.iter().position(|&b| b == c)?;
        for shift in (0..5).rev() {
            let range = if even { &mut lon_range } else { &mut lat_range };
            let mid = (range.0 + range.1) / 2.0;
            if cd & (1 << shift) != 0 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
    }

    Some((
        (lat_range.0 + lat_range.1) / 2.0,
        (lon_range.0 + lon_range.1) / 2.0,
    ))
}

/// Haversine distance in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dl = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Distance in meters between the centers of two cells.
pub fn cell_distance_m(a: &str, b: &str) -> Option<f64> {
    let (lat1, lon1) = decode_center(a)?;
    let (lat2, lon2) = decode_center(b)?;
    Some(haversine_m(lat1, lon1, lat2, lon2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_geohash() {
        // Jutland, the canonical geohash example.
        assert_eq!(encode(57.64911, 10.40744, 11), "u4pruydqqvj");
        let beijing = encode(39.9042, 116.4074, DEFAULT_GEOHASH_PRECISION);
        assert_eq!(beijing.len(), 7);
        assert!(beijing.starts_with("wx4g"));
    }

    #[test]
    fn invalid_cells_do_not_decode() {
        assert!(decode_center("").is_none());
        assert!(decode_center("wx4a").is_none());
        assert!(decode_center("gX").is_none());
    }

    #[test]
    fn haversine_known_distance() {
        // One degree of latitude is about 111.2 km.
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 10.0);
        assert_eq!(haversine_m(10.0, 10.0, 10.0, 10.0), 0.0);
    }

    proptest! {
        #[test]
        fn center_lies_in_cell(lat in -89.9f64..89.9, lon in -179.9f64..179.9) {
            let cell = encode(lat, lon, DEFAULT_GEOHASH_PRECISION);
            let (clat, clon) = decode_center(&cell).unwrap();
            prop_assert_eq!(encode(clat, clon, DEFAULT_GEOHASH_PRECISION), cell);
            // A precision-7 cell is at most about 153 m x 153 m.
            prop_assert!(haversine_m(lat, lon, clat, clon) < 120.0);
        }
    }
}
