//! Polyline6 shape codec.
//!
//! Each coordinate is stored as a delta from the previous one, scaled by
//! 1e6, zig-zag folded and emitted as little-endian 5-bit groups biased by
//! 63. Bit 0x20 marks that another group follows.

use crate::error::ShapeError;
use crate::models::GeoPoint;

const PRECISION: f64 = 1e6;
const BIAS: u8 = 63;
const CONTINUATION: u64 = 0x20;
const GROUP_MASK: u64 = 0x1f;

/// Decode a polyline6 string into points, in encounter order.
pub fn decode(shape: &str) -> Result<Vec<GeoPoint>, ShapeError> {
    let bytes = shape.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut index = 0usize;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        lon = accumulate(lon, bytes, &mut index)?;
        points.push(GeoPoint::new(lat as f64 / PRECISION, lon as f64 / PRECISION));
    }

    Ok(points)
}

/// Encode points as polyline6. Inverse of [`decode`] at 1e-6 precision.
pub fn encode(points: &[GeoPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lon = (point.lon * PRECISION).round() as i64;
        write_value(&mut out, lat - prev_lat);
        write_value(&mut out, lon - prev_lon);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

/// Add the next delta to `total`; a sum past `i64` is an overflow of the
/// value that produced it.
fn accumulate(total: i64, bytes: &[u8], index: &mut usize) -> Result<i64, ShapeError> {
    let start = *index;
    let delta = read_value(bytes, index)?;
    total
        .checked_add(delta)
        .ok_or(ShapeError::Overflow { offset: start })
}

fn read_value(bytes: &[u8], index: &mut usize) -> Result<i64, ShapeError> {
    let start = *index;
    let mut result: u64 = 0;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(ShapeError::Truncated { offset: start });
        };
        if byte < BIAS || byte > BIAS + 0x3f {
            return Err(ShapeError::InvalidByte {
                offset: *index,
                byte,
            });
        }
        if shift > 60 {
            return Err(ShapeError::Overflow { offset: start });
        }

        let chunk = u64::from(byte - BIAS);
        let group = chunk & GROUP_MASK;
        // The last group has room for 4 bits only.
        if (group << shift) >> shift != group {
            return Err(ShapeError::Overflow { offset: start });
        }
        *index += 1;
        result |= group << shift;
        shift += 5;

        if chunk < CONTINUATION {
            break;
        }
    }

    // Zig-zag: low bit carries the sign.
    let value = if result & 1 == 1 {
        !((result >> 1) as i64)
    } else {
        (result >> 1) as i64
    };
    Ok(value)
}

fn write_value(out: &mut String, value: i64) {
    let mut folded: u64 = if value < 0 {
        (!(value << 1)) as u64
    } else {
        (value << 1) as u64
    };

    while folded >= CONTINUATION {
        let group = (CONTINUATION | (folded & GROUP_MASK)) as u8 + BIAS;
        out.push(char::from(group));
        folded >>= 5;
    }
    out.push(char::from(folded as u8 + BIAS));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_shape() {
        // Google's reference polyline, re-read at precision 5 by scaling.
        let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        let scaled: Vec<(f64, f64)> = points
            .iter()
            .map(|p| ((p.lat * 10.0 * 1e5).round() / 1e5, (p.lon * 10.0 * 1e5).round() / 1e5))
            .collect();
        assert_eq!(
            scaled,
            vec![(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)]
        );
    }

    #[test]
    fn encode_then_decode_recovers_points() {
        let points = vec![
            GeoPoint::new(45.464211, 9.189982),
            GeoPoint::new(45.464311, 9.190001),
            GeoPoint::new(-33.868820, 151.209296),
            GeoPoint::new(0.0, -0.000001),
            GeoPoint::new(89.999999, -179.999999),
        ];
        let decoded = decode(&encode(&points)).unwrap();
        assert_eq!(decoded.len(), points.len());
        for (a, b) in decoded.iter().zip(&points) {
            assert!((a.lat - b.lat).abs() < 5e-7);
            assert!((a.lon - b.lon).abs() < 5e-7);
        }
    }

    #[test]
    fn empty_shape_decodes_to_nothing() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn truncated_continuation_is_malformed() {
        let shape = encode(&[GeoPoint::new(45.5, 9.25)]);
        let cut = &shape[..shape.len() - 1];
        assert!(matches!(decode(cut), Err(ShapeError::Truncated { .. })));
    }

    #[test]
    fn missing_longitude_is_malformed() {
        // "?" is a complete zero latitude delta with no longitude after it.
        assert_eq!(decode("?"), Err(ShapeError::Truncated { offset: 1 }));
    }

    #[test]
    fn bytes_outside_alphabet_are_rejected() {
        assert!(matches!(
            decode("??\n?"),
            Err(ShapeError::InvalidByte { offset: 2, byte: b'\n' })
        ));
    }

    #[test]
    fn endless_continuation_overflows() {
        let shape = "~".repeat(20);
        assert!(matches!(decode(&shape), Err(ShapeError::Overflow { offset: 0 })));
    }

    #[test]
    fn bits_past_the_top_of_the_value_overflow() {
        // Twelve full groups fill 60 bits; a fifth bit in the 13th is lost.
        let shape = format!("{}^?", "~".repeat(12));
        assert_eq!(decode(&shape), Err(ShapeError::Overflow { offset: 0 }));
    }

    #[test]
    fn running_sum_past_i64_overflows() {
        let mut shape = String::new();
        for _ in 0..2 {
            write_value(&mut shape, 1 << 62);
            write_value(&mut shape, 0);
        }
        let second_lat = shape.len() / 2;
        assert_eq!(
            decode(&shape),
            Err(ShapeError::Overflow { offset: second_lat })
        );
    }
}
