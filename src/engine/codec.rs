//! Fixed-width value codecs
//!
//! All scalars are stored little-endian; strings are raw UTF-8. A decode
//! of mismatched width means the key holds a value of a different type,
//! surfaced as a [`StoreError::Codec`] rather than a panic or a silent
//! default.

use crate::errors::{StoreError, StoreResult};

pub(crate) fn encode_bool(value: bool) -> [u8; 1] {
    [value as u8]
}

pub(crate) fn decode_bool(bytes: &[u8]) -> StoreResult<bool> {
    match bytes {
        [byte] => Ok(*byte != 0),
        _ => Err(width_error("bool", 1, bytes.len())),
    }
}

pub(crate) fn encode_i32(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}

pub(crate) fn decode_i32(bytes: &[u8]) -> StoreResult<i32> {
    let array: [u8; 4] = bytes
        .try_into()
        .map_err(|_| width_error("i32", 4, bytes.len()))?;
    Ok(i32::from_le_bytes(array))
}

pub(crate) fn encode_i64(value: i64) -> [u8; 8] {
    value.to_le_bytes()
}

pub(crate) fn decode_i64(bytes: &[u8]) -> StoreResult<i64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| width_error("i64", 8, bytes.len()))?;
    Ok(i64::from_le_bytes(array))
}

pub(crate) fn encode_f32(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

pub(crate) fn decode_f32(bytes: &[u8]) -> StoreResult<f32> {
    let array: [u8; 4] = bytes
        .try_into()
        .map_err(|_| width_error("f32", 4, bytes.len()))?;
    Ok(f32::from_le_bytes(array))
}

pub(crate) fn encode_f64(value: f64) -> [u8; 8] {
    value.to_le_bytes()
}

pub(crate) fn decode_f64(bytes: &[u8]) -> StoreResult<f64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| width_error("f64", 8, bytes.len()))?;
    Ok(f64::from_le_bytes(array))
}

pub(crate) fn decode_string(bytes: &[u8]) -> StoreResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|err| StoreError::Codec(format!("invalid UTF-8 string value: {}", err)))
}

fn width_error(kind: &str, expected: usize, actual: usize) -> StoreError {
    StoreError::Codec(format!(
        "expected {} bytes for {}, found {}",
        expected, kind, actual
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_roundtrip() {
        assert!(decode_bool(&encode_bool(true)).unwrap());
        assert!(!decode_bool(&encode_bool(false)).unwrap());
    }

    #[test]
    fn test_i32_roundtrip_extremes() {
        for value in [i32::MIN, -577, -1, 0, 1, 2049, i32::MAX] {
            assert_eq!(decode_i32(&encode_i32(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_i64_roundtrip_extremes() {
        for value in [i64::MIN, -9_301_481_313_131_789, 0, 136_978_203, i64::MAX] {
            assert_eq!(decode_i64(&encode_i64(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_f32_roundtrip_extremes() {
        for value in [f32::MIN, -9.999_123_5, 0.0, 1.1234, f32::MAX] {
            assert_eq!(decode_f32(&encode_f32(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_f64_roundtrip_extremes() {
        for value in [f64::MIN, 0.0, 1.123_456_789_100_001, f64::MAX] {
            assert_eq!(decode_f64(&encode_f64(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_scalars_are_little_endian() {
        assert_eq!(encode_i32(0x0A0B0C0D), [0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(encode_i64(1), [1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_wrong_width_is_codec_error() {
        assert!(matches!(decode_i32(&[1, 2, 3]), Err(StoreError::Codec(_))));
        assert!(matches!(decode_bool(&[1, 0]), Err(StoreError::Codec(_))));
        assert!(matches!(decode_f64(&[0; 4]), Err(StoreError::Codec(_))));
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        assert!(decode_string(b"plain ascii").is_ok());
        assert!(matches!(
            decode_string(&[0xFF, 0xFE, 0xFD]),
            Err(StoreError::Codec(_))
        ));
    }
}
