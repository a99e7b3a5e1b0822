use crate::error::GmcError;

/// A verbatim message to send which requests the device configuration block
pub(crate) const REQUEST: &[u8] = b"<GETCFG>>";

/// Only the first 256 bytes are read; they contain the calibration points
pub(crate) const RESPONSE_LEN: usize = 256;

// Each calibration point is a big-endian u16 CPM value followed by a
// little-endian f32 µSv/h value.
const CPM_OFFSETS: [usize; 3] = [8, 14, 20];
const USV_OFFSETS: [usize; 3] = [10, 16, 22];

/// Derive the CPM → µSv/h conversion factor from the three calibration points
/// stored in the configuration block, averaging µSv/CPM across them.
pub(crate) fn parse_calibration_factor(data: &[u8]) -> Result<f64, GmcError> {
    let mut sum = 0.0;
    for (&cpm_at, &usv_at) in CPM_OFFSETS.iter().zip(USV_OFFSETS.iter()) {
        let cpm = u16::from_be_bytes([data[cpm_at], data[cpm_at + 1]]);
        let usv = f32::from_le_bytes([
            data[usv_at],
            data[usv_at + 1],
            data[usv_at + 2],
            data[usv_at + 3],
        ]);
        if cpm == 0 {
            return Err(GmcError::Protocol("calibration point with zero CPM"));
        }
        if !usv.is_finite() || usv <= 0.0 {
            return Err(GmcError::Protocol("calibration point out of range"));
        }
        sum += f64::from(usv) / f64::from(cpm);
    }
    Ok(sum / CPM_OFFSETS.len() as f64)
}

#[cfg(test)]
fn config_with_points(points: [(u16, f32); 3]) -> Vec<u8> {
    let mut data = vec![0u8; RESPONSE_LEN];
    for (i, (cpm, usv)) in points.into_iter().enumerate() {
        data[CPM_OFFSETS[i]..CPM_OFFSETS[i] + 2].copy_from_slice(&cpm.to_be_bytes());
        data[USV_OFFSETS[i]..USV_OFFSETS[i] + 4].copy_from_slice(&usv.to_le_bytes());
    }
    data
}

#[test]
fn test_parse_calibration_factor() {
    // Factory calibration of a GMC-300E Plus: 0.0065 µSv/h per CPM
    let data = config_with_points([(60, 0.39), (240, 1.56), (1000, 6.5)]);
    let factor = parse_calibration_factor(&data).unwrap();
    assert!((factor - 0.0065).abs() < 1e-7);
}

#[test]
fn test_parse_calibration_factor_zero_cpm() {
    let data = config_with_points([(60, 0.39), (0, 1.56), (1000, 6.5)]);
    assert!(matches!(
        parse_calibration_factor(&data),
        Err(GmcError::Protocol(_))
    ));
}

#[test]
fn test_parse_calibration_factor_garbage_usv() {
    let data = config_with_points([(60, 0.39), (240, f32::NAN), (1000, 6.5)]);
    assert!(matches!(
        parse_calibration_factor(&data),
        Err(GmcError::Protocol(_))
    ));
}
