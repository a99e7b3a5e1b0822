use std::time::SystemTime;

/// CPM → µSv/h factor for a GMC-300E Plus, used when the device configuration
/// does not yield a usable calibration.
pub const DEFAULT_CALIBRATION_FACTOR: f64 = 0.0065;

/// A snapshot of the values reported by the Geiger counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Counts per minute from the Geiger tube
    pub cpm: u16,
    /// The equivalent dose rate in µSv/h, derived from `cpm`
    pub dose_rate_usv_h: f64,
    /// The battery voltage in V
    pub battery_voltage_v: f64,
    /// When the reading was taken
    pub taken_at: SystemTime,
}

impl Reading {
    /// Build a reading from raw device values. The dose rate is always derived
    /// from the CPM here so the two can never disagree.
    pub fn new(cpm: u16, battery_voltage_v: f64, calibration_factor: f64) -> Self {
        Self {
            cpm,
            dose_rate_usv_h: convert(cpm, calibration_factor),
            battery_voltage_v,
            taken_at: SystemTime::now(),
        }
    }
}

/// Convert a CPM count to a dose rate in µSv/h using a per-model calibration
/// factor.
pub fn convert(cpm: u16, calibration_factor: f64) -> f64 {
    f64::from(cpm) * calibration_factor
}

#[test]
fn test_convert_is_exact_product() {
    for cpm in [0u16, 1, 27, 100, u16::MAX] {
        for factor in [0.0065, 0.0081, 1.0] {
            assert_eq!(convert(cpm, factor), f64::from(cpm) * factor);
        }
    }
}

#[test]
fn test_reading_derives_dose_rate_from_cpm() {
    let reading = Reading::new(100, 4.2, DEFAULT_CALIBRATION_FACTOR);
    assert_eq!(reading.cpm, 100);
    assert_eq!(reading.dose_rate_usv_h, 0.65);
    assert_eq!(reading.battery_voltage_v, 4.2);
}
