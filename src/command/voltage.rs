use crate::error::GmcError;

/// A verbatim message to send which requests the battery voltage
pub(crate) const REQUEST: &[u8] = b"<GETVOLT>>";

/// The response is a single byte holding tenths of a volt
pub(crate) const RESPONSE_LEN: usize = 1;

// GMC devices run off 3-4.2V batteries
const MAX_PLAUSIBLE_VOLTAGE_V: f64 = 10.0;

pub(crate) fn parse(data: &[u8]) -> Result<f64, GmcError> {
    let volts = f64::from(data[0]) / 10.0;
    if volts > MAX_PLAUSIBLE_VOLTAGE_V {
        return Err(GmcError::Protocol("battery voltage out of range"));
    }
    Ok(volts)
}

#[test]
fn test_parse_voltage() {
    assert_eq!(parse(&[42]).unwrap(), 4.2);
    assert_eq!(parse(&[0]).unwrap(), 0.0);
}

#[test]
fn test_parse_voltage_out_of_range() {
    assert!(matches!(parse(&[255]), Err(GmcError::Protocol(_))));
}
