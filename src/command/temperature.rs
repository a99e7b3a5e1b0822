use super::RESPONSE_TERMINATOR;
use crate::error::GmcError;

/// A verbatim message to send which requests the internal temperature.
/// Only supported by GMC-320 Re 3.01 or later.
pub(crate) const REQUEST: &[u8] = b"<GETTEMP>>";

/// The response is [integer part, hundredths, sign, 0xAA]
pub(crate) const RESPONSE_LEN: usize = 4;

pub(crate) fn parse(data: &[u8]) -> Result<f64, GmcError> {
    if data[3] != RESPONSE_TERMINATOR {
        return Err(GmcError::Protocol("missing response terminator"));
    }
    let magnitude = f64::from(data[0]) + f64::from(data[1]) / 100.0;
    if data[2] != 0 {
        Ok(-magnitude)
    } else {
        Ok(magnitude)
    }
}

#[test]
fn test_parse_temperature() {
    assert_eq!(parse(&[22, 50, 0, 0xaa]).unwrap(), 22.5);
    assert_eq!(parse(&[3, 25, 1, 0xaa]).unwrap(), -3.25);
}

#[test]
fn test_parse_temperature_bad_terminator() {
    assert!(matches!(
        parse(&[22, 50, 0, 0x00]),
        Err(GmcError::Protocol(_))
    ));
}
