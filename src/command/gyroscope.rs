use super::RESPONSE_TERMINATOR;
use crate::error::GmcError;

/// A verbatim message to send which requests the gyroscope position.
/// Only supported by GMC-320 Re 3.01 or later.
pub(crate) const REQUEST: &[u8] = b"<GETGYRO>>";

/// The response is [XX XX YY YY ZZ ZZ 0xAA], each axis a big-endian u16
pub(crate) const RESPONSE_LEN: usize = 7;

/// The gyroscope position along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GyroscopePosition {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

pub(crate) fn parse(data: &[u8]) -> Result<GyroscopePosition, GmcError> {
    if data[6] != RESPONSE_TERMINATOR {
        return Err(GmcError::Protocol("missing response terminator"));
    }
    Ok(GyroscopePosition {
        x: u16::from_be_bytes([data[0], data[1]]),
        y: u16::from_be_bytes([data[2], data[3]]),
        z: u16::from_be_bytes([data[4], data[5]]),
    })
}

#[test]
fn test_parse_gyroscope() {
    let position = parse(&[0x01, 0x00, 0x00, 0x02, 0xff, 0xff, 0xaa]).unwrap();
    assert_eq!(
        position,
        GyroscopePosition {
            x: 256,
            y: 2,
            z: 0xffff,
        }
    );
}

#[test]
fn test_parse_gyroscope_bad_terminator() {
    assert!(matches!(
        parse(&[0, 0, 0, 0, 0, 0, 0x00]),
        Err(GmcError::Protocol(_))
    ));
}
