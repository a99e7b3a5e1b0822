use super::RESPONSE_TERMINATOR;
use crate::error::GmcError;

/// A verbatim message to send which requests the device clock.
/// Supported by GMC-280 and GMC-300 Re 3.00 or later.
pub(crate) const GET_REQUEST: &[u8] = b"<GETDATETIME>>";

/// The response is [YY MM DD HH MM SS 0xAA], year offset from 2000
pub(crate) const GET_RESPONSE_LEN: usize = 7;

/// The device clock, as stored on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

pub(crate) fn parse(data: &[u8]) -> Result<DeviceDateTime, GmcError> {
    if data[6] != RESPONSE_TERMINATOR {
        return Err(GmcError::Protocol("missing response terminator"));
    }
    let datetime = DeviceDateTime {
        year: 2000 + u16::from(data[0]),
        month: data[1],
        day: data[2],
        hour: data[3],
        minute: data[4],
        second: data[5],
    };
    let plausible = (1..=12).contains(&datetime.month)
        && (1..=31).contains(&datetime.day)
        && datetime.hour < 24
        && datetime.minute < 60
        && datetime.second < 60;
    if !plausible {
        return Err(GmcError::Protocol("implausible date"));
    }
    Ok(datetime)
}

/// Build the frame which sets the device clock: `<SETDATETIME` followed by the
/// six date bytes and `>>`. The device acknowledges with a single 0xAA.
/// The year byte is an offset from 2000, so only 2000-2255 can be encoded.
pub(crate) fn set_request(datetime: &DeviceDateTime) -> Result<Vec<u8>, GmcError> {
    if !(2000..=2255).contains(&datetime.year) {
        return Err(GmcError::Protocol("year not encodable on the device"));
    }
    let mut frame = b"<SETDATETIME".to_vec();
    frame.push((datetime.year - 2000) as u8);
    frame.push(datetime.month);
    frame.push(datetime.day);
    frame.push(datetime.hour);
    frame.push(datetime.minute);
    frame.push(datetime.second);
    frame.extend_from_slice(b">>");
    Ok(frame)
}

#[test]
fn test_parse_datetime() {
    let datetime = parse(&[26, 8, 31, 13, 45, 7, 0xaa]).unwrap();
    assert_eq!(
        datetime,
        DeviceDateTime {
            year: 2026,
            month: 8,
            day: 31,
            hour: 13,
            minute: 45,
            second: 7,
        }
    );
}

#[test]
fn test_parse_datetime_bad_terminator() {
    assert!(matches!(
        parse(&[26, 8, 31, 13, 45, 7, 0x00]),
        Err(GmcError::Protocol(_))
    ));
}

#[test]
fn test_parse_datetime_implausible() {
    assert!(matches!(
        parse(&[26, 13, 31, 13, 45, 7, 0xaa]),
        Err(GmcError::Protocol(_))
    ));
}

#[test]
fn test_set_request_round_trips() {
    let datetime = DeviceDateTime {
        year: 2026,
        month: 8,
        day: 31,
        hour: 13,
        minute: 45,
        second: 7,
    };
    let frame = set_request(&datetime).unwrap();
    assert_eq!(&frame[..12], b"<SETDATETIME");
    assert_eq!(&frame[12..18], &[26, 8, 31, 13, 45, 7]);
    assert_eq!(&frame[18..], b">>");
}

#[test]
fn test_set_request_rejects_unencodable_year() {
    let mut datetime = DeviceDateTime {
        year: 2260,
        month: 8,
        day: 31,
        hour: 13,
        minute: 45,
        second: 7,
    };
    assert!(matches!(
        set_request(&datetime),
        Err(GmcError::Protocol(_))
    ));
    datetime.year = 1999;
    assert!(matches!(
        set_request(&datetime),
        Err(GmcError::Protocol(_))
    ));
}
