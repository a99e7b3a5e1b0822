/// A verbatim message to send which requests the device serial number
pub(crate) const REQUEST: &[u8] = b"<GETSERIAL>>";

/// The response is 7 raw bytes
pub(crate) const RESPONSE_LEN: usize = 7;

pub(crate) fn parse(data: &[u8]) -> String {
    hex::encode_upper(data)
}

#[test]
fn test_parse_serial_number() {
    assert_eq!(
        parse(&[0xf4, 0x88, 0x00, 0x35, 0x37, 0x2e, 0x07]),
        "F4880035372E07"
    );
}
