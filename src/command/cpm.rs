/// A verbatim message to send which requests the current counts-per-minute
pub(crate) const REQUEST: &[u8] = b"<GETCPM>>";

/// The response is a single big-endian u16
pub(crate) const RESPONSE_LEN: usize = 2;

pub(crate) fn parse(data: &[u8]) -> u16 {
    u16::from_be_bytes([data[0], data[1]])
}

#[test]
fn test_parse_cpm() {
    assert_eq!(parse(&[0x00, 0x64]), 100);
    assert_eq!(parse(&[0x01, 0x00]), 256);
    assert_eq!(parse(&[0x00, 0x00]), 0);
}
