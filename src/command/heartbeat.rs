/// Turn on heartbeat mode: the device pushes one CPS sample every second
pub(crate) const ENABLE_REQUEST: &[u8] = b"<HEARTBEAT1>>";

/// Turn off heartbeat mode
pub(crate) const DISABLE_REQUEST: &[u8] = b"<HEARTBEAT0>>";

/// Each pushed sample is a big-endian u16 with the count in the low 14 bits
pub(crate) const SAMPLE_LEN: usize = 2;

const CPS_MASK: u16 = 0x3fff;

pub(crate) fn parse_sample(data: &[u8]) -> u16 {
    u16::from_be_bytes([data[0], data[1]]) & CPS_MASK
}

#[test]
fn test_parse_sample_masks_status_bits() {
    assert_eq!(parse_sample(&[0x00, 0x05]), 5);
    assert_eq!(parse_sample(&[0xc0, 0x05]), 5);
    assert_eq!(parse_sample(&[0x3f, 0xff]), 0x3fff);
}
