use crate::error::GmcError;

/// A verbatim message to send which requests the hardware model and firmware revision
pub(crate) const REQUEST: &[u8] = b"<GETVER>>";

/// The response is 15 ASCII bytes: 8 for the model, 7 for the revision
pub(crate) const RESPONSE_LEN: usize = 15;

const MODEL_LEN: usize = 8;

/// Hardware model and firmware revision as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVersion {
    pub model: String,
    pub revision: String,
}

pub(crate) fn parse(data: &[u8]) -> Result<DeviceVersion, GmcError> {
    let text = std::str::from_utf8(data).map_err(|_| GmcError::Protocol("version is not ASCII"))?;
    if !text.is_ascii() {
        return Err(GmcError::Protocol("version is not ASCII"));
    }
    let (model, revision) = text.split_at(MODEL_LEN);
    Ok(DeviceVersion {
        model: model.trim().to_owned(),
        revision: revision.trim().to_owned(),
    })
}

#[test]
fn test_parse_version() {
    let version = parse(b"GMC-320 Re 3.01").unwrap();
    assert_eq!(version.model, "GMC-320");
    assert_eq!(version.revision, "Re 3.01");
}

#[test]
fn test_parse_version_not_ascii() {
    assert!(matches!(
        parse(&[0xff; RESPONSE_LEN]),
        Err(GmcError::Protocol(_))
    ));
}
