//! Power and reset commands. None of these produce a response except
//! `<FACTORYRESET>>`, which acknowledges with a single 0xAA.

pub(crate) const ON_REQUEST: &[u8] = b"<POWERON>>";
pub(crate) const OFF_REQUEST: &[u8] = b"<POWEROFF>>";
pub(crate) const REBOOT_REQUEST: &[u8] = b"<REBOOT>>";
pub(crate) const FACTORY_RESET_REQUEST: &[u8] = b"<FACTORYRESET>>";
