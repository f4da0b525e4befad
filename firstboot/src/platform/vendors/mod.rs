//! Built-in dialogs.

pub mod cisco;
pub mod ftd;
pub mod linux;

use super::DialogDefinition;
use crate::topology::OsFamily;

/// Every dialog registered by default.
pub fn builtin_dialogs() -> Vec<DialogDefinition> {
    vec![
        cisco::initial(OsFamily::Ios),
        cisco::initial(OsFamily::Iosxe),
        cisco::provision(OsFamily::Ios),
        cisco::provision(OsFamily::Iosxe),
        ftd::initial(),
        linux::initial(),
    ]
}
