//! Kernel command line parameters
//!
//! Report only: changing the command line needs a boot loader update and a
//! reboot, which is left to the administrator.

use crate::error::Result;
use crate::param::{Value, GRUB_PREFIX};
use crate::system::Host;

const CMDLINE: &str = "/proc/cmdline";

/// Value of `key=value`, `key` for a bare flag, NA when absent
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    let key = name.strip_prefix(GRUB_PREFIX).unwrap_or(name);
    let Some(cmdline) = host.read(CMDLINE)? else {
        return Ok(Value::Na);
    };
    let value = cmdline.split_whitespace().find_map(|token| match token.split_once('=') {
        Some((k, v)) if k == key => Some(v.to_string()),
        None if token == key => Some(token.to_string()),
        _ => None,
    });
    Ok(value.map(Value::Text).unwrap_or(Value::Na))
}
