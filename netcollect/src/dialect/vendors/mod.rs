//! Built-in CLI dialects.
//!
//! Prompt patterns follow the ones published by
//! [scrapli](https://github.com/carlmontanari/scrapli) and scrapli_community.

pub mod arista_eos;
pub mod cisco_iosxe;
pub mod cisco_nxos;
pub mod juniper_junos;
pub mod linux;
pub mod nokia_sros;

use super::Dialect;

pub(super) fn builtin() -> Vec<Result<Dialect, regex::Error>> {
    vec![
        linux::dialect(),
        arista_eos::dialect(),
        cisco_iosxe::dialect(),
        cisco_nxos::dialect(),
        juniper_junos::dialect(),
        nokia_sros::dialect(),
    ]
}
