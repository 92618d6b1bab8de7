//! Convenience macros for building KNX addresses.
//!
//! Group-address tables and the device address are fixed at build time, so
//! both macros validate their components at compile time and expand to
//! const-evaluable expressions usable in `static` tables.

/// Creates a [`GroupAddress`](crate::addressing::GroupAddress) from 3-level
/// notation.
///
/// # Syntax
///
/// ```text
/// ga!(main/middle/sub)
/// ```
///
/// # Examples
///
/// ```
/// use knx_tpuart::addressing::GroupAddress;
/// use knx_tpuart::ga;
///
/// static SUBSCRIBED: [GroupAddress; 3] = [ga!(2 / 7 / 1), ga!(2 / 7 / 2), ga!(2 / 7 / 3)];
///
/// assert_eq!(SUBSCRIBED[0].raw(), 0x1701);
/// ```
///
/// Components are checked at compile time:
///
/// ```compile_fail
/// // main group > 31
/// let addr = knx_tpuart::ga!(32 / 0 / 0);
/// ```
#[macro_export]
macro_rules! ga {
    ($main:literal / $middle:literal / $sub:literal) => {{
        const _: () = {
            if $main > 31 {
                panic!("Main group must be 0-31");
            }
            if $middle > 7 {
                panic!("Middle group must be 0-7");
            }
            if $sub > 255 {
                panic!("Sub group must be 0-255");
            }
        };

        const RAW: u16 = (($main & 0x1F) << 11) | (($middle & 0x07) << 8) | ($sub & 0xFF);
        $crate::addressing::GroupAddress::from_raw(RAW)
    }};
}

/// Creates an [`IndividualAddress`](crate::addressing::IndividualAddress)
/// from its components.
///
/// # Syntax
///
/// ```text
/// pa!(area, line, device)
/// ```
///
/// Comma-separated because `1.1.12` does not tokenize as three integer
/// literals.
///
/// # Examples
///
/// ```
/// use knx_tpuart::pa;
///
/// let addr = pa!(1, 1, 12);
/// assert_eq!(addr.raw(), 0x110C);
/// ```
///
/// ```compile_fail
/// // area > 15
/// let addr = knx_tpuart::pa!(16, 0, 0);
/// ```
#[macro_export]
macro_rules! pa {
    ($area:literal, $line:literal, $device:literal) => {{
        const _: () = {
            if $area > 15 {
                panic!("Area must be 0-15");
            }
            if $line > 15 {
                panic!("Line must be 0-15");
            }
            if $device > 255 {
                panic!("Device must be 0-255");
            }
        };

        const RAW: u16 = (($area & 0x0F) << 12) | (($line & 0x0F) << 8) | ($device & 0xFF);
        $crate::addressing::IndividualAddress::from_raw(RAW)
    }};
}

#[cfg(test)]
mod tests {
    use crate::addressing::{GroupAddress, IndividualAddress};

    #[test]
    fn test_ga_macro() {
        assert_eq!(ga!(2 / 7 / 1), GroupAddress::from(0x1701));
        assert_eq!(ga!(0 / 0 / 0), GroupAddress::from(0x0000));
        assert_eq!(ga!(31 / 7 / 255), GroupAddress::from(0xFFFF));
    }

    #[test]
    fn test_pa_macro() {
        assert_eq!(pa!(1, 1, 12), IndividualAddress::from(0x110C));
        assert_eq!(pa!(15, 15, 255), IndividualAddress::from(0xFFFF));
    }
}
