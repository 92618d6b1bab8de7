//! Unified logging macro for the driver.
//!
//! The driver logs through a single macro that selects its backend from the
//! active feature flags:
//!
//! - `log` - routes to the `log` crate (hosted targets)
//! - `defmt` - routes to `defmt` (embedded targets)
//! - neither - compiles to nothing (arguments are still type-checked)
//!
//! # Usage
//!
//! ```rust,ignore
//! knx_log!(info, "reset successful");
//! knx_log!(warn, "stray byte 0x{:02x}", byte);
//! ```

/// Unified logging macro - selects log::, defmt::, or no-op based on features
#[macro_export]
#[cfg(feature = "log")]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(feature = "defmt", not(feature = "log")))]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! knx_log {
    ($level:ident, $fmt:literal) => {{}};
    ($level:ident, $fmt:literal, $($arg:expr),* $(,)?) => {{
        // keep the arguments evaluated so the call sites compile identically
        // with and without a logging backend
        let _ = ($(&$arg),*);
    }};
}
