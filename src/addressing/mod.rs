//! KNX bus addressing.
//!
//! Two address spaces exist on the bus:
//! - Individual addresses identify physical devices (Area.Line.Device)
//! - Group addresses identify logical multicast destinations (Main/Middle/Sub)
//!
//! Both are 16-bit values transmitted big-endian inside the telegram.

pub mod group;
pub mod individual;

pub use group::GroupAddress;
pub use individual::IndividualAddress;
