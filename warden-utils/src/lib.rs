//! Shared building blocks for the Warden crates: math, locks, wire codecs,
//! wall-clock access and legacy-formatted message templates.

pub mod clock;
pub mod codec;
pub mod locks;
pub mod math;
pub mod serial;
pub mod template;
