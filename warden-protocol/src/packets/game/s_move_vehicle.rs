//! Serverbound vehicle movement packet.

use std::io::{Cursor, Result};

use warden_utils::math::Vector3;
use warden_utils::serial::ReadFrom;

/// Sent by a client that controls the vehicle it is riding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SMoveVehicle {
    /// The vehicle's new position.
    pub position: Vector3<f64>,
    /// Vehicle yaw in degrees.
    pub yaw: f32,
    /// Vehicle pitch in degrees.
    pub pitch: f32,
    /// Whether the vehicle is on the ground.
    pub on_ground: bool,
}

impl ReadFrom for SMoveVehicle {
    fn read(data: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(Self {
            position: Vector3::new(f64::read(data)?, f64::read(data)?, f64::read(data)?),
            yaw: f32::read(data)?,
            pitch: f32::read(data)?,
            on_ground: bool::read(data)?,
        })
    }
}
