//! Movement validation: impossible positions, rotations and travel speeds.

use warden_protocol::ServerboundGamePacket;
use warden_protocol::packets::game::{CPlayerPosition, Rotation, SMovePlayer, SMoveVehicle};
use warden_utils::math::Vector3;

use super::detection::DetectionBase;
use super::violation::Violation;
use super::{CheckContext, CheckKind, Detection, PacketEvent};

/// Coordinates beyond this magnitude are outside the hard world border.
pub const WORLD_BORDER: f64 = 29_999_999.0;
/// Value produced by clients that overflow a float rotation.
pub const ROTATION_SENTINEL: f32 = 9.223_372e18;
/// Rotations beyond this magnitude are never produced by a vanilla client.
pub const ROTATION_LIMIT: f32 = 80_000.0;
/// Maximum absolute pitch, with a little slack for float rounding.
pub const MAX_PITCH: f32 = 90.01;
/// Horizontal distance per packet above which a move is suspicious.
pub const MAX_DELTA_XZ: f64 = 5.0;
/// Suspicious horizontal moves tolerated before a kick.
pub const DELTA_BUFFER_LIMIT: u32 = 5;
/// Chunk changes closer together than this are suspicious.
pub const MIN_CHUNK_TRAVEL_MILLIS: u64 = 20;
/// Suspicious chunk changes tolerated before a kick.
pub const CHUNK_BUFFER_LIMIT: u32 = 5;
/// Delta checks are suspended for this long after a server teleport.
pub const TELEPORT_GRACE_MILLIS: u64 = 1000;

/// Width of one column of the coarse chunk grid used for travel tracking.
const CHUNK_GRID: f64 = 32.0;

/// Detects movement packets no legitimate client sends.
#[derive(Debug)]
pub struct InvalidMoveCheck {
    base: DetectionBase,
    last_chunk_id: Option<f64>,
    last_chunk_change_millis: u64,
    chunk_travel_buffer: u32,
    delta_buffer: u32,
    last_location: Option<Vector3<f64>>,
    last_teleport_millis: Option<u64>,
}

impl Detection for InvalidMoveCheck {
    const KIND: Option<CheckKind> = Some(CheckKind::InvalidMove);

    fn base(&self) -> &DetectionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DetectionBase {
        &mut self.base
    }
}

impl InvalidMoveCheck {
    /// Creates the check for a connection that joined at `now_millis`.
    ///
    /// The join time counts as the last chunk change, so a chunk change within
    /// the first 20 ms of a session is already suspicious.
    #[must_use]
    pub const fn new(now_millis: u64) -> Self {
        Self {
            base: DetectionBase::new(<Self as Detection>::KIND),
            last_chunk_id: None,
            last_chunk_change_millis: now_millis,
            chunk_travel_buffer: 0,
            delta_buffer: 0,
            last_location: None,
            last_teleport_millis: None,
        }
    }

    /// Current value of the horizontal delta buffer.
    #[must_use]
    pub const fn delta_buffer(&self) -> u32 {
        self.delta_buffer
    }

    /// Current value of the chunk travel buffer.
    #[must_use]
    pub const fn chunk_travel_buffer(&self) -> u32 {
        self.chunk_travel_buffer
    }

    /// Last accepted position, `None` before the first position update.
    #[must_use]
    pub const fn last_location(&self) -> Option<Vector3<f64>> {
        self.last_location
    }

    /// Handles a decoded serverbound packet. Packets outside the movement family
    /// are ignored.
    pub fn handle_inbound(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<ServerboundGamePacket>,
    ) {
        let packet = *event.packet();
        match packet {
            ServerboundGamePacket::MovePlayer(packet) => self.handle_move(ctx, event, &packet),
            ServerboundGamePacket::MoveVehicle(packet) => self.handle_vehicle(ctx, event, &packet),
            ServerboundGamePacket::Other(_) => {}
        }
    }

    /// Records a server teleport, opening the grace window.
    pub const fn handle_teleport(&mut self, now_millis: u64, _packet: &CPlayerPosition) {
        self.last_teleport_millis = Some(now_millis);
    }

    fn handle_move<P>(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<P>,
        packet: &SMovePlayer,
    ) {
        if let Some(rotation) = packet.rotation {
            self.check_rotation(ctx, event, rotation);
        }

        let Some(position) = packet.position else {
            return;
        };
        let now = ctx.now_millis();
        let chunk_id = chunk_id(&position);

        if position.is_finite() {
            if let Some(last) = self.last_location {
                self.check_delta(ctx, event, &position, &last, now);
            }
            self.check_chunk_travel(ctx, event, chunk_id, now);
            if exceeds_border(&position) {
                self.base
                    .report_violation(ctx, event, Violation::ban("Moved out of border"));
            }
        }

        self.check_extreme_values(ctx, event, &position, packet.rotation);

        self.last_location = Some(position);
        self.last_chunk_id = Some(chunk_id);
    }

    /// Vehicle telemetry only gets the numeric validity checks.
    fn handle_vehicle<P>(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<P>,
        packet: &SMoveVehicle,
    ) {
        self.check_extreme_values(
            ctx,
            event,
            &packet.position,
            Some(Rotation::new(packet.yaw, packet.pitch)),
        );
    }

    fn check_rotation<P>(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<P>,
        rotation: Rotation,
    ) {
        let Rotation { yaw, pitch } = rotation;
        if pitch.abs() > MAX_PITCH {
            self.base.report_violation(
                ctx,
                event,
                Violation::kick(format!("Pitch at {:.2}", pitch.abs())),
            );
        }

        if rotation_out_of_range(yaw) || rotation_out_of_range(pitch) {
            self.base.report_violation(
                ctx,
                event,
                Violation::kick(format!("Yaw: {yaw:.4}, Pitch: {pitch:.4}")),
            );
        }
    }

    fn check_delta<P>(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<P>,
        position: &Vector3<f64>,
        last: &Vector3<f64>,
        now: u64,
    ) {
        let delta = position.abs_diff(last);
        if !delta.is_finite() {
            return;
        }
        let delta_xz = delta.horizontal_length();
        let in_grace = self
            .last_teleport_millis
            .is_some_and(|teleport| now.saturating_sub(teleport) <= TELEPORT_GRACE_MILLIS);

        if delta_xz > MAX_DELTA_XZ {
            if !in_grace {
                self.delta_buffer = self.delta_buffer.saturating_add(1);
                if self.delta_buffer > DELTA_BUFFER_LIMIT {
                    self.base.report_violation(
                        ctx,
                        event,
                        Violation::kick(format!("Invalid deltaXZ: {delta_xz:.2}")),
                    );
                }
            }
        } else {
            self.delta_buffer = self.delta_buffer.saturating_sub(1);
        }

        if !in_grace && delta.to_array().into_iter().any(is_flagrant_delta) {
            self.base.report_violation(
                ctx,
                event,
                Violation::kick(format!(
                    "X: {:.2} Y: {:.2} Z: {:.2}",
                    delta.x, delta.y, delta.z
                )),
            );
        }
    }

    fn check_chunk_travel<P>(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<P>,
        chunk_id: f64,
        now: u64,
    ) {
        if self.last_chunk_id == Some(chunk_id) {
            return;
        }

        let elapsed = now.saturating_sub(self.last_chunk_change_millis);
        self.last_chunk_change_millis = now;

        if elapsed < MIN_CHUNK_TRAVEL_MILLIS {
            self.chunk_travel_buffer = self.chunk_travel_buffer.saturating_add(1);
            if self.chunk_travel_buffer > CHUNK_BUFFER_LIMIT {
                let chunks = self.chunk_travel_buffer;
                self.base.report_violation(
                    ctx,
                    event,
                    Violation::kick(format!(
                        "Traveled {chunks} chunks in ~{}ms",
                        elapsed / u64::from(chunks)
                    )),
                );
            }
        } else {
            self.chunk_travel_buffer = self.chunk_travel_buffer.saturating_sub(1);
        }
    }

    fn check_extreme_values<P>(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<P>,
        position: &Vector3<f64>,
        rotation: Option<Rotation>,
    ) {
        if !position.is_finite() {
            self.base
                .report_violation(ctx, event, Violation::kick("Extreme values: double"));
        }

        if let Some(Rotation { yaw, pitch }) = rotation
            && (yaw.is_infinite() || pitch.is_infinite())
        {
            self.base
                .report_violation(ctx, event, Violation::kick("Extreme values: float"));
        }
    }
}

/// Coarse grid cell id. Distinct cells may share an id; only changes matter.
#[must_use]
pub fn chunk_id(position: &Vector3<f64>) -> f64 {
    (position.x / CHUNK_GRID).floor() + (position.z / CHUNK_GRID).floor()
}

fn exceeds_border(position: &Vector3<f64>) -> bool {
    position
        .to_array()
        .into_iter()
        .any(|axis| axis.abs() > WORLD_BORDER)
}

fn rotation_out_of_range(value: f32) -> bool {
    value < -ROTATION_LIMIT || value > ROTATION_LIMIT || value == ROTATION_SENTINEL
}

/// Whole-number jumps of more than a thousand blocks, typical of blink exploits.
fn is_flagrant_delta(delta: f64) -> bool {
    delta >= 10.0 && delta % 1.0 == 0.0 && delta > 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_uses_floor() {
        assert_eq!(chunk_id(&Vector3::new(0.5, 64.0, 0.5)), 0.0);
        assert_eq!(chunk_id(&Vector3::new(-0.5, 64.0, 0.5)), -1.0);
        assert_eq!(chunk_id(&Vector3::new(33.0, 64.0, 65.0)), 3.0);
    }

    #[test]
    fn border_is_exclusive() {
        assert!(!exceeds_border(&Vector3::new(WORLD_BORDER, 0.0, 0.0)));
        assert!(exceeds_border(&Vector3::new(0.0, -30_000_000.0, 0.0)));
    }

    #[test]
    fn rotation_range() {
        assert!(!rotation_out_of_range(80_000.0));
        assert!(rotation_out_of_range(-80_000.5));
        assert!(rotation_out_of_range(ROTATION_SENTINEL));
        assert!(!rotation_out_of_range(f32::NAN));
    }

    #[test]
    fn flagrant_deltas_must_be_whole_and_large() {
        assert!(is_flagrant_delta(1001.0));
        assert!(!is_flagrant_delta(1000.0));
        assert!(!is_flagrant_delta(1500.5));
        assert!(!is_flagrant_delta(12.0));
    }

    #[test]
    fn fresh_check_has_no_location() {
        let check = InvalidMoveCheck::new(0);
        assert!(check.last_location().is_none());
        assert_eq!(check.delta_buffer(), 0);
        assert_eq!(check.violations(), 0);
    }
}
