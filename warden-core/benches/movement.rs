#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use uuid::Uuid;
use warden_core::check::alert::AlertMessage;
use warden_core::{
    ConfigStore, ConnectionError, ConnectionId, NetworkConnection, PlayerIdentity, Warden,
};
use warden_protocol::packets::ids::serverbound::{S_MOVE_PLAYER_POS, S_MOVE_PLAYER_POS_ROT};
use warden_utils::clock::ManualClock;

struct NullConnection;

impl NetworkConnection for NullConnection {
    fn send_system_message(&self, _message: &str) {}
    fn send_alert(&self, _alert: &AlertMessage) {}
    fn disconnect_with_reason(&self, _reason: &str) -> Result<(), ConnectionError> {
        Ok(())
    }
    fn latency(&self) -> i32 {
        0
    }
    fn has_permission(&self, _permission: &str) -> bool {
        false
    }
}

fn setup() -> (Warden, Arc<ManualClock>, ConnectionId) {
    let clock = Arc::new(ManualClock::new(0));
    let warden = Warden::builder(ConfigStore::default())
        .clock(clock.clone())
        .build();
    let id = ConnectionId(Uuid::new_v4());
    warden.on_connect(
        PlayerIdentity {
            id,
            entity_id: 1,
            name: String::from("Bench"),
            protocol_version: 769,
            client_version: String::from("1.21.4"),
            address: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 25565),
            operator: false,
        },
        Arc::new(NullConnection),
    );
    (warden, clock, id)
}

fn payload(x: f64, rotation: Option<(f32, f32)>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(33);
    buf.extend_from_slice(&x.to_be_bytes());
    buf.extend_from_slice(&64.0f64.to_be_bytes());
    buf.extend_from_slice(&0.5f64.to_be_bytes());
    if let Some((yaw, pitch)) = rotation {
        buf.extend_from_slice(&yaw.to_be_bytes());
        buf.extend_from_slice(&pitch.to_be_bytes());
    }
    buf.push(1);
    buf
}

// ── Hot path ────────────────────────────────────────────────────────────────

fn bench_walking(c: &mut Criterion) {
    let (warden, clock, id) = setup();
    // Walks back and forth so the loop never jumps.
    let packets: Vec<Vec<u8>> = (0..64)
        .map(|i: i32| payload(f64::from(32 - (i - 32).abs()) * 0.2, None))
        .collect();

    c.bench_function("movement_walking_pos", |b| {
        b.iter(|| {
            for packet in &packets {
                clock.advance(50);
                black_box(warden.handle_inbound(id, S_MOVE_PLAYER_POS, black_box(packet)));
            }
        });
    });
}

fn bench_packet_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("movement_packet_kind");
    for (name, packet_id, rotation) in [
        ("pos", S_MOVE_PLAYER_POS, None),
        ("pos_rot", S_MOVE_PLAYER_POS_ROT, Some((90.0, 12.5))),
    ] {
        let (warden, clock, id) = setup();
        let packet = payload(0.5, rotation);
        group.bench_with_input(BenchmarkId::from_parameter(name), &packet, |b, packet| {
            b.iter(|| {
                clock.advance(50);
                black_box(warden.handle_inbound(id, packet_id, black_box(packet)))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walking, bench_packet_kinds);
criterion_main!(benches);
