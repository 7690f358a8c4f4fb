//! End-to-end: sender → UDP → input server → joystick → simulation

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_test::assert_ok;

use gesture_arena::game::{EntityTag, ScreenSize, Simulation, SimulationConfig};
use gesture_arena::input::{DeviceRegistry, Joystick};
use gesture_arena::net::protocol::encode;
use gesture_arena::net::{ControlSender, InputServer};

async fn wait_for(stick: &Joystick, expected: (f32, f32)) {
    let poll = async {
        while stick.read() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll)
        .await
        .expect("update never arrived");
}

#[tokio::test]
async fn sender_updates_registered_joystick() {
    let devices = Arc::new(DeviceRegistry::new());
    let stick = devices.register("joystick1");

    let server = assert_ok!(InputServer::bind("127.0.0.1:0".parse().unwrap(), devices.clone()).await);
    let mut handle = assert_ok!(server.spawn());

    let sender = assert_ok!(ControlSender::connect(handle.local_addr(), "joystick1").await);
    assert_ok!(sender.send_raw(1.5, -2.25).await);
    wait_for(&stick, (1.5, -2.25)).await;

    assert!(handle.shutdown().await.is_some_and(|n| n >= 1));
    assert!(handle.shutdown().await.is_none());
}

#[tokio::test]
async fn malformed_and_unknown_datagrams_change_nothing() {
    let devices = Arc::new(DeviceRegistry::new());
    let stick = devices.register("joystick1");
    let mut handle = InputServer::bind("127.0.0.1:0".parse().unwrap(), devices.clone())
        .await
        .unwrap()
        .spawn()
        .unwrap();

    let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = handle.local_addr();

    // No separator.
    let mut no_separator = b"joystick1".to_vec();
    no_separator.extend_from_slice(&1.0f32.to_be_bytes());
    no_separator.extend_from_slice(&1.0f32.to_be_bytes());
    raw.send_to(&no_separator, target).await.unwrap();
    // Unregistered device.
    raw.send_to(&encode("joystick9", 3.0, 3.0).unwrap(), target).await.unwrap();
    // Short payload.
    raw.send_to(b"joystick1\r\n\x00\x00", target).await.unwrap();
    // A valid update sent last acts as a barrier: once it lands, the others
    // have been processed.
    raw.send_to(&encode("joystick1", 0.25, 0.5).unwrap(), target).await.unwrap();

    wait_for(&stick, (0.25, 0.5)).await;
    assert!(devices.get("joystick9").is_none());
    assert_eq!(handle.shutdown().await, Some(1));
}

#[tokio::test]
async fn received_input_steers_the_player() {
    let devices = Arc::new(DeviceRegistry::new());
    let left = devices.register("joystick1");
    let right = devices.register("joystick2");
    let mut handle = InputServer::bind("127.0.0.1:0".parse().unwrap(), devices.clone())
        .await
        .unwrap()
        .spawn()
        .unwrap();

    let config = SimulationConfig {
        enemy_spawn_interval: 0,
        seed: Some(3),
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(config, left.clone(), right.clone());

    let steer = ControlSender::connect(handle.local_addr(), "joystick1").await.unwrap();
    let aim = ControlSender::connect(handle.local_addr(), "joystick2").await.unwrap();
    steer.send_raw(2.0, -1.0).await.unwrap();
    aim.send_raw(1.0, 0.0).await.unwrap();
    wait_for(&left, (2.0, -1.0)).await;
    wait_for(&right, (1.0, 0.0)).await;

    sim.tick(ScreenSize::new(80.0, 24.0));
    let snap = sim.snapshot();
    let player = snap.iter().find(|e| e.tag == EntityTag::Player).unwrap();
    assert_eq!((player.x, player.y), (12.0, 19.0));
    assert_eq!(snap.iter().filter(|e| e.tag == EntityTag::Bullet).count(), 1);

    handle.stop();
    handle.stop();
    assert!(handle.shutdown().await.is_some());
}
