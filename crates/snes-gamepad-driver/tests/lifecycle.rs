//! End-to-end driver lifecycle tests against the scripted mock host.
//!
//! Covers attach filtering, slot exhaustion and reuse, detach, shutdown,
//! and the poll cycle as seen through the driver entry points.

use hid_snes_protocol::{Button, DeviceId, KeyCode, SnesReport};
use insta::assert_snapshot;
use proptest::prelude::*;
use snes_gamepad_driver::mock::{MockHost, MockRead, MockSources};
use snes_gamepad_driver::{
    AttachError, AttachHook, AttachRequest, ConfigError, DriverConfig, EndpointDescriptor,
    GamepadDriver, HookOutcome, HostEvent, InterfaceDescriptor, KEY_QUEUE_CAPACITY, MAX_GAMEPADS,
    SessionState, SlotRegistry, TransferError,
};

type Driver = GamepadDriver<MockHost, MockSources>;

const SN30: DeviceId = DeviceId::new(0x2DC8, 0x9018);

fn gamepad(device: u32) -> AttachRequest<u32> {
    AttachRequest {
        device,
        id: SN30,
        config_index: 0,
        interface: InterfaceDescriptor {
            number: 0,
            protocol: 0,
            endpoints: vec![EndpointDescriptor::interrupt_in(1, 8, 10)],
        },
    }
}

fn loaded() -> (Driver, MockHost, MockSources) {
    let mut driver = Driver::default();
    let mut host = MockHost::new();
    driver.init(&mut host);
    (driver, host, MockSources::new())
}

// ---------------------------------------------------------------------------
// Attach / detach
// ---------------------------------------------------------------------------

#[test]
fn ninth_attach_is_declined_without_mutation() {
    let (mut driver, mut host, mut sources) = loaded();

    for device in 0..MAX_GAMEPADS as u32 {
        let outcome = driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(device)));
        assert_eq!(outcome, HookOutcome::Claimed(device as usize));
    }

    let names_before: Vec<String> = sources.names().iter().map(|n| n.to_string()).collect();
    let started_before = host.started_count();

    let outcome = driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(100)));
    assert_eq!(outcome, HookOutcome::Declined);

    assert_eq!(driver.registry().occupied(), MAX_GAMEPADS);
    assert_eq!(driver.registry().find(&100), None);
    assert_eq!(sources.names(), names_before);
    assert_eq!(host.started_count(), started_before);
    assert_eq!(host.active_transfers(), MAX_GAMEPADS);
}

#[test]
fn registry_reports_no_free_slot() {
    let config = DriverConfig::default();
    let mut registry: SlotRegistry<MockHost, MockSources> = SlotRegistry::new(&config);
    let (mut host, mut sources) = (MockHost::new(), MockSources::new());

    for device in 0..MAX_GAMEPADS as u32 {
        assert_eq!(
            registry.attach(&mut host, &mut sources, gamepad(device)),
            Ok(device as usize)
        );
    }
    assert_eq!(
        registry.attach(&mut host, &mut sources, gamepad(100)),
        Err(AttachError::NoFreeSlot)
    );
}

#[test]
fn source_names_track_slot_reuse() {
    let (mut driver, mut host, mut sources) = loaded();
    for device in [7, 3, 9] {
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(device)));
    }
    driver.handle(&mut host, &mut sources, HostEvent::Detach(3));
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(4)));

    assert_snapshot!(sources.names().join(","), @"snes_gamepad0,snes_gamepad2,snes_gamepad1");
}

#[test]
fn unknown_detach_is_noop() {
    let (mut driver, mut host, mut sources) = loaded();
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));

    let outcome = driver.handle(&mut host, &mut sources, HostEvent::Detach(42));
    assert_eq!(outcome, HookOutcome::Released(0));
    assert_eq!(driver.registry().occupied(), 1);
    assert_eq!(host.cancelled_count(), 0);
    assert!(sources.unregistered().is_empty());
}

#[test]
fn detach_then_attach_reuses_lowest_slot() {
    let (mut driver, mut host, mut sources) = loaded();
    for device in [10, 11, 12] {
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(device)));
    }

    assert_eq!(
        driver.handle(&mut host, &mut sources, HostEvent::Detach(11)),
        HookOutcome::Released(1)
    );
    assert!(!driver.registry().is_occupied(1));
    assert!(!sources.is_registered("snes_gamepad1"));

    assert_eq!(
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(13))),
        HookOutcome::Claimed(1)
    );
    assert_eq!(driver.registry().source_name(1), Some("snes_gamepad1"));
    assert_eq!(driver.registry().find(&13), Some(1));
}

#[test]
fn keyboard_interface_is_declined() {
    let (mut driver, mut host, mut sources) = loaded();
    let mut request = gamepad(1);
    request.interface.protocol = 1;

    assert_eq!(
        driver.handle(&mut host, &mut sources, HostEvent::Attach(request)),
        HookOutcome::Declined
    );
    assert_eq!(host.started_count(), 0);
    assert!(host.control_requests().is_empty());
}

#[test]
fn strict_config_declines_unknown_devices() {
    let config = DriverConfig::strict();
    let mut registry: SlotRegistry<MockHost, MockSources> = SlotRegistry::new(&config);
    let (mut host, mut sources) = (MockHost::new(), MockSources::new());

    let mut unknown = gamepad(1);
    unknown.id = DeviceId::new(0x1234, 0x5678);
    assert_eq!(
        registry.attach(&mut host, &mut sources, unknown),
        Err(AttachError::NotAllowListed {
            vendor_id: 0x1234,
            product_id: 0x5678
        })
    );
    assert_eq!(registry.attach(&mut host, &mut sources, gamepad(2)), Ok(0));
}

#[test]
fn driver_rejects_empty_source_prefix() {
    let parsed = DriverConfig::from_json(r#"{ "source_prefix": "" }"#);
    assert!(matches!(parsed, Err(ConfigError::EmptyPrefix)));

    let config = DriverConfig {
        source_prefix: " ".to_string(),
        ..DriverConfig::default()
    };
    assert!(matches!(Driver::new(config), Err(ConfigError::EmptyPrefix)));
}

#[test]
fn interface_without_interrupt_in_is_declined() {
    let config = DriverConfig::default();
    let mut registry: SlotRegistry<MockHost, MockSources> = SlotRegistry::new(&config);
    let (mut host, mut sources) = (MockHost::new(), MockSources::new());

    let mut request = gamepad(1);
    request.interface.endpoints = vec![EndpointDescriptor {
        address: 0x01,
        attributes: 0x03,
        max_packet_size: 8,
        interval: 10,
    }];

    assert_eq!(
        registry.attach(&mut host, &mut sources, request),
        Err(AttachError::NoInterruptEndpoint)
    );
    assert_eq!(registry.occupied(), 0);
    assert_eq!(sources.count(), 0);
}

#[test]
fn failed_first_read_keeps_nothing() {
    let config = DriverConfig::default();
    let mut registry: SlotRegistry<MockHost, MockSources> = SlotRegistry::new(&config);
    let (mut host, mut sources) = (MockHost::new(), MockSources::new());
    host.fail_starts(1, true);

    assert_eq!(
        registry.attach(&mut host, &mut sources, gamepad(1)),
        Err(AttachError::ReadStart(TransferError::NoResources))
    );
    assert_eq!(registry.occupied(), 0);
    assert_eq!(sources.count(), 0);
    assert_eq!(host.active_transfers(), 0);

    host.fail_starts(1, false);
    assert_eq!(registry.attach(&mut host, &mut sources, gamepad(1)), Ok(0));
}

#[test]
fn rejected_source_cancels_first_read() {
    let (mut driver, mut host, mut sources) = loaded();
    sources.reject_registrations(true);

    assert_eq!(
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1))),
        HookOutcome::Declined
    );
    assert_eq!(host.started_count(), 1);
    assert_eq!(host.cancelled_count(), 1);
    assert_eq!(host.active_transfers(), 0);
    assert_eq!(driver.registry().occupied(), 0);
}

#[test]
fn fini_releases_everything() {
    let (mut driver, mut host, mut sources) = loaded();
    for device in 0..5 {
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(device)));
    }
    assert_eq!(host.hooks(), [AttachHook::HID]);

    driver.fini(&mut host, &mut sources);

    assert_eq!(driver.registry().occupied(), 0);
    assert_eq!(sources.count(), 0);
    assert_eq!(sources.unregistered().len(), 5);
    assert_eq!(host.active_transfers(), 0);
    assert_eq!(host.cancelled_count(), 5);
    assert!(host.hooks().is_empty());
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

#[test]
fn three_poll_end_to_end() {
    let (mut driver, mut host, mut sources) = loaded();
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));
    let left = SnesReport::BASELINE.with_x(0x00);

    assert_eq!(driver.poll(&mut host, 0), KeyCode::NoKey);

    host.queue_read(1, MockRead::Report(left));
    assert_eq!(driver.poll(&mut host, 0), KeyCode::Left);

    host.queue_read(1, MockRead::Report(left));
    assert_eq!(driver.poll(&mut host, 0), KeyCode::NoKey);

    let session = driver.registry().session(0);
    assert_eq!(session.map(|s| *s.previous_report()), Some(left));
    assert_eq!(session.map(|s| s.state()), Some(SessionState::ReadPending));
}

#[test]
fn registered_source_polls_its_own_slot() {
    let (mut driver, mut host, mut sources) = loaded();
    for device in [20, 21, 22] {
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(device)));
    }
    driver.handle(&mut host, &mut sources, HostEvent::Detach(20));
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(23)));

    host.queue_read(23, MockRead::Report(SnesReport::BASELINE.with_button(Button::Select)));
    host.queue_read(22, MockRead::Report(SnesReport::BASELINE.with_button(Button::L)));

    let pad = sources.handle("snes_gamepad0").and_then(|h| sources.slot(h));
    assert_eq!(pad, Some(0));
    assert_eq!(pad.map(|slot| driver.poll(&mut host, slot)), Some(KeyCode::Escape));

    let pad = sources.handle("snes_gamepad2").and_then(|h| sources.slot(h));
    assert_eq!(pad, driver.registry().find(&22));
    assert_eq!(pad.map(|slot| driver.poll(&mut host, slot)), Some(KeyCode::PageUp));
}

#[test]
fn burst_is_delivered_one_key_per_poll() {
    let (mut driver, mut host, mut sources) = loaded();
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));

    let burst = SnesReport::BASELINE
        .with_y(0xFF)
        .with_button(Button::A)
        .with_button(Button::B)
        .with_button(Button::R);
    host.queue_read(1, MockRead::Report(burst));

    let keys: Vec<KeyCode> = (0..4).map(|_| driver.poll(&mut host, 0)).collect();
    assert_eq!(
        keys,
        [
            KeyCode::Down,
            KeyCode::Enter,
            KeyCode::PageDown,
            KeyCode::NoKey
        ]
    );
}

#[test]
fn pads_are_polled_independently() {
    let (mut driver, mut host, mut sources) = loaded();
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(2)));

    host.queue_read(1, MockRead::Report(SnesReport::BASELINE.with_button(Button::X)));
    host.queue_read(2, MockRead::Report(SnesReport::BASELINE.with_button(Button::Y)));

    assert_eq!(driver.poll(&mut host, 1), KeyCode::CommandChar);
    assert_eq!(driver.poll(&mut host, 0), KeyCode::EditChar);
}

#[test]
fn transient_errors_do_not_detach() {
    let (mut driver, mut host, mut sources) = loaded();
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));

    host.queue_read(1, MockRead::Short(4));
    host.queue_read(1, MockRead::Fail(TransferError::Stall));
    host.queue_read(1, MockRead::Report(SnesReport::BASELINE.with_button(Button::L)));

    assert_eq!(driver.poll(&mut host, 0), KeyCode::NoKey);
    assert_eq!(driver.poll(&mut host, 0), KeyCode::NoKey);
    assert_eq!(driver.poll(&mut host, 0), KeyCode::PageUp);

    let stats = driver.registry().session(0).map(|s| s.stats());
    assert_eq!(
        stats.map(|s| (s.reports, s.short_reads, s.failed_reads)),
        Some((1, 1, 1))
    );
}

#[test]
fn dead_session_stays_attached_until_detach() {
    let (mut driver, mut host, mut sources) = loaded();
    driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));

    let start = SnesReport::BASELINE.with_button(Button::Start);
    host.queue_read(1, MockRead::Report(start));
    host.fail_starts(1, true);

    assert_eq!(driver.poll(&mut host, 0), KeyCode::NoKey);
    assert_eq!(driver.poll(&mut host, 0), KeyCode::Enter);
    assert_eq!(driver.poll(&mut host, 0), KeyCode::NoKey);
    assert!(driver.registry().session(0).is_some_and(|s| s.is_dead()));

    assert_eq!(
        driver.handle(&mut host, &mut sources, HostEvent::Detach(1)),
        HookOutcome::Released(1)
    );
    assert_eq!(host.cancelled_count(), 0, "dead session has no read to cancel");
    assert_eq!(sources.count(), 0);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn report_strategy() -> impl Strategy<Value = SnesReport> {
    (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(x, y, buttons)| {
        SnesReport::BASELINE.with_x(x).with_y(y).with_buttons(buttons)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_queue_never_exceeds_capacity(
        reports in proptest::collection::vec(report_strategy(), 1..80),
    ) {
        let mut driver = Driver::default();
        let (mut host, mut sources) = (MockHost::new(), MockSources::new());
        driver.init(&mut host);
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));

        for report in &reports {
            host.queue_read(1, MockRead::Report(*report));
        }
        let _ = driver.poll(&mut host, 0);
        let queued = driver.registry().session(0).map_or(0, |s| s.queued());
        prop_assert!(queued <= KEY_QUEUE_CAPACITY);
        prop_assert_eq!(host.active_transfers(), 1);
    }

    #[test]
    fn prop_poll_never_fails(
        reports in proptest::collection::vec(report_strategy(), 0..40),
        polls in 0usize..120,
    ) {
        let mut driver = Driver::default();
        let (mut host, mut sources) = (MockHost::new(), MockSources::new());
        driver.init(&mut host);
        driver.handle(&mut host, &mut sources, HostEvent::Attach(gamepad(1)));

        for report in &reports {
            host.queue_read(1, MockRead::Report(*report));
        }
        for _ in 0..polls {
            let _ = driver.poll(&mut host, 0);
            prop_assert!(host.active_transfers() <= 1);
        }
        driver.fini(&mut host, &mut sources);
        prop_assert_eq!(host.active_transfers(), 0);
    }
}
