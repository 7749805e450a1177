//! Fixed table of gamepad slots.
//!
//! Each occupied slot pairs one [`DeviceSession`] with the input source it
//! feeds. A slot's input source is registered exactly while its session
//! exists: attach either completes every step or leaves the slot empty.

use crate::MAX_GAMEPADS;
use crate::config::DriverConfig;
use crate::error::{AttachError, AttachResult};
use crate::filter::DeviceFilter;
use crate::host::{AttachRequest, ControlRequest, HidProtocolMode, InputSources, UsbHost};
use crate::session::DeviceSession;
use hid_snes_protocol::{KeyCode, device_name};
use std::fmt;
use tracing::{debug, info};

/// Index into the slot table, `0..MAX_GAMEPADS`.
pub type SlotIndex = usize;

struct Slot<H: UsbHost, S: InputSources> {
    session: DeviceSession<H>,
    source: S::Handle,
    name: String,
    config_index: u8,
}

pub struct SlotRegistry<H: UsbHost, S: InputSources> {
    slots: [Option<Slot<H, S>>; MAX_GAMEPADS],
    filter: DeviceFilter,
    source_prefix: String,
}

impl<H: UsbHost, S: InputSources> SlotRegistry<H, S> {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            filter: DeviceFilter::from_config(config),
            source_prefix: config.source_prefix.clone(),
        }
    }

    /// Claim a free slot for `request` and start polling it.
    pub fn attach(
        &mut self,
        host: &mut H,
        sources: &mut S,
        request: AttachRequest<H::Device>,
    ) -> AttachResult<SlotIndex> {
        let AttachRequest {
            device,
            id,
            config_index,
            interface,
        } = request;

        self.filter.check(id, interface.protocol)?;

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(AttachError::NoFreeSlot)?;

        let endpoint = interface
            .interrupt_in()
            .ok_or(AttachError::NoInterruptEndpoint)?;

        debug!(
            slot = index,
            %id,
            interface = interface.number,
            endpoint = endpoint.address,
            max_packet = endpoint.max_packet_size,
            "claiming gamepad"
        );

        let mut session = DeviceSession::new(device, interface.number, endpoint);
        initialize_device(host, session.device(), config_index, interface.number);
        session.start(host).map_err(AttachError::ReadStart)?;

        let name = format!("{}{}", self.source_prefix, index);
        let source = match sources.register_source(&name, index) {
            Ok(source) => source,
            Err(err) => {
                session.cancel(host);
                return Err(AttachError::Registration(err));
            }
        };

        info!(device = device_name(id), %id, slot = index, source = %name, "gamepad connected");

        if let Some(entry) = self.slots.get_mut(index) {
            *entry = Some(Slot {
                session,
                source,
                name,
                config_index,
            });
        }
        Ok(index)
    }

    /// Release every slot bound to `device`. Returns how many were freed.
    pub fn detach(&mut self, host: &mut H, sources: &mut S, device: &H::Device) -> usize {
        let mut released = 0;
        for index in 0..MAX_GAMEPADS {
            let matches = self
                .slots
                .get(index)
                .and_then(Option::as_ref)
                .is_some_and(|slot| slot.session.device() == device);
            if matches && self.release(host, sources, index) {
                released += 1;
            }
        }
        released
    }

    pub fn shutdown_all(&mut self, host: &mut H, sources: &mut S) -> usize {
        (0..MAX_GAMEPADS)
            .filter(|&index| self.release(host, sources, index))
            .count()
    }

    /// One poll of the slot's input source. Empty or out-of-range slots
    /// yield `NoKey`.
    pub fn poll(&mut self, host: &mut H, slot: SlotIndex) -> KeyCode {
        match self.slots.get_mut(slot).and_then(Option::as_mut) {
            Some(entry) => entry.session.poll(host),
            None => KeyCode::NoKey,
        }
    }

    fn release(&mut self, host: &mut H, sources: &mut S, index: SlotIndex) -> bool {
        let Some(mut slot) = self.slots.get_mut(index).and_then(Option::take) else {
            return false;
        };

        slot.session.cancel(host);
        sources.unregister_source(slot.source);

        let stats = slot.session.stats();
        debug!(
            slot = index,
            reports = stats.reports,
            short_reads = stats.short_reads,
            failed_reads = stats.failed_reads,
            keys_emitted = stats.keys_emitted,
            keys_evicted = stats.keys_evicted,
            "gamepad session closed"
        );
        info!(slot = index, source = %slot.name, "gamepad disconnected");
        true
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_occupied(&self, slot: SlotIndex) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    pub fn source_name(&self, slot: SlotIndex) -> Option<&str> {
        self.entry(slot).map(|entry| entry.name.as_str())
    }

    pub fn session(&self, slot: SlotIndex) -> Option<&DeviceSession<H>> {
        self.entry(slot).map(|entry| &entry.session)
    }

    /// Configuration index the slot's device was attached with.
    pub fn config_index(&self, slot: SlotIndex) -> Option<u8> {
        self.entry(slot).map(|entry| entry.config_index)
    }

    /// Lowest slot bound to `device`.
    pub fn find(&self, device: &H::Device) -> Option<SlotIndex> {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|entry| entry.session.device() == device)
        })
    }

    pub fn capacity(&self) -> usize {
        MAX_GAMEPADS
    }

    fn entry(&self, slot: SlotIndex) -> Option<&Slot<H, S>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }
}

impl<H: UsbHost, S: InputSources> fmt::Debug for SlotRegistry<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for slot in self.slots.iter().flatten() {
            list.entry(&(&slot.name, &slot.session));
        }
        list.finish()
    }
}

/// SET_CONFIGURATION, boot protocol and idle rate 0. Failures are logged and
/// ignored; many pads stall on one or more of these.
fn initialize_device<H: UsbHost>(
    host: &mut H,
    device: &H::Device,
    config_index: u8,
    interface: u8,
) {
    let configuration = config_index.saturating_add(1);
    if let Err(err) = host.set_configuration(device, configuration) {
        debug!(error = %err, configuration, "SET_CONFIGURATION failed");
    }

    let boot = ControlRequest::set_protocol(interface, HidProtocolMode::Boot);
    if let Err(err) = host.control_out(device, boot) {
        debug!(error = %err, interface, "SET_PROTOCOL(boot) failed");
    }

    if let Err(err) = host.control_out(device, ControlRequest::set_idle(interface, 0)) {
        debug!(error = %err, interface, "SET_IDLE failed");
    }
}
