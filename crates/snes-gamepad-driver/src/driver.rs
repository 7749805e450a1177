//! Module lifecycle: hook registration and host event dispatch.

use crate::config::DriverConfig;
use crate::error::ConfigError;
use crate::host::{AttachHook, AttachRequest, InputSources, UsbHost};
use crate::registry::{SlotIndex, SlotRegistry};
use hid_snes_protocol::KeyCode;
use tracing::{debug, info};

/// Notification delivered by the USB host after `init`.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent<D> {
    Attach(AttachRequest<D>),
    Detach(D),
}

/// Answer returned to the host for one [`HostEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// The interface was bound to this slot.
    Claimed(SlotIndex),
    /// Not ours; the host may offer it to another driver.
    Declined,
    /// This many slots were freed.
    Released(usize),
}

#[derive(Debug)]
pub struct GamepadDriver<H: UsbHost, S: InputSources> {
    config: DriverConfig,
    registry: SlotRegistry<H, S>,
    hooked: bool,
}

impl<H: UsbHost, S: InputSources> Default for GamepadDriver<H, S> {
    fn default() -> Self {
        let config = DriverConfig::default();
        Self {
            registry: SlotRegistry::new(&config),
            config,
            hooked: false,
        }
    }
}

impl<H: UsbHost, S: InputSources> GamepadDriver<H, S> {
    pub fn new(config: DriverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry: SlotRegistry::new(&config),
            config,
            hooked: false,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn registry(&self) -> &SlotRegistry<H, S> {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.hooked
    }

    /// Register interest in HID-class interfaces.
    pub fn init(&mut self, host: &mut H) {
        if self.hooked {
            return;
        }
        host.register_attach_hook(AttachHook::HID);
        self.hooked = true;
        info!(
            accept_any_hid = self.config.accept_any_hid,
            allow_listed = self.config.allow_list.len(),
            "SNES gamepad driver loaded"
        );
    }

    pub fn handle(
        &mut self,
        host: &mut H,
        sources: &mut S,
        event: HostEvent<H::Device>,
    ) -> HookOutcome {
        match event {
            HostEvent::Attach(request) => match self.registry.attach(host, sources, request) {
                Ok(slot) => HookOutcome::Claimed(slot),
                Err(err) => {
                    debug!(error = %err, "attach declined");
                    HookOutcome::Declined
                }
            },
            HostEvent::Detach(device) => {
                HookOutcome::Released(self.registry.detach(host, sources, &device))
            }
        }
    }

    pub fn poll(&mut self, host: &mut H, slot: SlotIndex) -> KeyCode {
        self.registry.poll(host, slot)
    }

    /// Tear down every slot, then drop the attach hook.
    pub fn fini(&mut self, host: &mut H, sources: &mut S) {
        let released = self.registry.shutdown_all(host, sources);
        if self.hooked {
            host.unregister_attach_hook(AttachHook::HID);
            self.hooked = false;
        }
        info!(released, "SNES gamepad driver unloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EndpointDescriptor, InterfaceDescriptor};
    use crate::mock::{MockHost, MockRead, MockSources};
    use hid_snes_protocol::{Button, DeviceId, SnesReport};

    type Driver = GamepadDriver<MockHost, MockSources>;

    fn attach(device: u32, protocol: u8) -> HostEvent<u32> {
        HostEvent::Attach(AttachRequest {
            device,
            id: DeviceId::new(0x2DC8, 0x9018),
            config_index: 0,
            interface: InterfaceDescriptor {
                number: 0,
                protocol,
                endpoints: vec![EndpointDescriptor::interrupt_in(1, 8, 10)],
            },
        })
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = DriverConfig {
            source_prefix: String::new(),
            ..DriverConfig::default()
        };
        assert!(matches!(Driver::new(config), Err(ConfigError::EmptyPrefix)));
    }

    #[test]
    fn test_default_matches_default_config() {
        let driver = Driver::default();
        assert_eq!(driver.config(), &DriverConfig::default());
        assert!(!driver.is_initialized());
    }

    #[test]
    fn test_init_and_fini_manage_hook() {
        let mut driver = Driver::default();
        let (mut host, mut sources) = (MockHost::new(), MockSources::new());

        driver.init(&mut host);
        driver.init(&mut host);
        assert_eq!(host.hooks(), [AttachHook { class: 0x03 }]);
        assert!(driver.is_initialized());

        let outcome = driver.handle(&mut host, &mut sources, attach(1, 0));
        assert_eq!(outcome, HookOutcome::Claimed(0));
        driver.fini(&mut host, &mut sources);
        assert!(host.hooks().is_empty());
        assert_eq!(driver.registry().occupied(), 0);
        assert_eq!(sources.count(), 0);
    }

    #[test]
    fn test_handle_dispatch() {
        let mut driver = Driver::default();
        let (mut host, mut sources) = (MockHost::new(), MockSources::new());
        driver.init(&mut host);

        let keyboard = driver.handle(&mut host, &mut sources, attach(1, 1));
        assert_eq!(keyboard, HookOutcome::Declined);
        let pad = driver.handle(&mut host, &mut sources, attach(1, 0));
        assert_eq!(pad, HookOutcome::Claimed(0));
        assert_eq!(
            driver.handle(&mut host, &mut sources, HostEvent::Detach(1)),
            HookOutcome::Released(1)
        );
        assert_eq!(
            driver.handle(&mut host, &mut sources, HostEvent::Detach(1)),
            HookOutcome::Released(0)
        );
    }

    #[test]
    fn test_poll_forwards_to_slot() {
        let mut driver = Driver::default();
        let (mut host, mut sources) = (MockHost::new(), MockSources::new());
        driver.init(&mut host);
        let outcome = driver.handle(&mut host, &mut sources, attach(8, 0));
        assert_eq!(outcome, HookOutcome::Claimed(0));

        let select = SnesReport::BASELINE.with_button(Button::Select);
        host.queue_read(8, MockRead::Report(select));
        assert_eq!(driver.poll(&mut host, 0), KeyCode::Escape);
        assert_eq!(driver.poll(&mut host, 3), KeyCode::NoKey);
    }
}
