//! Scripted host collaborators for tests and benches.

use crate::error::{SourceError, TransferError};
use crate::host::{
    AttachHook, ControlRequest, EndpointDescriptor, InputSources, ReadStatus, UsbHost,
};
use crate::registry::SlotIndex;
use hid_snes_protocol::{REPORT_SIZE, SnesReport};
use std::collections::{HashMap, HashSet, VecDeque};

/// Outcome of one `check_read` call against a [`MockHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    Pending,
    Report(SnesReport),
    /// Completes with this many bytes, fewer than a full report.
    Short(usize),
    Fail(TransferError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockTransfer {
    pub id: u64,
    pub device: u32,
}

/// In-memory USB host. Devices are plain `u32` handles.
///
/// Reads complete in the order they were queued with [`MockHost::queue_read`];
/// a device with nothing queued stays pending.
#[derive(Debug, Default)]
pub struct MockHost {
    next_transfer: u64,
    active: Vec<MockTransfer>,
    reads: HashMap<u32, VecDeque<MockRead>>,
    failing_starts: HashSet<u32>,
    failing_control: bool,
    started: usize,
    checks: usize,
    cancelled: Vec<MockTransfer>,
    configurations: Vec<(u32, u8)>,
    control_requests: Vec<(u32, ControlRequest)>,
    hooks: Vec<AttachHook>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_read(&mut self, device: u32, read: MockRead) {
        self.reads.entry(device).or_default().push_back(read);
    }

    pub fn fail_starts(&mut self, device: u32, fail: bool) {
        if fail {
            self.failing_starts.insert(device);
        } else {
            self.failing_starts.remove(&device);
        }
    }

    /// Make every SET_CONFIGURATION and control request fail.
    pub fn fail_control(&mut self, fail: bool) {
        self.failing_control = fail;
    }

    pub fn active_transfers(&self) -> usize {
        self.active.len()
    }

    pub fn active_for(&self, device: u32) -> usize {
        self.active.iter().filter(|t| t.device == device).count()
    }

    pub fn started_count(&self) -> usize {
        self.started
    }

    pub fn check_count(&self) -> usize {
        self.checks
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.len()
    }

    pub fn configurations(&self) -> &[(u32, u8)] {
        &self.configurations
    }

    pub fn control_requests(&self) -> &[(u32, ControlRequest)] {
        &self.control_requests
    }

    pub fn hooks(&self) -> &[AttachHook] {
        &self.hooks
    }

    fn complete(&mut self, transfer: &MockTransfer) {
        self.active.retain(|t| t != transfer);
    }
}

impl UsbHost for MockHost {
    type Device = u32;
    type Transfer = MockTransfer;

    fn start_read(
        &mut self,
        device: &u32,
        _endpoint: &EndpointDescriptor,
        _len: usize,
    ) -> Result<MockTransfer, TransferError> {
        if self.failing_starts.contains(device) {
            return Err(TransferError::NoResources);
        }
        self.next_transfer += 1;
        let transfer = MockTransfer {
            id: self.next_transfer,
            device: *device,
        };
        self.active.push(transfer);
        self.started += 1;
        Ok(transfer)
    }

    fn check_read(
        &mut self,
        transfer: &MockTransfer,
        buffer: &mut [u8; REPORT_SIZE],
    ) -> ReadStatus {
        self.checks += 1;
        if !self.active.contains(transfer) {
            return ReadStatus::Failed(TransferError::Disconnected);
        }

        let next = self
            .reads
            .get_mut(&transfer.device)
            .and_then(VecDeque::pop_front)
            .unwrap_or(MockRead::Pending);

        match next {
            MockRead::Pending => ReadStatus::Pending,
            MockRead::Report(report) => {
                buffer.copy_from_slice(report.as_bytes());
                self.complete(transfer);
                ReadStatus::Done(REPORT_SIZE)
            }
            MockRead::Short(len) => {
                self.complete(transfer);
                ReadStatus::Done(len.min(REPORT_SIZE - 1))
            }
            MockRead::Fail(err) => {
                self.complete(transfer);
                ReadStatus::Failed(err)
            }
        }
    }

    fn cancel_read(&mut self, transfer: MockTransfer) {
        self.complete(&transfer);
        self.cancelled.push(transfer);
    }

    fn set_configuration(&mut self, device: &u32, value: u8) -> Result<(), TransferError> {
        self.configurations.push((*device, value));
        if self.failing_control {
            return Err(TransferError::Stall);
        }
        Ok(())
    }

    fn control_out(&mut self, device: &u32, request: ControlRequest) -> Result<(), TransferError> {
        self.control_requests.push((*device, request));
        if self.failing_control {
            return Err(TransferError::Stall);
        }
        Ok(())
    }

    fn register_attach_hook(&mut self, hook: AttachHook) {
        self.hooks.push(hook);
    }

    fn unregister_attach_hook(&mut self, hook: AttachHook) {
        self.hooks.retain(|h| *h != hook);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockSourceHandle(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
struct MockSource {
    handle: MockSourceHandle,
    name: String,
    slot: SlotIndex,
}

/// In-memory input-source registry.
#[derive(Debug, Default)]
pub struct MockSources {
    next: u32,
    registered: Vec<MockSource>,
    unregistered: Vec<String>,
    rejecting: bool,
}

impl MockSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_registrations(&mut self, reject: bool) {
        self.rejecting = reject;
    }

    pub fn names(&self) -> Vec<&str> {
        self.registered.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.iter().any(|s| s.name == name)
    }

    pub fn handle(&self, name: &str) -> Option<MockSourceHandle> {
        self.registered
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.handle)
    }

    /// Slot token the source was registered with.
    pub fn slot(&self, handle: MockSourceHandle) -> Option<SlotIndex> {
        self.registered
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| s.slot)
    }

    pub fn count(&self) -> usize {
        self.registered.len()
    }

    pub fn unregistered(&self) -> &[String] {
        &self.unregistered
    }
}

impl InputSources for MockSources {
    type Handle = MockSourceHandle;

    fn register_source(
        &mut self,
        name: &str,
        slot: SlotIndex,
    ) -> Result<MockSourceHandle, SourceError> {
        if self.rejecting {
            return Err(SourceError::Rejected(name.to_string()));
        }
        self.next += 1;
        let handle = MockSourceHandle(self.next);
        self.registered.push(MockSource {
            handle,
            name: name.to_string(),
            slot,
        });
        Ok(handle)
    }

    fn unregister_source(&mut self, handle: MockSourceHandle) {
        if let Some(pos) = self.registered.iter().position(|s| s.handle == handle) {
            let source = self.registered.remove(pos);
            self.unregistered.push(source.name);
        }
    }
}
