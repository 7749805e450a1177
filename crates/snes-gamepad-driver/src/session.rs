//! Per-device read/parse/requeue cycle.
//!
//! A [`DeviceSession`] keeps exactly one interrupt read in flight. Every
//! call to [`DeviceSession::poll`] either hands out a queued key or checks
//! that read once; a completed read is decoded, the report becomes the new
//! comparison base, and the read is re-armed before returning.
//!
//! # State machine
//!
//! ```text
//!   Idle ──start/re-arm ok──▶ ReadPending ──completion──▶ Idle
//!     │                                                    │
//!     └──────────────re-arm failed──────▶ Dead ◀───────────┘
//! ```
//!
//! `Idle` only exists between a completion and the re-arm inside one poll,
//! or before the first read is started. `Dead` is terminal: no further
//! reads are attempted and polls only drain keys that were already queued.

use crate::host::{EndpointDescriptor, ReadStatus, UsbHost};
use crate::queue::KeyQueue;
use hid_snes_protocol::{KeyCode, REPORT_SIZE, SnesReport, derive_events};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ReadPending,
    Dead,
}

/// Counters for diagnostics. Never consulted for control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub reports: u32,
    pub short_reads: u32,
    pub failed_reads: u32,
    pub keys_emitted: u32,
    /// Mirrors [`KeyQueue::evicted`]. Polling drains the queue before
    /// reading, and one report yields at most
    /// [`MAX_EVENTS_PER_REPORT`](hid_snes_protocol::MAX_EVENTS_PER_REPORT)
    /// keys, so this reads 0 for sessions driven only through `poll`.
    pub keys_evicted: u32,
}

pub struct DeviceSession<H: UsbHost> {
    device: H::Device,
    interface: u8,
    endpoint: EndpointDescriptor,
    transfer: Option<H::Transfer>,
    current: SnesReport,
    previous: SnesReport,
    queue: KeyQueue,
    state: SessionState,
    stats: SessionStats,
}

impl<H: UsbHost> DeviceSession<H> {
    pub fn new(device: H::Device, interface: u8, endpoint: EndpointDescriptor) -> Self {
        Self {
            device,
            interface,
            endpoint,
            transfer: None,
            current: SnesReport::zeroed(),
            previous: SnesReport::BASELINE,
            queue: KeyQueue::new(),
            state: SessionState::Idle,
            stats: SessionStats::default(),
        }
    }

    /// Start the first read. Unlike a re-arm, a failure here is returned to
    /// the caller and does not kill the session.
    pub fn start(&mut self, host: &mut H) -> Result<(), crate::TransferError> {
        let transfer = host.start_read(&self.device, &self.endpoint, REPORT_SIZE)?;
        self.transfer = Some(transfer);
        self.state = SessionState::ReadPending;
        Ok(())
    }

    /// Advance one step and return at most one key.
    pub fn poll(&mut self, host: &mut H) -> KeyCode {
        if self.state == SessionState::Dead || !self.queue.is_empty() {
            return self.queue.pop();
        }

        if let Some(transfer) = self.transfer.as_ref() {
            match host.check_read(transfer, self.current.as_bytes_mut()) {
                ReadStatus::Pending => return KeyCode::NoKey,
                ReadStatus::Done(len) if len == REPORT_SIZE => self.process_report(),
                ReadStatus::Done(len) => {
                    debug!(len, expected = REPORT_SIZE, "short gamepad report skipped");
                    self.stats.short_reads = self.stats.short_reads.saturating_add(1);
                }
                ReadStatus::Failed(err) => {
                    debug!(error = %err, "gamepad read failed, retrying");
                    self.stats.failed_reads = self.stats.failed_reads.saturating_add(1);
                }
            }
            self.transfer = None;
            self.state = SessionState::Idle;
        }

        if !self.rearm(host) {
            return KeyCode::NoKey;
        }

        self.queue.pop()
    }

    fn process_report(&mut self) {
        let events = derive_events(&self.previous, &self.current);
        for key in &events {
            self.queue.push(*key);
        }
        self.previous = self.current;

        self.stats.reports = self.stats.reports.saturating_add(1);
        self.stats.keys_emitted = self
            .stats
            .keys_emitted
            .saturating_add(u32::try_from(events.len()).unwrap_or(u32::MAX));
        self.stats.keys_evicted = self.queue.evicted();
    }

    fn rearm(&mut self, host: &mut H) -> bool {
        match host.start_read(&self.device, &self.endpoint, REPORT_SIZE) {
            Ok(transfer) => {
                self.transfer = Some(transfer);
                self.state = SessionState::ReadPending;
                true
            }
            Err(err) => {
                warn!(
                    error = %err,
                    queued = self.queue.len(),
                    "failed to restart gamepad read, device stopped"
                );
                self.transfer = None;
                self.state = SessionState::Dead;
                false
            }
        }
    }

    /// Cancel the outstanding read, if any. The session keeps its queue.
    pub fn cancel(&mut self, host: &mut H) {
        if let Some(transfer) = self.transfer.take() {
            host.cancel_read(transfer);
        }
        if self.state == SessionState::ReadPending {
            self.state = SessionState::Idle;
        }
    }

    pub fn device(&self) -> &H::Device {
        &self.device
    }

    pub fn interface(&self) -> u8 {
        self.interface
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == SessionState::Dead
    }

    pub fn has_pending_read(&self) -> bool {
        self.transfer.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn previous_report(&self) -> &SnesReport {
        &self.previous
    }

    pub fn current_report(&self) -> &SnesReport {
        &self.current
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}

impl<H: UsbHost> fmt::Debug for DeviceSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device", &self.device)
            .field("interface", &self.interface)
            .field("endpoint", &self.endpoint.address)
            .field("transfer", &self.transfer)
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .finish()
    }
}
