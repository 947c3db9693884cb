// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use arrayvec::ArrayVec;
use m_mode_utils::hart;
use sbi::reset::{ResetReason, ResetType};
use spin::RwLock;

/// Errors that can be returned by the reset device registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The registry is full.
    TooManyDevices,
}

/// Holds the result of a reset registry operation.
pub type Result<T> = core::result::Result<T, Error>;

/// A device capable of carrying out SBI system-reset requests.
pub trait SystemResetDevice: Sync {
    /// Returns the name of this device.
    fn name(&self) -> &str;

    /// Returns the priority with which this device can service `reset_type`, or 0 if it cannot.
    /// Priorities are opaque; the registry only compares them.
    fn system_reset_check(&self, reset_type: ResetType, reason: ResetReason) -> u32;

    /// Carries out the requested transition. Never returns: either the transition takes the
    /// system down or the calling hart parks itself.
    fn system_reset(&self, reset_type: ResetType, reason: ResetReason) -> !;
}

const MAX_RESET_DEVICES: usize = 4;

/// The set of reset-capable devices the platform has registered. Devices are added at probe time
/// and remain registered for the remainder of the firmware's life.
pub struct ResetDeviceRegistry {
    devices: RwLock<ArrayVec<&'static dyn SystemResetDevice, MAX_RESET_DEVICES>>,
}

impl ResetDeviceRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            devices: RwLock::new(ArrayVec::new_const()),
        }
    }

    /// Adds `device` to the set of devices considered for future reset requests.
    pub fn register(&self, device: &'static dyn SystemResetDevice) -> Result<()> {
        self.devices
            .write()
            .try_push(device)
            .map_err(|_| Error::TooManyDevices)
    }

    /// Returns the registered device reporting the highest non-zero priority for `reset_type`,
    /// if any.
    pub fn device_for(
        &self,
        reset_type: ResetType,
        reason: ResetReason,
    ) -> Option<&'static dyn SystemResetDevice> {
        let devices = self.devices.read();
        let mut best: Option<(&'static dyn SystemResetDevice, u32)> = None;
        for &device in devices.iter() {
            let priority = device.system_reset_check(reset_type, reason);
            if priority == 0 {
                continue;
            }
            match best {
                Some((_, current)) if priority <= current => (),
                _ => best = Some((device, priority)),
            }
        }
        best.map(|(device, _)| device)
    }

    /// Returns true if some registered device can service `reset_type`.
    pub fn supported(&self, reset_type: ResetType, reason: ResetReason) -> bool {
        self.device_for(reset_type, reason).is_some()
    }

    /// Hands the requested transition to the most capable registered device, or parks the
    /// calling hart if no device can service it.
    pub fn system_reset(&self, reset_type: ResetType, reason: ResetReason) -> ! {
        // The lookup must release the registry lock before dispatching: the selected device
        // never returns.
        let device = self.device_for(reset_type, reason);
        match device {
            Some(device) => device.system_reset(reset_type, reason),
            None => hart::hang(),
        }
    }
}

static RESET_DEVICES: ResetDeviceRegistry = ResetDeviceRegistry::new();

/// Returns the process-wide reset device registry.
pub fn registry() -> &'static ResetDeviceRegistry {
    &RESET_DEVICES
}

/// Registers `device` with the process-wide registry.
pub fn register_device(device: &'static dyn SystemResetDevice) -> Result<()> {
    RESET_DEVICES.register(device)
}

/// Carries out `reset_type` using the process-wide registry. Never returns.
pub fn system_reset(reset_type: ResetType, reason: ResetReason) -> ! {
    RESET_DEVICES.system_reset(reset_type, reason)
}
