// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use crate::{Error, Result};

/// The kind of power transition a System Reset call requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetType {
    /// Power the system down.
    Shutdown,
    /// Power-cycle all hardware and boot from cold.
    ColdReboot,
    /// Reset processors and a platform-defined subset of hardware.
    WarmReboot,
    /// A reset type from the vendor-specific encoding range.
    PlatformSpecific(u32),
}

impl ResetType {
    /// Decodes a reset type from its `a0` register encoding. Reserved encodings are rejected.
    pub fn from_reg(a0: u64) -> Result<Self> {
        use ResetType::*;
        let raw = u32::try_from(a0).map_err(|_| Error::InvalidParam)?;
        Ok(match raw {
            0 => Shutdown,
            1 => ColdReboot,
            2 => WarmReboot,
            0xf000_0000..=0xffff_ffff => PlatformSpecific(raw),
            _ => return Err(Error::InvalidParam),
        })
    }

    /// Returns the `a0` register encoding of this reset type.
    pub fn to_reg(self) -> u64 {
        use ResetType::*;
        match self {
            Shutdown => 0,
            ColdReboot => 1,
            WarmReboot => 2,
            PlatformSpecific(raw) => raw as u64,
        }
    }
}

/// The cause a System Reset call reports for the transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetReason {
    /// No particular cause.
    NoReason,
    /// The supervisor detected a system failure.
    SystemFailure,
    /// A reason from the SBI-implementation-specific encoding range.
    SbiSpecific(u32),
    /// A reason from the vendor-specific encoding range.
    PlatformSpecific(u32),
}

impl ResetReason {
    /// Decodes a reset reason from its `a1` register encoding. Reserved encodings are rejected.
    pub fn from_reg(a1: u64) -> Result<Self> {
        use ResetReason::*;
        let raw = u32::try_from(a1).map_err(|_| Error::InvalidParam)?;
        Ok(match raw {
            0 => NoReason,
            1 => SystemFailure,
            0xe000_0000..=0xefff_ffff => SbiSpecific(raw),
            0xf000_0000..=0xffff_ffff => PlatformSpecific(raw),
            _ => return Err(Error::InvalidParam),
        })
    }

    /// Returns the `a1` register encoding of this reset reason.
    pub fn to_reg(self) -> u64 {
        use ResetReason::*;
        match self {
            NoReason => 0,
            SystemFailure => 1,
            SbiSpecific(raw) | PlatformSpecific(raw) => raw as u64,
        }
    }
}
