// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # Platform device drivers
#![no_std]

// For testing use the std crate.
#[cfg(test)]
extern crate std;

/// Provides the driver binding the board-management MCU to the system-reset registry.
pub mod mcu_reset;
/// Provides the registry of devices capable of servicing SBI system-reset requests.
pub mod reset;

pub use mcu_reset::McuResetDriver;
