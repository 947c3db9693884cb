// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Utilities for code running in M-mode.
#![no_std]

#[cfg(test)]
extern crate std;

/// Hart parking.
pub mod hart;
/// Console output for the firmware.
pub mod print;
