// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Types for the SBI extensions this firmware implements, as defined by the SBI
//! [spec](https://github.com/riscv-non-isa/riscv-sbi-doc/releases).
#![no_std]

mod error;
/// Types for the System Reset extension (SRST).
pub mod reset;

pub use error::{Error, Result};

/// Extension ID of the System Reset extension ("SRST").
pub const EXT_RESET: u64 = 0x53525354;
