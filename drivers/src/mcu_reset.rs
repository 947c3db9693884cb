// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use device_tree::{DeviceTree, DeviceTreeError};
use i2c::I2cAdapter;
use m_mode_utils::hart;
use m_mode_utils::print::*;
use sbi::reset::{ResetReason, ResetType};
use spin::Once;

use crate::reset::{self, SystemResetDevice};

/// Errors that can be returned while probing for the MCU reset device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// No enabled device-tree node matches the MCU reset compatible string.
    DeviceNotFound,
    /// The MCU node carries no usable `reg` bus address.
    MissingAddress,
    /// The MCU node has no parent bus node.
    NotOnI2cBus,
    /// No I2C adapter could be obtained for the parent bus.
    AdapterRequest(i2c::Error),
    /// The reset registry rejected the device.
    Registration(reset::Error),
    /// The consumed node could not be removed from the tree.
    DeviceTree(DeviceTreeError),
}

impl From<DeviceTreeError> for Error {
    fn from(e: DeviceTreeError) -> Self {
        Error::DeviceTree(e)
    }
}

/// Holds the result of an MCU reset driver operation.
pub type Result<T> = core::result::Result<T, Error>;

const MCU_RESET_COMPAT: &str = "mango,reset";

// MCU register map.
const REG_MCU_BOARD_TYPE: u8 = 0x00;
const REG_MCU_CMD: u8 = 0x03;

// Mango boards report bit 7 set in the board-type register.
const MANGO_BOARD_TYPE_MASK: u8 = 1 << 7;

// Command register opcodes. The MCU also accepts a bare reset opcode (0x03); the SBI path
// always uses the full reboot.
const CMD_POWEROFF: u8 = 0x02;
#[allow(dead_code)]
const CMD_RESET: u8 = 0x03;
const CMD_REBOOT: u8 = 0x07;

/// The board-management MCU, bound to the adapter of the I2C bus it sits on. Only constructed
/// once both the adapter and the MCU's bus address are known; its registration with the reset
/// registry *is* the "MCU available" state.
struct McuResetDevice {
    adapter: &'static dyn I2cAdapter,
    addr: u32,
}

impl SystemResetDevice for McuResetDevice {
    fn name(&self) -> &str {
        "mango-reset"
    }

    fn system_reset_check(&self, reset_type: ResetType, _reason: ResetReason) -> u32 {
        match reset_type {
            ResetType::Shutdown => 1,
            ResetType::ColdReboot | ResetType::WarmReboot => 255,
            _ => 0,
        }
    }

    fn system_reset(&self, reset_type: ResetType, _reason: ResetReason) -> ! {
        match self.adapter.reg_read(self.addr, REG_MCU_BOARD_TYPE) {
            Ok(board_type) if board_type & MANGO_BOARD_TYPE_MASK != 0 => {
                let cmd = match reset_type {
                    ResetType::Shutdown => Some(CMD_POWEROFF),
                    ResetType::ColdReboot | ResetType::WarmReboot => Some(CMD_REBOOT),
                    _ => None,
                };
                if let Some(cmd) = cmd {
                    // One attempt only; there is nobody left to report a failure to.
                    let _ = self.adapter.reg_write(self.addr, REG_MCU_CMD, cmd);
                }
            }
            Ok(board_type) => {
                println!(
                    "{}: device at 0x{:02x} is not a mango MCU (board type 0x{:02x})",
                    self.name(),
                    self.addr,
                    board_type
                );
            }
            Err(e) => {
                println!("{}: board type read failed ({:?})", self.name(), e);
            }
        }
        // On success the MCU power-cycles the board before this hart could ever resume; in
        // every other case parking the hart is the terminal fallback.
        hart::hang()
    }
}

static MCU_RESET: Once<McuResetDevice> = Once::new();

/// Driver binding the board-management MCU's reset function to the system-reset registry.
pub struct McuResetDriver {}

impl McuResetDriver {
    /// Probes `dt` for the board MCU's reset node and registers the MCU with the system-reset
    /// registry. The node's `reg` address identifies the MCU on its parent I2C bus, whose
    /// adapter must already be registered. On success the node has been fully consumed and is
    /// removed from the tree; on any failure nothing is registered.
    pub fn probe_from(dt: &mut DeviceTree) -> Result<()> {
        let node = dt
            .iter()
            .find(|n| n.compatible([MCU_RESET_COMPAT]) && !n.disabled())
            .ok_or(Error::DeviceNotFound)?;
        let node_id = node.id();
        let addr = node
            .props()
            .find(|p| p.name() == "reg")
            .and_then(|p| p.value_u32().next())
            .ok_or(Error::MissingAddress)?;
        let bus = node.parent().ok_or(Error::NotOnI2cBus)?;
        let adapter = i2c::adapter_for_node(bus).map_err(Error::AdapterRequest)?;

        let device = MCU_RESET.call_once(|| McuResetDevice { adapter, addr });
        reset::register_device(device).map_err(Error::Registration)?;
        // The node carries no further runtime meaning once the binding exists.
        dt.remove_node(node_id)?;
        Ok(())
    }
}
