// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Interface to the I2C buses described by the platform device-tree.
//!
//! Bus drivers implement [`I2cAdapter`] and register themselves against the device-tree node of
//! the bus they drive; client drivers whose device sits on a bus look the adapter up by that
//! node. This crate only defines the adapter-facing surface; the bus drivers themselves are
//! platform code.
#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

use arrayvec::ArrayVec;
use device_tree::NodeId;
use spin::RwLock;

/// Errors that can be returned by I2C operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The bus transaction failed outright.
    BusError,
    /// Bus arbitration was lost to another master.
    ArbitrationLost,
    /// The device did not acknowledge the transfer.
    Nack,
    /// The transaction did not complete in time.
    Timeout,
    /// No adapter is registered for the requested bus node.
    AdapterNotFound,
    /// The adapter registry is full.
    TooManyAdapters,
}

/// Holds the result of an I2C operation.
pub type Result<T> = core::result::Result<T, Error>;

/// A master-mode I2C bus controller.
///
/// Both operations are synchronous: the bus transaction has either completed or failed by the
/// time the call returns.
pub trait I2cAdapter: Sync {
    /// Reads one byte from register `reg` of the device at bus address `addr`.
    fn reg_read(&self, addr: u32, reg: u8) -> Result<u8>;

    /// Writes `val` to register `reg` of the device at bus address `addr`.
    fn reg_write(&self, addr: u32, reg: u8, val: u8) -> Result<()>;
}

const MAX_ADAPTERS: usize = 8;

/// Maps device-tree bus nodes to the adapters driving them. Bindings are created at probe time
/// and live for the remainder of the firmware's life.
pub struct AdapterRegistry {
    adapters: RwLock<ArrayVec<(NodeId, &'static dyn I2cAdapter), MAX_ADAPTERS>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            adapters: RwLock::new(ArrayVec::new_const()),
        }
    }

    /// Registers `adapter` as the driver for the bus described by `node`.
    pub fn register(&self, node: NodeId, adapter: &'static dyn I2cAdapter) -> Result<()> {
        self.adapters
            .write()
            .try_push((node, adapter))
            .map_err(|_| Error::TooManyAdapters)
    }

    /// Returns the adapter driving the bus described by `node`.
    pub fn adapter_for_node(&self, node: NodeId) -> Result<&'static dyn I2cAdapter> {
        self.adapters
            .read()
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, a)| *a)
            .ok_or(Error::AdapterNotFound)
    }
}

static ADAPTERS: AdapterRegistry = AdapterRegistry::new();

/// Registers `adapter` with the process-wide registry as the driver for the bus node `node`.
pub fn register_adapter(node: NodeId, adapter: &'static dyn I2cAdapter) -> Result<()> {
    ADAPTERS.register(node, adapter)
}

/// Returns the adapter registered for the bus node `node`, if any.
pub fn adapter_for_node(node: NodeId) -> Result<&'static dyn I2cAdapter> {
    ADAPTERS.adapter_for_node(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_tree::DeviceTree;

    struct NullAdapter;

    impl I2cAdapter for NullAdapter {
        fn reg_read(&self, _addr: u32, _reg: u8) -> Result<u8> {
            Err(Error::Nack)
        }

        fn reg_write(&self, _addr: u32, _reg: u8, _val: u8) -> Result<()> {
            Ok(())
        }
    }

    static BUS0: NullAdapter = NullAdapter;
    static BUS1: NullAdapter = NullAdapter;

    #[test]
    fn registration_and_lookup() {
        let mut tree = DeviceTree::new();
        let root = tree.add_node("", None).unwrap();
        let bus0 = tree.add_node("i2c@7030005000", Some(root)).unwrap();
        let bus1 = tree.add_node("i2c@7030006000", Some(root)).unwrap();
        let other = tree.add_node("uart@7040000000", Some(root)).unwrap();

        let registry = AdapterRegistry::new();
        registry.register(bus0, &BUS0).unwrap();
        registry.register(bus1, &BUS1).unwrap();

        let adapter = registry.adapter_for_node(bus0).unwrap();
        assert_eq!(adapter.reg_read(0x17, 0x00), Err(Error::Nack));
        assert!(registry.adapter_for_node(bus1).is_ok());
        assert_eq!(
            registry.adapter_for_node(other).err(),
            Some(Error::AdapterNotFound)
        );
    }

    #[test]
    fn registry_capacity() {
        let mut tree = DeviceTree::new();
        let root = tree.add_node("", None).unwrap();

        let registry = AdapterRegistry::new();
        for i in 0..MAX_ADAPTERS {
            let bus = tree
                .add_node(&format!("i2c@{:x}", 0x7030005000u64 + i as u64 * 0x1000), Some(root))
                .unwrap();
            registry.register(bus, &BUS0).unwrap();
        }
        let overflow = tree.add_node("i2c@90", Some(root)).unwrap();
        assert_eq!(registry.register(overflow, &BUS0), Err(Error::TooManyAdapters));
    }
}
