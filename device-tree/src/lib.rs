// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Library for interacting with the platform hardware description tree.
#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod device_tree;
mod error;

pub use device_tree::{DeviceTree, DeviceTreeIter, DeviceTreeNode, DeviceTreeProp, NodeId};
pub use error::{Error as DeviceTreeError, Result as DeviceTreeResult};
