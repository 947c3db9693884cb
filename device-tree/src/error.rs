// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloc::collections::TryReserveError;
use core::{fmt, result};

/// Errors returned by device-tree operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The node ID does not refer to a live node in this tree.
    InvalidNodeId,
    /// The tree already has a root; only one parentless node is allowed.
    RootAlreadyExists,
    /// No property with the requested name exists on the node.
    PropNotFound,
    /// Memory for a node or property could not be reserved.
    AllocError(TryReserveError),
}

impl From<TryReserveError> for Error {
    fn from(e: TryReserveError) -> Self {
        Error::AllocError(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Error::InvalidNodeId => write!(f, "Invalid node ID"),
            Error::RootAlreadyExists => write!(f, "Tree already has a root node"),
            Error::PropNotFound => write!(f, "Property not found"),
            Error::AllocError(e) => write!(f, "Memory allocation error: {}", e),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
