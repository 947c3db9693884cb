// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloc::string::String;
use alloc::vec::Vec;
use core::{fmt, result};

use crate::error::{Error, Result};

fn try_string_from(src: &str) -> Result<String> {
    let mut owned = String::new();
    owned.try_reserve(src.len())?;
    owned.push_str(src);
    Ok(owned)
}

/// Identifies a node within a `DeviceTree`. IDs are never reused: once a node is removed its ID
/// stays dead for the lifetime of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(usize);

/// An individual property of a device or bus node. Properties are (name, value) pairs whose value
/// is a raw byte buffer; how the buffer is interpreted depends on the property name and
/// surrounding context, typically either a NULL-terminated string or an array of big-endian cells.
pub struct DeviceTreeProp {
    name: String,
    buf: Vec<u8>,
}

/// A bus or device in the tree. Every node except the root has a parent, and any node may carry
/// child nodes and properties.
pub struct DeviceTreeNode {
    id: NodeId,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    props: Vec<DeviceTreeProp>,
}

/// A mutable, in-memory description of the hardware in the system, following the Devicetree
/// Specification's tree-of-nodes model. Nodes live in a slot arena indexed by `NodeId`.
///
/// The tree guarantees its own structural integrity (parent/child links, ID liveness) but does
/// not validate that nodes or properties are semantically meaningful; that is left to the
/// consumers probing it.
pub struct DeviceTree {
    nodes: Vec<Option<DeviceTreeNode>>,
    root: Option<NodeId>,
}

impl DeviceTree {
    /// Creates an empty device-tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Returns the ID of the root node, if the tree has one.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns a reference to the node with the given ID.
    pub fn get_node(&self, id: NodeId) -> Option<&DeviceTreeNode> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    /// Returns a mutable reference to the node with the given ID.
    pub fn get_mut_node(&mut self, id: NodeId) -> Option<&mut DeviceTreeNode> {
        self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Creates a new node with the given name under `parent`. Passing `None` as the parent
    /// inserts the root node, which must not already exist.
    pub fn add_node(&mut self, name: &str, parent: Option<NodeId>) -> Result<NodeId> {
        match parent {
            Some(pid) if self.get_node(pid).is_none() => return Err(Error::InvalidNodeId),
            None if self.root.is_some() => return Err(Error::RootAlreadyExists),
            _ => (),
        }
        let id = NodeId(self.nodes.len());
        let node = DeviceTreeNode::new(id, name, parent)?;
        self.nodes.try_reserve(1)?;
        self.nodes.push(Some(node));
        match parent {
            // Unwrap ok: the parent was validated above.
            Some(pid) => self.get_mut_node(pid).unwrap().add_child(id)?,
            None => self.root = Some(id),
        }
        Ok(id)
    }

    /// Removes the node and all of its descendants from the tree. Their IDs become permanently
    /// unresolvable.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self.get_node(id).ok_or(Error::InvalidNodeId)?.parent();
        // Unwrap ok: `id` was just validated.
        let num_doomed = self.iter_from(id).unwrap().count();
        let mut doomed = Vec::new();
        doomed.try_reserve(num_doomed)?;
        for node in self.iter_from(id).unwrap() {
            doomed.push(node.id());
        }
        match parent {
            Some(pid) => {
                // Unwrap ok: a live node's parent link is always live.
                self.get_mut_node(pid).unwrap().remove_child(id);
            }
            None => self.root = None,
        }
        for dead in doomed {
            self.nodes[dead.0] = None;
        }
        Ok(())
    }

    /// Returns an iterator visiting the tree's nodes in depth-first pre-order, starting at the
    /// root node.
    pub fn iter(&self) -> DeviceTreeIter {
        DeviceTreeIter::new(self, self.root)
    }

    /// Returns an iterator visiting the subtree rooted at `root` in depth-first pre-order.
    pub fn iter_from(&self, root: NodeId) -> Result<DeviceTreeIter> {
        let _ = self.get_node(root).ok_or(Error::InvalidNodeId)?;
        Ok(DeviceTreeIter::new(self, Some(root)))
    }
}

impl Default for DeviceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceTreeNode {
    fn new(id: NodeId, name: &str, parent: Option<NodeId>) -> Result<Self> {
        Ok(Self {
            id,
            name: try_string_from(name)?,
            parent,
            children: Vec::new(),
            props: Vec::new(),
        })
    }

    /// Returns the ID of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns this node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ID of this node's parent, if it has one.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns an iterator over this node's child node IDs.
    pub fn children(&self) -> impl ExactSizeIterator<Item = &NodeId> {
        self.children.iter()
    }

    /// Creates a new property with the given name on this node, returning a mutable reference to
    /// it so the value can be filled in.
    pub fn add_prop(&mut self, name: &str) -> Result<&mut DeviceTreeProp> {
        let index = self.props.len();
        self.props.try_reserve(1)?;
        self.props.push(DeviceTreeProp::new(name)?);
        Ok(&mut self.props[index])
    }

    /// Removes the property with the given name from this node.
    pub fn remove_prop(&mut self, name: &str) -> Result<()> {
        let index = self
            .props()
            .position(|p| p.name() == name)
            .ok_or(Error::PropNotFound)?;
        self.props.remove(index);
        Ok(())
    }

    /// Returns an iterator over this node's properties.
    pub fn props(&self) -> impl ExactSizeIterator<Item = &DeviceTreeProp> {
        self.props.iter()
    }

    /// Returns a mutable iterator over this node's properties.
    pub fn props_mut(&mut self) -> impl ExactSizeIterator<Item = &mut DeviceTreeProp> {
        self.props.iter_mut()
    }

    /// Returns true if this node's `status` property marks it as disabled.
    pub fn disabled(&self) -> bool {
        self.props()
            .any(|p| p.name() == "status" && p.value_str().unwrap_or("") == "disabled")
    }

    /// Returns true if any entry of this node's `compatible` string list equals one of the given
    /// compatible strings.
    pub fn compatible<I>(&self, compat_strings: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        compat_strings.into_iter().any(|compat| {
            self.props()
                .filter(|p| p.name() == "compatible")
                .filter_map(|p| p.value_str())
                .any(|list| list.split('\0').any(|entry| entry == compat.as_ref()))
        })
    }

    fn add_child(&mut self, child: NodeId) -> Result<()> {
        self.children.try_reserve(1)?;
        self.children.push(child);
        Ok(())
    }

    fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }

    fn fmt_in(
        &self,
        tree: &DeviceTree,
        f: &mut fmt::Formatter,
        indent: usize,
    ) -> result::Result<(), fmt::Error> {
        writeln!(f, "{:width$}{} {{", "", self.name(), width = indent)?;
        for p in self.props() {
            writeln!(f, "{:width$}{}", "", p, width = indent + 4)?;
        }
        for &c in self.children() {
            // Unwrap ok: child links of a live node are always live.
            tree.get_node(c).unwrap().fmt_in(tree, f, indent + 4)?;
        }
        writeln!(f, "{:width$}}}", "", width = indent)
    }
}

impl DeviceTreeProp {
    fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: try_string_from(name)?,
            buf: Vec::new(),
        })
    }

    /// Returns this property's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns this property's value as a raw byte slice.
    pub fn value_raw(&self) -> &[u8] {
        &self.buf
    }

    /// Sets this property's value from a raw byte slice.
    pub fn set_value_raw(&mut self, val: &[u8]) -> Result<()> {
        self.buf.truncate(0);
        self.buf.try_reserve(val.len())?;
        self.buf.extend_from_slice(val);
        Ok(())
    }

    /// Returns this property's value as a string with its trailing NULL stripped, if the buffer
    /// holds valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        let value = core::str::from_utf8(&self.buf).ok()?;
        value.strip_suffix('\0')
    }

    /// Sets this property's value to a NULL-terminated string.
    pub fn set_value_str(&mut self, val: &str) -> Result<()> {
        self.buf.truncate(0);
        self.buf.try_reserve(val.len() + 1)?;
        self.buf.extend_from_slice(val.as_bytes());
        self.buf.push(b'\0');
        Ok(())
    }

    /// Returns this property's value as an iterator over big-endian u32 cells.
    pub fn value_u32(&self) -> impl Iterator<Item = u32> + '_ {
        self.buf
            .chunks_exact(4)
            // Unwrap ok: chunks_exact() yields 4-byte slices.
            .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
    }

    /// Sets this property's value from a set of u32 cells.
    pub fn set_value_u32(&mut self, vals: &[u32]) -> Result<()> {
        self.buf.truncate(0);
        self.buf.try_reserve(vals.len() * 4)?;
        for &v in vals {
            self.buf.extend_from_slice(&v.to_be_bytes());
        }
        Ok(())
    }

    /// Returns this property's value as an iterator over big-endian u64 cells.
    pub fn value_u64(&self) -> impl Iterator<Item = u64> + '_ {
        self.buf
            .chunks_exact(8)
            // Unwrap ok: chunks_exact() yields 8-byte slices.
            .map(|c| u64::from_be_bytes(c.try_into().unwrap()))
    }

    /// Sets this property's value from a set of u64 cells.
    pub fn set_value_u64(&mut self, vals: &[u64]) -> Result<()> {
        self.buf.truncate(0);
        self.buf.try_reserve(vals.len() * 8)?;
        for &v in vals {
            self.buf.extend_from_slice(&v.to_be_bytes());
        }
        Ok(())
    }
}

/// An iterator over a device-tree in depth-first pre-order.
pub struct DeviceTreeIter<'tree> {
    tree: &'tree DeviceTree,
    root: Option<NodeId>,
    next: Option<NodeId>,
}

impl<'tree> DeviceTreeIter<'tree> {
    fn new(tree: &'tree DeviceTree, root: Option<NodeId>) -> Self {
        Self {
            tree,
            root,
            next: root,
        }
    }

    fn advance(&mut self, node: &DeviceTreeNode) {
        if let Some(&child) = node.children().next() {
            self.next = Some(child);
            return;
        }

        // Climb towards the iteration root looking for an unvisited sibling.
        let mut current = node;
        // Unwrap ok: we only get here having yielded a node, so root is set.
        while current.id() != self.root.unwrap() {
            let pid = match current.parent() {
                Some(pid) => pid,
                None => break,
            };
            // Unwrap ok: a live node's parent link is always live.
            let pnode = self.tree.get_node(pid).unwrap();
            let mut siblings = pnode.children();
            let _ = siblings.find(|&&id| id == current.id());
            if let Some(&sibling) = siblings.next() {
                self.next = Some(sibling);
                return;
            }
            current = pnode;
        }
        self.next = None;
    }
}

impl<'tree> Iterator for DeviceTreeIter<'tree> {
    type Item = &'tree DeviceTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.get_node(self.next?)?;
        self.advance(node);
        Some(node)
    }
}

impl fmt::Display for DeviceTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self.root {
            // Unwrap ok: the root link of a non-empty tree is always live.
            Some(r) => self.get_node(r).unwrap().fmt_in(self, f, 0),
            None => write!(f, "empty"),
        }
    }
}

impl fmt::Display for DeviceTreeProp {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        // A value prints as a string if it's ASCII without embedded double-NULLs.
        fn printable(s: &str) -> bool {
            s.is_ascii() && !s.contains("\0\0")
        }

        if self.value_raw().is_empty() {
            write!(f, "{};", self.name())
        } else if let Some(s) = self.value_str().filter(|&s| printable(s)) {
            write!(f, "{} = \"{}\";", self.name(), s)
        } else {
            write!(f, "{} =", self.name())?;
            for v in self.value_u32() {
                write!(f, " 0x{:08x}", v)?;
            }
            write!(f, ";")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    // root { soc { i2c@7030005000 { board-mcu@17 }, uart@7040000000 }, memory@80000000 }
    fn stub_tree() -> DeviceTree {
        let mut tree = DeviceTree::new();
        let root = tree.add_node("", None).unwrap();
        let soc = tree.add_node("soc", Some(root)).unwrap();
        let i2c = tree.add_node("i2c@7030005000", Some(soc)).unwrap();
        let _ = tree.add_node("board-mcu@17", Some(i2c)).unwrap();
        let _ = tree.add_node("uart@7040000000", Some(soc)).unwrap();
        let _ = tree.add_node("memory@80000000", Some(root)).unwrap();
        tree
    }

    fn node_id(tree: &DeviceTree, name: &str) -> NodeId {
        tree.iter().find(|n| n.name() == name).unwrap().id()
    }

    #[test]
    fn tree_construction() {
        let tree = stub_tree();
        let root = tree.get_node(tree.root().unwrap()).unwrap();
        assert_eq!(root.name(), "");
        assert!(root.parent().is_none());
        assert_eq!(root.children().count(), 2);

        let mcu = tree.get_node(node_id(&tree, "board-mcu@17")).unwrap();
        let i2c = tree.get_node(mcu.parent().unwrap()).unwrap();
        assert_eq!(i2c.name(), "i2c@7030005000");
        assert_eq!(i2c.children().count(), 1);
    }

    #[test]
    fn second_root_rejected() {
        let mut tree = stub_tree();
        assert_eq!(tree.add_node("other-root", None), Err(Error::RootAlreadyExists));
    }

    #[test]
    fn add_node_requires_live_parent() {
        let mut tree = stub_tree();
        let soc = node_id(&tree, "soc");
        tree.remove_node(soc).unwrap();
        assert_eq!(tree.add_node("orphan", Some(soc)), Err(Error::InvalidNodeId));
    }

    #[test]
    fn traversal_order() {
        let tree = stub_tree();
        let names = tree.iter().map(|n| n.name()).collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "",
                "soc",
                "i2c@7030005000",
                "board-mcu@17",
                "uart@7040000000",
                "memory@80000000"
            ]
        );

        let soc_names = tree
            .iter_from(node_id(&tree, "soc"))
            .unwrap()
            .map(|n| n.name())
            .collect::<Vec<_>>();
        assert_eq!(
            soc_names,
            ["soc", "i2c@7030005000", "board-mcu@17", "uart@7040000000"]
        );
    }

    #[test]
    fn subtree_removal() {
        let mut tree = stub_tree();
        let soc = node_id(&tree, "soc");
        let i2c = node_id(&tree, "i2c@7030005000");
        tree.remove_node(soc).unwrap();

        assert!(tree.get_node(soc).is_none());
        assert!(tree.get_node(i2c).is_none());
        assert!(tree.iter_from(i2c).is_err());
        assert!(tree.iter().all(|n| !n.name().starts_with("i2c")));

        let root = tree.get_node(tree.root().unwrap()).unwrap();
        assert_eq!(root.children().count(), 1);
        assert_eq!(tree.remove_node(soc), Err(Error::InvalidNodeId));
    }

    #[test]
    fn root_removal_empties_tree() {
        let mut tree = stub_tree();
        tree.remove_node(tree.root().unwrap()).unwrap();
        assert!(tree.root().is_none());
        assert!(tree.iter().next().is_none());
    }

    #[test]
    fn property_round_trips() {
        let mut tree = stub_tree();
        let mcu_id = node_id(&tree, "board-mcu@17");
        let node = tree.get_mut_node(mcu_id).unwrap();
        node.add_prop("compatible")
            .unwrap()
            .set_value_str("mango,reset")
            .unwrap();
        node.add_prop("reg").unwrap().set_value_u32(&[0x17]).unwrap();
        node.add_prop("clock-span")
            .unwrap()
            .set_value_u64(&[0x7030005000, 0x1000])
            .unwrap();

        let node = tree.get_node(mcu_id).unwrap();
        let compat = node.props().find(|p| p.name() == "compatible").unwrap();
        assert_eq!(compat.value_str(), Some("mango,reset"));
        assert_eq!(compat.value_raw(), b"mango,reset\0");
        let reg = node.props().find(|p| p.name() == "reg").unwrap();
        assert_eq!(reg.value_u32().collect::<Vec<_>>(), [0x17]);
        let span = node.props().find(|p| p.name() == "clock-span").unwrap();
        assert_eq!(span.value_u64().collect::<Vec<_>>(), [0x7030005000, 0x1000]);
    }

    #[test]
    fn prop_removal() {
        let mut tree = stub_tree();
        let soc = node_id(&tree, "soc");
        let node = tree.get_mut_node(soc).unwrap();
        node.add_prop("ranges").unwrap();
        assert!(node.remove_prop("ranges").is_ok());
        assert_eq!(node.remove_prop("ranges"), Err(Error::PropNotFound));
        assert_eq!(node.props().count(), 0);
    }

    #[test]
    fn compatible_matching() {
        let mut tree = stub_tree();
        let mcu_id = node_id(&tree, "board-mcu@17");
        let node = tree.get_mut_node(mcu_id).unwrap();
        node.add_prop("compatible")
            .unwrap()
            // A multi-entry string list, most-specific first.
            .set_value_raw(b"mango,reset\0sophgo,board-mcu\0")
            .unwrap();

        let node = tree.get_node(mcu_id).unwrap();
        assert!(node.compatible(["mango,reset"]));
        assert!(node.compatible(["sophgo,board-mcu"]));
        assert!(node.compatible(["bogus,device", "mango,reset"]));
        // Entries match whole, not by substring.
        assert!(!node.compatible(["mango"]));
        assert!(!node.compatible(["bogus,device"]));
    }

    #[test]
    fn disabled_status() {
        let mut tree = stub_tree();
        let uart = node_id(&tree, "uart@7040000000");
        let node = tree.get_mut_node(uart).unwrap();
        assert!(!node.disabled());
        node.add_prop("status").unwrap().set_value_str("disabled").unwrap();
        assert!(node.disabled());
    }
}
