use std::fmt::{self, Display, Formatter};

use super::Insn;
use crate::error::{OptimizationError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsnHandle(u32);

impl InsnHandle {
    pub const fn new(index: usize) -> Self {
        InsnHandle(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for InsnHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Node {
    insn: Insn,
    prev: Option<InsnHandle>,
    next: Option<InsnHandle>,
    live: bool,
}

/// Every mutation keeps the invariant that each live jump targets a live
/// label. Nothing is ever retargeted implicitly; a mutation that would break
/// the invariant is refused with an error and leaves the list untouched.
#[derive(Debug, Clone, Default)]
pub struct InsnList {
    nodes: Vec<Node>,
    first: Option<InsnHandle>,
    last: Option<InsnHandle>,
    len: usize,
}

impl InsnList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list whose handles equal the positions of `insns`, so jump
    /// targets may be written as `InsnHandle::new(position_of_label)`.
    pub fn from_insns(insns: impl IntoIterator<Item = Insn>) -> Result<Self> {
        let mut list = Self::new();
        for insn in insns {
            let handle = list.alloc(insn);
            list.link_back(handle);
        }
        list.verify()?;
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<InsnHandle> {
        self.first
    }

    pub fn last(&self) -> Option<InsnHandle> {
        self.last
    }

    pub fn contains(&self, handle: InsnHandle) -> bool {
        self.node(handle).is_some()
    }

    pub fn get(&self, handle: InsnHandle) -> Option<&Insn> {
        self.node(handle).map(|node| &node.insn)
    }

    pub fn next(&self, handle: InsnHandle) -> Option<InsnHandle> {
        self.node(handle)?.next
    }

    pub fn prev(&self, handle: InsnHandle) -> Option<InsnHandle> {
        self.node(handle)?.prev
    }

    pub fn is_label(&self, handle: InsnHandle) -> bool {
        self.get(handle).map_or(false, Insn::is_label)
    }

    pub fn handles(&self) -> Handles<'_> {
        Handles {
            list: self,
            cursor: self.first,
        }
    }

    pub fn handles_from(&self, start: InsnHandle) -> Handles<'_> {
        Handles {
            list: self,
            cursor: self.contains(start).then(|| start),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (InsnHandle, &Insn)> + '_ {
        self.handles()
            .filter_map(move |handle| Some((handle, self.get(handle)?)))
    }

    pub fn position(&self, handle: InsnHandle) -> Option<usize> {
        self.handles().position(|h| h == handle)
    }

    pub fn int_constant_before(&self, handle: InsnHandle) -> Option<i32> {
        self.get(self.prev(handle)?)?.int_constant()
    }

    pub fn insert_after(&mut self, anchor: InsnHandle, insn: Insn) -> Result<InsnHandle> {
        self.live(anchor)?;
        self.check_insertion(&insn)?;
        let handle = self.alloc(insn);
        self.link_after(handle, anchor);
        Ok(handle)
    }

    pub fn insert_before(&mut self, anchor: InsnHandle, insn: Insn) -> Result<InsnHandle> {
        self.live(anchor)?;
        self.check_insertion(&insn)?;
        let handle = self.alloc(insn);
        self.link_before(handle, anchor);
        Ok(handle)
    }

    pub fn remove(&mut self, handle: InsnHandle) -> Result<Insn> {
        self.live(handle)?;
        self.check_unreferenced(handle)?;
        self.unlink(handle);
        let node = &mut self.nodes[handle.index()];
        node.live = false;
        Ok(std::mem::replace(&mut node.insn, Insn::Nop))
    }

    pub fn set(&mut self, handle: InsnHandle, insn: Insn) -> Result<Insn> {
        self.live(handle)?;
        if !insn.is_label() {
            self.check_unreferenced(handle)?;
        }
        if let Some(target) = insn.target() {
            // a jump may target the label it is replacing only if it stays a label
            if !self.is_label(target) || target == handle {
                return Err(OptimizationError::DanglingJump {
                    jump: handle,
                    target,
                });
            }
        }
        Ok(std::mem::replace(
            &mut self.nodes[handle.index()].insn,
            insn,
        ))
    }

    pub fn move_range(
        &mut self,
        from: InsnHandle,
        to: InsnHandle,
        before: InsnHandle,
    ) -> Result<()> {
        self.live(from)?;
        self.live(to)?;
        self.live(before)?;
        let invalid = OptimizationError::InvalidMove { from, to, before };

        let mut range = vec![];
        let mut cursor = Some(from);
        loop {
            let Some(handle) = cursor else {
                return Err(invalid);
            };
            if handle == before {
                return Err(invalid);
            }
            range.push(handle);
            if handle == to {
                break;
            }
            cursor = self.next(handle);
        }

        for handle in range {
            self.unlink(handle);
            self.link_before(handle, before);
        }
        Ok(())
    }

    pub fn verify(&self) -> Result<()> {
        for (jump, insn) in self.iter() {
            if let Some(target) = insn.target() {
                if !self.is_label(target) {
                    return Err(OptimizationError::DanglingJump { jump, target });
                }
            }
        }
        Ok(())
    }

    pub fn jump_to(&self, label: InsnHandle) -> Option<InsnHandle> {
        self.iter()
            .find(|(_, insn)| insn.target() == Some(label))
            .map(|(jump, _)| jump)
    }

    fn node(&self, handle: InsnHandle) -> Option<&Node> {
        self.nodes.get(handle.index()).filter(|node| node.live)
    }

    fn live(&self, handle: InsnHandle) -> Result<()> {
        if self.contains(handle) {
            Ok(())
        } else {
            Err(OptimizationError::StaleHandle(handle))
        }
    }

    fn check_insertion(&self, insn: &Insn) -> Result<()> {
        match insn.target() {
            Some(target) if !self.is_label(target) => Err(OptimizationError::DanglingJump {
                jump: InsnHandle::new(self.nodes.len()),
                target,
            }),
            _ => Ok(()),
        }
    }

    fn check_unreferenced(&self, handle: InsnHandle) -> Result<()> {
        if !self.is_label(handle) {
            return Ok(());
        }
        match self.jump_to(handle) {
            Some(jump) => Err(OptimizationError::LabelInUse {
                label: handle,
                jump,
            }),
            None => Ok(()),
        }
    }

    fn alloc(&mut self, insn: Insn) -> InsnHandle {
        let handle = InsnHandle::new(self.nodes.len());
        self.nodes.push(Node {
            insn,
            prev: None,
            next: None,
            live: true,
        });
        handle
    }

    fn link_back(&mut self, handle: InsnHandle) {
        let node = &mut self.nodes[handle.index()];
        node.prev = self.last;
        node.next = None;
        match self.last {
            Some(last) => self.nodes[last.index()].next = Some(handle),
            None => self.first = Some(handle),
        }
        self.last = Some(handle);
        self.len += 1;
    }

    fn link_after(&mut self, handle: InsnHandle, anchor: InsnHandle) {
        let next = self.nodes[anchor.index()].next;
        let node = &mut self.nodes[handle.index()];
        node.prev = Some(anchor);
        node.next = next;
        self.nodes[anchor.index()].next = Some(handle);
        match next {
            Some(next) => self.nodes[next.index()].prev = Some(handle),
            None => self.last = Some(handle),
        }
        self.len += 1;
    }

    fn link_before(&mut self, handle: InsnHandle, anchor: InsnHandle) {
        let prev = self.nodes[anchor.index()].prev;
        let node = &mut self.nodes[handle.index()];
        node.prev = prev;
        node.next = Some(anchor);
        self.nodes[anchor.index()].prev = Some(handle);
        match prev {
            Some(prev) => self.nodes[prev.index()].next = Some(handle),
            None => self.first = Some(handle),
        }
        self.len += 1;
    }

    fn unlink(&mut self, handle: InsnHandle) {
        let Node { prev, next, .. } = self.nodes[handle.index()];
        match prev {
            Some(prev) => self.nodes[prev.index()].next = next,
            None => self.first = next,
        }
        match next {
            Some(next) => self.nodes[next.index()].prev = prev,
            None => self.last = prev,
        }
        let node = &mut self.nodes[handle.index()];
        node.prev = None;
        node.next = None;
        self.len -= 1;
    }
}

impl Display for InsnList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (handle, insn) in self.iter() {
            match insn {
                Insn::Label => writeln!(f, "(label L{})", handle.index())?,
                _ => writeln!(f, "  {insn}")?,
            }
        }
        Ok(())
    }
}

pub struct Handles<'a> {
    list: &'a InsnList,
    cursor: Option<InsnHandle>,
}

impl Iterator for Handles<'_> {
    type Item = InsnHandle;

    fn next(&mut self) -> Option<InsnHandle> {
        let current = self.cursor?;
        self.cursor = self.list.next(current);
        Some(current)
    }
}
