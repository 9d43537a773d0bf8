//! Frame-scoped bump storage for draw-command payloads.
//
// Allocation goes through `&self` so several batches can share one arena
// during a frame. `clear` needs `&mut self`, which means no batch borrowing
// the arena can survive into the next frame. Handles carry the generation
// they were allocated in so a copied-out handle is caught after a reset.
// Within a generation, every ended temp scope logs the mark it truncated to;
// a handle is stale once any later release cut below its end.

use crate::errors::{self, ViewerError};
use std::cell::{Ref, RefCell};
use std::fmt::{self, Write as _};

pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// A string slice living inside a [`FrameArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStr {
    generation: u32,
    scope: u32,
    start: u32,
    len: u32,
}

impl ArenaStr {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
pub struct FrameArena {
    bytes: RefCell<String>,
    capacity: usize,
    generation: u32,
    releases: RefCell<Vec<usize>>,
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl FrameArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: RefCell::new(String::with_capacity(capacity.min(64 * 1024))),
            capacity,
            generation: 0,
            releases: RefCell::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Bytes handed out since the last [`FrameArena::clear`].
    pub fn used(&self) -> usize {
        self.bytes.borrow().len()
    }

    /// Resets the arena without releasing its backing storage. Every handle
    /// allocated before this call becomes stale.
    pub fn clear(&mut self) {
        self.bytes.get_mut().clear();
        self.releases.get_mut().clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn try_alloc_str(&self, s: &str) -> Result<ArenaStr, ViewerError> {
        let mut bytes = self.bytes.borrow_mut();
        let start = bytes.len();
        if start + s.len() > self.capacity {
            return Err(ViewerError::ArenaExhausted {
                requested: s.len(),
                capacity: self.capacity,
            });
        }
        bytes.push_str(s);
        Ok(self.handle(start, s.len()))
    }

    /// Formats straight into the arena.
    pub fn try_alloc_fmt(&self, args: fmt::Arguments<'_>) -> Result<ArenaStr, ViewerError> {
        let mut bytes = self.bytes.borrow_mut();
        let start = bytes.len();
        // Writing into a String only fails if a Display impl reports an error.
        if bytes.write_fmt(args).is_err() {
            bytes.truncate(start);
            return Ok(self.handle(start, 0));
        }
        if bytes.len() > self.capacity {
            let requested = bytes.len() - start;
            bytes.truncate(start);
            return Err(ViewerError::ArenaExhausted {
                requested,
                capacity: self.capacity,
            });
        }
        let len = bytes.len() - start;
        Ok(self.handle(start, len))
    }

    /// Like [`FrameArena::try_alloc_str`], but running out of arena is fatal.
    pub fn alloc_str(&self, s: &str) -> ArenaStr {
        match self.try_alloc_str(s) {
            Ok(handle) => handle,
            Err(err) => errors::fatal(&err),
        }
    }

    pub fn alloc_fmt(&self, args: fmt::Arguments<'_>) -> ArenaStr {
        match self.try_alloc_fmt(args) {
            Ok(handle) => handle,
            Err(err) => errors::fatal(&err),
        }
    }

    /// Returns the string behind `handle`, or `None` if it predates the last
    /// clear or its bytes were released by a temp scope.
    pub fn get(&self, handle: ArenaStr) -> Option<Ref<'_, str>> {
        if handle.generation != self.generation {
            return None;
        }
        let start = handle.start as usize;
        let end = start + handle.len as usize;
        let released = self
            .releases
            .borrow()
            .get(handle.scope as usize..)
            .is_some_and(|later| later.iter().any(|&mark| mark < end));
        if released {
            return None;
        }
        Ref::filter_map(self.bytes.borrow(), |b| b.get(start..end)).ok()
    }

    /// Resolves a handle that is expected to be live. Stale handles trip a
    /// debug assertion and resolve to an empty string in release builds.
    pub fn resolve(&self, handle: ArenaStr) -> Ref<'_, str> {
        match self.get(handle) {
            Some(s) => s,
            None => {
                debug_assert!(
                    false,
                    "stale arena handle: generation {} (arena at {})",
                    handle.generation, self.generation
                );
                Ref::map(self.bytes.borrow(), |_| "")
            }
        }
    }

    /// Opens a scoped sub-arena. Everything allocated through the returned
    /// guard is released when it is dropped or [`ArenaTemp::end`] is called.
    pub fn temp(&self) -> ArenaTemp<'_> {
        ArenaTemp {
            arena: self,
            mark: self.used(),
        }
    }

    fn handle(&self, start: usize, len: usize) -> ArenaStr {
        // Capacity is checked against usize; handles saturate rather than wrap.
        let scope = self.releases.borrow().len();
        ArenaStr {
            generation: self.generation,
            scope: u32::try_from(scope).unwrap_or(u32::MAX),
            start: u32::try_from(start).unwrap_or(u32::MAX),
            len: u32::try_from(len).unwrap_or(0),
        }
    }
}

#[derive(Debug)]
pub struct ArenaTemp<'a> {
    arena: &'a FrameArena,
    mark: usize,
}

impl<'a> ArenaTemp<'a> {
    pub fn arena(&self) -> &'a FrameArena {
        self.arena
    }

    pub fn end(self) {}
}

impl Drop for ArenaTemp<'_> {
    fn drop(&mut self) {
        if let Ok(mut bytes) = self.arena.bytes.try_borrow_mut() {
            bytes.truncate(self.mark);
        }
        if let Ok(mut releases) = self.arena.releases.try_borrow_mut() {
            releases.push(self.mark);
        }
    }
}
