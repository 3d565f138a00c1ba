use bitflags::bitflags;
use std::fmt;
use std::sync::OnceLock;

bitflags! {
    /// Capability bits. A bit is only ever set on positive evidence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Hardware AES instructions.
        const AES = 1 << 0;
        /// OS exposes 1 GiB huge pages.
        const PDPE1GB = 1 << 1;
        /// ARM polynomial multiply. Only set on ARM builds.
        const PMULL = 1 << 2;
        /// RISC-V vector extension. Only set on RISC-V builds.
        const RVV = 1 << 3;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Fixed-capacity processor name.
///
/// Holds at most `CAPACITY - 1` bytes followed by a NUL terminator, so the raw
/// buffer can be handed to C-style consumers unchanged. Longer names are
/// truncated, never overrun.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Brand {
    buf: [u8; Brand::CAPACITY],
    len: usize,
}

impl Brand {
    pub const CAPACITY: usize = 64;

    pub const fn empty() -> Self {
        Self {
            buf: [0; Self::CAPACITY],
            len: 0,
        }
    }

    /// Bounded copy of `name`. Stops at an embedded NUL, and backs off to a
    /// char boundary when the cut would land inside a UTF-8 sequence.
    pub fn from_name(name: &str) -> Self {
        let mut brand = Self::empty();
        brand.set(name);
        brand
    }

    pub fn set(&mut self, name: &str) {
        let name = name.split('\0').next().unwrap_or_default();

        let mut len = name.len().min(Self::CAPACITY - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }

        self.buf = [0; Self::CAPACITY];
        self.buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.len = len;
    }

    pub fn as_str(&self) -> &str {
        // `set` only ever copies whole chars of a `&str`.
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    /// Stored bytes including the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[..=self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Brand {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Brand").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the capability detector.
///
/// Built once by a [`Strategy`](crate::core::hardware::Strategy) and read-only
/// afterwards. Re-detection produces a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityRecord {
    brand: Brand,
    flags: Flags,
}

static GLOBAL: OnceLock<CapabilityRecord> = OnceLock::new();

impl CapabilityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide record, detected on first access.
    pub fn global() -> &'static CapabilityRecord {
        GLOBAL.get_or_init(crate::core::hardware::detect)
    }

    pub fn brand(&self) -> &Brand {
        &self.brand
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn has(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    // Population is crate-private: consumers only ever see a finished record.

    pub(crate) fn set_brand(&mut self, name: &str) {
        self.brand.set(name);
    }

    pub(crate) fn mark(&mut self, flag: Flags, present: bool) {
        if present {
            self.flags.insert(flag);
        }
    }
}
