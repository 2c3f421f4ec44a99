//! # Memory Store
//!
//! Sparse byte-addressable memory. Unset bytes read as zero.
//!
//! Ranged access takes two endpoints. Storage is always indexed in
//! ascending address order, while the endpoint the caller names first holds
//! the most significant byte: `(a + 3, a)` is a little-endian word at `a`,
//! `(a, a + 3)` a big-endian one.

use crate::config::ByteOrder;
use crate::error::{IsaError, Result};
use crate::Address;
use std::collections::BTreeMap;

/// Widest ranged access, in bytes
pub const MAX_ACCESS_BYTES: u64 = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    bytes: BTreeMap<Address, u8>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read_byte(&self, addr: Address) -> u8 {
        self.bytes.get(&addr).copied().unwrap_or(0)
    }

    #[inline]
    pub fn write_byte(&mut self, addr: Address, value: u8) {
        self.bytes.insert(addr, value);
    }

    /// Addresses from the most to the least significant byte
    fn span(first: Address, last: Address) -> Result<impl Iterator<Item = Address>> {
        let (low, high) = if first <= last { (first, last) } else { (last, first) };
        if high - low >= MAX_ACCESS_BYTES {
            return Err(IsaError::RangeTooWide {
                from: first,
                to: last,
            });
        }
        let ascending = first <= last;
        Ok((0..=high - low).map(move |i| if ascending { low + i } else { high - i }))
    }

    /// Read the range `first..last`; `first` holds the most significant byte.
    pub fn read_range(&self, first: Address, last: Address) -> Result<u64> {
        Ok(Self::span(first, last)?
            .fold(0u64, |acc, addr| (acc << 8) | self.read_byte(addr) as u64))
    }

    /// Write `value` over `first..last`; `first` receives the most significant byte.
    pub fn write_range(&mut self, first: Address, last: Address, value: u64) -> Result<()> {
        let addrs: Vec<Address> = Self::span(first, last)?.collect();
        for (i, addr) in addrs.iter().rev().enumerate() {
            self.write_byte(*addr, (value >> (8 * i)) as u8);
        }
        Ok(())
    }

    fn endpoints(addr: Address, bytes: u64, order: ByteOrder) -> Result<(Address, Address)> {
        let last = bytes
            .checked_sub(1)
            .and_then(|n| addr.checked_add(n))
            .ok_or(IsaError::RangeTooWide {
                from: addr,
                to: addr.wrapping_add(bytes),
            })?;
        Ok(match order {
            ByteOrder::LittleEndian => (last, addr),
            ByteOrder::BigEndian => (addr, last),
        })
    }

    /// Read a `bytes`-wide value at `addr` in the given byte order.
    pub fn read(&self, addr: Address, bytes: u64, order: ByteOrder) -> Result<u64> {
        let (first, last) = Self::endpoints(addr, bytes, order)?;
        self.read_range(first, last)
    }

    pub fn write(&mut self, addr: Address, bytes: u64, order: ByteOrder, value: u64) -> Result<()> {
        let (first, last) = Self::endpoints(addr, bytes, order)?;
        self.write_range(first, last, value)
    }

    /// Number of bytes ever written
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Address, u8)> + '_ {
        self.bytes.iter().map(|(&a, &b)| (a, b))
    }
}
