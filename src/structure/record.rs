// Mon Oct 12 2026 - Alex

use crate::memory::{Address, MemoryError, MemoryReader};
use crate::structure::TargetTraits;
use std::marker::PhantomData;

/// `UNICODE_STRING` as stored in the target: a counted UTF-16 buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeString {
    /// Byte length, excluding any terminator.
    pub length: u16,
    pub maximum_length: u16,
    pub buffer: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    pub flink: Address,
    pub blink: Address,
}

/// A copy of one remote structure, read by address and parsed by offset.
///
/// Nothing in here is ever treated as a pointer in the reader's own address
/// space; pointer fields come back as [`Address`] values to be read again.
/// Every accessor is bounds-checked against the bytes actually read.
pub struct RemoteRecord<T: TargetTraits> {
    address: Address,
    bytes: Vec<u8>,
    _traits: PhantomData<T>,
}

impl<T: TargetTraits> RemoteRecord<T> {
    pub fn read(reader: &dyn MemoryReader, address: Address, size: usize) -> Result<Self, MemoryError> {
        let bytes = reader.read_bytes(address, size)?;
        Ok(Self::from_bytes(address, bytes))
    }

    pub fn from_bytes(address: Address, bytes: Vec<u8>) -> Self {
        Self {
            address,
            bytes,
            _traits: PhantomData,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.bytes.get(offset..offset.checked_add(len)?)
    }

    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        let raw = self.slice(offset, 2)?;
        Some(u16::from_le_bytes([raw[0], raw[1]]))
    }

    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        let raw = self.slice(offset, 4)?;
        Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn u64_at(&self, offset: usize) -> Option<u64> {
        let raw = self.slice(offset, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Some(u64::from_le_bytes(buf))
    }

    /// A target-width pointer, zero-extended to 64 bits.
    pub fn pointer_at(&self, offset: usize) -> Option<Address> {
        match T::POINTER_SIZE {
            4 => self.u32_at(offset).map(|v| Address::new(v as u64)),
            _ => self.u64_at(offset).map(Address::new),
        }
    }

    pub fn unicode_string_at(&self, offset: usize) -> Option<UnicodeString> {
        let layout = T::UNICODE_STRING;
        Some(UnicodeString {
            length: self.u16_at(offset + layout.length)?,
            maximum_length: self.u16_at(offset + layout.maximum_length)?,
            buffer: self.pointer_at(offset + layout.buffer)?,
        })
    }

    pub fn list_entry_at(&self, offset: usize) -> Option<ListEntry> {
        Some(ListEntry {
            flink: self.pointer_at(offset)?,
            blink: self.pointer_at(offset + T::POINTER_SIZE)?,
        })
    }

    /// Decodes a fixed-capacity UTF-16 buffer, stopping at the first NUL.
    pub fn utf16_at(&self, offset: usize, max_bytes: usize) -> Option<String> {
        let raw = self.slice(offset, max_bytes)?;
        Some(decode_utf16_until_nul(raw))
    }
}

pub fn decode_utf16_until_nul(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decodes a fixed-capacity byte string, stopping at the first NUL.
pub fn decode_c_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
