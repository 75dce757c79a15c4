// Sat Oct 17 2026 - Alex

use crate::memory::Address;
use crate::process::ProcessReader;
use crate::snapshot::error::{Result, SnapshotError};
use crate::structure::layout::{
    EXCEPTION_INFORMATION_POINTERS, EXCEPTION_INFORMATION_SIZE, EXCEPTION_INFORMATION_THREAD_ID,
    EXCEPTION_MAXIMUM_PARAMETERS,
};
use crate::structure::{RemoteRecord, TargetTraits};

/// The exception the crashing side handed over, and the context of the
/// thread it was raised on.
#[derive(Debug, Clone)]
pub struct ExceptionSnapshot {
    thread_id: u32,
    exception_code: u32,
    exception_flags: u32,
    exception_address: Address,
    codes: Vec<u64>,
    context: Vec<u8>,
}

impl ExceptionSnapshot {
    pub fn capture<T: TargetTraits>(reader: &ProcessReader, information_address: Address) -> Result<Self> {
        let memory = reader.memory();
        let information = RemoteRecord::<T>::read(memory, information_address, EXCEPTION_INFORMATION_SIZE)
            .map_err(|e| SnapshotError::unreadable("exception information", information_address, e))?;
        let truncated = |what: &'static str, address: Address| SnapshotError::Truncated { what, address };
        let thread_id = information
            .u32_at(EXCEPTION_INFORMATION_THREAD_ID)
            .ok_or_else(|| truncated("exception information", information_address))?;
        let pointers_address = information
            .u64_at(EXCEPTION_INFORMATION_POINTERS)
            .map(Address::new)
            .ok_or_else(|| truncated("exception information", information_address))?;

        let pointers = RemoteRecord::<T>::read(memory, pointers_address, 2 * T::POINTER_SIZE)
            .map_err(|e| SnapshotError::unreadable("EXCEPTION_POINTERS", pointers_address, e))?;
        let record_address = pointers
            .pointer_at(0)
            .ok_or_else(|| truncated("EXCEPTION_POINTERS", pointers_address))?;
        let context_address = pointers
            .pointer_at(T::POINTER_SIZE)
            .ok_or_else(|| truncated("EXCEPTION_POINTERS", pointers_address))?;

        let layout = T::EXCEPTION;
        let record = RemoteRecord::<T>::read(memory, record_address, layout.record_size)
            .map_err(|e| SnapshotError::unreadable("EXCEPTION_RECORD", record_address, e))?;
        let field = |value: Option<u32>| value.ok_or_else(|| truncated("EXCEPTION_RECORD", record_address));
        let exception_code = field(record.u32_at(layout.code))?;
        let exception_flags = field(record.u32_at(layout.flags))?;
        let parameter_count = field(record.u32_at(layout.number_parameters))? as usize;
        let exception_address = record
            .pointer_at(layout.address)
            .ok_or_else(|| truncated("EXCEPTION_RECORD", record_address))?;
        if parameter_count > EXCEPTION_MAXIMUM_PARAMETERS {
            log::warn!(
                "exception record at {} claims {} parameters",
                record_address,
                parameter_count
            );
        }
        let codes = (0..parameter_count.min(EXCEPTION_MAXIMUM_PARAMETERS))
            .filter_map(|i| record.pointer_at(layout.information + i * T::POINTER_SIZE))
            .map(|a| a.as_u64())
            .collect();

        let context = memory
            .read_bytes(context_address, layout.context_size)
            .map_err(|e| SnapshotError::unreadable("exception context", context_address, e))?;

        Ok(Self {
            thread_id,
            exception_code,
            exception_flags,
            exception_address,
            codes,
            context,
        })
    }

    pub fn thread_id(&self) -> u32 {
        self.thread_id
    }

    pub fn exception_code(&self) -> u32 {
        self.exception_code
    }

    pub fn exception_flags(&self) -> u32 {
        self.exception_flags
    }

    pub fn exception_address(&self) -> Address {
        self.exception_address
    }

    pub fn codes(&self) -> &[u64] {
        &self.codes
    }

    pub fn context(&self) -> &[u8] {
        &self.context
    }
}
