// Mon Oct 12 2026 - Alex

use crate::structure::layout::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    /// Pointer width of this build, which is the reader's side of any
    /// cross-process read.
    pub fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Bits64
        } else {
            Self::Bits32
        }
    }

    pub fn from_is_64bit(is_64bit: bool) -> Self {
        if is_64bit {
            Self::Bits64
        } else {
            Self::Bits32
        }
    }

    pub fn pointer_size(self) -> usize {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }

    pub fn is_64bit(self) -> bool {
        self == Self::Bits64
    }
}

impl fmt::Display for Bitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits32 => write!(f, "32-bit"),
            Self::Bits64 => write!(f, "64-bit"),
        }
    }
}

/// Layout description of the OS structures for one target pointer width.
///
/// Every remote walk is generic over this trait, so one walk body serves both
/// widths. The choice depends only on the target, never on the reader.
pub trait TargetTraits: 'static {
    const BITNESS: Bitness;
    const POINTER_SIZE: usize;
    const UNICODE_STRING: UnicodeStringLayout;
    const PEB: PebLayout;
    const LDR_DATA: LdrDataLayout;
    const LDR_ENTRY: LdrEntryLayout;
    const PROCESS_PARAMETERS: ProcessParametersLayout;
    const CRITICAL_SECTION: CriticalSectionLayout;
    const UNLOAD_EVENT: UnloadEventLayout;
    const EXCEPTION: ExceptionLayout;
    const TEB: TebLayout;
    const CLIENT_INFO: ClientInfoLayout;

    /// Value a pointer field holds when it is all ones (`(PVOID)-1`).
    fn invalid_pointer() -> u64 {
        match Self::POINTER_SIZE {
            4 => u32::MAX as u64,
            _ => u64::MAX,
        }
    }
}

pub struct Traits32;
pub struct Traits64;

impl TargetTraits for Traits32 {
    const BITNESS: Bitness = Bitness::Bits32;
    const POINTER_SIZE: usize = 4;
    const UNICODE_STRING: UnicodeStringLayout = UnicodeStringLayout {
        size: 0x8,
        length: 0x0,
        maximum_length: 0x2,
        buffer: 0x4,
    };
    const PEB: PebLayout = PebLayout {
        size: 0xA4,
        ldr: 0x0C,
        process_parameters: 0x10,
        loader_lock: 0xA0,
    };
    const LDR_DATA: LdrDataLayout = LdrDataLayout {
        size: 0x30,
        in_load_order: 0x0C,
        in_memory_order: 0x14,
        in_initialization_order: 0x1C,
    };
    const LDR_ENTRY: LdrEntryLayout = LdrEntryLayout {
        size: 0x48,
        in_load_order_links: 0x00,
        in_memory_order_links: 0x08,
        in_initialization_order_links: 0x10,
        dll_base: 0x18,
        size_of_image: 0x20,
        full_dll_name: 0x24,
        base_dll_name: 0x2C,
    };
    const PROCESS_PARAMETERS: ProcessParametersLayout = ProcessParametersLayout {
        size: 0x298,
        current_directory: 0x24,
        dll_path: 0x30,
        image_path_name: 0x38,
        command_line: 0x40,
        environment: 0x48,
        window_title: 0x70,
        desktop_info: 0x78,
        shell_info: 0x80,
        runtime_data: 0x88,
    };
    const CRITICAL_SECTION: CriticalSectionLayout = CriticalSectionLayout {
        size: 0x18,
        debug_info: 0x0,
        debug_size: 0x20,
    };
    const UNLOAD_EVENT: UnloadEventLayout = UnloadEventLayout {
        size: 0x5C,
        base_address: 0x00,
        size_of_image: 0x04,
        time_date_stamp: 0x0C,
        check_sum: 0x10,
        image_name: 0x14,
    };
    const EXCEPTION: ExceptionLayout = ExceptionLayout {
        record_size: 0x50,
        code: 0x00,
        flags: 0x04,
        address: 0x0C,
        number_parameters: 0x10,
        information: 0x14,
        context_size: 0x2CC,
    };
    const TEB: TebLayout = TebLayout {
        size: 0x1000,
        stack_base: 0x04,
        stack_limit: 0x08,
    };
    const CLIENT_INFO: ClientInfoLayout = ClientInfoLayout {
        size: 0x28,
        extra_memory_ranges: 0x18,
        simple_annotations: 0x1C,
    };
}

impl TargetTraits for Traits64 {
    const BITNESS: Bitness = Bitness::Bits64;
    const POINTER_SIZE: usize = 8;
    const UNICODE_STRING: UnicodeStringLayout = UnicodeStringLayout {
        size: 0x10,
        length: 0x0,
        maximum_length: 0x2,
        buffer: 0x8,
    };
    const PEB: PebLayout = PebLayout {
        size: 0x118,
        ldr: 0x18,
        process_parameters: 0x20,
        loader_lock: 0x110,
    };
    const LDR_DATA: LdrDataLayout = LdrDataLayout {
        size: 0x58,
        in_load_order: 0x10,
        in_memory_order: 0x20,
        in_initialization_order: 0x30,
    };
    const LDR_ENTRY: LdrEntryLayout = LdrEntryLayout {
        size: 0x88,
        in_load_order_links: 0x00,
        in_memory_order_links: 0x10,
        in_initialization_order_links: 0x20,
        dll_base: 0x30,
        size_of_image: 0x40,
        full_dll_name: 0x48,
        base_dll_name: 0x58,
    };
    const PROCESS_PARAMETERS: ProcessParametersLayout = ProcessParametersLayout {
        size: 0x400,
        current_directory: 0x38,
        dll_path: 0x50,
        image_path_name: 0x60,
        command_line: 0x70,
        environment: 0x80,
        window_title: 0xB0,
        desktop_info: 0xC0,
        shell_info: 0xD0,
        runtime_data: 0xE0,
    };
    const CRITICAL_SECTION: CriticalSectionLayout = CriticalSectionLayout {
        size: 0x28,
        debug_info: 0x0,
        debug_size: 0x30,
    };
    const UNLOAD_EVENT: UnloadEventLayout = UnloadEventLayout {
        size: 0x68,
        base_address: 0x00,
        size_of_image: 0x08,
        time_date_stamp: 0x14,
        check_sum: 0x18,
        image_name: 0x1C,
    };
    const EXCEPTION: ExceptionLayout = ExceptionLayout {
        record_size: 0x98,
        code: 0x00,
        flags: 0x04,
        address: 0x10,
        number_parameters: 0x18,
        information: 0x20,
        context_size: 0x4D0,
    };
    const TEB: TebLayout = TebLayout {
        size: 0x1838,
        stack_base: 0x08,
        stack_limit: 0x10,
    };
    const CLIENT_INFO: ClientInfoLayout = ClientInfoLayout {
        size: 0x38,
        extra_memory_ranges: 0x18,
        simple_annotations: 0x20,
    };
}
