// Mon Oct 12 2026 - Alex

//! Field offsets of the OS structures read out of a target. Sizes are the
//! number of bytes read and recorded for each record.

/// Fixed capacity of the name buffer in an unload-event record, in UTF-16 units.
pub const UNLOAD_EVENT_NAME_CHARS: usize = 32;
pub const UNLOAD_EVENT_NAME_BYTES: usize = UNLOAD_EVENT_NAME_CHARS * 2;

/// Exception-information record handed over by the crashing side. Its layout
/// is the same for both widths.
pub const EXCEPTION_INFORMATION_SIZE: usize = 0x10;
pub const EXCEPTION_INFORMATION_THREAD_ID: usize = 0x0;
pub const EXCEPTION_INFORMATION_POINTERS: usize = 0x8;

pub const EXCEPTION_MAXIMUM_PARAMETERS: usize = 15;

#[derive(Debug, Clone, Copy)]
pub struct UnicodeStringLayout {
    pub size: usize,
    pub length: usize,
    pub maximum_length: usize,
    pub buffer: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct PebLayout {
    pub size: usize,
    pub ldr: usize,
    pub process_parameters: usize,
    pub loader_lock: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LdrDataLayout {
    pub size: usize,
    pub in_load_order: usize,
    pub in_memory_order: usize,
    pub in_initialization_order: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LdrEntryLayout {
    pub size: usize,
    pub in_load_order_links: usize,
    pub in_memory_order_links: usize,
    pub in_initialization_order_links: usize,
    pub dll_base: usize,
    pub size_of_image: usize,
    pub full_dll_name: usize,
    pub base_dll_name: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessParametersLayout {
    pub size: usize,
    /// `CURDIR.DosPath`, the leading member of `CURDIR`.
    pub current_directory: usize,
    pub dll_path: usize,
    pub image_path_name: usize,
    pub command_line: usize,
    pub environment: usize,
    pub window_title: usize,
    pub desktop_info: usize,
    pub shell_info: usize,
    pub runtime_data: usize,
}

impl ProcessParametersLayout {
    /// The string fields recorded individually, with a label for logging.
    pub fn string_fields(&self) -> [(&'static str, usize); 8] {
        [
            ("CurrentDirectory", self.current_directory),
            ("DllPath", self.dll_path),
            ("ImagePathName", self.image_path_name),
            ("CommandLine", self.command_line),
            ("WindowTitle", self.window_title),
            ("DesktopInfo", self.desktop_info),
            ("ShellInfo", self.shell_info),
            ("RuntimeData", self.runtime_data),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CriticalSectionLayout {
    pub size: usize,
    pub debug_info: usize,
    /// Size of the `RTL_CRITICAL_SECTION_DEBUG` companion.
    pub debug_size: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct UnloadEventLayout {
    pub size: usize,
    pub base_address: usize,
    pub size_of_image: usize,
    pub time_date_stamp: usize,
    pub check_sum: usize,
    pub image_name: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ExceptionLayout {
    pub record_size: usize,
    pub code: usize,
    pub flags: usize,
    pub address: usize,
    pub number_parameters: usize,
    pub information: usize,
    pub context_size: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TebLayout {
    pub size: usize,
    pub stack_base: usize,
    pub stack_limit: usize,
}

/// The per-module client info record. Only the pointer members move with the
/// target width; the leading scalars are fixed.
#[derive(Debug, Clone, Copy)]
pub struct ClientInfoLayout {
    pub size: usize,
    pub extra_memory_ranges: usize,
    pub simple_annotations: usize,
}

pub const CLIENT_INFO_SIGNATURE: u32 = 0x6461_5043;
pub const CLIENT_INFO_VERSION: u32 = 1;
pub const CLIENT_INFO_SIGNATURE_OFFSET: usize = 0x00;
pub const CLIENT_INFO_SIZE_OFFSET: usize = 0x04;
pub const CLIENT_INFO_VERSION_OFFSET: usize = 0x08;
pub const CLIENT_INFO_MEMORY_CAP_OFFSET: usize = 0x0C;
pub const CLIENT_INFO_HANDLER_BEHAVIOR_OFFSET: usize = 0x14;
pub const CLIENT_INFO_FORWARDING_OFFSET: usize = 0x15;
pub const CLIENT_INFO_GATHER_MEMORY_OFFSET: usize = 0x16;

/// `{u64 base, u64 size}` slots in an extra-memory-range bag.
pub const RANGE_BAG_ENTRIES: usize = 64;
pub const RANGE_BAG_ENTRY_SIZE: usize = 16;

/// `{char key[256], char value[256]}` slots in a simple annotation dictionary.
pub const ANNOTATION_ENTRIES: usize = 64;
pub const ANNOTATION_KEY_SIZE: usize = 256;
pub const ANNOTATION_VALUE_SIZE: usize = 256;
