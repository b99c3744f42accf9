use std::fmt;

use thiserror::Error;
use windows::Win32::Foundation::ERROR_SUCCESS;
use windows::Win32::System::Performance::*;

const SUCCESS_CODE: u32 = ERROR_SUCCESS.0;

/// Status code returned by a PDH function, or stored in the `CStatus` field of a counter value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PdhStatus(u32);

impl PdhStatus {
    pub const SUCCESS: Self = Self(SUCCESS_CODE);

    #[inline(always)]
    pub const fn new(code: u32) -> Self {
        PdhStatus(code)
    }

    /// Status code getter.
    #[inline(always)]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Turn the return value of a PDH function into a `Result`.
    #[inline]
    pub fn check(code: u32) -> Result<(), PdhStatus> {
        match code {
            SUCCESS_CODE => Ok(()),
            code => Err(PdhStatus(code)),
        }
    }

    pub const fn is_success(self) -> bool {
        self.0 == SUCCESS_CODE
    }

    /// Whether a counter value carrying this status holds usable data.
    pub const fn is_valid_data(self) -> bool {
        matches!(self.0, PDH_CSTATUS_VALID_DATA | PDH_CSTATUS_NEW_DATA)
    }

    pub const fn is_error(self) -> bool {
        self.0 >> 30 == 0b11
    }

    pub const fn is_warning(self) -> bool {
        self.0 >> 30 == 0b10
    }

    /// Symbolic name as in `<PdhMsg.h>`, if known.
    pub fn name(self) -> Option<&'static str> {
        known(self.0).map(|&(_, name, _)| name)
    }

    /// Built-in english description, if known.
    pub fn description(self) -> Option<&'static str> {
        known(self.0).map(|&(_, _, description)| description)
    }

    /// Human readable message. Tries the message table of pdh.dll first, then
    /// the built-in descriptions, and finally renders the bare number.
    /// Never returns an empty string.
    pub fn message(self) -> String {
        system::message(self.0)
            .filter(|message| !message.is_empty())
            .or_else(|| self.description().map(str::to_owned))
            .unwrap_or_else(|| fallback_message(self.0))
    }
}

fn fallback_message(code: u32) -> String {
    format!("pdh error #{}", code)
}

impl From<u32> for PdhStatus {
    fn from(code: u32) -> Self {
        PdhStatus(code)
    }
}

impl fmt::Debug for PdhStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "PdhStatus({} 0x{:08X})", name, self.0),
            None => write!(f, "PdhStatus(0x{:08X})", self.0),
        }
    }
}

impl fmt::Display for PdhStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.message(), self.0)
    }
}

impl std::error::Error for PdhStatus {}

/// Failure of a query, counter or array operation. Every variant keeps the
/// status code reported by PDH.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PdhError {
    /// Query could not be opened or closed. The session is unusable.
    #[error("query session failed: {status}")]
    Session { status: PdhStatus },

    /// Counter path was rejected when attaching (or detaching) a counter.
    #[error("counter {path:?} could not be attached: {status}")]
    Attach { path: String, status: PdhStatus },

    /// One data collection failed. Counters stay attached; try again on the next poll.
    #[error("data collection failed: {status}")]
    Collection { status: PdhStatus },

    /// Value of a counter could not be read.
    #[error("counter {path:?} could not be read: {status}")]
    Read { path: String, status: PdhStatus },

    /// Array of a counter could not be read even after growing the buffer.
    #[error("counter {path:?} could not be read into a buffer of {size} bytes: {status}")]
    BufferGrow {
        path: String,
        size: usize,
        status: PdhStatus,
    },
}

impl PdhError {
    pub fn status(&self) -> PdhStatus {
        match *self {
            PdhError::Session { status }
            | PdhError::Attach { status, .. }
            | PdhError::Collection { status }
            | PdhError::Read { status, .. }
            | PdhError::BufferGrow { status, .. } => status,
        }
    }

    /// Counter instance does not exist (anymore), or a multi-instance counter was read
    /// as a single value. Not a failure: there is just no sample for this cycle.
    pub fn is_instance_unavailable(&self) -> bool {
        matches!(
            self,
            PdhError::Read { status, .. } | PdhError::BufferGrow { status, .. }
                if matches!(status.code(), PDH_INVALID_DATA | PDH_CSTATUS_NO_INSTANCE)
        )
    }

    /// No usable sample is available for a read, e.g. before the first collection.
    pub fn is_no_data(&self) -> bool {
        if self.is_instance_unavailable() {
            return true;
        }
        match self {
            PdhError::Read { status, .. } => matches!(
                status.code(),
                PDH_NO_DATA
                    | PDH_CSTATUS_INVALID_DATA
                    | PDH_CSTATUS_ITEM_NOT_VALIDATED
                    | PDH_CALC_NEGATIVE_DENOMINATOR
                    | PDH_CALC_NEGATIVE_TIMEBASE
                    | PDH_CALC_NEGATIVE_VALUE
            ),
            _ => false,
        }
    }

    /// Whether the same operation may succeed on a later poll cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PdhError::Collection { .. }) || self.is_no_data()
    }
}

/// Rust + PDH extension for error handling
pub type PdhResult<T> = Result<T, PdhError>;

fn known(code: u32) -> Option<&'static (u32, &'static str, &'static str)> {
    KNOWN_STATUS.iter().find(|(known, _, _)| *known == code)
}

#[rustfmt::skip]
static KNOWN_STATUS: &[(u32, &str, &str)] = &[
    (PDH_CSTATUS_VALID_DATA, "PDH_CSTATUS_VALID_DATA", "The returned data is valid."),
    (PDH_CSTATUS_NEW_DATA, "PDH_CSTATUS_NEW_DATA", "The return data value is valid and different from the last sample."),
    (PDH_CSTATUS_NO_MACHINE, "PDH_CSTATUS_NO_MACHINE", "Unable to connect to the specified computer, or the computer is offline."),
    (PDH_CSTATUS_NO_INSTANCE, "PDH_CSTATUS_NO_INSTANCE", "The specified instance is not present."),
    (PDH_MORE_DATA, "PDH_MORE_DATA", "There is more data to return than would fit in the supplied buffer."),
    (PDH_CSTATUS_ITEM_NOT_VALIDATED, "PDH_CSTATUS_ITEM_NOT_VALIDATED", "The data item has been added to the query but has not been validated nor accessed."),
    (PDH_RETRY, "PDH_RETRY", "The selected operation should be retried."),
    (PDH_NO_DATA, "PDH_NO_DATA", "No data to return."),
    (PDH_CALC_NEGATIVE_DENOMINATOR, "PDH_CALC_NEGATIVE_DENOMINATOR", "A counter with a negative denominator value was detected."),
    (PDH_CALC_NEGATIVE_TIMEBASE, "PDH_CALC_NEGATIVE_TIMEBASE", "A counter with a negative timebase value was detected."),
    (PDH_CALC_NEGATIVE_VALUE, "PDH_CALC_NEGATIVE_VALUE", "A counter with a negative value was detected."),
    (PDH_DIALOG_CANCELLED, "PDH_DIALOG_CANCELLED", "The user canceled the dialog box."),
    (PDH_CSTATUS_NO_OBJECT, "PDH_CSTATUS_NO_OBJECT", "The specified object is not found on the system."),
    (PDH_CSTATUS_NO_COUNTER, "PDH_CSTATUS_NO_COUNTER", "The specified counter could not be found."),
    (PDH_CSTATUS_INVALID_DATA, "PDH_CSTATUS_INVALID_DATA", "The returned data is not valid."),
    (PDH_MEMORY_ALLOCATION_FAILURE, "PDH_MEMORY_ALLOCATION_FAILURE", "A PDH function could not allocate enough temporary memory to complete the operation."),
    (PDH_INVALID_HANDLE, "PDH_INVALID_HANDLE", "The handle is not a valid PDH object."),
    (PDH_INVALID_ARGUMENT, "PDH_INVALID_ARGUMENT", "A required argument is missing or incorrect."),
    (PDH_FUNCTION_NOT_FOUND, "PDH_FUNCTION_NOT_FOUND", "Unable to find the specified function."),
    (PDH_CSTATUS_NO_COUNTERNAME, "PDH_CSTATUS_NO_COUNTERNAME", "No counter was specified."),
    (PDH_CSTATUS_BAD_COUNTERNAME, "PDH_CSTATUS_BAD_COUNTERNAME", "Unable to parse the counter path. Check the format and syntax of the specified path."),
    (PDH_INVALID_BUFFER, "PDH_INVALID_BUFFER", "The buffer passed by the caller is not valid."),
    (PDH_INSUFFICIENT_BUFFER, "PDH_INSUFFICIENT_BUFFER", "The requested data is larger than the buffer supplied."),
    (PDH_CANNOT_CONNECT_MACHINE, "PDH_CANNOT_CONNECT_MACHINE", "Unable to connect to the requested computer."),
    (PDH_INVALID_PATH, "PDH_INVALID_PATH", "The specified counter path could not be interpreted."),
    (PDH_INVALID_INSTANCE, "PDH_INVALID_INSTANCE", "The instance name could not be read from the specified counter path."),
    (PDH_INVALID_DATA, "PDH_INVALID_DATA", "The data is not valid."),
    (PDH_NO_DIALOG_DATA, "PDH_NO_DIALOG_DATA", "The dialog box data block was missing or not valid."),
    (PDH_CANNOT_READ_NAME_STRINGS, "PDH_CANNOT_READ_NAME_STRINGS", "Unable to read the counter and/or help text from the specified computer."),
    (PDH_LOG_FILE_CREATE_ERROR, "PDH_LOG_FILE_CREATE_ERROR", "Unable to create the specified log file."),
    (PDH_LOG_FILE_OPEN_ERROR, "PDH_LOG_FILE_OPEN_ERROR", "Unable to open the specified log file."),
    (PDH_LOG_TYPE_NOT_FOUND, "PDH_LOG_TYPE_NOT_FOUND", "The specified log file type has not been installed on this system."),
    (PDH_NO_MORE_DATA, "PDH_NO_MORE_DATA", "No more data is available."),
    (PDH_ENTRY_NOT_IN_LOG_FILE, "PDH_ENTRY_NOT_IN_LOG_FILE", "The specified record was not found in the log file."),
    (PDH_DATA_SOURCE_IS_LOG_FILE, "PDH_DATA_SOURCE_IS_LOG_FILE", "The specified data source is a log file."),
    (PDH_DATA_SOURCE_IS_REAL_TIME, "PDH_DATA_SOURCE_IS_REAL_TIME", "The specified data source is the current activity."),
    (PDH_UNABLE_READ_LOG_HEADER, "PDH_UNABLE_READ_LOG_HEADER", "The log file header could not be read."),
    (PDH_FILE_NOT_FOUND, "PDH_FILE_NOT_FOUND", "Unable to find the specified file."),
];

#[cfg(windows)]
mod system {
    use widestring::U16Str;
    use windows::Win32::System::Diagnostics::Debug::{
        FORMAT_MESSAGE_ARGUMENT_ARRAY, FORMAT_MESSAGE_FROM_HMODULE, FORMAT_MESSAGE_IGNORE_INSERTS,
        FormatMessageW,
    };
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows_core::{PWSTR, w};

    use win_low::um::winnt::*;

    use crate::format::trim_line_endings;

    const BUFFER_LEN: usize = 300;

    /// Look up the message table of pdh.dll, in english first and then in the neutral language.
    pub fn message(code: u32) -> Option<String> {
        // SAFETY: pdh.dll is loaded for as long as this crate links against it
        let module = unsafe { GetModuleHandleW(w!("pdh.dll")) }.ok()?;
        let flags = FORMAT_MESSAGE_FROM_HMODULE
            | FORMAT_MESSAGE_ARGUMENT_ARRAY
            | FORMAT_MESSAGE_IGNORE_INSERTS;
        let mut buffer = [0u16; BUFFER_LEN];
        for lang_id in [
            MAKELANGID(LANG_ENGLISH, SUBLANG_ENGLISH_US),
            MAKELANGID(LANG_NEUTRAL, SUBLANG_NEUTRAL),
        ] {
            // If the function succeeds, the return value is the number of TCHARs stored in the
            // output buffer, excluding the terminating null character.
            let len = unsafe {
                FormatMessageW(
                    flags,
                    Some(module.0 as *const _),
                    code,
                    lang_id as u32,
                    PWSTR(buffer.as_mut_ptr()),
                    BUFFER_LEN as u32,
                    None,
                )
            };
            if len != 0 {
                let message = trim_line_endings(&buffer[..len as usize]);
                return Some(U16Str::from_slice(message).to_string_lossy());
            }
        }
        None
    }
}

#[cfg(not(windows))]
mod system {
    pub fn message(_code: u32) -> Option<String> {
        None
    }
}
