use widestring::{U16CStr, U16CString, error::ContainsNul, u16cstr};

/// Strip trailing `\r` and `\n` characters, as found at the end of system messages.
pub fn trim_line_endings(mut input: &[u16]) -> &[u16] {
    const CR: u16 = b'\r' as u16;
    const LF: u16 = b'\n' as u16;
    while let [rest @ .., CR | LF] = input {
        input = rest;
    }
    input
}

/// Encode a string argument for a `PCWSTR` parameter.
pub fn to_wide(s: &str) -> Result<U16CString, ContainsNul<u16>> {
    U16CString::from_str(s)
}

/// Same as `to_wide`, but empty input means "no value" (NULL pointer).
pub fn to_wide_opt(s: &str) -> Result<Option<U16CString>, ContainsNul<u16>> {
    if s.is_empty() {
        return Ok(None);
    }
    to_wide(s).map(Some)
}

/// Borrow a NUL-terminated UTF-16 string owned by someone else. NULL becomes an empty string.
///
/// # Safety
/// Non-null `p` must point to a NUL-terminated string which outlives `'a`.
pub unsafe fn wide_from_ptr<'a>(p: *const u16) -> &'a U16CStr {
    if p.is_null() {
        return u16cstr!("");
    }
    unsafe { U16CStr::from_ptr_str(p) }
}
