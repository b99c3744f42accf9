//! Everything you need to get started with PDH queries.
#![allow(unused_imports)]

pub use widestring::{U16CStr, U16CString, U16Str, U16String, u16cstr, u16str};

pub use windows::Win32::System::Performance::*;

pub use win_low::um::pdh::*;

pub use crate::error::*;
pub use crate::pdh::*;
