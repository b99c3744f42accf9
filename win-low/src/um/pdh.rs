//! `dwFormat` flags of `<Pdh.h>`.
//!
//! The `windows` crate only has the three representations (`PDH_FMT_LONG`, `PDH_FMT_DOUBLE`
//! and `PDH_FMT_LARGE`, as `PDH_FMT`); the modifiers below are missing there.

pub const PDH_FMT_RAW: u32 = 0x00000010;
pub const PDH_FMT_ANSI: u32 = 0x00000020;
pub const PDH_FMT_UNICODE: u32 = 0x00000040;
pub const PDH_FMT_NOSCALE: u32 = 0x00001000;
pub const PDH_FMT_1000: u32 = 0x00002000;
pub const PDH_FMT_NODATA: u32 = 0x00004000;
pub const PDH_FMT_NOCAP100: u32 = 0x00008000;
