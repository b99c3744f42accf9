//! Bits of `<Pdh.h>`, `<WinPerf.h>` and `<WinNT.h>` which the `windows` crate does not carry.
pub mod um;
