//! Missing API from `<winnt.h>`

#![allow(bad_style, unused)]

type WORD = u16;
type DWORD = u32;
type LANGID = WORD;

pub const LANG_NEUTRAL: WORD = 0x00;
pub const LANG_ENGLISH: WORD = 0x09;

pub const SUBLANG_NEUTRAL: WORD = 0x00;
pub const SUBLANG_DEFAULT: WORD = 0x01;
pub const SUBLANG_ENGLISH_US: WORD = 0x01;

#[inline]
pub const fn MAKELANGID(p: WORD, s: WORD) -> LANGID {
    (s << 10) | p
}
#[inline]
pub const fn PRIMARYLANGID(lgid: LANGID) -> WORD {
    lgid & 0x3ff
}
#[inline]
pub const fn SUBLANGID(lgid: LANGID) -> WORD {
    lgid >> 10
}
