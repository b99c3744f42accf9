//! Predefined counter types of `<WinPerf.h>`.
//!
//! These are macros in C, so the `windows` crate only has the bits they are built from.

use windows::Win32::System::Performance::*;

type DWORD = u32;

// predefined counter types
pub const PERF_COUNTER_COUNTER: DWORD = PERF_SIZE_DWORD
    | PERF_TYPE_COUNTER
    | PERF_COUNTER_RATE
    | PERF_TIMER_TICK
    | PERF_DELTA_COUNTER
    | PERF_DISPLAY_PER_SEC;
pub const PERF_COUNTER_BULK_COUNT: DWORD = PERF_SIZE_LARGE
    | PERF_TYPE_COUNTER
    | PERF_COUNTER_RATE
    | PERF_TIMER_TICK
    | PERF_DELTA_COUNTER
    | PERF_DISPLAY_PER_SEC;
pub const PERF_COUNTER_RAWCOUNT: DWORD =
    PERF_SIZE_DWORD | PERF_TYPE_NUMBER | PERF_NUMBER_DECIMAL | PERF_DISPLAY_NO_SUFFIX;
pub const PERF_COUNTER_LARGE_RAWCOUNT: DWORD =
    PERF_SIZE_LARGE | PERF_TYPE_NUMBER | PERF_NUMBER_DECIMAL | PERF_DISPLAY_NO_SUFFIX;
pub const PERF_100NSEC_TIMER: DWORD = PERF_SIZE_LARGE
    | PERF_TYPE_COUNTER
    | PERF_COUNTER_RATE
    | PERF_TIMER_100NS
    | PERF_DELTA_COUNTER
    | PERF_DISPLAY_PERCENT;
pub const PERF_100NSEC_TIMER_INV: DWORD = PERF_SIZE_LARGE
    | PERF_TYPE_COUNTER
    | PERF_COUNTER_RATE
    | PERF_TIMER_100NS
    | PERF_DELTA_COUNTER
    | PERF_INVERSE_COUNTER
    | PERF_DISPLAY_PERCENT;
pub const PERF_RAW_FRACTION: DWORD =
    PERF_SIZE_DWORD | PERF_TYPE_COUNTER | PERF_COUNTER_FRACTION | PERF_DISPLAY_PERCENT;
pub const PERF_ELAPSED_TIME: DWORD = PERF_SIZE_LARGE
    | PERF_TYPE_COUNTER
    | PERF_COUNTER_ELAPSED
    | PERF_OBJECT_TIMER
    | PERF_DISPLAY_SECONDS;
