//! Raw and formatted counter values.
use std::fmt;

use bitflags::bitflags;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use widestring::U16CStr;
use windows::Win32::Foundation::FILETIME;
use windows::Win32::System::Performance::{
    PDH_FMT_COUNTERVALUE, PDH_FMT_DOUBLE, PDH_FMT_LARGE, PDH_FMT_LONG, PDH_RAW_COUNTER,
};

use win_low::um::pdh::*;

use crate::error::PdhStatus;

/// Number of FILETIME ticks (100 ns) in one second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

const NANOS_PER_TICK: i64 = 100;

/// Start of the FILETIME epoch, 1601-01-01 00:00:00.
fn filetime_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1601, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub const fn filetime_ticks(ft: FILETIME) -> u64 {
    ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64
}

pub const fn filetime_from_ticks(ticks: u64) -> FILETIME {
    FILETIME {
        dwLowDateTime: ticks as u32,
        dwHighDateTime: (ticks >> 32) as u32,
    }
}

/// Civil time of a FILETIME tick count. `None` if beyond the range of `NaiveDateTime`.
pub fn filetime_to_naive(ticks: u64) -> Option<NaiveDateTime> {
    let ticks = i64::try_from(ticks).ok()?;
    let delta = TimeDelta::try_seconds(ticks / TICKS_PER_SECOND)?
        + TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK);
    filetime_epoch().checked_add_signed(delta)
}

/// Tick count of a civil time. Sub-tick precision is truncated; times before the epoch give `None`.
pub fn naive_to_filetime(time: NaiveDateTime) -> Option<u64> {
    let delta = time.signed_duration_since(filetime_epoch());
    let ticks = delta
        .num_seconds()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(delta.subsec_nanos()) / NANOS_PER_TICK)?;
    u64::try_from(ticks).ok()
}

/// One raw sample of a counter, as it was at the last collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawCounter {
    pub status: PdhStatus,
    /// Local time of the sample, in FILETIME ticks.
    pub timestamp: u64,
    pub first_value: i64,
    pub second_value: i64,
    /// Number of instances that were summed into `first_value`, for multi counters.
    pub multi_count: u32,
}

impl RawCounter {
    /// Time of the sample, without a time zone.
    pub fn naive_time(&self) -> Option<NaiveDateTime> {
        filetime_to_naive(self.timestamp)
    }

    /// Time of the sample in the local time zone.
    ///
    /// PDH stamps samples with the local wall clock, so the fields are taken as they are rather
    /// than converted from UTC. A time which falls into a DST gap yields `None`; an ambiguous
    /// one resolves to the earlier instant.
    pub fn time(&self) -> Option<DateTime<Local>> {
        let naive = self.naive_time()?;
        Local.from_local_datetime(&naive).earliest()
    }
}

impl From<PDH_RAW_COUNTER> for RawCounter {
    fn from(raw: PDH_RAW_COUNTER) -> Self {
        RawCounter {
            status: PdhStatus::new(raw.CStatus),
            timestamp: filetime_ticks(raw.TimeStamp),
            first_value: raw.FirstValue,
            second_value: raw.SecondValue,
            multi_count: raw.MultiCount,
        }
    }
}

/// Data type of a formatted value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Representation {
    /// `PDH_FMT_DOUBLE`
    Double,
    /// `PDH_FMT_LARGE`, 64 bit integer
    Large,
    /// `PDH_FMT_LONG`, 32 bit integer
    Long,
}

const FMT_DOUBLE: u32 = PDH_FMT_DOUBLE.0;
const FMT_LARGE: u32 = PDH_FMT_LARGE.0;
const FMT_LONG: u32 = PDH_FMT_LONG.0;

impl Representation {
    pub const fn into_raw(self) -> u32 {
        match self {
            Representation::Double => FMT_DOUBLE,
            Representation::Large => FMT_LARGE,
            Representation::Long => FMT_LONG,
        }
    }
}

bitflags! {
    /// Scaling modifiers which may be combined with any `Representation`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Scaling: u32 {
        /// Do not apply the counter's default scaling factor.
        const NOSCALE = PDH_FMT_NOSCALE;
        /// Do not cap values at 100, e.g. processor time on multiprocessor machines.
        const NOCAP100 = PDH_FMT_NOCAP100;
        /// Multiply the actual value by 1000.
        const MULTIPLY_1000 = PDH_FMT_1000;
    }
}

/// Format of a formatted read: exactly one representation plus any scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Format {
    pub representation: Representation,
    pub scaling: Scaling,
}

impl Format {
    pub const fn new(representation: Representation) -> Self {
        Format {
            representation,
            scaling: Scaling::empty(),
        }
    }

    pub const fn with_scaling(self, scaling: Scaling) -> Self {
        Format {
            representation: self.representation,
            scaling: scaling.union(self.scaling),
        }
    }

    /// Parse a `PDH_FMT_*` mask. Zero or several representations, or unknown bits, give `None`.
    pub fn from_raw(value: u32) -> Option<Self> {
        let representation = match value & (FMT_DOUBLE | FMT_LARGE | FMT_LONG) {
            FMT_DOUBLE => Representation::Double,
            FMT_LARGE => Representation::Large,
            FMT_LONG => Representation::Long,
            _ => return None,
        };
        let scaling = Scaling::from_bits(value & !representation.into_raw())?;
        Some(Format {
            representation,
            scaling,
        })
    }

    pub const fn into_raw(self) -> u32 {
        self.representation.into_raw() | self.scaling.bits()
    }
}

impl From<Representation> for Format {
    fn from(representation: Representation) -> Self {
        Format::new(representation)
    }
}

/// A formatted number, in the representation it was requested in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FmtValue {
    Double(f64),
    Large(i64),
    Long(i32),
}

impl FmtValue {
    pub fn as_f64(self) -> f64 {
        match self {
            FmtValue::Double(value) => value,
            FmtValue::Large(value) => value as f64,
            FmtValue::Long(value) => f64::from(value),
        }
    }

    pub fn representation(self) -> Representation {
        match self {
            FmtValue::Double(_) => Representation::Double,
            FmtValue::Large(_) => Representation::Large,
            FmtValue::Long(_) => Representation::Long,
        }
    }
}

impl fmt::Display for FmtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmtValue::Double(value) => fmt::Display::fmt(value, f),
            FmtValue::Large(value) => fmt::Display::fmt(value, f),
            FmtValue::Long(value) => fmt::Display::fmt(value, f),
        }
    }
}

/// Formatted counter value together with its data status.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormattedValue {
    pub status: PdhStatus,
    pub value: FmtValue,
}

impl FormattedValue {
    /// Read the member of the native union which `representation` selects.
    pub fn from_raw(raw: &PDH_FMT_COUNTERVALUE, representation: Representation) -> Self {
        // SAFETY: every member is plain old data, and PDH fills the one that the format asked for
        let value = unsafe {
            match representation {
                Representation::Double => FmtValue::Double(raw.Anonymous.doubleValue),
                Representation::Large => FmtValue::Large(raw.Anonymous.largeValue),
                Representation::Long => FmtValue::Long(raw.Anonymous.longValue),
            }
        };
        FormattedValue {
            status: PdhStatus::new(raw.CStatus),
            value,
        }
    }
}

/// One instance of a multi-instance counter. The name borrows from the `FmtArray` buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FmtItem<'a> {
    pub name: &'a U16CStr,
    pub value: FormattedValue,
}

impl<'a> FmtItem<'a> {
    pub fn name_string(&self) -> String {
        self.name.to_string_lossy()
    }
}
