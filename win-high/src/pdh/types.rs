//! Counter type, as reported by every raw and formatted read.
//!
//! The type is a packed `u32`. From the low to the high bits: size of the value (bits 8-9),
//! field usage (10-11), subtype (16-19), time base (20-21), calculation modifiers (22-27)
//! and display suffix (28-31). The remaining bits are reserved.
use std::fmt;

use bitflags::bitflags;

use windows::Win32::System::Performance::*;

const SIZE_MASK: u32 = 0x0000_0300;
const TYPE_MASK: u32 = 0x0000_0C00;
const SUBTYPE_MASK: u32 = 0x000F_0000;
const TIME_BASE_MASK: u32 = 0x0030_0000;
const MODIFIERS_MASK: u32 = 0x0FC0_0000;
const DISPLAY_MASK: u32 = 0xF000_0000;

/// Decoded view of a counter type value.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct CounterTypeDefinition(u32);

/// Width of the raw value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Size {
    Dword,
    Large,
    Zero,
    /// variable length
    Var,
}

/// Field usage together with its subtype.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CounterType {
    Number(Number),
    Counter(Counter),
    Text(Text),
    Zero,
}

/// How a plain number is shown.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Number {
    Hex,
    Decimal,
    /// decimal, divided by 1000
    Dec1000,
}

/// How a counter is computed from its samples.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Counter {
    Value,
    /// per unit of time between two samples
    Rate,
    /// over a base counter
    Fraction,
    /// denominator of a fraction
    Base,
    /// time since the value
    Elapsed,
    Queuelen,
    Histogram,
    /// over a counter-specific clock
    Precision,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Text {
    Unicode,
    Ascii,
}

/// Clock that rates and elapsed times are measured against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Timer {
    /// system performance frequency
    TimerTick,
    /// 100 ns units
    Timer100NS,
    /// frequency supplied by the object
    ObjectTimer,
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct CalculationModifiers: u32 {
        /// The counter is a difference of two samples.
        const DELTA = PERF_DELTA_COUNTER;
        /// So is its base.
        const DELTA_BASE = PERF_DELTA_BASE;
        /// Shown as `1 - value`, e.g. busy time out of idle time.
        const INVERSE = PERF_INVERSE_COUNTER;
        /// Sum over several instances, see `MultiCount`.
        const MULTI = PERF_MULTI_COUNTER;
    }
}

/// Unit suffix shown after the value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayFlags {
    NoSuffix,
    /// "/sec"
    PerSec,
    /// "%"
    Percent,
    /// "secs"
    Seconds,
    /// hidden from browsers
    NoShow,
}

impl CounterTypeDefinition {
    #[inline(always)]
    pub const fn from_raw(value: u32) -> Self {
        CounterTypeDefinition(value)
    }

    #[inline(always)]
    pub const fn into_raw(self) -> u32 {
        self.0
    }

    pub fn size(&self) -> Size {
        match self.0 & SIZE_MASK {
            PERF_SIZE_DWORD => Size::Dword,
            PERF_SIZE_LARGE => Size::Large,
            PERF_SIZE_ZERO => Size::Zero,
            _ => Size::Var,
        }
    }

    /// Subtype bits, meaning depends on `counter_type`.
    pub fn sub_type(&self) -> u32 {
        self.0 & SUBTYPE_MASK
    }

    /// Type and subtype. `None` for a subtype unknown to `<WinPerf.h>`.
    pub fn counter_type(&self) -> Option<CounterType> {
        let sub_type = self.sub_type();
        Some(match self.0 & TYPE_MASK {
            PERF_TYPE_NUMBER => CounterType::Number(match sub_type {
                PERF_NUMBER_HEX => Number::Hex,
                PERF_NUMBER_DECIMAL => Number::Decimal,
                PERF_NUMBER_DEC_1000 => Number::Dec1000,
                _ => return None,
            }),
            PERF_TYPE_COUNTER => CounterType::Counter(match sub_type {
                PERF_COUNTER_VALUE => Counter::Value,
                PERF_COUNTER_RATE => Counter::Rate,
                PERF_COUNTER_FRACTION => Counter::Fraction,
                PERF_COUNTER_BASE => Counter::Base,
                PERF_COUNTER_ELAPSED => Counter::Elapsed,
                PERF_COUNTER_QUEUELEN => Counter::Queuelen,
                PERF_COUNTER_HISTOGRAM => Counter::Histogram,
                PERF_COUNTER_PRECISION => Counter::Precision,
                _ => return None,
            }),
            PERF_TYPE_TEXT => CounterType::Text(match sub_type {
                PERF_TEXT_UNICODE => Text::Unicode,
                PERF_TEXT_ASCII => Text::Ascii,
                _ => return None,
            }),
            // zero-length fields carry no subtype
            _ => CounterType::Zero,
        })
    }

    pub fn time_base(&self) -> Option<Timer> {
        Some(match self.0 & TIME_BASE_MASK {
            PERF_TIMER_TICK => Timer::TimerTick,
            PERF_TIMER_100NS => Timer::Timer100NS,
            PERF_OBJECT_TIMER => Timer::ObjectTimer,
            _ => return None,
        })
    }

    pub fn calculation_modifiers(&self) -> Option<CalculationModifiers> {
        CalculationModifiers::from_bits(self.0 & MODIFIERS_MASK)
    }

    pub fn display_flags(&self) -> Option<DisplayFlags> {
        Some(match self.0 & DISPLAY_MASK {
            PERF_DISPLAY_NO_SUFFIX => DisplayFlags::NoSuffix,
            PERF_DISPLAY_PER_SEC => DisplayFlags::PerSec,
            PERF_DISPLAY_PERCENT => DisplayFlags::Percent,
            PERF_DISPLAY_SECONDS => DisplayFlags::Seconds,
            PERF_DISPLAY_NOSHOW => DisplayFlags::NoShow,
            _ => return None,
        })
    }

    /// Formatted value is computed from two samples, so it needs two collections.
    pub fn is_rate(&self) -> bool {
        self.calculation_modifiers()
            .is_some_and(|modifiers| modifiers.contains(CalculationModifiers::DELTA))
    }
}

impl From<u32> for CounterTypeDefinition {
    fn from(value: u32) -> Self {
        CounterTypeDefinition(value)
    }
}

impl fmt::Debug for CounterTypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterTypeDefinition")
            .field("raw", &format_args!("{:#010x}", self.0))
            .field("size", &self.size())
            .field("type", &self.counter_type())
            .field("timer", &self.time_base())
            .field("modifiers", &self.calculation_modifiers())
            .field("display", &self.display_flags())
            .finish()
    }
}
