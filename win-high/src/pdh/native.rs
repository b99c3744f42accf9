//! `PdhApi` backed by pdh.dll.
#[cfg(windows)]
use std::ffi::c_void;

use widestring::U16CStr;
use windows::Win32::System::Performance::*;
#[cfg(windows)]
use windows_core::PCWSTR;

use crate::error::PdhStatus;
use crate::pdh::api::*;

/// The system's Performance Data Helper. On platforms other than Windows every call fails
/// with `PDH_FUNCTION_NOT_FOUND`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Native;

#[cfg(windows)]
impl QueryHandle {
    fn to_native(self) -> PDH_HQUERY {
        PDH_HQUERY(self.0 as *mut c_void)
    }
}

#[cfg(windows)]
impl CounterHandle {
    fn to_native(self) -> PDH_HCOUNTER {
        PDH_HCOUNTER(self.0 as *mut c_void)
    }
}

#[cfg(windows)]
impl PdhApi for Native {
    fn open_query(
        &self,
        data_source: Option<&U16CStr>,
        user_data: usize,
    ) -> Result<QueryHandle, PdhStatus> {
        let source = data_source.map_or(PCWSTR::null(), |s| PCWSTR(s.as_ptr()));
        let mut handle = PDH_HQUERY::default();
        PdhStatus::check(unsafe { PdhOpenQueryW(source, user_data, &mut handle) })?;
        Ok(QueryHandle(handle.0 as isize))
    }

    fn close_query(&self, query: QueryHandle) -> Result<(), PdhStatus> {
        PdhStatus::check(unsafe { PdhCloseQuery(query.to_native()) })
    }

    fn collect_query_data(&self, query: QueryHandle) -> Result<(), PdhStatus> {
        PdhStatus::check(unsafe { PdhCollectQueryData(query.to_native()) })
    }

    fn add_counter(
        &self,
        query: QueryHandle,
        path: &U16CStr,
        user_data: usize,
    ) -> Result<CounterHandle, PdhStatus> {
        let mut handle = PDH_HCOUNTER::default();
        PdhStatus::check(unsafe {
            PdhAddCounterW(query.to_native(), PCWSTR(path.as_ptr()), user_data, &mut handle)
        })?;
        Ok(CounterHandle(handle.0 as isize))
    }

    fn remove_counter(&self, counter: CounterHandle) -> Result<(), PdhStatus> {
        PdhStatus::check(unsafe { PdhRemoveCounter(counter.to_native()) })
    }

    fn raw_counter_value(
        &self,
        counter: CounterHandle,
    ) -> Result<(u32, PDH_RAW_COUNTER), PdhStatus> {
        let mut counter_type = 0;
        let mut value = PDH_RAW_COUNTER::default();
        PdhStatus::check(unsafe {
            PdhGetRawCounterValue(counter.to_native(), Some(&raw mut counter_type), &mut value)
        })?;
        Ok((counter_type, value))
    }

    fn formatted_counter_value(
        &self,
        counter: CounterHandle,
        format: u32,
    ) -> Result<(u32, PDH_FMT_COUNTERVALUE), PdhStatus> {
        let mut counter_type = 0;
        let mut value = PDH_FMT_COUNTERVALUE::default();
        PdhStatus::check(unsafe {
            PdhGetFormattedCounterValue(
                counter.to_native(),
                PDH_FMT(format),
                Some(&raw mut counter_type),
                &mut value,
            )
        })?;
        Ok((counter_type, value))
    }

    unsafe fn formatted_counter_array(
        &self,
        counter: CounterHandle,
        format: u32,
        size: &mut u32,
        count: &mut u32,
        items: *mut PDH_FMT_COUNTERVALUE_ITEM_W,
    ) -> PdhStatus {
        // SAFETY: forwarded to the caller
        PdhStatus::new(unsafe {
            PdhGetFormattedCounterArrayW(counter.to_native(), PDH_FMT(format), size, count, Some(items))
        })
    }
}

#[cfg(not(windows))]
impl PdhApi for Native {
    fn open_query(&self, _: Option<&U16CStr>, _: usize) -> Result<QueryHandle, PdhStatus> {
        Err(unsupported())
    }

    fn close_query(&self, _: QueryHandle) -> Result<(), PdhStatus> {
        Err(unsupported())
    }

    fn collect_query_data(&self, _: QueryHandle) -> Result<(), PdhStatus> {
        Err(unsupported())
    }

    fn add_counter(&self, _: QueryHandle, _: &U16CStr, _: usize) -> Result<CounterHandle, PdhStatus> {
        Err(unsupported())
    }

    fn remove_counter(&self, _: CounterHandle) -> Result<(), PdhStatus> {
        Err(unsupported())
    }

    fn raw_counter_value(&self, _: CounterHandle) -> Result<(u32, PDH_RAW_COUNTER), PdhStatus> {
        Err(unsupported())
    }

    fn formatted_counter_value(
        &self,
        _: CounterHandle,
        _: u32,
    ) -> Result<(u32, PDH_FMT_COUNTERVALUE), PdhStatus> {
        Err(unsupported())
    }

    unsafe fn formatted_counter_array(
        &self,
        _: CounterHandle,
        _: u32,
        _: &mut u32,
        _: &mut u32,
        _: *mut PDH_FMT_COUNTERVALUE_ITEM_W,
    ) -> PdhStatus {
        unsupported()
    }
}

#[cfg(not(windows))]
fn unsupported() -> PdhStatus {
    PdhStatus::new(PDH_FUNCTION_NOT_FOUND)
}
