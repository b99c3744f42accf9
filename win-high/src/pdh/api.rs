//! The seam between the safe wrappers and whoever actually answers PDH calls.
use widestring::U16CStr;
use windows::Win32::System::Performance::{
    PDH_FMT_COUNTERVALUE, PDH_FMT_COUNTERVALUE_ITEM_W, PDH_RAW_COUNTER,
};

use crate::error::PdhStatus;

/// Opaque query handle, as returned by `PdhOpenQuery`. Kept as an address rather than a
/// `PDH_HQUERY` pointer, so that a query can move to another thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryHandle(pub isize);

/// Opaque counter handle, as returned by `PdhAddCounter`. Valid until the counter is removed
/// or its query is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CounterHandle(pub isize);

/// The PDH functions used by `Query`, `Counter` and `FmtArray`.
///
/// Every call is blocking and synchronous. Implementations report failures with the
/// native status code, untouched.
pub trait PdhApi {
    /// `PdhOpenQueryW`. `None` data source means real-time data of the local machine.
    fn open_query(
        &self,
        data_source: Option<&U16CStr>,
        user_data: usize,
    ) -> Result<QueryHandle, PdhStatus>;

    /// `PdhCloseQuery`. Closes all counters of the query as well.
    fn close_query(&self, query: QueryHandle) -> Result<(), PdhStatus>;

    /// `PdhCollectQueryData`.
    fn collect_query_data(&self, query: QueryHandle) -> Result<(), PdhStatus>;

    /// `PdhAddCounterW`.
    fn add_counter(
        &self,
        query: QueryHandle,
        path: &U16CStr,
        user_data: usize,
    ) -> Result<CounterHandle, PdhStatus>;

    /// `PdhRemoveCounter`.
    fn remove_counter(&self, counter: CounterHandle) -> Result<(), PdhStatus>;

    /// `PdhGetRawCounterValue`. Returns counter type and the raw record.
    fn raw_counter_value(
        &self,
        counter: CounterHandle,
    ) -> Result<(u32, PDH_RAW_COUNTER), PdhStatus>;

    /// `PdhGetFormattedCounterValue`. Returns counter type and the formatted value.
    fn formatted_counter_value(
        &self,
        counter: CounterHandle,
        format: u32,
    ) -> Result<(u32, PDH_FMT_COUNTERVALUE), PdhStatus>;

    /// `PdhGetFormattedCounterArrayW`.
    ///
    /// On input `*size` is the size of `items` in bytes. If it is too small, the call fails
    /// with `PDH_MORE_DATA` and `*size` is set to the required size. On success `*count` is
    /// the number of items at the start of the buffer; their names are stored in the same
    /// buffer, after the items.
    ///
    /// # Safety
    /// `items` must be NULL if `*size` is zero, otherwise it must be valid for writes of
    /// `*size` bytes and aligned for `PDH_FMT_COUNTERVALUE_ITEM_W`.
    unsafe fn formatted_counter_array(
        &self,
        counter: CounterHandle,
        format: u32,
        size: &mut u32,
        count: &mut u32,
        items: *mut PDH_FMT_COUNTERVALUE_ITEM_W,
    ) -> PdhStatus;
}

impl<T: PdhApi + ?Sized> PdhApi for &T {
    fn open_query(
        &self,
        data_source: Option<&U16CStr>,
        user_data: usize,
    ) -> Result<QueryHandle, PdhStatus> {
        (**self).open_query(data_source, user_data)
    }

    fn close_query(&self, query: QueryHandle) -> Result<(), PdhStatus> {
        (**self).close_query(query)
    }

    fn collect_query_data(&self, query: QueryHandle) -> Result<(), PdhStatus> {
        (**self).collect_query_data(query)
    }

    fn add_counter(
        &self,
        query: QueryHandle,
        path: &U16CStr,
        user_data: usize,
    ) -> Result<CounterHandle, PdhStatus> {
        (**self).add_counter(query, path, user_data)
    }

    fn remove_counter(&self, counter: CounterHandle) -> Result<(), PdhStatus> {
        (**self).remove_counter(counter)
    }

    fn raw_counter_value(
        &self,
        counter: CounterHandle,
    ) -> Result<(u32, PDH_RAW_COUNTER), PdhStatus> {
        (**self).raw_counter_value(counter)
    }

    fn formatted_counter_value(
        &self,
        counter: CounterHandle,
        format: u32,
    ) -> Result<(u32, PDH_FMT_COUNTERVALUE), PdhStatus> {
        (**self).formatted_counter_value(counter, format)
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
        unsafe { (**self).formatted_counter_array(counter, format, size, count, items) }
    }
}
