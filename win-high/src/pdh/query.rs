//! Query, a session which collects a set of counters together.
use std::cell::Cell;
use std::marker::PhantomData;

use log::{debug, trace, warn};

use windows::Win32::System::Performance::PDH_INVALID_ARGUMENT;

use crate::error::{PdhError, PdhResult, PdhStatus};
use crate::format::{to_wide, to_wide_opt};
use crate::pdh::api::{PdhApi, QueryHandle};
use crate::pdh::counter::Counter;
use crate::pdh::native::Native;

/// Open query session.
///
/// Counters borrow the query they were added to, so none of them can be used after the query
/// is closed. Dropping an unclosed query closes it.
///
/// The query is `Send` but not `Sync`: it may move between threads, but calls must not overlap.
pub struct Query<A: PdhApi = Native> {
    api: A,
    handle: QueryHandle,
    user_data: usize,
    closed: bool,
    _not_sync: PhantomData<Cell<()>>,
}

impl Query<Native> {
    /// Open a query on the system's provider. Empty `data_source` means real-time data of the
    /// local machine; otherwise it names a log file to read from.
    pub fn open(data_source: &str, user_data: usize) -> PdhResult<Self> {
        Query::open_with(Native, data_source, user_data)
    }
}

impl<A: PdhApi> Query<A> {
    /// Open a query on the given provider.
    pub fn open_with(api: A, data_source: &str, user_data: usize) -> PdhResult<Self> {
        let source = to_wide_opt(data_source).map_err(|_| PdhError::Session {
            status: PdhStatus::new(PDH_INVALID_ARGUMENT),
        })?;
        let handle = api
            .open_query(source.as_deref(), user_data)
            .map_err(|status| PdhError::Session { status })?;
        if data_source.is_empty() {
            debug!("opened query {:?} on real-time data", handle);
        } else {
            debug!("opened query {:?} on {:?}", handle, data_source);
        }
        Ok(Query {
            api,
            handle,
            user_data,
            closed: false,
            _not_sync: PhantomData,
        })
    }

    /// Attach a counter. Wildcard paths are accepted even if no instance matches right now.
    pub fn add_counter(&self, path: &str, user_data: usize) -> PdhResult<Counter<'_, A>> {
        let attach = |status| PdhError::Attach {
            path: path.to_owned(),
            status,
        };
        let wide = to_wide(path).map_err(|_| attach(PdhStatus::new(PDH_INVALID_ARGUMENT)))?;
        let handle = self
            .api
            .add_counter(self.handle, &wide, user_data)
            .map_err(attach)?;
        debug!("attached counter {:?} to query {:?}: {}", handle, self.handle, path);
        Ok(Counter::new(self, handle, path.to_owned()))
    }

    /// Take one sample of every attached counter at once.
    ///
    /// A failure leaves the query and its counters usable; try again on the next cycle.
    pub fn collect_data(&self) -> PdhResult<()> {
        self.api
            .collect_query_data(self.handle)
            .map_err(|status| PdhError::Collection { status })?;
        trace!("collected query {:?}", self.handle);
        Ok(())
    }

    /// Close the query, releasing all of its counters.
    pub fn close(mut self) -> PdhResult<()> {
        // whatever the outcome, the handle is not touched again
        self.closed = true;
        self.api
            .close_query(self.handle)
            .map_err(|status| PdhError::Session { status })?;
        debug!("closed query {:?}", self.handle);
        Ok(())
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn handle(&self) -> QueryHandle {
        self.handle
    }

    pub fn user_data(&self) -> usize {
        self.user_data
    }
}

impl<A: PdhApi> Drop for Query<A> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match self.api.close_query(self.handle) {
            Ok(()) => debug!("closed query {:?} on drop", self.handle),
            Err(status) => warn!("PdhCloseQuery({:?}) failed: {}", self.handle, status),
        }
    }
}

/// Settings for opening a query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    data_source: String,
    user_data: usize,
}

impl QueryOptions {
    pub fn new() -> Self {
        QueryOptions::default()
    }

    /// Log file to read from instead of real-time data.
    pub fn data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }

    /// Caller-defined value associated with the query.
    pub fn user_data(mut self, user_data: usize) -> Self {
        self.user_data = user_data;
        self
    }

    pub fn open(&self) -> PdhResult<Query> {
        Query::open(&self.data_source, self.user_data)
    }

    pub fn open_with<A: PdhApi>(&self, api: A) -> PdhResult<Query<A>> {
        Query::open_with(api, &self.data_source, self.user_data)
    }
}
