//! Counter attached to a query.
use std::fmt;

use log::debug;

use crate::error::{PdhError, PdhResult, PdhStatus};
use crate::pdh::api::{CounterHandle, PdhApi};
use crate::pdh::native::Native;
use crate::pdh::path::CounterPath;
use crate::pdh::query::Query;
use crate::pdh::types::CounterTypeDefinition;
use crate::pdh::value::{Format, FormattedValue, RawCounter};

/// One counter path attached to a query. Lives no longer than the query.
pub struct Counter<'q, A: PdhApi = Native> {
    query: &'q Query<A>,
    handle: CounterHandle,
    path: String,
}

impl<'q, A: PdhApi> Counter<'q, A> {
    pub(crate) fn new(query: &'q Query<A>, handle: CounterHandle, path: String) -> Self {
        Counter {
            query,
            handle,
            path,
        }
    }

    /// Detach the counter from its query.
    pub fn remove(self) -> PdhResult<()> {
        self.query
            .api()
            .remove_counter(self.handle)
            .map_err(|status| PdhError::Attach {
                path: self.path.clone(),
                status,
            })?;
        debug!("removed counter {:?}: {}", self.handle, self.path);
        Ok(())
    }

    /// Raw sample from the last collection.
    ///
    /// A sample without valid data, e.g. before the first collection or for an instance which
    /// has gone away, is reported as `PdhError::Read` with the status of the sample.
    pub fn raw_value(&self) -> PdhResult<(CounterTypeDefinition, RawCounter)> {
        let (counter_type, raw) = self
            .query
            .api()
            .raw_counter_value(self.handle)
            .map_err(|status| self.read_error(status))?;
        let raw = RawCounter::from(raw);
        if !raw.status.is_valid_data() {
            return Err(self.read_error(raw.status));
        }
        Ok((CounterTypeDefinition::from_raw(counter_type), raw))
    }

    /// Computed value of a single-instance counter.
    ///
    /// Wildcard counters can't be read this way; PDH reports `PDH_INVALID_DATA`, which
    /// `PdhError::is_instance_unavailable` recognizes. Use `FmtArray` for those.
    pub fn formatted_value(
        &self,
        format: Format,
    ) -> PdhResult<(CounterTypeDefinition, FormattedValue)> {
        let (counter_type, raw) = self
            .query
            .api()
            .formatted_counter_value(self.handle, format.into_raw())
            .map_err(|status| self.read_error(status))?;
        let value = FormattedValue::from_raw(&raw, format.representation);
        if !value.status.is_valid_data() {
            return Err(self.read_error(value.status));
        }
        Ok((CounterTypeDefinition::from_raw(counter_type), value))
    }

    pub(crate) fn read_error(&self, status: PdhStatus) -> PdhError {
        PdhError::Read {
            path: self.path.clone(),
            status,
        }
    }

    pub(crate) fn api(&self) -> &A {
        self.query.api()
    }

    /// Path as it was given to `Query::add_counter`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handle(&self) -> CounterHandle {
        self.handle
    }

    pub fn is_wildcard(&self) -> bool {
        CounterPath::parse(&self.path).is_some_and(|path| path.is_wildcard())
    }
}

impl<'q, A: PdhApi> fmt::Debug for Counter<'q, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("query", &self.query.handle())
            .field("handle", &self.handle)
            .field("path", &self.path)
            .finish()
    }
}
