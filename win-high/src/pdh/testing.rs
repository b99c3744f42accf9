//! In-memory PDH provider for unit tests.
//!
//! Behaves like the real thing where it matters to the wrappers: no data before the first
//! collection, `PDH_MORE_DATA` sizing of arrays with names packed after the items, and
//! rejection of single reads of wildcard counters. Values are a deterministic function of
//! instance index and number of collections.
use std::cell::RefCell;
use std::collections::HashMap;
use std::iter;
use std::mem;

use widestring::U16CStr;
use windows::Win32::System::Performance::*;
use windows_core::PWSTR;

use win_low::um::winperf::*;

use crate::error::PdhStatus;
use crate::pdh::api::*;
use crate::pdh::path::CounterPath;
use crate::pdh::types::{CounterTypeDefinition, DisplayFlags};
use crate::pdh::value::{Format, Representation, Scaling, TICKS_PER_SECOND, filetime_from_ticks};

/// 2020-02-20T12:34:56
pub(crate) const FIRST_SAMPLE: u64 = 132_266_756_960_000_000;

struct Object {
    name: &'static str,
    /// `None` for single-instance objects.
    instances: Option<Vec<String>>,
    counters: &'static [(&'static str, u32)],
}

impl Object {
    /// Instance indices and names matched by the path.
    fn select(&self, path: &CounterPath) -> Vec<(usize, String)> {
        match (&self.instances, &path.instance) {
            (None, _) => vec![(0, String::new())],
            (Some(_), None) => Vec::new(),
            (Some(instances), Some(selector)) => instances
                .iter()
                .enumerate()
                .filter(|(_, name)| matches(selector, name))
                .map(|(index, name)| (index, name.clone()))
                .collect(),
        }
    }
}

fn matches(selector: &str, name: &str) -> bool {
    match selector.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => selector == name,
    }
}

struct Counter {
    query: QueryHandle,
    path: CounterPath,
    counter_type: u32,
    /// Collections since the counter was added.
    samples: u64,
}

#[derive(Default)]
struct State {
    objects: Vec<Object>,
    next_handle: isize,
    queries: HashMap<QueryHandle, Vec<CounterHandle>>,
    counters: HashMap<CounterHandle, Counter>,
    closed: Vec<QueryHandle>,
    array_calls: usize,
    array_faults: Vec<(usize, u32)>,
    /// Added to the item count of successful array calls.
    count_surplus: u32,
}

impl State {
    fn next_handle(&mut self) -> isize {
        self.next_handle += 1;
        self.next_handle
    }

    fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|object| object.name.eq_ignore_ascii_case(name))
    }

    fn counter(&self, handle: CounterHandle) -> Result<(&Counter, &Object), PdhStatus> {
        let counter = self
            .counters
            .get(&handle)
            .ok_or(PdhStatus::new(PDH_INVALID_HANDLE))?;
        let object = self
            .object(&counter.path.object)
            .ok_or(PdhStatus::new(PDH_INVALID_HANDLE))?;
        Ok((counter, object))
    }
}

/// Value before formatting.
fn sample(counter: &str, index: usize, samples: u64) -> f64 {
    let index = index as u64;
    match counter {
        "% Processor Time" => ((index * 37 + samples * 11) % 150) as f64,
        "Available MBytes" => (2048 + samples) as f64,
        _ => (100 * (index + 1) + samples) as f64,
    }
}

fn format_value(value: f64, counter_type: u32, format: Format) -> PDH_FMT_COUNTERVALUE {
    let mut value = value;
    let percent = CounterTypeDefinition::from_raw(counter_type).display_flags()
        == Some(DisplayFlags::Percent);
    if percent && !format.scaling.contains(Scaling::NOCAP100) {
        value = value.min(100.0);
    }
    if format.scaling.contains(Scaling::MULTIPLY_1000) {
        value *= 1000.0;
    }
    let mut raw = PDH_FMT_COUNTERVALUE::default();
    raw.CStatus = PDH_CSTATUS_VALID_DATA;
    match format.representation {
        Representation::Double => raw.Anonymous.doubleValue = value,
        Representation::Large => raw.Anonymous.largeValue = value as i64,
        Representation::Long => raw.Anonymous.longValue = value as i32,
    }
    raw
}

pub(crate) struct FakePdh {
    state: RefCell<State>,
}

impl FakePdh {
    /// A machine with four processors, a few processes and some memory.
    pub fn new() -> Self {
        let state = State {
            objects: vec![
                Object {
                    name: "Memory",
                    instances: None,
                    counters: &[
                        ("Available MBytes", PERF_COUNTER_RAWCOUNT),
                        ("Committed Bytes", PERF_COUNTER_LARGE_RAWCOUNT),
                    ],
                },
                Object {
                    name: "Processor",
                    instances: Some(names(&["0", "1", "2", "3", "_Total"])),
                    counters: &[
                        ("% Processor Time", PERF_100NSEC_TIMER_INV),
                        ("Interrupts/sec", PERF_COUNTER_COUNTER),
                    ],
                },
                Object {
                    name: "Process",
                    instances: Some(names(&["Idle", "System", "explorer", "_Total"])),
                    counters: &[
                        ("% Processor Time", PERF_100NSEC_TIMER),
                        ("Handle Count", PERF_COUNTER_RAWCOUNT),
                    ],
                },
            ],
            ..State::default()
        };
        FakePdh {
            state: RefCell::new(state),
        }
    }

    /// Replace the instances of a multi-instance object, e.g. when processes come and go.
    pub fn set_instances(&self, object: &str, instances: &[&str]) {
        let mut state = self.state.borrow_mut();
        if let Some(object) = state.objects.iter_mut().find(|o| o.name == object) {
            object.instances = Some(names(instances));
        }
    }

    /// Number of array calls so far, failed ones included.
    pub fn array_calls(&self) -> usize {
        self.state.borrow().array_calls
    }

    /// Make the `call`-th array call (counting from 1, over the lifetime of this fake)
    /// fail with `status`.
    pub fn fail_array_call(&self, call: usize, status: u32) {
        self.state.borrow_mut().array_faults.push((call, status));
    }

    /// Make successful array calls report `extra` more items than they wrote, like a
    /// misbehaving provider would.
    pub fn overstate_array_count(&self, extra: u32) {
        self.state.borrow_mut().count_surplus = extra;
    }

    pub fn open_queries(&self) -> usize {
        self.state.borrow().queries.len()
    }

    pub fn attached_counters(&self) -> usize {
        self.state.borrow().counters.len()
    }

    pub fn closed_queries(&self) -> Vec<QueryHandle> {
        self.state.borrow().closed.clone()
    }
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|&name| name.to_owned()).collect()
}

impl PdhApi for FakePdh {
    fn open_query(
        &self,
        data_source: Option<&U16CStr>,
        _user_data: usize,
    ) -> Result<QueryHandle, PdhStatus> {
        if data_source.is_some() {
            // no log files here
            return Err(PdhStatus::new(PDH_FILE_NOT_FOUND));
        }
        let mut state = self.state.borrow_mut();
        let handle = QueryHandle(state.next_handle());
        state.queries.insert(handle, Vec::new());
        Ok(handle)
    }

    fn close_query(&self, query: QueryHandle) -> Result<(), PdhStatus> {
        let mut state = self.state.borrow_mut();
        let counters = state
            .queries
            .remove(&query)
            .ok_or(PdhStatus::new(PDH_INVALID_HANDLE))?;
        for counter in counters {
            state.counters.remove(&counter);
        }
        state.closed.push(query);
        Ok(())
    }

    fn collect_query_data(&self, query: QueryHandle) -> Result<(), PdhStatus> {
        let mut state = self.state.borrow_mut();
        let counters = state
            .queries
            .get(&query)
            .ok_or(PdhStatus::new(PDH_INVALID_HANDLE))?
            .clone();
        if counters.is_empty() {
            return Err(PdhStatus::new(PDH_NO_DATA));
        }
        for handle in counters {
            if let Some(counter) = state.counters.get_mut(&handle) {
                counter.samples += 1;
            }
        }
        Ok(())
    }

    fn add_counter(
        &self,
        query: QueryHandle,
        path: &U16CStr,
        _user_data: usize,
    ) -> Result<CounterHandle, PdhStatus> {
        let mut state = self.state.borrow_mut();
        if !state.queries.contains_key(&query) {
            return Err(PdhStatus::new(PDH_INVALID_HANDLE));
        }
        let path = CounterPath::parse(&path.to_string_lossy())
            .ok_or(PdhStatus::new(PDH_CSTATUS_BAD_COUNTERNAME))?;
        if path.machine.as_deref().is_some_and(|m| m != ".") {
            return Err(PdhStatus::new(PDH_CSTATUS_NO_MACHINE));
        }
        let object = state
            .object(&path.object)
            .ok_or(PdhStatus::new(PDH_CSTATUS_NO_OBJECT))?;
        let counter_type = object
            .counters
            .iter()
            .find(|(name, _)| *name == path.counter)
            .map(|&(_, counter_type)| counter_type)
            .ok_or(PdhStatus::new(PDH_CSTATUS_NO_COUNTER))?;

        let handle = CounterHandle(state.next_handle());
        state.counters.insert(
            handle,
            Counter {
                query,
                path,
                counter_type,
                samples: 0,
            },
        );
        if let Some(counters) = state.queries.get_mut(&query) {
            counters.push(handle);
        }
        Ok(handle)
    }

    fn remove_counter(&self, counter: CounterHandle) -> Result<(), PdhStatus> {
        let mut state = self.state.borrow_mut();
        let removed = state
            .counters
            .remove(&counter)
            .ok_or(PdhStatus::new(PDH_INVALID_HANDLE))?;
        if let Some(counters) = state.queries.get_mut(&removed.query) {
            counters.retain(|&handle| handle != counter);
        }
        Ok(())
    }

    fn raw_counter_value(
        &self,
        counter: CounterHandle,
    ) -> Result<(u32, PDH_RAW_COUNTER), PdhStatus> {
        let state = self.state.borrow();
        let (counter, object) = state.counter(counter)?;
        if counter.path.is_wildcard() {
            return Err(PdhStatus::new(PDH_INVALID_DATA));
        }
        let mut raw = PDH_RAW_COUNTER {
            MultiCount: 1,
            ..PDH_RAW_COUNTER::default()
        };
        match object.select(&counter.path).first() {
            None => raw.CStatus = PDH_CSTATUS_NO_INSTANCE,
            Some(_) if counter.samples == 0 => raw.CStatus = PDH_CSTATUS_INVALID_DATA,
            Some(&(index, _)) => {
                raw.CStatus = PDH_CSTATUS_VALID_DATA;
                raw.TimeStamp = filetime_from_ticks(
                    FIRST_SAMPLE + (counter.samples - 1) * TICKS_PER_SECOND as u64,
                );
                raw.FirstValue = sample(&counter.path.counter, index, counter.samples) as i64;
                raw.SecondValue = counter.samples as i64;
            }
        }
        Ok((counter.counter_type, raw))
    }

    fn formatted_counter_value(
        &self,
        counter: CounterHandle,
        format: u32,
    ) -> Result<(u32, PDH_FMT_COUNTERVALUE), PdhStatus> {
        let format = Format::from_raw(format).ok_or(PdhStatus::new(PDH_INVALID_ARGUMENT))?;
        let state = self.state.borrow();
        let (counter, object) = state.counter(counter)?;
        if counter.path.is_wildcard() {
            return Err(PdhStatus::new(PDH_INVALID_DATA));
        }
        let &(index, _) = object
            .select(&counter.path)
            .first()
            .ok_or(PdhStatus::new(PDH_INVALID_DATA))?;
        let value = if counter.samples == 0 {
            PDH_FMT_COUNTERVALUE {
                CStatus: PDH_CSTATUS_INVALID_DATA,
                ..PDH_FMT_COUNTERVALUE::default()
            }
        } else {
            let value = sample(&counter.path.counter, index, counter.samples);
            format_value(value, counter.counter_type, format)
        };
        Ok((counter.counter_type, value))
    }

    unsafe fn formatted_counter_array(
        &self,
        counter: CounterHandle,
        format: u32,
        size: &mut u32,
        count: &mut u32,
        items: *mut PDH_FMT_COUNTERVALUE_ITEM_W,
    ) -> PdhStatus {
        let mut state = self.state.borrow_mut();
        state.array_calls += 1;
        let call = state.array_calls;
        if let Some(fault) = state.array_faults.iter().position(|&(n, _)| n == call) {
            let (_, status) = state.array_faults.remove(fault);
            return PdhStatus::new(status);
        }
        let surplus = state.count_surplus;

        let Some(format) = Format::from_raw(format) else {
            return PdhStatus::new(PDH_INVALID_ARGUMENT);
        };
        let (counter, object) = match state.counter(counter) {
            Ok(found) => found,
            Err(status) => return status,
        };
        if counter.samples == 0 {
            return PdhStatus::new(PDH_CSTATUS_INVALID_DATA);
        }
        let selected = object.select(&counter.path);
        // a wildcard which currently matches nothing is as unreadable as a missing instance
        if selected.is_empty() {
            return PdhStatus::new(PDH_INVALID_DATA);
        }

        let names: Vec<Vec<u16>> = selected
            .iter()
            .map(|(_, name)| name.encode_utf16().chain(iter::once(0)).collect())
            .collect();
        let items_size = selected.len() * mem::size_of::<PDH_FMT_COUNTERVALUE_ITEM_W>();
        let names_size: usize = names.iter().map(|name| name.len() * 2).sum();
        let required = (items_size + names_size) as u32;

        *count = selected.len() as u32;
        if *size < required {
            *size = required;
            return PdhStatus::new(PDH_MORE_DATA);
        }
        *size = required;
        *count += surplus;

        // SAFETY: the caller guarantees `items` is valid for writes of at least `required` bytes
        unsafe {
            let mut name_ptr = items.add(selected.len()) as *mut u16;
            for (i, ((index, _), name)) in selected.iter().zip(&names).enumerate() {
                name_ptr.copy_from_nonoverlapping(name.as_ptr(), name.len());
                let value = sample(&counter.path.counter, *index, counter.samples);
                items.add(i).write(PDH_FMT_COUNTERVALUE_ITEM_W {
                    szName: PWSTR(name_ptr),
                    FmtValue: format_value(value, counter.counter_type, format),
                });
                name_ptr = name_ptr.add(name.len());
            }
        }
        PdhStatus::SUCCESS
    }
}
