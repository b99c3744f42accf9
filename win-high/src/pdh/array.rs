//! Reusable buffer for reading every instance of a counter at once.
use std::fmt;
use std::mem;
use std::ptr;
use std::slice;

use log::{debug, warn};
use windows::Win32::System::Performance::{
    PDH_FMT_COUNTERVALUE_ITEM_W, PDH_INVALID_BUFFER, PDH_MORE_DATA,
};

use crate::error::{PdhError, PdhResult, PdhStatus};
use crate::format::wide_from_ptr;
use crate::pdh::api::PdhApi;
use crate::pdh::counter::Counter;
use crate::pdh::value::{FmtItem, Format, FormattedValue, Representation};

/// Formatted values of all instances of a counter.
///
/// The buffer is sized by PDH and kept between reads: it grows when the counter gains
/// instances and is never shrunk, so steady polling costs one call per read. Items are
/// decoded from the buffer on access; names borrow from it.
#[derive(Default)]
pub struct FmtArray {
    /// `u64` storage keeps the items 8-byte aligned.
    buf: Vec<u64>,
    /// Bytes handed to PDH, at most `buf.len() * 8`.
    size: u32,
    count: usize,
    format: Option<Format>,
}

impl FmtArray {
    pub fn new() -> Self {
        FmtArray::default()
    }

    /// Read all instances of `counter` from the last collection of its query.
    ///
    /// On `PDH_MORE_DATA` the buffer is grown to exactly the size PDH asks for and the read is
    /// retried once. If the first call fails otherwise, the error is `PdhError::Read` and the
    /// previous items stay as they were; if the retry fails, the error is
    /// `PdhError::BufferGrow` and the array is left empty.
    ///
    /// A provider which reports more items than the buffer can hold fails the read with
    /// `PDH_INVALID_BUFFER`, and the array is left empty.
    pub fn get<A: PdhApi>(&mut self, counter: &Counter<'_, A>, format: Format) -> PdhResult<()> {
        let mut count = 0;
        let (mut status, required) = self.fetch(counter, format, &mut count);
        let retried = status.code() == PDH_MORE_DATA;
        if retried {
            self.grow(counter, required);
            status = self.fetch(counter, format, &mut count).0;
        }
        if status.is_success() && count as usize > self.max_items() {
            warn!(
                "array of {:?} reports {} items, buffer of {} bytes holds {}",
                counter.path(),
                count,
                self.size,
                self.max_items()
            );
            // the buffer was written to, previous items are gone
            self.count = 0;
            self.format = None;
            status = PdhStatus::new(PDH_INVALID_BUFFER);
        }
        if !status.is_success() {
            if !retried {
                return Err(counter.read_error(status));
            }
            self.count = 0;
            self.format = None;
            return Err(PdhError::BufferGrow {
                path: counter.path().to_owned(),
                size: self.capacity(),
                status,
            });
        }
        self.count = count as usize;
        self.format = Some(format);
        Ok(())
    }

    fn max_items(&self) -> usize {
        self.size as usize / mem::size_of::<PDH_FMT_COUNTERVALUE_ITEM_W>()
    }

    /// One array call with the buffer as it is. Returns the status and the size PDH reported.
    fn fetch<A: PdhApi>(
        &mut self,
        counter: &Counter<'_, A>,
        format: Format,
        count: &mut u32,
    ) -> (PdhStatus, u32) {
        let mut size = self.size;
        let items = if size == 0 {
            ptr::null_mut()
        } else {
            self.buf.as_mut_ptr().cast::<PDH_FMT_COUNTERVALUE_ITEM_W>()
        };
        // SAFETY: `items` is NULL for an empty buffer, otherwise it is 8-byte aligned and
        // valid for writes of `size` bytes
        let status = unsafe {
            counter.api().formatted_counter_array(
                counter.handle(),
                format.into_raw(),
                &mut size,
                count,
                items,
            )
        };
        (status, size)
    }

    fn grow<A: PdhApi>(&mut self, counter: &Counter<'_, A>, required: u32) {
        let size = required.max(self.size);
        debug!(
            "growing array of {:?} from {} to {} bytes",
            counter.path(),
            self.size,
            size
        );
        self.buf = vec![0; (size as usize).div_ceil(8)];
        self.size = size;
    }

    fn raw_items(&self) -> &[PDH_FMT_COUNTERVALUE_ITEM_W] {
        if self.count == 0 {
            return &[];
        }
        // SAFETY: the last successful read stored `count` items at the start of the buffer,
        // and `get` never accepts more than `max_items`
        unsafe { slice::from_raw_parts(self.buf.as_ptr().cast(), self.count) }
    }

    fn decode<'a>(&'a self, item: &'a PDH_FMT_COUNTERVALUE_ITEM_W, format: Format) -> FmtItem<'a> {
        FmtItem {
            // SAFETY: names were stored in the buffer along with the items
            name: unsafe { wide_from_ptr(item.szName.0) },
            value: FormattedValue::from_raw(&item.FmtValue, format.representation),
        }
    }

    /// Items of the last successful read.
    pub fn items(&self) -> impl ExactSizeIterator<Item = FmtItem<'_>> + '_ {
        // without a format there are no items either
        let format = self.format.unwrap_or(Format::new(Representation::Double));
        self.raw_items()
            .iter()
            .map(move |item| self.decode(item, format))
    }

    pub fn item(&self, index: usize) -> Option<FmtItem<'_>> {
        let format = self.format?;
        self.raw_items().get(index).map(|item| self.decode(item, format))
    }

    /// Number of items of the last successful read.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Size of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.size as usize
    }

    /// Format of the last successful read.
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    /// Release the buffer.
    pub fn clean(&mut self) {
        *self = FmtArray::default();
    }
}

impl fmt::Debug for FmtArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FmtArray")
            .field("len", &self.count)
            .field("capacity", &self.size)
            .field("format", &self.format)
            .finish()
    }
}
