//! Counter queries over the Performance Data Helper.
//!
//! Typical session:
//!
//! ```no_run
//! use win_high::pdh::*;
//!
//! # fn main() -> win_high::error::PdhResult<()> {
//! let query = Query::open("", 0)?;
//! let cpu = query.add_counter(r"\Processor(*)\% Processor Time", 0)?;
//! let mut array = FmtArray::new();
//!
//! query.collect_data()?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! query.collect_data()?;
//!
//! array.get(&cpu, Format::new(Representation::Double))?;
//! for item in array.items() {
//!     println!("{}: {:?}", item.name_string(), item.value);
//! }
//! drop(cpu);
//! query.close()
//! # }
//! ```
pub mod api;
pub mod array;
pub mod counter;
pub mod native;
pub mod path;
pub mod query;
pub mod types;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use self::api::{CounterHandle, PdhApi, QueryHandle};
pub use self::array::FmtArray;
pub use self::counter::Counter;
pub use self::native::Native;
pub use self::path::CounterPath;
pub use self::query::{Query, QueryOptions};
pub use self::types::CounterTypeDefinition;
pub use self::value::*;
