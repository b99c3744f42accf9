use std::error::Error;
use std::thread;
use std::time::Duration;

use argh::FromArgs;
use itertools::Itertools;
use log::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use win_high::prelude::*;

/// Poll performance counters and print their values.
#[derive(Debug, FromArgs)]
struct Cli {
    /// time in ms between two samples.
    #[argh(option, default = "1000")]
    interval: u64,
    /// number of samples to print, 0 polls until interrupted.
    #[argh(option, default = "0")]
    count: u64,
    /// representation of values: double, large or long.
    #[argh(
        option,
        default = "Representation::Double",
        from_str_fn(parse_representation)
    )]
    format: Representation,
    /// do not cap percentages at 100.
    #[argh(switch)]
    no_cap: bool,
    /// do not apply the default scale of counters.
    #[argh(switch)]
    no_scale: bool,
    /// multiply values by 1000.
    #[argh(switch)]
    x1000: bool,
    /// log file to read samples from instead of real-time data.
    #[argh(option)]
    source: Option<String>,
    /// counter paths, such as "\Processor(*)\% Processor Time".
    #[argh(positional)]
    paths: Vec<String>,
}

impl Cli {
    fn format(&self) -> Format {
        let mut scaling = Scaling::empty();
        scaling.set(Scaling::NOCAP100, self.no_cap);
        scaling.set(Scaling::NOSCALE, self.no_scale);
        scaling.set(Scaling::MULTIPLY_1000, self.x1000);
        Format::new(self.format).with_scaling(scaling)
    }
}

fn parse_representation(value: &str) -> Result<Representation, String> {
    match value {
        "double" => Ok(Representation::Double),
        "large" => Ok(Representation::Large),
        "long" => Ok(Representation::Long),
        other => Err(format!(
            "unknown format {:?}, expected double, large or long",
            other
        )),
    }
}

/// A counter and, once it turned out to have several instances, the array it is read into.
struct Watch<'q> {
    counter: Counter<'q>,
    array: Option<FmtArray>,
}

impl<'q> Watch<'q> {
    fn new(counter: Counter<'q>) -> Self {
        let array = counter.is_wildcard().then(FmtArray::new);
        Watch { counter, array }
    }

    fn print(&mut self, format: Format) {
        let path = self.counter.path();
        if let Some(array) = &mut self.array {
            match array.get(&self.counter, format) {
                Ok(()) => {
                    for item in array.items() {
                        let name = instance_path(path, &item.name_string());
                        println!("{}\t{:.3}", name, item.value.value);
                    }
                }
                Err(e) if e.is_no_data() => println!("{}\tskipped", path),
                Err(e) => error!("{}", e),
            }
            return;
        }
        match self.counter.formatted_value(format) {
            Ok((_, value)) => println!("{}\t{:.3}", path, value.value),
            Err(e) if e.is_instance_unavailable() && read_as_array(path) => {
                debug!("reading {} as an array from now on", path);
                self.array = Some(FmtArray::new());
                self.print(format);
            }
            Err(e) if e.is_no_data() => println!("{}\tskipped", path),
            Err(e) => error!("{}", e),
        }
    }
}

/// Whether a counter without a single value to read should be read as an array instead.
/// A named instance which went away is just skipped; a path we can't parse might still
/// select several instances.
fn read_as_array(path: &str) -> bool {
    CounterPath::parse(path).is_none_or(|path| path.is_wildcard())
}

/// Path of one instance of a wildcard counter.
fn instance_path(path: &str, instance: &str) -> String {
    match CounterPath::parse(path) {
        Some(mut parsed) if !instance.is_empty() => {
            parsed.parent = None;
            parsed.index = None;
            parsed.instance = Some(instance.to_owned());
            parsed.to_string()
        }
        _ => path.to_owned(),
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli: Cli = argh::from_env();
    if cli.paths.is_empty() {
        return Err("no counter paths given".into());
    }
    let format = cli.format();

    let mut options = QueryOptions::new();
    if let Some(source) = &cli.source {
        options = options.data_source(source.as_str());
    }
    let query = options.open()?;

    let mut watches = Vec::with_capacity(cli.paths.len());
    for (index, path) in cli.paths.iter().enumerate() {
        match query.add_counter(path, index) {
            Ok(counter) => watches.push(Watch::new(counter)),
            Err(e) => error!("{}", e),
        }
    }
    if watches.is_empty() {
        return Err("none of the counters could be added".into());
    }
    info!(
        "polling every {} ms: {}",
        cli.interval,
        watches.iter().map(|watch| watch.counter.path()).join(", ")
    );

    // rate counters need two samples before they have a value
    if let Err(e) = query.collect_data() {
        warn!("{}", e);
    }
    let interval = Duration::from_millis(cli.interval);
    let mut sample = 0;
    while cli.count == 0 || sample < cli.count {
        thread::sleep(interval);
        sample += 1;
        if let Err(e) = query.collect_data() {
            warn!("{}", e);
            continue;
        }
        for watch in &mut watches {
            watch.print(format);
        }
    }

    drop(watches);
    query.close()?;
    Ok(())
}
