//! Nom parser for counter paths.
//!
//! ```txt
//! [\\Machine]\Object[(Parent/Instance#Index)]\Counter
//! ```
//!
//! Only syntax is checked here. Whether the object or counter exists is up to the provider.
use std::fmt;

use nom::bytes::complete::{tag, take_till1};
use nom::character::complete::char;
use nom::combinator::{all_consuming, opt};
use nom::error::{Error, ErrorKind};
use nom::sequence::preceded;
use nom::{IResult, Parser};

/// Components of a counter path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CounterPath {
    pub machine: Option<String>,
    pub object: String,
    pub parent: Option<String>,
    pub instance: Option<String>,
    /// Disambiguates instances with the same name, as in `svchost#2`.
    pub index: Option<u32>,
    pub counter: String,
}

impl CounterPath {
    /// Split a path into its components. `None` if it is not well-formed.
    pub fn parse(path: &str) -> Option<Self> {
        all_consuming(counter_path)
            .parse(path)
            .ok()
            .map(|(_, path)| path)
    }

    /// Whether the instance selector matches more than one instance, e.g. `Processor(*)`.
    pub fn is_wildcard(&self) -> bool {
        let has_star = |s: &Option<String>| s.as_deref().is_some_and(|s| s.contains('*'));
        has_star(&self.instance) || has_star(&self.parent)
    }
}

impl fmt::Display for CounterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(machine) = &self.machine {
            write!(f, r"\\{}", machine)?;
        }
        write!(f, r"\{}", self.object)?;
        if let Some(instance) = &self.instance {
            f.write_str("(")?;
            if let Some(parent) = &self.parent {
                write!(f, "{}/", parent)?;
            }
            f.write_str(instance)?;
            if let Some(index) = self.index {
                write!(f, "#{}", index)?;
            }
            f.write_str(")")?;
        }
        write!(f, r"\{}", self.counter)
    }
}

fn counter_path(input: &str) -> IResult<&str, CounterPath> {
    let (input, machine) = opt(machine).parse(input)?;
    let (input, object) = object(input)?;
    let (input, instance) = opt(instance).parse(input)?;
    let (input, counter) = counter(input)?;

    let (parent, instance, index) = match instance {
        Some(selector) => {
            let (parent, instance, index) = split_instance(selector);
            (parent.map(str::to_owned), Some(instance.to_owned()), index)
        }
        None => (None, None, None),
    };
    let path = CounterPath {
        machine: machine.map(str::to_owned),
        object: object.to_owned(),
        parent,
        instance,
        index,
        counter: counter.to_owned(),
    };
    Ok((input, path))
}

fn machine(input: &str) -> IResult<&str, &str> {
    preceded(tag(r"\\"), take_till1(|c: char| c == '\\')).parse(input)
}

fn object(input: &str) -> IResult<&str, &str> {
    preceded(char('\\'), take_till1(|c: char| c == '\\' || c == '(')).parse(input)
}

/// Instance names may contain parentheses themselves, so the selector runs up to the last `)\`.
fn instance(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('(').parse(input)?;
    match input.rfind(r")\") {
        Some(end) if end > 0 => Ok((&input[end + 1..], &input[..end])),
        _ => Err(nom::Err::Error(Error::new(input, ErrorKind::TakeUntil))),
    }
}

fn counter(input: &str) -> IResult<&str, &str> {
    preceded(char('\\'), take_till1(|c: char| c == '\\')).parse(input)
}

/// `Parent/Instance#Index` into its parts. A `#` suffix which is not a number stays in the name.
fn split_instance(selector: &str) -> (Option<&str>, &str, Option<u32>) {
    let (parent, rest) = match selector.split_once('/') {
        Some((parent, rest)) if !parent.is_empty() && !rest.is_empty() => (Some(parent), rest),
        _ => (None, selector),
    };
    match rest.rsplit_once('#') {
        Some((instance, index)) if !instance.is_empty() => match index.parse() {
            Ok(index) => (parent, instance, Some(index)),
            Err(_) => (parent, rest, None),
        },
        _ => (parent, rest, None),
    }
}
