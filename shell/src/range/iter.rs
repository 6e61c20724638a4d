//! Iterators produced by range specifications.

use std::collections::VecDeque;
use std::net::Ipv4Addr;

/// A loop value source.
///
/// `next()` alone decides termination; `estimated_len` is a display hint.
pub trait RangeIter: Iterator<Item = String> + Send {
    /// Approximate number of values still to come.
    fn estimated_len(&self) -> usize;

    /// Release any held resources. Safe to call more than once.
    fn close(&mut self) {}
}

pub type BoxedRange = Box<dyn RangeIter>;

/// Fixed list of items, in declared order.
#[derive(Debug, Clone)]
pub struct ListIter {
    items: VecDeque<String>,
}

impl ListIter {
    pub fn new(items: impl IntoIterator<Item = String>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

impl Iterator for ListIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.items.pop_front()
    }
}

impl RangeIter for ListIter {
    fn estimated_len(&self) -> usize {
        self.items.len()
    }

    fn close(&mut self) {
        self.items.clear();
    }
}

/// How a stepped value is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Render {
    Number,
    Char,
    /// Last octet appended to a fixed `a.b.c.` prefix.
    Octet(String),
    Ipv4,
}

/// Inclusive walk from `start` to `end`, one unit at a time.
#[derive(Debug, Clone)]
pub struct SteppedRange {
    current: i64,
    end: i64,
    step: i64,
    exhausted: bool,
    render: Render,
}

impl SteppedRange {
    fn new(start: i64, end: i64, render: Render, allow_descending: bool) -> Self {
        let step = if start <= end { 1 } else { -1 };
        Self {
            current: start,
            end,
            step,
            exhausted: step < 0 && !allow_descending,
            render,
        }
    }

    /// `start..=end`, counting down when `start > end`.
    pub fn numeric(start: i64, end: i64) -> Self {
        Self::new(start, end, Render::Number, true)
    }

    /// Character range over code points, counting down when reversed.
    pub fn chars(start: char, end: char) -> Self {
        Self::new(i64::from(u32::from(start)), i64::from(u32::from(end)), Render::Char, true)
    }

    /// Last-octet range under `prefix` (which ends with a dot). Ascending only.
    pub fn octets(prefix: &str, start: u8, end: u8) -> Self {
        Self::new(
            i64::from(start),
            i64::from(end),
            Render::Octet(prefix.to_string()),
            false,
        )
    }

    /// Full address range with carry across octets. Ascending only.
    pub fn ipv4(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        Self::new(
            i64::from(u32::from(start)),
            i64::from(u32::from(end)),
            Render::Ipv4,
            false,
        )
    }

    fn render(&self, value: i64) -> Option<String> {
        match &self.render {
            Render::Number => Some(value.to_string()),
            Render::Char => u32::try_from(value)
                .ok()
                .and_then(char::from_u32)
                .map(String::from),
            Render::Octet(prefix) => Some(format!("{prefix}{value}")),
            Render::Ipv4 => u32::try_from(value).ok().map(|v| Ipv4Addr::from(v).to_string()),
        }
    }

    fn advance(&mut self) -> Option<i64> {
        if self.exhausted {
            return None;
        }
        let value = self.current;
        if value == self.end {
            self.exhausted = true;
        } else {
            self.current += self.step;
        }
        Some(value)
    }
}

impl Iterator for SteppedRange {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        // Surrogate code points have no char; skip them.
        while let Some(value) = self.advance() {
            if let Some(rendered) = self.render(value) {
                return Some(rendered);
            }
        }
        None
    }
}

impl RangeIter for SteppedRange {
    fn estimated_len(&self) -> usize {
        if self.exhausted {
            return 0;
        }
        usize::try_from(self.end.abs_diff(self.current)).map_or(usize::MAX, |d| d.saturating_add(1))
    }
}

/// Sub-ranges exhausted one after another.
pub struct ChainIter {
    parts: VecDeque<BoxedRange>,
}

impl ChainIter {
    pub fn new(parts: impl IntoIterator<Item = BoxedRange>) -> Self {
        Self {
            parts: parts.into_iter().collect(),
        }
    }
}

impl Iterator for ChainIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(current) = self.parts.front_mut() {
            if let Some(value) = current.next() {
                return Some(value);
            }
            if let Some(mut done) = self.parts.pop_front() {
                done.close();
            }
        }
        None
    }
}

impl RangeIter for ChainIter {
    fn estimated_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| p.estimated_len())
            .fold(0, usize::saturating_add)
    }

    fn close(&mut self) {
        for part in &mut self.parts {
            part.close();
        }
        self.parts.clear();
    }
}
