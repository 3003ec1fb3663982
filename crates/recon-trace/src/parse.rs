//! Input parser
//!
//! Accepts whitespace-separated tokens:
//!
//! ```text
//! <vertex count>
//! <trace count>
//! <door string> × trace count      e.g. 0123[2]45
//! <label string> × trace count     e.g. 0123245
//! ```
//!
//! A `[d]` marker before a door digit rewrites the current room's label to
//! `d` before the door is taken. The label string then carries one echo digit
//! after the label observed at that step, which is skipped.

use crate::error::{ParseError, StoreError};
use crate::orientation::Orientation;
use crate::store::TraceStore;
use crate::trace::Trace;
use crate::types::{Door, Label, DOOR_COUNT, LABEL_COUNT};

/// Door choices of one trace with their overrides
#[derive(Debug, Clone, PartialEq, Eq)]
struct DoorPlan {
    doors: Vec<Door>,
    overrides: Vec<Option<Label>>,
}

/// Parsed problem instance
#[derive(Debug, Clone)]
pub struct ParsedInput {
    /// Rooms of the full graph
    pub vertex_count: usize,
    /// Observed walks in input order
    pub traces: Vec<Trace>,
}

impl ParsedInput {
    /// Convert into a store with all hypotheses at the start vertex
    ///
    /// # Errors
    /// Propagates [`crate::StoreError`] for an invalid vertex count.
    pub fn into_store(self) -> Result<TraceStore, ParseError> {
        Ok(TraceStore::new(self.vertex_count, self.traces)?)
    }

    /// Convert into a store over the base graph of a layered instance
    ///
    /// The rooms split evenly into `orientation.layers()` copies of
    /// `vertex_count / layers` base vertices.
    ///
    /// # Errors
    /// Returns [`StoreError::LayerSplit`] if the rooms do not divide evenly,
    /// or the store's own validation error.
    pub fn into_layered_store<O: Orientation>(self, orientation: O) -> Result<TraceStore<O>, ParseError> {
        let layers = orientation.layers();
        if layers == 0 || self.vertex_count % layers != 0 {
            return Err(StoreError::LayerSplit {
                vertex_count: self.vertex_count,
                layers,
            }
            .into());
        }
        Ok(TraceStore::with_orientation(
            self.vertex_count / layers,
            self.traces,
            orientation,
        )?)
    }
}

/// Parse a full problem instance
///
/// # Errors
/// Returns [`ParseError`] describing the first malformed token.
pub fn parse_input(input: &str) -> Result<ParsedInput, ParseError> {
    let mut tokens = input.split_whitespace();

    let vertex_count = parse_count(tokens.next(), "vertex count")?;
    let trace_count = parse_count(tokens.next(), "trace count")?;

    let plans = (0..trace_count)
        .map(|t| {
            let raw = tokens.next().ok_or(ParseError::MissingToken("door string"))?;
            parse_doors(t, raw)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut traces = Vec::with_capacity(trace_count);
    for (t, plan) in plans.into_iter().enumerate() {
        let raw = tokens.next().ok_or(ParseError::MissingToken("label string"))?;
        let labels = parse_labels(t, raw, &plan)?;
        traces.push(Trace::with_overrides(plan.doors, labels, plan.overrides)?);
    }

    if let Some(extra) = tokens.next() {
        return Err(ParseError::TrailingInput(extra.to_string()));
    }

    Ok(ParsedInput {
        vertex_count,
        traces,
    })
}

fn parse_count(token: Option<&str>, field: &'static str) -> Result<usize, ParseError> {
    let raw = token.ok_or(ParseError::MissingToken(field))?;
    raw.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn digit(trace: usize, column: usize, c: char, limit: usize) -> Result<u8, ParseError> {
    match c.to_digit(10) {
        Some(d) if (d as usize) < limit => Ok(d as u8),
        _ => Err(ParseError::InvalidDigit {
            trace,
            column,
            found: c,
        }),
    }
}

fn parse_doors(trace: usize, raw: &str) -> Result<DoorPlan, ParseError> {
    let chars: Vec<char> = raw.chars().collect();
    let mut doors = Vec::with_capacity(chars.len());
    let mut overrides = Vec::with_capacity(chars.len());
    let mut column = 0;

    while column < chars.len() {
        let mut pending = None;
        if chars[column] == '[' {
            let (Some(&d), Some(']')) = (chars.get(column + 1), chars.get(column + 2)) else {
                return Err(ParseError::UnclosedOverride { trace, column });
            };
            pending = Some(Label(digit(trace, column + 1, d, LABEL_COUNT)?));
            column += 3;
        }
        let Some(&c) = chars.get(column) else {
            return Err(ParseError::UnclosedOverride { trace, column });
        };
        doors.push(Door(digit(trace, column, c, DOOR_COUNT)?));
        overrides.push(pending);
        column += 1;
    }

    Ok(DoorPlan { doors, overrides })
}

fn parse_labels(trace: usize, raw: &str, plan: &DoorPlan) -> Result<Vec<Label>, ParseError> {
    let chars: Vec<char> = raw.chars().collect();
    let expected_chars = plan.doors.len() + 1 + plan.overrides.iter().flatten().count();
    if chars.len() != expected_chars {
        return Err(ParseError::LengthMismatch {
            trace,
            expected: expected_chars,
            found: chars.len(),
        });
    }

    let mut labels = Vec::with_capacity(plan.doors.len() + 1);
    let mut column = 0;
    for step in 0..=plan.doors.len() {
        labels.push(Label(digit(trace, column, chars[column], LABEL_COUNT)?));
        column += 1;
        if plan.overrides.get(step).copied().flatten().is_some() {
            digit(trace, column, chars[column], LABEL_COUNT)?;
            column += 1;
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_instance() {
        let parsed = parse_input("4\n2\n012\n345\n0123\n0321\n").unwrap();
        assert_eq!(parsed.vertex_count, 4);
        assert_eq!(parsed.traces.len(), 2);
        assert_eq!(parsed.traces[1].doors(), &[Door(3), Door(4), Door(5)]);
        assert_eq!(parsed.traces[1].labels(), &[Label(0), Label(3), Label(2), Label(1)]);
    }

    #[test]
    fn parses_override_markers_and_skips_echo() {
        let parsed = parse_input("6 1 0[2]15 01223").unwrap();
        let trace = &parsed.traces[0];
        assert_eq!(trace.doors(), &[Door(0), Door(1), Door(5)]);
        assert_eq!(trace.override_at(1), Some(Label(2)));
        assert_eq!(trace.labels(), &[Label(0), Label(1), Label(2), Label(3)]);
        assert!(!trace.is_bound(2));
    }

    #[test]
    fn rejects_bad_door_digit() {
        let err = parse_input("4 1 017 0123").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidDigit {
                trace: 0,
                column: 2,
                found: '7'
            }
        );
    }

    #[test]
    fn rejects_unclosed_override() {
        let err = parse_input("4 1 0[2 012").unwrap_err();
        assert!(matches!(err, ParseError::UnclosedOverride { trace: 0, column: 1 }));
    }

    #[test]
    fn rejects_label_length_mismatch() {
        let err = parse_input("4 1 012 012").unwrap_err();
        assert!(matches!(err, ParseError::LengthMismatch { expected: 4, found: 3, .. }));
    }

    #[test]
    fn reports_missing_tokens() {
        assert_eq!(parse_input("4").unwrap_err(), ParseError::MissingToken("trace count"));
        assert_eq!(parse_input("4 1 01").unwrap_err(), ParseError::MissingToken("label string"));
    }

    #[test]
    fn layered_store_splits_rooms() {
        use crate::orientation::{Mirror, Triad};

        let store = parse_input("8 1 0[1]1 0112").unwrap().into_layered_store(Mirror).unwrap();
        assert_eq!(store.vertex_count(), 4);
        assert_eq!(store.codes().len(), 4 * DOOR_COUNT);

        let err = parse_input("8 1 01 012").unwrap().into_layered_store(Triad).unwrap_err();
        assert_eq!(
            err,
            ParseError::Store(StoreError::LayerSplit {
                vertex_count: 8,
                layers: 3
            })
        );
    }

    #[test]
    fn into_store_rejects_zero_vertices() {
        let parsed = parse_input("0 0").unwrap();
        assert!(parsed.into_store().is_err());
    }
}
