//! A single observed walk

use crate::error::StoreError;
use crate::types::{Door, Label, DOOR_COUNT, LABEL_COUNT};

/// Immutable record of one walk: the doors taken and the labels seen
///
/// # Invariants
/// - `labels.len() == doors.len() + 1`
/// - `overrides.len() == doors.len()`
/// - every door is `< DOOR_COUNT`, every label `< LABEL_COUNT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    doors: Vec<Door>,
    labels: Vec<Label>,
    overrides: Vec<Option<Label>>,
    first_override: Option<usize>,
}

impl Trace {
    /// Build a trace without label overrides
    ///
    /// # Errors
    /// Returns [`StoreError`] if lengths disagree or a digit is out of range
    pub fn new(doors: Vec<Door>, labels: Vec<Label>) -> Result<Self, StoreError> {
        let overrides = vec![None; doors.len()];
        Self::with_overrides(doors, labels, overrides)
    }

    /// Build a trace where some door steps first rewrite the current label
    ///
    /// # Errors
    /// Returns [`StoreError`] if lengths disagree or a digit is out of range
    pub fn with_overrides(
        doors: Vec<Door>,
        labels: Vec<Label>,
        overrides: Vec<Option<Label>>,
    ) -> Result<Self, StoreError> {
        if labels.len() != doors.len() + 1 {
            return Err(StoreError::LabelLength {
                doors: doors.len(),
                labels: labels.len(),
            });
        }
        if overrides.len() != doors.len() {
            return Err(StoreError::OverrideLength {
                doors: doors.len(),
                overrides: overrides.len(),
            });
        }
        if let Some(door) = doors.iter().find(|d| d.index() >= DOOR_COUNT) {
            return Err(StoreError::DoorOutOfRange(door.0));
        }
        let bad_label = labels
            .iter()
            .chain(overrides.iter().flatten())
            .find(|l| l.index() >= LABEL_COUNT);
        if let Some(label) = bad_label {
            return Err(StoreError::LabelOutOfRange(label.0));
        }

        let first_override = overrides.iter().position(Option::is_some);
        Ok(Self {
            doors,
            labels,
            overrides,
            first_override,
        })
    }

    /// Number of doors taken
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.doors.len()
    }

    /// No doors taken
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    /// Door choices in walk order
    #[inline]
    #[must_use]
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    /// Observed labels, one more than doors
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Door taken when leaving `step`
    #[inline]
    #[must_use]
    pub fn door(&self, step: usize) -> Door {
        self.doors[step]
    }

    /// Label observed on arrival at `step`
    #[inline]
    #[must_use]
    pub fn label(&self, step: usize) -> Label {
        self.labels[step]
    }

    /// Label written onto the room at `step` before leaving it
    #[inline]
    #[must_use]
    pub fn override_at(&self, step: usize) -> Option<Label> {
        self.overrides.get(step).copied().flatten()
    }

    /// Whether the observed label at `step` pins the hypothesis to a class
    ///
    /// Steps after the first override may sit in a relabeled room, so their
    /// observations say nothing about the underlying vertex class.
    #[inline]
    #[must_use]
    pub fn is_bound(&self, step: usize) -> bool {
        self.first_override.map_or(true, |first| step <= first)
    }

    /// Index of the first overriding door step, if any
    #[inline]
    #[must_use]
    pub fn first_override(&self) -> Option<usize> {
        self.first_override
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doors(raw: &[u8]) -> Vec<Door> {
        raw.iter().map(|&d| Door(d)).collect()
    }

    fn labels(raw: &[u8]) -> Vec<Label> {
        raw.iter().map(|&l| Label(l)).collect()
    }

    #[test]
    fn rejects_label_length_mismatch() {
        let err = Trace::new(doors(&[0, 1]), labels(&[0, 1])).unwrap_err();
        assert!(matches!(err, StoreError::LabelLength { doors: 2, labels: 2 }));
    }

    #[test]
    fn rejects_out_of_range_door() {
        let err = Trace::new(doors(&[6]), labels(&[0, 1])).unwrap_err();
        assert!(matches!(err, StoreError::DoorOutOfRange(6)));
    }

    #[test]
    fn steps_after_first_override_are_unbound() {
        let trace = Trace::with_overrides(
            doors(&[0, 1, 2, 3]),
            labels(&[0, 1, 2, 3, 0]),
            vec![None, Some(Label(2)), None, None],
        )
        .unwrap();
        assert_eq!(trace.first_override(), Some(1));
        assert!(trace.is_bound(0));
        assert!(trace.is_bound(1));
        assert!(!trace.is_bound(2));
        assert!(!trace.is_bound(4));
    }

    #[test]
    fn trace_without_overrides_is_fully_bound() {
        let trace = Trace::new(doors(&[0, 5]), labels(&[0, 1, 2])).unwrap();
        assert!((0..=trace.len()).all(|s| trace.is_bound(s)));
        assert_eq!(trace.override_at(0), None);
    }
}
