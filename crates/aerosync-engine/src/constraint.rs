//! Value constraints for settings.
//!
//! A constraint decides what a request may push to the device and how a
//! device report is reconciled with the declared support:
//!
//! - [`DiscreteSet`] rejects values outside the set.
//! - [`Bounds`] clamps values into `[min, max]`.
//! - [`AnyValue`] accepts everything (toggles, free-form values).
//!
//! An empty set or an unbounded range means nothing is settable yet; both are
//! the state of a freshly constructed setting before the first device update.

use std::cmp::Ordering;

/// Support constraint attached to a setting.
pub trait Constraint<T> {
    /// Filter a requested value. `None` rejects it, `Some` carries the value
    /// that may be pushed to the device (possibly clamped).
    fn admit(&self, value: T) -> Option<T>;

    /// Reconcile a value reported by the device with this constraint so that
    /// the confirmed value always satisfies it.
    fn conform(&mut self, value: T) -> T;

    /// Reconcile a value confirmed under a previous constraint with this one.
    /// Unlike [`conform`](Constraint::conform) the constraint is never widened.
    fn reconcile(&self, value: T) -> T;

    /// Whether any value can currently be requested.
    fn is_settable(&self) -> bool;
}

/// Discrete set of supported values, in the order the device declared them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscreteSet<T> {
    values: Vec<T>,
}

impl<T> Default for DiscreteSet<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T: PartialEq> DiscreteSet<T> {
    /// Build a set from the given values, dropping duplicates.
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::default();
        for value in values {
            if !set.values.contains(&value) {
                set.values.push(value);
            }
        }
        set
    }

    /// Whether `value` is supported.
    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }

    /// Iterate over the supported values.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Number of supported values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value is supported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: PartialEq> FromIterator<T> for DiscreteSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T: PartialEq + Clone> Constraint<T> for DiscreteSet<T> {
    fn admit(&self, value: T) -> Option<T> {
        self.contains(&value).then_some(value)
    }

    fn conform(&mut self, value: T) -> T {
        // The device is authoritative: a reported value is supported by definition.
        if !self.values.is_empty() && !self.values.contains(&value) {
            tracing::debug!("Device reported a value outside its declared set, extending the set");
            self.values.push(value.clone());
        }
        value
    }

    fn reconcile(&self, value: T) -> T {
        match self.values.first() {
            Some(first) if !self.values.contains(&value) => {
                tracing::debug!("Confirmed value left the declared set, falling back to its first value");
                first.clone()
            }
            _ => value,
        }
    }

    fn is_settable(&self) -> bool {
        !self.values.is_empty()
    }
}

/// Inclusive numeric range. Unbounded until the device declares its limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds<T> {
    range: Option<(T, T)>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self { range: None }
    }
}

impl<T: PartialOrd + Copy> Bounds<T> {
    /// Create bounds `[min, max]`. Swapped limits are reordered. Limits that
    /// cannot be compared (NaN) leave the range undeclared.
    pub fn new(min: T, max: T) -> Self {
        let range = match min.partial_cmp(&max) {
            Some(Ordering::Greater) => Some((max, min)),
            Some(_) => Some((min, max)),
            None => {
                tracing::warn!("Ignoring range with non-comparable limits");
                None
            }
        };
        Self { range }
    }

    /// Lower limit, if declared.
    pub fn min(&self) -> Option<T> {
        self.range.map(|(min, _)| min)
    }

    /// Upper limit, if declared.
    pub fn max(&self) -> Option<T> {
        self.range.map(|(_, max)| max)
    }

    /// Clamp `value` into the range. Returns `None` when no range is declared
    /// or when `value` is not comparable with the limits (NaN).
    pub fn clamp(&self, value: T) -> Option<T> {
        let (min, max) = self.range?;
        match (value.partial_cmp(&min), value.partial_cmp(&max)) {
            (None, _) | (_, None) => None,
            (Some(Ordering::Less), _) => Some(min),
            (_, Some(Ordering::Greater)) => Some(max),
            _ => Some(value),
        }
    }
}

impl<T: PartialOrd + Copy> Constraint<T> for Bounds<T> {
    fn admit(&self, value: T) -> Option<T> {
        self.clamp(value)
    }

    fn conform(&mut self, value: T) -> T {
        match self.range {
            None => value,
            Some((min, _)) => self.clamp(value).unwrap_or(min),
        }
    }

    fn reconcile(&self, value: T) -> T {
        match self.range {
            None => value,
            Some((min, _)) => self.clamp(value).unwrap_or(min),
        }
    }

    fn is_settable(&self) -> bool {
        self.range.is_some()
    }
}

/// No constraint: every value may be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnyValue;

impl<T> Constraint<T> for AnyValue {
    fn admit(&self, value: T) -> Option<T> {
        Some(value)
    }

    fn conform(&mut self, value: T) -> T {
        value
    }

    fn reconcile(&self, value: T) -> T {
        value
    }

    fn is_settable(&self) -> bool {
        true
    }
}
