//! The profile: one measurement curve plus everything the stages attach to it.
//!
//! A profile holds
//!
//! - its points `(id, q, I, err)` (loaded profiles are sorted by `q`)
//! - typed per-point flags, declared before use
//! - one interval cache per flag (rebuilt explicitly, invalidated on write)
//! - an optional fitted interpolant
//! - the calibration factor `gamma`, applied by [`Profile::data`] and
//!   [`Profile::mean`]
//!
//! Stages take profiles by value and hand back annotated ones; nothing else
//! holds a mutable reference across stages.

pub mod flags;
pub mod intervals;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::Hyperparams;
use crate::error::MergeError;
use crate::fit::engine::Interpolant;

pub use flags::{FlagColumn, FlagKind, FlagValue, names};
pub use intervals::{Interval, Intervals};

/// One observation. `id` is the index in the profile's point list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub id: usize,
    pub q: f64,
    pub i: f64,
    pub err: f64,
}

/// Mean-curve sample returned by [`Profile::mean`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanPoint {
    pub q: f64,
    pub i: f64,
    pub err: f64,
}

#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    n_reps: u32,
    points: Vec<Point>,
    flags: Vec<FlagColumn>,
    intervals: HashMap<String, Intervals>,
    interpolant: Option<Arc<dyn Interpolant>>,
    gamma: f64,
}

impl Profile {
    /// Build a profile from raw `(q, I, err)` rows; rows are sorted by `q`.
    pub fn new(name: impl Into<String>, n_reps: u32, rows: &[(f64, f64, f64)]) -> Result<Self, MergeError> {
        let name = name.into();
        if rows.is_empty() {
            return Err(MergeError::InvalidInput(format!("profile '{name}' has no data")));
        }
        let mut rows = rows.to_vec();
        rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut profile = Profile::empty(name, n_reps)?;
        for (q, i, err) in rows {
            if !(q.is_finite() && i.is_finite() && err.is_finite()) {
                return Err(MergeError::InvalidInput(format!(
                    "profile '{}': non-finite value at q={q}",
                    profile.name
                )));
            }
            if err < 0.0 {
                return Err(MergeError::InvalidInput(format!(
                    "profile '{}': negative error at q={q}",
                    profile.name
                )));
            }
            if profile.points.last().is_some_and(|p| p.q == q) {
                return Err(MergeError::InvalidInput(format!(
                    "profile '{}': duplicate coordinate q={q}",
                    profile.name
                )));
            }
            profile.push_point(q, i, err);
        }
        Ok(profile)
    }

    /// A profile with no points; rows are appended in call order.
    pub fn empty(name: impl Into<String>, n_reps: u32) -> Result<Self, MergeError> {
        let name = name.into();
        if n_reps == 0 {
            return Err(MergeError::InvalidInput(format!("profile '{name}': Nreps must be >= 1")));
        }
        Ok(Self {
            name,
            n_reps,
            points: Vec::new(),
            flags: Vec::new(),
            intervals: HashMap::new(),
            interpolant: None,
            gamma: 1.0,
        })
    }

    /// Append a point; every declared flag gets an unset slot for it.
    pub fn push_point(&mut self, q: f64, i: f64, err: f64) -> usize {
        let id = self.points.len();
        self.points.push(Point { id, q, i, err });
        for column in &mut self.flags {
            column.values.push(None);
        }
        self.intervals.clear();
        id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_reps(&self) -> u32 {
        self.n_reps
    }

    pub fn set_n_reps(&mut self, n_reps: u32) -> Result<(), MergeError> {
        if n_reps == 0 {
            return Err(MergeError::InvalidInput(format!("profile '{}': Nreps must be >= 1", self.name)));
        }
        self.n_reps = n_reps;
        Ok(())
    }

    /// Raw points (not rescaled), in storage order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn interpolant(&self) -> Option<&Arc<dyn Interpolant>> {
        self.interpolant.as_ref()
    }

    pub fn with_interpolant(mut self, interpolant: Arc<dyn Interpolant>) -> Self {
        self.interpolant = Some(interpolant);
        self
    }

    pub fn hyperparams(&self) -> Option<Hyperparams> {
        self.interpolant.as_ref().map(|ip| ip.hyperparams())
    }

    /// Point indices in increasing `q` (stable for repeated coordinates).
    pub fn order_by_q(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.points.len()).collect();
        order.sort_by(|&a, &b| {
            self.points[a]
                .q
                .partial_cmp(&self.points[b].q)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }

    /// Declared flags, in declaration order.
    pub fn flag_columns(&self) -> &[FlagColumn] {
        &self.flags
    }

    pub fn flag_kind(&self, name: &str) -> Option<FlagKind> {
        self.column(name).map(|c| c.kind)
    }

    /// Declare a flag. Redeclaring with the same kind clears its values.
    pub fn declare_flag(&mut self, name: &str, kind: FlagKind) -> Result<(), MergeError> {
        let len = self.points.len();
        self.intervals.remove(name);
        match self.flags.iter_mut().find(|c| c.name == name) {
            Some(column) if column.kind != kind => Err(MergeError::SchemaMismatch {
                profile: self.name.clone(),
                flag: name.to_string(),
                expected: kind.name(),
                found: column.kind.name(),
            }),
            Some(column) => {
                column.values = vec![None; len];
                Ok(())
            }
            None => {
                self.flags.push(FlagColumn::new(name, kind, len));
                Ok(())
            }
        }
    }

    /// Set a flag on point `id`; invalidates that flag's intervals.
    pub fn set_flag(&mut self, id: usize, name: &str, value: impl Into<FlagValue>) -> Result<(), MergeError> {
        let value = value.into();
        let len = self.points.len();
        let profile = &self.name;
        let column = self
            .flags
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| MergeError::MissingFlag {
                profile: profile.clone(),
                flag: name.to_string(),
            })?;
        if value.kind() != column.kind {
            return Err(MergeError::FlagType {
                profile: profile.clone(),
                flag: name.to_string(),
                expected: column.kind.name(),
                found: value.kind().name(),
            });
        }
        let slot = column.values.get_mut(id).ok_or_else(|| MergeError::PointOutOfRange {
            profile: profile.clone(),
            id,
            len,
        })?;
        *slot = Some(value);
        self.intervals.remove(name);
        Ok(())
    }

    /// Flag value of point `id` (`None` if declared but unset).
    pub fn flag(&self, id: usize, name: &str) -> Result<Option<&FlagValue>, MergeError> {
        let column = self.require(name)?;
        let slot = column.values.get(id).ok_or_else(|| MergeError::PointOutOfRange {
            profile: self.name.clone(),
            id,
            len: self.points.len(),
        })?;
        Ok(slot.as_ref())
    }

    /// Flag value at an arbitrary coordinate, read from the interval cache.
    pub fn flag_at(&self, q: f64, name: &str) -> Result<Option<&FlagValue>, MergeError> {
        Ok(self.intervals(name)?.lookup(q))
    }

    /// Like [`Profile::flag_at`], with a fallback for coordinates outside every interval.
    pub fn flag_at_or(&self, q: f64, name: &str, default: FlagValue) -> Result<FlagValue, MergeError> {
        Ok(self.flag_at(q, name)?.cloned().unwrap_or(default))
    }

    pub fn intervals(&self, name: &str) -> Result<&Intervals, MergeError> {
        self.require(name)?;
        self.intervals.get(name).ok_or_else(|| MergeError::StaleIntervals {
            profile: self.name.clone(),
            flag: name.to_string(),
        })
    }

    /// Recompute the intervals of a fully populated flag.
    pub fn rebuild_intervals(&mut self, name: &str) -> Result<(), MergeError> {
        let column = self.require(name)?;
        let order = self.order_by_q();
        let mut samples = Vec::with_capacity(order.len());
        for id in order {
            let value = column.values[id].as_ref().ok_or_else(|| MergeError::IncompleteFlag {
                profile: self.name.clone(),
                flag: name.to_string(),
                id,
            })?;
            samples.push((self.points[id].q, value));
        }
        let intervals = Intervals::compress(samples);
        self.intervals.insert(name.to_string(), intervals);
        Ok(())
    }

    /// Replace a flag's intervals with explicitly constructed ones.
    pub fn set_intervals(&mut self, name: &str, intervals: Intervals) -> Result<(), MergeError> {
        let column = self.require(name)?;
        if let Some(bad) = intervals.iter().find(|iv| iv.value.kind() != column.kind) {
            return Err(MergeError::FlagType {
                profile: self.name.clone(),
                flag: name.to_string(),
                expected: column.kind.name(),
                found: bad.value.kind().name(),
            });
        }
        self.intervals.insert(name.to_string(), intervals);
        Ok(())
    }

    /// Points whose boolean flags in `filter` are all true, rescaled by gamma.
    pub fn data(&self, filter: &[&str]) -> Result<Vec<Point>, MergeError> {
        let columns = filter
            .iter()
            .map(|name| self.require(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .points
            .iter()
            .filter(|p| {
                columns
                    .iter()
                    .all(|c| matches!(c.values[p.id], Some(FlagValue::Bool(true))))
            })
            .map(|p| Point {
                id: p.id,
                q: p.q,
                i: self.gamma * p.i,
                err: self.gamma * p.err,
            })
            .collect())
    }

    /// Evaluate the interpolant at `qs`, rescaled by gamma.
    pub fn mean(&self, qs: &[f64]) -> Result<Vec<MeanPoint>, MergeError> {
        let interpolant = self
            .interpolant
            .as_ref()
            .ok_or_else(|| MergeError::MissingInterpolant(self.name.clone()))?;
        Ok(qs
            .iter()
            .map(|&q| {
                let est = interpolant.evaluate(q);
                MeanPoint {
                    q,
                    i: self.gamma * est.mean,
                    err: self.gamma * est.err,
                }
            })
            .collect())
    }

    fn column(&self, name: &str) -> Option<&FlagColumn> {
        self.flags.iter().find(|c| c.name == name)
    }

    fn require(&self, name: &str) -> Result<&FlagColumn, MergeError> {
        self.column(name).ok_or_else(|| MergeError::MissingFlag {
            profile: self.name.clone(),
            flag: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::LinearEngine;
    use crate::fit::engine::RegressionEngine;

    fn sample() -> Profile {
        Profile::new(
            "a.dat",
            10,
            &[(0.3, 3.0, 0.3), (0.1, 1.0, 0.1), (0.2, 2.0, 0.2)],
        )
        .unwrap()
    }

    #[test]
    fn new_sorts_and_validates() {
        let p = sample();
        let qs: Vec<f64> = p.points().iter().map(|p| p.q).collect();
        assert_eq!(qs, vec![0.1, 0.2, 0.3]);
        assert_eq!(p.points()[2].id, 2);

        assert!(Profile::new("x", 10, &[]).is_err());
        assert!(Profile::new("x", 0, &[(0.1, 1.0, 0.1)]).is_err());
        assert!(Profile::new("x", 10, &[(0.1, 1.0, -0.1)]).is_err());
        assert!(Profile::new("x", 10, &[(0.1, 1.0, 0.1), (0.1, 2.0, 0.1)]).is_err());
    }

    #[test]
    fn undeclared_flag_is_not_found() {
        let p = sample();
        let err = p.flag(0, "agood").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = p.flag_at(0.1, "agood").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn set_flag_checks_type_and_range() {
        let mut p = sample();
        p.declare_flag("agood", FlagKind::Bool).unwrap();
        assert_eq!(p.flag(0, "agood").unwrap(), None);

        p.set_flag(0, "agood", true).unwrap();
        assert_eq!(p.flag(0, "agood").unwrap(), Some(&FlagValue::Bool(true)));

        let err = p.set_flag(0, "agood", 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(p.set_flag(9, "agood", true).is_err());
    }

    #[test]
    fn redeclare_with_other_kind_is_schema_mismatch() {
        let mut p = sample();
        p.declare_flag("drefnum", FlagKind::Int).unwrap();
        let err = p.declare_flag("drefnum", FlagKind::Str).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn intervals_go_stale_after_write() {
        let mut p = sample();
        p.declare_flag("agood", FlagKind::Bool).unwrap();
        for (id, v) in [true, true, false].into_iter().enumerate() {
            p.set_flag(id, "agood", v).unwrap();
        }
        p.rebuild_intervals("agood").unwrap();
        assert_eq!(p.flag_at(0.15, "agood").unwrap(), Some(&FlagValue::Bool(true)));
        assert_eq!(p.flag_at(0.3, "agood").unwrap(), Some(&FlagValue::Bool(false)));
        assert_eq!(
            p.flag_at_or(0.5, "agood", FlagValue::Bool(false)).unwrap(),
            FlagValue::Bool(false)
        );

        p.set_flag(2, "agood", true).unwrap();
        assert_eq!(p.flag_at(0.3, "agood").unwrap_err().kind(), ErrorKind::Ordering);
        p.rebuild_intervals("agood").unwrap();
        assert_eq!(p.intervals("agood").unwrap().len(), 1);
    }

    #[test]
    fn rebuild_requires_every_point() {
        let mut p = sample();
        p.declare_flag("agood", FlagKind::Bool).unwrap();
        p.set_flag(0, "agood", true).unwrap();
        let err = p.rebuild_intervals("agood").unwrap_err();
        assert!(matches!(err, MergeError::IncompleteFlag { id: 1, .. }));
    }

    #[test]
    fn data_filters_and_rescales() {
        let mut p = sample();
        p.declare_flag("agood", FlagKind::Bool).unwrap();
        for (id, v) in [true, false, true].into_iter().enumerate() {
            p.set_flag(id, "agood", v).unwrap();
        }
        let p = p.with_gamma(2.0);
        let data = p.data(&["agood"]).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].id, 2);
        assert!((data[1].i - 6.0).abs() < 1e-12);
        assert!((data[1].err - 0.6).abs() < 1e-12);
        assert_eq!(p.data(&[]).unwrap().len(), 3);
    }

    #[test]
    fn mean_needs_interpolant_and_applies_gamma() {
        let p = sample();
        let err = p.mean(&[0.15]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ordering);

        let model = LinearEngine
            .build(p.points(), p.n_reps(), &Hyperparams::default())
            .unwrap();
        let p = p.with_interpolant(model).with_gamma(0.5);
        let mean = p.mean(&[0.15]).unwrap();
        assert!((mean[0].i - 0.75).abs() < 1e-12);
        assert!((mean[0].err - 0.075).abs() < 1e-12);
    }

    #[test]
    fn merged_style_profile_keeps_insertion_order() {
        let mut p = Profile::empty("merged", 10).unwrap();
        p.declare_flag("eorigin", FlagKind::Int).unwrap();
        for (q, origin) in [(0.2, 0i64), (0.3, 0), (0.1, 1)] {
            let id = p.push_point(q, 1.0, 0.1);
            p.set_flag(id, "eorigin", origin).unwrap();
        }
        assert_eq!(p.points()[2].q, 0.1);
        assert_eq!(p.order_by_q(), vec![2, 0, 1]);
        p.rebuild_intervals("eorigin").unwrap();
        assert_eq!(p.flag_at(0.1, "eorigin").unwrap(), Some(&FlagValue::Int(1)));
        assert_eq!(p.flag_at(0.25, "eorigin").unwrap(), Some(&FlagValue::Int(0)));
    }
}
