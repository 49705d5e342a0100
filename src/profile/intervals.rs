//! Run-length encoding of a flag over the coordinate axis.
//!
//! A flag observed at discrete coordinates is turned into ranges on which it is
//! constant, so it can be queried at coordinates that were never observed
//! (e.g. the points of a mean curve).
//!
//! Example: `q1:T, q2:F, q3:T, q4:T` gives `[q1,q2) T`, `[q2,q3) F`, `[q3,q4] T`.
//! Every interval is half-open except the last one, which is closed at the
//! last observed coordinate (possibly a single point `[q, q]`).

use crate::profile::flags::FlagValue;

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub value: FlagValue,
    /// Whether `end` itself belongs to the interval.
    pub end_inclusive: bool,
}

impl Interval {
    pub fn contains(&self, q: f64) -> bool {
        self.start <= q && (q < self.end || (self.end_inclusive && q == self.end))
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered list of intervals for one flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intervals(Vec<Interval>);

impl Intervals {
    /// Compress `(q, value)` samples given in increasing `q` order.
    pub fn compress<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (f64, &'a FlagValue)>,
    {
        let mut out = Vec::new();
        let mut current: Option<(f64, &FlagValue)> = None;
        let mut last_q = f64::NAN;

        for (q, value) in samples {
            match current {
                None => current = Some((q, value)),
                Some((start, open)) if open != value => {
                    out.push(Interval {
                        start,
                        end: q,
                        value: open.clone(),
                        end_inclusive: false,
                    });
                    current = Some((q, value));
                }
                Some(_) => {}
            }
            last_q = q;
        }

        if let Some((start, value)) = current {
            out.push(Interval {
                start,
                end: last_q,
                value: value.clone(),
                end_inclusive: true,
            });
        }
        Intervals(out)
    }

    /// Append an explicit interval; the list is kept sorted by `start`.
    pub fn push(&mut self, interval: Interval) {
        let pos = self.0.partition_point(|iv| iv.start <= interval.start);
        self.0.insert(pos, interval);
    }

    /// Value of the first interval containing `q`.
    pub fn lookup(&self, q: f64) -> Option<&FlagValue> {
        self.0.iter().find(|iv| iv.contains(q)).map(|iv| &iv.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn min_start(&self) -> Option<f64> {
        self.0.iter().map(|iv| iv.start).reduce(f64::min)
    }

    pub fn max_end(&self) -> Option<f64> {
        self.0.iter().map(|iv| iv.end).reduce(f64::max)
    }
}
