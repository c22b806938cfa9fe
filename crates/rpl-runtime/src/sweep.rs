//! Function sweep: the numeric side of plotting.
//!
//! A plot evaluates an expression for successive values of `x` and maps
//! each `(x, y)` pair to pixel coordinates. Drawing belongs to the caller,
//! which receives the samples through a sink.

use std::cmp::Ordering;

use rpl_common_core::Settings;

use crate::algebraic::Algebraic;
use crate::arithmetic;
use crate::error::{Result, RuntimeError};
use crate::gc::Gc;
use crate::runtime::Runtime;

/// Horizontal range of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRange {
    pub xmin: Algebraic,
    pub xmax: Algebraic,
    /// Distance between samples, zero to split the range evenly
    pub step: Algebraic,
}

impl SweepRange {
    pub fn new(xmin: Algebraic, xmax: Algebraic) -> Self {
        Self { xmin, xmax, step: Algebraic::from_i64(0) }
    }

    pub fn with_step(mut self, step: Algebraic) -> Self {
        self.step = step;
        self
    }

    /// Effective step for `samples` samples.
    pub fn step_for(&self, samples: u32, settings: &Settings) -> Result<Algebraic> {
        if !self.step.is_zero() {
            return Ok(self.step.clone());
        }
        if samples == 0 {
            return Err(RuntimeError::InvalidPlotRange);
        }
        let span = arithmetic::sub(&self.xmax, &self.xmin, settings)?;
        arithmetic::div(&span, &Algebraic::from_i64(samples as i64), settings)
    }
}

/// Evaluate `expr` for every `x` of `range`, handing each `(x, y)` to `sink`.
///
/// `x` is pushed on the stack before `expr` runs, which must leave one
/// number. Returns the number of samples taken, or `Interrupted` if the
/// runtime's interrupt flag was raised. A sample that fails leaves the
/// stack as it was before the sample.
pub fn sweep<F>(rt: &mut Runtime, expr: &Gc, range: &SweepRange, samples: u32, mut sink: F) -> Result<usize>
where
    F: FnMut(&Algebraic, &Algebraic) -> Result<()>,
{
    let settings = *rt.settings();
    let step = range.step_for(samples, &settings)?;
    if arithmetic::compare(&step, &Algebraic::from_i64(0))? != Ordering::Greater
        || arithmetic::compare(&range.xmin, &range.xmax)? == Ordering::Greater
    {
        return Err(RuntimeError::InvalidPlotRange);
    }

    let interrupt = rt.interrupt();
    let mut x = range.xmin.clone();
    let mut count = 0;
    loop {
        if interrupt.is_raised() {
            tracing::warn!(samples = count, "sweep interrupted");
            return Err(RuntimeError::Interrupted);
        }
        let depth = rt.depth();
        let y = match sample(rt, expr, &x) {
            Ok(y) => y,
            Err(err) => {
                let extra = rt.depth().saturating_sub(depth);
                rt.drop_n(extra)?;
                tracing::debug!(%err, dropped = extra, "sweep sample failed");
                return Err(err);
            }
        };
        sink(&x, &y)?;
        count += 1;

        x = arithmetic::add(&x, &step, &settings)?;
        if arithmetic::compare(&x, &range.xmax)? == Ordering::Greater {
            break;
        }
    }
    tracing::trace!(samples = count, "sweep done");
    Ok(count)
}

fn sample(rt: &mut Runtime, expr: &Gc, x: &Algebraic) -> Result<Algebraic> {
    let xo = rt.make_algebraic(x)?;
    rt.push(xo);
    rt.execute(expr)?;
    let yo = rt.pop()?;
    rt.algebraic(&yo)
}

/// Map `value` to a pixel coordinate on an axis of `scale` pixels spanning
/// `min..max`. Sizes are mapped without the `min` offset. Based integers are
/// already coordinates and map to their value.
pub fn pixel_adjust(
    value: &Algebraic,
    min: &Algebraic,
    max: &Algebraic,
    scale: u32,
    is_size: bool,
    settings: &Settings,
) -> Result<i32> {
    if value.is_based() {
        return arithmetic::as_i32(value);
    }
    let mut range = arithmetic::sub(max, min, settings)?;
    // Avoid dividing by zero for a degenerate range
    if range.is_zero() {
        range = Algebraic::from_i64(1);
    }
    let pos = if is_size { value.clone() } else { arithmetic::sub(value, min, settings)? };
    let pos = arithmetic::div(&pos, &range, settings)?;
    let pos = arithmetic::mul(&pos, &Algebraic::from_i64(scale as i64), settings)?;
    arithmetic::as_i32(&pos)
}
