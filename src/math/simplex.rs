//! Nelder–Mead simplex minimizer.
//!
//! Derivative-free, deterministic, and cheap per iteration (one or two
//! objective evaluations except on shrink steps), which suits objectives that
//! are only piecewise smooth (clamped parameters) or may be non-finite in
//! places. Non-finite objective values are treated as `+∞`.

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `x0`, with initial simplex edge `step`.
///
/// Stops after `max_iter` iterations or when the spread of objective values
/// across the simplex falls below `tol` (relative to the best value).
pub fn nelder_mead<F>(f: F, x0: &[f64], step: f64, max_iter: usize, tol: f64) -> SimplexResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_finite() { v } else { f64::INFINITY }
    };

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for j in 0..n {
        let mut v = x0.to_vec();
        v[j] += step;
        simplex.push(v);
    }
    let mut values: Vec<f64> = simplex.iter().map(|x| eval(x.as_slice())).collect();

    let mut iterations = 0;
    while iterations < max_iter {
        order(&mut simplex, &mut values);

        let best = values[0];
        let worst = values[n];
        if worst.is_finite() && (worst - best).abs() <= tol * (1.0 + best.abs()) {
            break;
        }
        iterations += 1;

        // Centroid of every vertex but the worst.
        let mut centroid = vec![0.0; n];
        for x in &simplex[..n] {
            for (c, xi) in centroid.iter_mut().zip(x) {
                *c += xi / n as f64;
            }
        }

        let reflected = blend(&centroid, &simplex[n], -REFLECT);
        let f_reflected = eval(reflected.as_slice());

        if f_reflected < values[0] {
            let expanded = blend(&centroid, &simplex[n], -EXPAND);
            let f_expanded = eval(expanded.as_slice());
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        // Contract towards the better of the worst and the reflected point.
        let (towards, f_towards) = if f_reflected < values[n] {
            (reflected, f_reflected)
        } else {
            (simplex[n].clone(), values[n])
        };
        let contracted = blend(&centroid, &towards, CONTRACT);
        let f_contracted = eval(contracted.as_slice());
        if f_contracted < f_towards {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        // Shrink every vertex towards the best one.
        let best_x = simplex[0].clone();
        for k in 1..=n {
            simplex[k] = blend(&best_x, &simplex[k], SHRINK);
            values[k] = eval(simplex[k].as_slice());
        }
    }

    order(&mut simplex, &mut values);
    SimplexResult {
        x: simplex.swap_remove(0),
        fx: values[0],
        iterations,
    }
}

/// `c + t·(x - c)`.
fn blend(c: &[f64], x: &[f64], t: f64) -> Vec<f64> {
    c.iter().zip(x).map(|(ci, xi)| ci + t * (xi - ci)).collect()
}

fn order(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));
    *simplex = idx.iter().map(|&i| simplex[i].clone()).collect();
    *values = idx.iter().map(|&i| values[i]).collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_shifted_quadratic() {
        let f = |x: &[f64]| (x[0] - 1.5).powi(2) + 3.0 * (x[1] + 0.5).powi(2);
        let res = nelder_mead(f, &[0.0, 0.0], 0.5, 2000, 1e-14);
        assert!((res.x[0] - 1.5).abs() < 1e-4, "{:?}", res.x);
        assert!((res.x[1] + 0.5).abs() < 1e-4, "{:?}", res.x);
        assert!(res.fx < 1e-8);
    }

    #[test]
    fn minimizes_rosenbrock() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let res = nelder_mead(f, &[-1.2, 1.0], 0.5, 5000, 1e-16);
        assert!((res.x[0] - 1.0).abs() < 1e-3, "{:?}", res.x);
        assert!((res.x[1] - 1.0).abs() < 1e-3, "{:?}", res.x);
    }

    #[test]
    fn respects_iteration_limit() {
        let f = |x: &[f64]| x[0] * x[0];
        let res = nelder_mead(f, &[10.0], 1.0, 3, 0.0);
        assert!(res.iterations <= 3);
    }

    #[test]
    fn escapes_non_finite_region() {
        let f = |x: &[f64]| if x[0] < 0.0 { f64::NAN } else { (x[0] - 2.0).powi(2) };
        let res = nelder_mead(f, &[0.5], 0.5, 500, 1e-12);
        assert!((res.x[0] - 2.0).abs() < 1e-3);
    }
}
