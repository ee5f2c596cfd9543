use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;
use tracing::debug;

use super::{
    dsbus_dv::{current_injection, d_sbus_d_v},
    solver::Solve,
};
use crate::error::PowerFlowError;

/// Solves the power flow equations with Newton's method in polar form.
///
/// `pv` and `pq` index into `v_init`; every other bus is treated as a
/// reference bus and keeps its voltage. `Ybus` must store all diagonal
/// entries.
///
/// On success returns the voltage vector and the number of iterations.
/// On failure returns the error together with the last iterate.
#[allow(non_snake_case)]
pub fn newton_pf<Solver: Solve>(
    Ybus: &CscMatrix<Complex64>,
    Sbus: &DVector<Complex64>,
    v_init: &DVector<Complex64>,
    pv: &[usize],
    pq: &[usize],
    tolerance: Option<f64>,
    max_iter: Option<usize>,
    solver: &mut Solver,
) -> Result<(DVector<Complex64>, usize), (PowerFlowError, DVector<Complex64>)> {
    let max_iter = max_iter.unwrap_or(10);
    let tol = tolerance.unwrap_or(1e-8);
    let pvpq: Vec<usize> = pv.iter().chain(pq.iter()).copied().collect();
    let n_bus = v_init.len();

    // position of each bus inside the state vector
    let mut pos_a = vec![None; n_bus];
    let mut pos_m = vec![None; n_bus];
    pvpq.iter().enumerate().for_each(|(j, &b)| pos_a[b] = Some(j));
    pq.iter()
        .enumerate()
        .for_each(|(j, &b)| pos_m[b] = Some(pvpq.len() + j));

    solver.reset();

    let mut v = v_init.clone();
    let mut v_m: Vec<f64> = v.iter().map(|e| e.norm()).collect();
    let mut v_a: Vec<f64> = v.iter().map(|e| e.arg()).collect();

    let mut f = mismatch(Ybus, Sbus, &v, &pvpq, pq);
    if norm_inf(&f) < tol {
        return Ok((v, 0));
    }

    for iteration in 1..=max_iter {
        let jacobian = build_jacobian(Ybus, &v, &pos_a, &pos_m, f.len());
        let n = jacobian.nrows();
        let (ap, ai, ax) = jacobian.disassemble();

        let mut dx: Vec<f64> = f.iter().map(|x| -x).collect();
        if let Err(err) = solver.solve(&ap, &ai, &ax, &mut dx, n) {
            return Err((err.into(), v));
        }

        update_v(&mut v_a, &mut v_m, &dx, &pvpq, pq);
        v = DVector::from_iterator(
            n_bus,
            v_m.iter()
                .zip(v_a.iter())
                .map(|(&m, &a)| Complex64::from_polar(m, a)),
        );
        // fold a negative magnitude back into the angle
        v_m.iter_mut().zip(v.iter()).for_each(|(m, e)| *m = e.norm());
        v_a.iter_mut().zip(v.iter()).for_each(|(a, e)| *a = e.arg());

        f = mismatch(Ybus, Sbus, &v, &pvpq, pq);
        let norm_f = norm_inf(&f);
        debug!(iteration, mismatch = norm_f, "newton step");

        if !norm_f.is_finite() {
            return Err((PowerFlowError::NotConverged { iterations: iteration }, v));
        }
        if norm_f < tol {
            return Ok((v, iteration));
        }
    }
    Err((PowerFlowError::NotConverged { iterations: max_iter }, v))
}

/// `F = [Re(mis[pvpq]); Im(mis[pq])]` with `mis = V .* conj(Ybus V) - Sbus`.
fn mismatch(
    y_bus: &CscMatrix<Complex64>,
    s_bus: &DVector<Complex64>,
    v: &DVector<Complex64>,
    pvpq: &[usize],
    pq: &[usize],
) -> Vec<f64> {
    let ibus = current_injection(y_bus, v);
    let mis = |b: usize| v[b] * ibus[b].conj() - s_bus[b];
    pvpq.iter()
        .map(|&b| mis(b).re)
        .chain(pq.iter().map(|&b| mis(b).im))
        .collect()
}

#[inline(always)]
fn norm_inf(f: &[f64]) -> f64 {
    f.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

#[inline(always)]
fn update_v(v_a: &mut [f64], v_m: &mut [f64], dx: &[f64], pvpq: &[usize], pq: &[usize]) {
    pvpq.iter().zip(dx).for_each(|(&b, d)| v_a[b] += d);
    pq.iter()
        .zip(&dx[pvpq.len()..])
        .for_each(|(&b, d)| v_m[b] += d);
}

/// Assembles
/// ```text
/// J = | Re(dS/dVa)[pvpq, pvpq]  Re(dS/dVm)[pvpq, pq] |
///     | Im(dS/dVa)[pq,   pvpq]  Im(dS/dVm)[pq,   pq] |
/// ```
/// directly from the `Ybus` pattern.
fn build_jacobian(
    y_bus: &CscMatrix<Complex64>,
    v: &DVector<Complex64>,
    pos_a: &[Option<usize>],
    pos_m: &[Option<usize>],
    dim: usize,
) -> CscMatrix<f64> {
    let d = d_sbus_d_v(y_bus, v);
    let mut jac = CooMatrix::new(dim, dim);
    for (k, (row, col, _)) in y_bus.triplet_iter().enumerate() {
        let (da, dm) = (d.d_va[k], d.d_vm[k]);
        if let Some(r) = pos_a[row] {
            if let Some(c) = pos_a[col] {
                jac.push(r, c, da.re);
            }
            if let Some(c) = pos_m[col] {
                jac.push(r, c, dm.re);
            }
        }
        if let Some(r) = pos_m[row] {
            if let Some(c) = pos_a[col] {
                jac.push(r, c, da.im);
            }
            if let Some(c) = pos_m[col] {
                jac.push(r, c, dm.im);
            }
        }
    }
    CscMatrix::from(&jac)
}
