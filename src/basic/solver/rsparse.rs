use rsparse::{
    data::{self, Numeric, Symb},
    lsolve, lu, sqr, usolve,
};

use super::{LinearSolveError, Solve};

/// Sparse LU backend. The symbolic analysis is cached between calls and
/// dropped by [`Solve::reset`].
#[derive(Default)]
pub struct RSparseSolver {
    x: Vec<f64>,
    symbolic: Option<Symb>,
}

#[allow(non_snake_case)]
impl Solve for RSparseSolver {
    fn solve(
        &mut self,
        Ap: &[usize],
        Ai: &[usize],
        Ax: &[f64],
        b: &mut [f64],
        n: usize,
    ) -> Result<(), LinearSolveError> {
        if b.len() != n || Ap.len() != n + 1 {
            return Err(LinearSolveError::Dimension { n, rhs: b.len() });
        }
        let a = data::Sprs {
            m: n,
            n,
            i: Ai.to_vec(),
            p: Ap.iter().map(|&v| v as isize).collect(),
            x: Ax.to_vec(),
            nzmax: Ax.len(),
        };
        if self.x.len() != n {
            self.symbolic = None;
        }
        let symbolic = self.symbolic.get_or_insert_with(|| sqr(&a, 1, false));
        self.x.resize(n, 0.0);

        let num = lu(&a, symbolic, 1e-6).map_err(|_| LinearSolveError::Factorization)?;
        let x = &mut self.x;
        ipvec(&num.pinv, b, x); // x = P*b
        lsolve(&num.l, x); // x = L\x
        usolve(&num.u, x); // x = U\x
        ipvec(&symbolic.q, x, b); // b = Q*x

        if b.iter().any(|v| !v.is_finite()) {
            return Err(LinearSolveError::Singular);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.symbolic = None;
    }
}

fn ipvec<T: Numeric<T>>(p: &Option<Vec<isize>>, b: &[T], x: &mut [T]) {
    match p {
        Some(perm) => {
            for k in 0..b.len() {
                x[perm[k] as usize] = b[k];
            }
        }
        None => x.copy_from_slice(b),
    }
}
