use nalgebra::{DMatrix, DVector};

use super::{LinearSolveError, Solve};

/// Dense LU fallback. Expands the CSC data into a full matrix, so it is only
/// meant for small systems or builds without a sparse backend.
#[derive(Default)]
pub struct DenseSolver;

#[allow(non_snake_case)]
impl Solve for DenseSolver {
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
        let mut a = DMatrix::<f64>::zeros(n, n);
        for col in 0..n {
            for idx in Ap[col]..Ap[col + 1] {
                a[(Ai[idx], col)] += Ax[idx];
            }
        }
        let rhs = DVector::from_column_slice(b);
        let x = a.lu().solve(&rhs).ok_or(LinearSolveError::Singular)?;
        b.copy_from_slice(x.as_slice());
        Ok(())
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::solver::tests::{check_solution, small_system};

    #[test]
    fn solves_small_system() {
        let (ap, ai, ax, mut b) = small_system();
        DenseSolver.solve(&ap, &ai, &ax, &mut b, 3).unwrap();
        check_solution(&b);
    }

    #[test]
    fn singular_matrix_is_reported() {
        // second column duplicates the first
        let ap = vec![0, 2, 4];
        let ai = vec![0, 1, 0, 1];
        let ax = vec![1.0, 2.0, 1.0, 2.0];
        let mut b = vec![1.0, 1.0];
        let err = DenseSolver.solve(&ap, &ai, &ax, &mut b, 2).unwrap_err();
        assert_eq!(err, LinearSolveError::Singular);
    }
}
