use thiserror::Error;

mod dense;
pub use dense::*;

#[cfg(feature = "rsparse")]
mod rsparse;
#[cfg(feature = "rsparse")]
pub use rsparse::*;

#[cfg(feature = "rsparse")]
pub type DefaultSolver = RSparseSolver;

#[cfg(not(feature = "rsparse"))]
pub type DefaultSolver = DenseSolver;

/// Failure of a sparse linear solve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinearSolveError {
    #[error("matrix is singular")]
    Singular,
    #[error("LU factorization failed")]
    Factorization,
    #[error("dimension mismatch: matrix is {n}x{n}, right-hand side has {rhs} rows")]
    Dimension { n: usize, rhs: usize },
}

#[allow(non_snake_case)]
/// A trait for solving sparse linear systems.
pub trait Solve {
    /// Solves `A x = b` in place.
    ///
    /// # Parameters
    ///
    /// * `Ap` - Column pointers of the matrix.
    /// * `Ai` - Row indices of the matrix.
    /// * `Ax` - Non-zero values of the matrix.
    /// * `b` - Right-hand side vector, overwritten with the solution.
    /// * `n` - Dimension of the system.
    fn solve(
        &mut self,
        Ap: &[usize],
        Ai: &[usize],
        Ax: &[f64],
        b: &mut [f64],
        n: usize,
    ) -> Result<(), LinearSolveError>;

    /// Drops any cached symbolic analysis. Called whenever the sparsity
    /// pattern may have changed.
    fn reset(&mut self);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 3x3 system
    /// | 4 1 0 |       | 1 |
    /// | 1 3 1 | x  =  | 2 |
    /// | 0 1 2 |       | 3 |
    pub(crate) fn small_system() -> (Vec<usize>, Vec<usize>, Vec<f64>, Vec<f64>) {
        let ap = vec![0, 2, 5, 7];
        let ai = vec![0, 1, 0, 1, 2, 1, 2];
        let ax = vec![4.0, 1.0, 1.0, 3.0, 1.0, 1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        (ap, ai, ax, b)
    }

    pub(crate) fn check_solution(x: &[f64]) {
        // residual against the dense form
        let a = [[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let b = [1.0, 2.0, 3.0];
        for r in 0..3 {
            let lhs: f64 = (0..3).map(|c| a[r][c] * x[c]).sum();
            assert!((lhs - b[r]).abs() < 1e-10, "row {r}: {lhs} != {}", b[r]);
        }
    }

    #[test]
    fn default_solver_solves_small_system() {
        let (ap, ai, ax, mut b) = small_system();
        let mut solver = DefaultSolver::default();
        solver.solve(&ap, &ai, &ax, &mut b, 3).unwrap();
        check_solution(&b);
    }
}
