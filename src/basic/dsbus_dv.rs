use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;
use num_complex::Complex64;

/// Partial derivatives of the complex bus power injections with respect to
/// voltage angle and magnitude.
///
/// Both value arrays share the sparsity pattern (and storage order) of the
/// `Ybus` they were computed from, which must store every diagonal entry.
pub struct PowerDerivatives {
    pub d_va: Vec<Complex64>,
    pub d_vm: Vec<Complex64>,
}

/// `Ybus * v` for a compressed sparse column matrix.
pub(crate) fn current_injection(
    y_bus: &CscMatrix<Complex64>,
    v: &DVector<Complex64>,
) -> DVector<Complex64> {
    let mut ibus = DVector::zeros(y_bus.nrows());
    for (row, col, y) in y_bus.triplet_iter() {
        ibus[row] += *y * v[col];
    }
    ibus
}

/// Computes `dS/dVa` and `dS/dVm` entry by entry.
///
/// Uses the complex matrix formulation from MatPower:
///  R. D. Zimmerman, "AC Power Flows, Generalized OPF Costs and
///  their Derivatives using Complex Matrix Notation", MATPOWER
///  Technical Note 2, February 2010.
///
/// ```text
/// dS/dVa = j diag(V) conj(diag(Ibus) - Ybus diag(V))
/// dS/dVm = diag(V) conj(Ybus diag(V/|V|)) + conj(diag(Ibus)) diag(V/|V|)
/// ```
pub fn d_sbus_d_v(y_bus: &CscMatrix<Complex64>, v: &DVector<Complex64>) -> PowerDerivatives {
    let ibus = current_injection(y_bus, v);
    let v_norm = v.map(|e| if e.norm() > 0.0 { e / e.norm() } else { Complex64::new(1.0, 0.0) });

    let nnz = y_bus.nnz();
    let mut d_va = Vec::with_capacity(nnz);
    let mut d_vm = Vec::with_capacity(nnz);
    for (row, col, y) in y_bus.triplet_iter() {
        let mut dm = v[row] * (*y * v_norm[col]).conj();
        let mut da = -v[row] * (*y * v[col]).conj();
        if row == col {
            dm += ibus[row].conj() * v_norm[row];
            da += v[row] * ibus[row].conj();
        }
        d_va.push(da * Complex64::i());
        d_vm.push(dm);
    }
    PowerDerivatives { d_va, d_vm }
}
