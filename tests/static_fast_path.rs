//! Tests for the static fast path: equivalence with the general cache-based
//! path and fall-through for non-whitelisted algorithms.

use approx::assert_abs_diff_eq;
use axb::{solve, solve_static, AlgKind, LinearProblem, Operator, ReturnCode, Rhs, SolveOptions};
use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};

#[test]
fn static_default_matches_general_lu_path() {
    let a = Matrix2::new(4.0, 1.0, 1.0, 3.0);
    let b = Vector2::new(1.0, 2.0);
    let fast = solve_static(&a, &b, None).unwrap();

    let dense = faer::Mat::from_fn(2, 2, |i, j| a[(i, j)]);
    let problem = LinearProblem::new(Operator::dense(dense), Rhs::dense(vec![1.0, 2.0]));
    let general = solve(&problem, Some(AlgKind::Lu.instantiate()), SolveOptions::default()).unwrap();

    for i in 0..2 {
        assert_abs_diff_eq!(fast.u[i], general.u[i], epsilon = 1e-12);
    }
    assert_eq!(fast.retcode, ReturnCode::Success);
}

#[test]
fn explicit_whitelisted_methods_agree_with_each_other() {
    let a = Matrix3::new(5.0, 1.0, 0.0, 1.0, 4.0, 1.0, 0.0, 1.0, 3.0);
    let b = Vector3::new(1.0, -1.0, 2.0);
    let reference = solve_static(&a, &b, Some(AlgKind::Ldiv)).unwrap().u;
    for kind in [
        AlgKind::Lu,
        AlgKind::Qr,
        AlgKind::Cholesky,
        AlgKind::NormalCholesky,
        AlgKind::Svd,
    ] {
        let u = solve_static(&a, &b, Some(kind)).unwrap().u;
        assert!((u - reference).norm() < 1e-9, "{kind:?} disagrees with ldiv");
    }
}

#[test]
fn non_whitelisted_algorithm_falls_through_to_cache_path() {
    // SPD system, so an explicit CG request is legitimate; it must take the
    // general path and still produce the direct answer.
    let a = Matrix2::new(4.0, 1.0, 1.0, 3.0);
    let b = Vector2::new(1.0, 2.0);
    let direct = solve_static(&a, &b, None).unwrap().u;
    let via_cg = solve_static(&a, &b, Some(AlgKind::Cg)).unwrap().u;
    assert!((via_cg - direct).norm() < 1e-7);

    let via_gmres = solve_static(&a, &b, Some(AlgKind::Gmres)).unwrap().u;
    assert!((via_gmres - direct).norm() < 1e-7);
}
