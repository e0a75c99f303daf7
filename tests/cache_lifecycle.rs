//! Tests for the cache lifecycle: aliasing, invalidation-on-assign,
//! tolerance and preconditioner defaults, reinitialization, and payload
//! reuse across repeated solves.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axb::{
    init, AlgKind, CacheVal, Error, Identity, InitArgs, LinearAlgorithm, LinearProblem, Operator,
    Params, Preconditioner, Reinit, Rhs, SolveArgs, SolveOptions, SolveStats,
};
use faer::linalg::solvers::{FullPivLu, SolveCore};
use faer::Mat;

fn spd_problem() -> LinearProblem<f64> {
    // [[4,1],[1,3]] x = [1,2]
    let a = Mat::from_fn(2, 2, |i, j| [[4.0, 1.0], [1.0, 3.0]][i][j]);
    LinearProblem::new(Operator::dense(a), Rhs::dense(vec![1.0, 2.0]))
}

/// A full-pivot LU collaborator that counts factorizations and rhs-changed
/// hook invocations, carrying its factor in the opaque payload case.
#[derive(Default)]
struct CountingLu {
    factors: AtomicUsize,
    rhs_hooks: AtomicUsize,
}

impl LinearAlgorithm<f64> for CountingLu {
    fn name(&self) -> &'static str {
        "counting-lu"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, f64>) -> Result<CacheVal<f64>, Error> {
        Ok(CacheVal::Opaque(Box::new(None::<FullPivLu<f64>>)))
    }

    fn rhs_changed(&self, _cacheval: &mut CacheVal<f64>, _b: &Rhs<f64>) {
        self.rhs_hooks.fetch_add(1, Ordering::SeqCst);
    }

    fn solve(&self, args: SolveArgs<'_, f64>) -> Result<SolveStats<f64>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, .. } = args;
        let CacheVal::Opaque(payload) = cacheval else {
            return Err(Error::Solve("counting-lu: cache payload missing".into()));
        };
        let slot = payload
            .downcast_mut::<Option<FullPivLu<f64>>>()
            .ok_or_else(|| Error::Solve("counting-lu: payload type mismatch".into()))?;
        if *isfresh || slot.is_none() {
            self.factors.fetch_add(1, Ordering::SeqCst);
            *slot = Some(FullPivLu::new(a.to_dense().as_ref()));
            *isfresh = false;
        }
        let factor = slot.as_ref().expect("factor just stored");
        let mut x = b.to_dense_vec();
        let n = x.len();
        factor.solve_in_place_with_conj(
            faer::Conj::No,
            faer::MatMut::from_column_major_slice_mut(&mut x, n, 1),
        );
        *u = x;
        Ok(SolveStats { iterations: 1, final_residual: 0.0, converged: true })
    }
}

/// A preconditioner whose only purpose is to be recognizable by dimension.
struct Marker {
    dim: usize,
}

impl Preconditioner<f64> for Marker {
    fn apply(&self, r: &[f64], z: &mut [f64]) -> Result<(), Error> {
        z.copy_from_slice(r);
        Ok(())
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// A collaborator that supplies its own preconditioner pair.
struct WithPrecs;

impl LinearAlgorithm<f64> for WithPrecs {
    fn name(&self) -> &'static str {
        "with-precs"
    }

    fn precs(
        &self,
        a: &Operator<f64>,
        _p: &Params,
    ) -> Option<(Box<dyn Preconditioner<f64>>, Box<dyn Preconditioner<f64>>)> {
        Some((
            Box::new(Marker { dim: a.nrows() + 100 }),
            Box::new(Marker { dim: a.ncols() + 200 }),
        ))
    }

    fn init_cacheval(&self, _args: InitArgs<'_, f64>) -> Result<CacheVal<f64>, Error> {
        Ok(CacheVal::Empty)
    }

    fn solve(&self, _args: SolveArgs<'_, f64>) -> Result<SolveStats<f64>, Error> {
        Err(Error::Unsupported("test algorithm has no solve"))
    }
}

#[test]
fn algorithm_precs_beat_identity_and_lose_to_explicit_options() {
    let problem = spd_problem();
    // No explicit option: the algorithm's builder wins over identity.
    let cache = init(&problem, Some(Arc::new(WithPrecs)), Default::default()).unwrap();
    assert_eq!(cache.pl().dim(), 102);
    assert_eq!(cache.pr().dim(), 202);

    // An explicit option beats the builder for the side it covers.
    let options = SolveOptions { pl: Some(Box::new(Identity::new(7))), ..Default::default() };
    let cache = init(&problem, Some(Arc::new(WithPrecs)), options).unwrap();
    assert_eq!(cache.pl().dim(), 7);
    assert_eq!(cache.pr().dim(), 202);
}

#[test]
fn alias_a_stores_the_callers_operator() {
    let problem = spd_problem();
    let options = SolveOptions { alias_a: Some(true), ..Default::default() };
    let cache = init(&problem, Some(AlgKind::Lu.instantiate()), options).unwrap();
    assert!(cache.operator().same_object(&problem.a));
}

#[test]
fn copy_a_stores_equal_but_distinct_operator() {
    let problem = spd_problem();
    let options = SolveOptions { alias_a: Some(false), ..Default::default() };
    let cache = init(&problem, Some(AlgKind::Lu.instantiate()), options).unwrap();
    assert!(!cache.operator().same_object(&problem.a));
    let orig = problem.a.to_dense();
    let copy = cache.operator().to_dense();
    for i in 0..2 {
        for j in 0..2 {
            assert_eq!(orig[(i, j)], copy[(i, j)]);
        }
    }
}

#[test]
fn direct_algorithms_copy_and_iterative_alias_by_default() {
    let problem = spd_problem();
    let direct = init(&problem, Some(AlgKind::Lu.instantiate()), Default::default()).unwrap();
    assert!(!direct.operator().same_object(&problem.a));
    let iterative = init(&problem, Some(AlgKind::Cg.instantiate()), Default::default()).unwrap();
    assert!(iterative.operator().same_object(&problem.a));
    assert!(iterative.rhs().same_object(&problem.b));
}

#[test]
fn operator_write_invalidates_payload() {
    let problem = spd_problem();
    let mut cache = init(&problem, Some(AlgKind::Lu.instantiate()), Default::default()).unwrap();
    cache.solve_mut().unwrap();
    assert!(!cache.is_fresh());
    cache.set_operator(Operator::dense(Mat::identity(2, 2)));
    assert!(cache.is_fresh());
}

#[test]
fn parameter_write_invalidates_payload() {
    let problem = spd_problem();
    let mut cache = init(&problem, Some(AlgKind::Lu.instantiate()), Default::default()).unwrap();
    cache.solve_mut().unwrap();
    assert!(!cache.is_fresh());
    cache.set_parameters(Some(Arc::new(42usize)));
    assert!(cache.is_fresh());
}

#[test]
fn rhs_write_runs_hook_and_preserves_freshness() {
    let problem = spd_problem();
    let alg = Arc::new(CountingLu::default());
    let mut cache =
        init(&problem, Some(alg.clone() as Arc<dyn LinearAlgorithm<f64>>), Default::default())
            .unwrap();
    let fresh_before = cache.is_fresh();
    cache.set_rhs(Rhs::dense(vec![3.0, 4.0]));
    assert_eq!(cache.is_fresh(), fresh_before);
    assert_eq!(alg.rhs_hooks.load(Ordering::SeqCst), 1);

    cache.solve_mut().unwrap();
    assert!(!cache.is_fresh());
    cache.set_rhs(Rhs::dense(vec![5.0, 6.0]));
    assert!(!cache.is_fresh());
    assert_eq!(alg.rhs_hooks.load(Ordering::SeqCst), 2);
}

#[test]
fn tolerances_default_to_sqrt_eps_for_f64() {
    let problem = spd_problem();
    let cache = init(&problem, Some(AlgKind::Lu.instantiate()), Default::default()).unwrap();
    assert_eq!(cache.abstol(), f64::EPSILON.sqrt());
    assert_eq!(cache.reltol(), f64::EPSILON.sqrt());
}

#[test]
fn explicit_tolerances_are_stored_coerced() {
    let problem = spd_problem();
    let options = SolveOptions { abstol: Some(1e-10), reltol: Some(1e-6), ..Default::default() };
    let cache = init(&problem, Some(AlgKind::Lu.instantiate()), options).unwrap();
    assert_eq!(cache.abstol(), 1e-10);
    assert_eq!(cache.reltol(), 1e-6);
}

#[test]
fn maxiters_defaults_to_rhs_length() {
    let problem = spd_problem();
    let cache = init(&problem, Some(AlgKind::Cg.instantiate()), Default::default()).unwrap();
    assert_eq!(cache.maxiters(), 2);
}

#[test]
fn default_preconditioners_are_identity_sized_to_the_operator() {
    // 3x2 least-squares system through QR.
    let a = Mat::from_fn(3, 2, |i, j| (i + 2 * j + 1) as f64);
    let problem = LinearProblem::new(Operator::dense(a), Rhs::dense(vec![1.0, 2.0, 3.0]));
    let cache = init(&problem, Some(AlgKind::Qr.instantiate()), Default::default()).unwrap();
    assert_eq!(cache.pl().dim(), 3);
    assert_eq!(cache.pr().dim(), 2);
}

#[test]
fn reinit_in_place_preserves_identity_and_invalidates() {
    let problem = spd_problem();
    let mut cache = init(&problem, Some(AlgKind::Lu.instantiate()), Default::default()).unwrap();
    cache.solve_mut().unwrap();
    assert!(!cache.is_fresh());
    cache.reinit(Reinit {
        a: Some(Operator::dense(Mat::identity(2, 2))),
        ..Default::default()
    });
    assert!(cache.is_fresh());
    // p was not supplied, so it reset to the null sentinel.
    assert!(cache.params().is_none());
}

#[test]
fn rebuild_returns_new_cache_with_same_algorithm_and_payload() {
    let problem = spd_problem();
    let mut cache = init(&problem, Some(AlgKind::Lu.instantiate()), Default::default()).unwrap();
    cache.solve_mut().unwrap();
    let alg_before = Arc::clone(cache.algorithm());
    let had_factor = matches!(cache.cacheval(), CacheVal::Lu(Some(_)));
    assert!(had_factor);
    let rebuilt = cache.rebuild(Reinit {
        a: Some(Operator::dense(Mat::identity(2, 2))),
        ..Default::default()
    });
    assert!(Arc::ptr_eq(&alg_before, rebuilt.algorithm()));
    // The opaque payload object was carried over, not rebuilt.
    assert!(matches!(rebuilt.cacheval(), CacheVal::Lu(Some(_))));
    assert!(rebuilt.is_fresh());
}

#[test]
fn repeated_solves_reuse_the_factorization() {
    let problem = spd_problem();
    let alg = Arc::new(CountingLu::default());
    let mut cache =
        init(&problem, Some(alg.clone() as Arc<dyn LinearAlgorithm<f64>>), Default::default())
            .unwrap();
    let first = cache.solve_mut().unwrap();
    let second = cache.solve_mut().unwrap();
    assert_eq!(alg.factors.load(Ordering::SeqCst), 1);
    assert_eq!(first.u, second.u);

    // A new operator invalidates; the next solve refactorizes exactly once.
    cache.set_operator(Operator::dense(Mat::identity(2, 2)));
    cache.solve_mut().unwrap();
    assert_eq!(alg.factors.load(Ordering::SeqCst), 2);
}

#[test]
fn rhs_update_does_not_refactorize() {
    let problem = spd_problem();
    let alg = Arc::new(CountingLu::default());
    let mut cache =
        init(&problem, Some(alg.clone() as Arc<dyn LinearAlgorithm<f64>>), Default::default())
            .unwrap();
    cache.solve_mut().unwrap();
    cache.set_rhs(Rhs::dense(vec![7.0, -1.0]));
    let sol = cache.solve_mut().unwrap();
    assert_eq!(alg.factors.load(Ordering::SeqCst), 1);
    // Solution tracks the new rhs through the cached factorization.
    let a = problem.a.to_dense();
    let r0 = 7.0 - (a[(0, 0)] * sol.u[0] + a[(0, 1)] * sol.u[1]);
    let r1 = -1.0 - (a[(1, 0)] * sol.u[0] + a[(1, 1)] * sol.u[1]);
    assert!(r0.abs() < 1e-12 && r1.abs() < 1e-12);
}

#[test]
fn auto_cache_records_the_selected_kind() {
    let problem = spd_problem();
    let cache = init(&problem, None, Default::default()).unwrap();
    let CacheVal::Deferred(payload) = cache.cacheval() else {
        panic!("auto cache should carry a deferred payload");
    };
    // Square dense + default conditioning assumption selects full-pivot LU.
    assert_eq!(payload.kind, AlgKind::Lu);
}
