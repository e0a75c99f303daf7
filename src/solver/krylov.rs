//! Krylov-class algorithms: preconditioned CG and restarted GMRES
//! (Saad §6.4, §9.2).
//!
//! Both methods are left-preconditioned and share a [`KrylovWorkspace`]
//! payload: the scratch vectors are allocated once at cache construction
//! and reused across every subsequent solve, which is the whole point of
//! keeping a cache around an iterative method. Neither method needs an
//! upfront factorization, so caches built for them start out fresh; an
//! operator swap re-runs the preconditioner's setup on the next solve.

use log::trace;
use num_traits::Float;

use crate::core::traits::Scalar;
use crate::error::Error;
use crate::solver::{CacheVal, InitArgs, LinearAlgorithm, SolveArgs};
use crate::utils::convergence::SolveStats;

/// Reusable scratch vectors for Krylov iterations.
pub struct KrylovWorkspace<T> {
    pub r: Vec<T>,
    pub z: Vec<T>,
    pub p: Vec<T>,
    pub ap: Vec<T>,
    /// Whether the preconditioner has been set up against the current
    /// operator.
    pub ready: bool,
}

impl<T: Scalar> KrylovWorkspace<T> {
    pub fn sized(n: usize) -> Self {
        Self {
            r: vec![T::zero(); n],
            z: vec![T::zero(); n],
            p: vec![T::zero(); n],
            ap: vec![T::zero(); n],
            ready: false,
        }
    }
}

fn dot<T: Scalar>(x: &[T], y: &[T]) -> T {
    x.iter().zip(y).map(|(&xi, &yi)| xi * yi).fold(T::zero(), |acc, v| acc + v)
}

fn norm<T: Scalar>(x: &[T]) -> T {
    Float::sqrt(dot(x, x))
}

/// Preconditioned conjugate gradients, for symmetric positive definite
/// operators.
pub struct CgSolver;

impl<T: Scalar> LinearAlgorithm<T> for CgSolver {
    fn name(&self) -> &'static str {
        "cg"
    }

    fn is_iterative(&self) -> bool {
        true
    }

    fn init_cacheval(&self, args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Krylov(KrylovWorkspace::sized(args.b.len())))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, pl, conv, verbose, .. } = args;
        let CacheVal::Krylov(ws) = cacheval else {
            return Err(Error::Solve("cg: cache payload missing".into()));
        };
        if *isfresh || !ws.ready {
            pl.setup(a)?;
            ws.ready = true;
            *isfresh = false;
        }
        let n = b.len();
        let bvec = b.to_dense_vec();
        // r = b - A u, z = Pl⁻¹ r
        a.matvec(u, &mut ws.ap);
        for i in 0..n {
            ws.r[i] = bvec[i] - ws.ap[i];
        }
        pl.apply(&ws.r, &mut ws.z)?;
        ws.p.copy_from_slice(&ws.z);
        let mut rz = dot(&ws.r, &ws.z);
        let res0 = norm(&ws.r);
        let mut stats =
            SolveStats { iterations: 0, final_residual: res0, converged: res0 <= conv.target(res0) };
        if stats.converged {
            return Ok(stats);
        }
        for i in 1..=conv.maxiters {
            a.matvec(&ws.p, &mut ws.ap);
            let p_ap = dot(&ws.p, &ws.ap);
            if p_ap <= T::zero() {
                return Err(Error::IndefiniteOperator);
            }
            let alpha = rz / p_ap;
            for (uj, pj) in u.iter_mut().zip(&ws.p) {
                *uj = *uj + alpha * *pj;
            }
            for (rj, apj) in ws.r.iter_mut().zip(&ws.ap) {
                *rj = *rj - alpha * *apj;
            }
            pl.apply(&ws.r, &mut ws.z)?;
            let rz_new = dot(&ws.r, &ws.z);
            let res_norm = norm(&ws.r);
            if verbose {
                trace!("cg: iter {i} residual {res_norm:?}");
            }
            let (stop, s) = conv.check(res_norm, res0, i);
            stats = s;
            if stop {
                break;
            }
            let beta = rz_new / rz;
            if beta < T::zero() {
                return Err(Error::IndefinitePreconditioner);
            }
            for (pj, zj) in ws.p.iter_mut().zip(&ws.z) {
                *pj = *zj + beta * *pj;
            }
            rz = rz_new;
        }
        Ok(stats)
    }
}

/// Restarted GMRES with double Gram-Schmidt orthogonalization and Givens
/// rotations for the least-squares update.
pub struct GmresSolver {
    /// Number of Arnoldi vectors before restart.
    pub restart: usize,
}

impl Default for GmresSolver {
    fn default() -> Self {
        Self { restart: 30 }
    }
}

impl GmresSolver {
    pub fn new(restart: usize) -> Self {
        Self { restart }
    }
}

// Apply previous Givens rotations to column j, compute the new rotation,
// and update the residual vector g.
fn apply_givens<T: Scalar>(h: &mut [Vec<T>], g: &mut [T], cs: &mut [T], sn: &mut [T], j: usize, eps: T) {
    for i in 0..j {
        let temp = cs[i] * h[i][j] + sn[i] * h[i + 1][j];
        h[i + 1][j] = -sn[i] * h[i][j] + cs[i] * h[i + 1][j];
        h[i][j] = temp;
    }
    let h_kk = h[j][j];
    let h_k1k = h[j + 1][j];
    let r = Float::sqrt(h_kk * h_kk + h_k1k * h_k1k);
    if Float::abs(r) < eps {
        cs[j] = T::one();
        sn[j] = T::zero();
    } else {
        cs[j] = h_kk / r;
        sn[j] = h_k1k / r;
    }
    h[j][j] = cs[j] * h_kk + sn[j] * h_k1k;
    h[j + 1][j] = T::zero();
    let temp = cs[j] * g[j] + sn[j] * g[j + 1];
    g[j + 1] = -sn[j] * g[j] + cs[j] * g[j + 1];
    g[j] = temp;
}

// Solve the upper-triangular system Hy = g, with zero-pivot protection.
fn back_substitution<T: Scalar>(h: &[Vec<T>], g: &[T], y: &mut [T], m: usize, eps: T) {
    for i in (0..m).rev() {
        y[i] = g[i];
        for j in (i + 1)..m {
            y[i] = y[i] - h[i][j] * y[j];
        }
        if Float::abs(h[i][i]) > eps {
            y[i] = y[i] / h[i][i];
        } else {
            y[i] = T::zero();
        }
    }
}

impl<T: Scalar> LinearAlgorithm<T> for GmresSolver {
    fn name(&self) -> &'static str {
        "gmres"
    }

    fn is_iterative(&self) -> bool {
        true
    }

    fn init_cacheval(&self, args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Krylov(KrylovWorkspace::sized(args.b.len())))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, pl, conv, verbose, .. } = args;
        let CacheVal::Krylov(ws) = cacheval else {
            return Err(Error::Solve("gmres: cache payload missing".into()));
        };
        if *isfresh || !ws.ready {
            pl.setup(a)?;
            ws.ready = true;
            *isfresh = false;
        }
        let n = b.len();
        let bvec = b.to_dense_vec();
        let m = self.restart.clamp(1, n.max(1));
        let eps = num_traits::cast::<f64, T>(1e-14).unwrap_or_else(T::epsilon);
        let mut res0 = None;
        let mut iteration = 0usize;
        let mut stats = SolveStats { iterations: 0, final_residual: T::zero(), converged: false };
        loop {
            // True preconditioned residual z = Pl⁻¹ (b - A u); restart from it.
            a.matvec(u, &mut ws.ap);
            for i in 0..n {
                ws.r[i] = bvec[i] - ws.ap[i];
            }
            pl.apply(&ws.r, &mut ws.z)?;
            let beta = norm(&ws.z);
            let r0 = *res0.get_or_insert(beta);
            stats.iterations = iteration;
            stats.final_residual = beta;
            if beta <= conv.target(r0) {
                stats.converged = true;
                break;
            }
            if iteration >= conv.maxiters {
                break;
            }
            let mut v: Vec<Vec<T>> = Vec::with_capacity(m + 1);
            v.push(ws.z.iter().map(|&zi| zi / beta).collect());
            let mut h = vec![vec![T::zero(); m]; m + 1];
            let mut g = vec![T::zero(); m + 1];
            g[0] = beta;
            let mut cs = vec![T::zero(); m];
            let mut sn = vec![T::zero(); m];
            let mut cols = 0;
            for j in 0..m {
                iteration += 1;
                a.matvec(&v[j], &mut ws.ap);
                pl.apply(&ws.ap, &mut ws.z)?;
                let mut w = ws.z.clone();
                // Modified Gram-Schmidt with one refinement pass
                for i in 0..=j {
                    h[i][j] = dot(&w, &v[i]);
                    for (wk, vik) in w.iter_mut().zip(&v[i]) {
                        *wk = *wk - h[i][j] * *vik;
                    }
                }
                for i in 0..=j {
                    let t = dot(&w, &v[i]);
                    h[i][j] = h[i][j] + t;
                    for (wk, vik) in w.iter_mut().zip(&v[i]) {
                        *wk = *wk - t * *vik;
                    }
                }
                h[j + 1][j] = norm(&w);
                // Happy breakdown: the subspace already contains the solution.
                let breakdown = Float::abs(h[j + 1][j]) < eps;
                if !breakdown {
                    v.push(w.iter().map(|&wi| wi / h[j + 1][j]).collect());
                }
                apply_givens(&mut h, &mut g, &mut cs, &mut sn, j, eps);
                cols = j + 1;
                let res = Float::abs(g[j + 1]);
                if verbose {
                    trace!("gmres: iter {iteration} residual {res:?}");
                }
                let (stop, s) = conv.check(res, r0, iteration);
                stats = s;
                if stop || breakdown {
                    break;
                }
            }
            // Least-squares update: solve Hy = g, then u += V y.
            let mut y = vec![T::zero(); cols];
            back_substitution(&h, &g, &mut y, cols, eps);
            for j in 0..cols {
                for (ui, vji) in u.iter_mut().zip(&v[j]) {
                    *ui = *ui + y[j] * *vji;
                }
            }
            if iteration >= conv.maxiters && !stats.converged {
                a.matvec(u, &mut ws.ap);
                for i in 0..n {
                    ws.r[i] = bvec[i] - ws.ap[i];
                }
                pl.apply(&ws.r, &mut ws.z)?;
                stats.final_residual = norm(&ws.z);
                stats.converged = stats.final_residual <= conv.target(r0);
                break;
            }
        }
        Ok(stats)
    }
}
