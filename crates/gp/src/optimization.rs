use gpsur_doe::{Lhs, LhsKind, SamplingMethod};
use ndarray::{Array1, Array2, arr1, s};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use linfa::Float;

pub(crate) struct CobylaParams {
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub maxeval: usize,
}

impl Default for CobylaParams {
    fn default() -> Self {
        CobylaParams {
            rhobeg: 0.5,
            ftol_rel: 1e-4,
            maxeval: 200,
        }
    }
}

/// Starting points in log10 space: the given initial guess first,
/// then `n_start` points spread over the log10 bounds by a maximin LHS.
pub(crate) fn prepare_multistart<F: Float>(
    n_start: usize,
    param0: &Array1<F>,
    bounds: &[(F, F)],
    seed: u64,
) -> (Array2<f64>, Vec<(f64, f64)>) {
    let bounds: Vec<(f64, f64)> = bounds
        .iter()
        .map(|(lo, up)| (into_f64(lo.log10()), into_f64(up.log10())))
        .collect();

    let mut starts = Array2::zeros((n_start + 1, param0.len()));
    starts
        .row_mut(0)
        .assign(&param0.mapv(|v| into_f64(v.log10())));

    if n_start > 0 {
        let xlimits = Array2::from_shape_fn((bounds.len(), 2), |(i, j)| {
            if j == 0 { bounds[i].0 } else { bounds[i].1 }
        });
        let seeds = Lhs::new(&xlimits)
            .kind(LhsKind::Maximin)
            .with_rng(Xoshiro256Plus::seed_from_u64(seed))
            .sample(n_start);
        starts.slice_mut(s![1.., ..]).assign(&seeds);
    }
    (starts, bounds)
}

/// Minimize `objfn` with COBYLA from `param0` within `bounds`.
/// Returns the best objective value (infinity when it is not a number) and its location.
pub(crate) fn optimize_params<ObjF>(
    objfn: ObjF,
    param0: &Array1<f64>,
    bounds: &[(f64, f64)],
    cobyla: CobylaParams,
) -> (f64, Array1<f64>)
where
    ObjF: Fn(&[f64]) -> f64,
{
    use cobyla::{Func, StopTols, minimize};

    let cons: Vec<&dyn Func<()>> = vec![];
    let param0 = param0.to_vec();

    match minimize(
        |x: &[f64], _u: &mut ()| objfn(x),
        &param0,
        bounds,
        &cons,
        (),
        cobyla.maxeval,
        cobyla::RhoBeg::All(cobyla.rhobeg),
        Some(StopTols {
            ftol_rel: cobyla.ftol_rel,
            ..StopTols::default()
        }),
    ) {
        Ok((_, x_opt, fval)) => {
            let fval = if f64::is_nan(fval) {
                f64::INFINITY
            } else {
                fval
            };
            (fval, arr1(&x_opt))
        }
        Err((status, x_opt, _)) => {
            log::warn!("Cobyla optimizer failure in GP likelihood optimization status={status:?}");
            (f64::INFINITY, arr1(&x_opt))
        }
    }
}

#[inline(always)]
pub(crate) fn into_f64<F: Float>(v: F) -> f64 {
    num_traits::ToPrimitive::to_f64(&v).unwrap_or(f64::NAN)
}
