use crate::SamplingMethod;
use crate::utils::pdist;
use linfa::Float;
use ndarray::{Array, Array2, ArrayBase, Data, Ix2, ShapeBuilder, s};
use ndarray_rand::{
    RandomExt, rand::Rng, rand::SeedableRng, rand::seq::SliceRandom, rand_distr::Uniform,
};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;
use std::sync::{Arc, RwLock};

/// Number of candidate designs drawn by the maximin kinds
const MAXIMIN_CANDIDATES: usize = 5;

/// Kinds of Latin Hypercube Design
#[derive(Clone, Debug, Default, Copy, PartialEq, Eq)]
pub enum LhsKind {
    /// point drawn uniformly within its stratum
    Classic,
    /// point at the middle of its stratum
    Centered,
    /// best classic design regarding the minimum pairwise distance
    #[default]
    Maximin,
    /// best centered design regarding the minimum pairwise distance
    CenteredMaximin,
}

type RngRef<R> = Arc<RwLock<R>>;

/// Latin hypercube design: each axis is cut into `ns` strata of equal width and
/// every stratum of every axis holds exactly one of the `ns` points.
#[derive(Clone, Debug)]
pub struct Lhs<F: Float, R: Rng> {
    /// Box of the design as a (nx, 2) matrix
    xlimits: Array2<F>,
    /// Requested kind of design
    kind: LhsKind,
    /// Random generator shared by clones
    rng: RngRef<R>,
}

impl<F: Float> Lhs<F, Xoshiro256Plus> {
    /// Constructor given a (nx, 2) box \[\[lower bound, upper bound\], ...\],
    /// the generator is seeded from entropy.
    ///
    /// ```
    /// use gpsur_doe::Lhs;
    /// use ndarray::arr2;
    ///
    /// let doe = Lhs::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for Lhs<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        match self.kind {
            LhsKind::Classic => self.classic(ns),
            LhsKind::Centered => self.centered(ns),
            LhsKind::Maximin => self.maximin(ns, false),
            LhsKind::CenteredMaximin => self.maximin(ns, true),
        }
    }
}

impl<F: Float, R: Rng> Lhs<F, R> {
    /// Constructor with given box and random generator.
    ///
    /// **Panics** if xlimits has not 2 columns.
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: R) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Lhs {
            xlimits: xlimits.to_owned(),
            kind: LhsKind::default(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sets the kind of LHS
    pub fn kind(mut self, kind: LhsKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Lhs<F, R2> {
        Lhs {
            xlimits: self.xlimits,
            kind: self.kind,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    fn classic(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let cut = Array::linspace(0., 1., ns + 1);
        let lower = cut.slice(s![..ns]).to_owned();
        let width = &cut.slice(s![1..]) - &lower;

        let mut rng = self.rng.write().unwrap();
        let rnd = Array::random_using((ns, nx).f(), Uniform::new(0., 1.), &mut *rng);
        let mut lhs = Array2::<f64>::zeros((ns, nx).f());
        for j in 0..nx {
            let mut col = (&rnd.column(j) * &width + &lower).to_vec();
            col.shuffle(&mut *rng);
            lhs.column_mut(j).assign(&Array::from_vec(col));
        }
        lhs.mapv(F::cast)
    }

    fn centered(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let cut = Array::linspace(0., 1., ns + 1);
        let mut centers = ((&cut.slice(s![..ns]) + &cut.slice(s![1..])) / 2.).to_vec();

        let mut rng = self.rng.write().unwrap();
        let mut lhs = Array2::<f64>::zeros((ns, nx).f());
        for j in 0..nx {
            centers.shuffle(&mut *rng);
            lhs.column_mut(j).assign(&Array::from_vec(centers.clone()));
        }
        lhs.mapv(F::cast)
    }

    fn maximin(&self, ns: usize, centered: bool) -> Array2<F> {
        let draw = || {
            if centered {
                self.centered(ns)
            } else {
                self.classic(ns)
            }
        };
        let mut best = draw();
        if ns < 2 {
            return best;
        }
        let mut best_dist = *pdist(&best).min().unwrap();
        for _ in 1..MAXIMIN_CANDIDATES {
            let candidate = draw();
            let d_min = *pdist(&candidate).min().unwrap();
            if d_min > best_dist {
                best_dist = d_min;
                best = candidate;
            }
        }
        best
    }
}
