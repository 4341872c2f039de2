use linfa::Float;
use ndarray::Array2;

/// A design able to draw `ns` points in a box `[lower_i, upper_i]^nx`.
///
/// Implementors only generate points in the unit hypercube, scaling to the
/// actual bounds is shared by [SamplingMethod::sample].
pub trait SamplingMethod<F: Float> {
    /// Box of the design as a (nx, 2) matrix, row i being `[lower_i, upper_i]`
    fn sampling_space(&self) -> &Array2<F>;

    /// Draws a (ns, nx) matrix of points in `[0., 1.]^nx`
    fn normalized_sample(&self, ns: usize) -> Array2<F>;

    /// Draws a (ns, nx) matrix of points within the bounds of [SamplingMethod::sampling_space]
    fn sample(&self, ns: usize) -> Array2<F> {
        let xlimits = self.sampling_space();
        let lower = xlimits.column(0);
        let width = &xlimits.column(1) - &lower;
        self.normalized_sample(ns) * width + lower
    }
}
