use criterion::{Criterion, criterion_group, criterion_main};
use gpsur_doe::{Lhs, SamplingMethod};
use gpsur_gp::{HyperTuning, Hyperparameters, SqExpSurrogate, gp_nll};
use linfa::prelude::{Dataset, Fit};
use ndarray::{Array1, Zip, array};
use ndarray_npy::{read_npy, write_npy};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn criterion_gp(c: &mut Criterion) {
    let dims = [2, 5];
    let nts = [16, 50];

    let mut group = c.benchmark_group("gp");
    group.sample_size(20);
    for i in 0..dims.len() {
        let dim = dims[i];
        let nt = nts[i];
        let rosenbrock = |x: &Array1<f64>| -> f64 { argmin_testfunctions::rosenbrock(&x.to_vec()) };
        let prefix = "gpsur";
        let xfilename = format!("{prefix}_xt_{nt}x{dim}.npy");
        let yfilename = format!("{}_yt_{}x{}.npy", prefix, nt, 1);
        let xt = match read_npy(&xfilename) {
            Ok(xt) => xt,
            Err(_) => {
                let lim = array![[-2., 2.]];
                let xlimits = lim.broadcast((dim, 2)).unwrap();
                let rng = Xoshiro256Plus::seed_from_u64(42);
                let xt = Lhs::new(&xlimits).with_rng(rng).sample(nt);
                write_npy(&xfilename, &xt).expect("cannot save xt");
                xt
            }
        };
        let yt = match read_npy(&yfilename) {
            Ok(yt) => yt,
            Err(_) => {
                let mut yt: Array1<f64> = Array1::zeros(xt.nrows());
                Zip::from(&mut yt).and(xt.rows()).par_for_each(|y, x| {
                    *y = rosenbrock(&x.to_owned());
                });
                write_npy(&yfilename, &yt).expect("cannot save yt");
                yt
            }
        };

        group.bench_function(format!("nll {dim}"), |b| {
            b.iter(|| std::hint::black_box(gp_nll(&[1.0f64, 1.0], &xt, &yt, 1e-2).expect("NLL")))
        });

        group.bench_function(format!("fit fixed hyperparameters {dim}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    SqExpSurrogate::params()
                        .hyperparameters(&Hyperparameters::isotropic(1.0, 1.0))
                        .sigma(1e-2)
                        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                        .expect("GP fit error"),
                )
            });
        });

        group.bench_function(format!("fit {dim}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    SqExpSurrogate::params()
                        .signal_variance(HyperTuning::Auto)
                        .n_start(3)
                        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                        .expect("GP fit error"),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_gp);
criterion_main!(benches);
