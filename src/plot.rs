//! SVG figures of the study drawn with plotters.

use crate::config::StudyConfig;
use crate::errors::{MockupError, Result};
use crate::study::{GroundTruth, NllProfile, StudyReport, TestSlice, TrainingSet};

use log::{info, warn};
use ndarray::Array1;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Number of color levels of the response surface
const ISO_LEVELS: usize = 10;

fn plot_err<E: std::fmt::Display>(err: E) -> MockupError {
    MockupError::PlotError(err.to_string())
}

/// Range of finite values padded by 5% on both sides, `None` when no value is finite
fn padded_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, up) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), v| (lo.min(v), up.max(v)));
    if lo > up {
        return None;
    }
    let pad = if up > lo { 0.05 * (up - lo) } else { 0.5 * lo.abs().max(1e-12) };
    Some((lo - pad, up + pad))
}

/// Cell edges around each level, cells meet halfway between levels
fn cell_edges(levels: &Array1<f64>) -> Vec<(f64, f64)> {
    let n = levels.len();
    (0..n)
        .map(|k| {
            let lo = if k == 0 { levels[0] } else { 0.5 * (levels[k - 1] + levels[k]) };
            let up = if k + 1 == n { levels[n - 1] } else { 0.5 * (levels[k] + levels[k + 1]) };
            (lo, up)
        })
        .collect()
}

/// Heat map of the ground truth with values binned into iso levels, and training points
pub fn draw_response_surface(
    truth: &GroundTruth,
    train: &TrainingSet,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let (ymin, ymax) = truth
        .y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), &v| (lo.min(v), up.max(v)));
    let (ucells, vcells) = (cell_edges(&truth.u), cell_edges(&truth.v));
    let umin = ucells[0].0;
    let umax = ucells[ucells.len() - 1].1;
    let vmin = vcells[0].0;
    let vmax = vcells[vcells.len() - 1].1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Mockup response f(u, v)", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(umin..umax, vmin..vmax)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("u")
        .y_desc("v")
        .draw()
        .map_err(plot_err)?;

    let step = (ymax - ymin) / ISO_LEVELS as f64;
    let color = |y: f64| {
        // color of the iso level band containing y
        let band = if step > 0. {
            ((y - ymin) / step).floor().min((ISO_LEVELS - 1) as f64)
        } else {
            0.
        };
        ViridisRGB::get_color_normalized(band, 0., (ISO_LEVELS - 1) as f64)
    };
    chart
        .draw_series(truth.y.indexed_iter().map(|((i, j), &y)| {
            let (u0, u1) = ucells[j];
            let (v0, v1) = vcells[i];
            Rectangle::new([(u0, v0), (u1, v1)], color(y).filled())
        }))
        .map_err(plot_err)?;

    chart
        .draw_series(
            train
                .x
                .rows()
                .into_iter()
                .map(|row| Circle::new((row[0], row[1]), 4, RED.filled())),
        )
        .map_err(plot_err)?
        .label("training points")
        .legend(|(x, y)| Circle::new((x, y), 4, RED.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Reference and surrogate along the test slice with 95% band and training error bars
pub fn draw_prediction(slice: &TestSlice, path: &Path, size: (u32, u32)) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let u = slice.x.column(0);
    let upper = &slice.mean + &(&slice.std * crate::study::Z95);
    let lower = &slice.mean - &(&slice.std * crate::study::Z95);
    let (umin, umax) = padded_range(u.iter().copied()).unwrap_or((0., 1.));
    let (ymin, ymax) = padded_range(
        slice
            .reference
            .iter()
            .chain(upper.iter())
            .chain(lower.iter())
            .copied()
            .chain(slice.train_y.iter().map(|y| y + slice.error_bar))
            .chain(slice.train_y.iter().map(|y| y - slice.error_bar)),
    )
    .unwrap_or((0., 1.));

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Surrogate prediction at v0 = {:.4}", slice.v0), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(umin..umax, ymin..ymax)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("u")
        .y_desc("f(u, v0)")
        .draw()
        .map_err(plot_err)?;

    let band: Vec<(f64, f64)> = u
        .iter()
        .zip(upper.iter())
        .map(|(&x, &y)| (x, y))
        .chain(u.iter().zip(lower.iter()).rev().map(|(&x, &y)| (x, y)))
        .collect();
    chart
        .draw_series(std::iter::once(Polygon::new(band, BLUE.mix(0.2).filled())))
        .map_err(plot_err)?
        .label("95% interval")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.2).filled()));

    chart
        .draw_series(LineSeries::new(
            u.iter().zip(slice.reference.iter()).map(|(&x, &y)| (x, y)),
            &BLACK,
        ))
        .map_err(plot_err)?
        .label("reference")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));

    chart
        .draw_series(LineSeries::new(
            u.iter().zip(slice.mean.iter()).map(|(&x, &y)| (x, y)),
            &BLUE,
        ))
        .map_err(plot_err)?
        .label("surrogate mean")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .draw_series(
            slice
                .train_x
                .column(0)
                .iter()
                .zip(slice.train_y.iter())
                .map(|(&x, &y)| {
                    ErrorBar::new_vertical(
                        x,
                        y - slice.error_bar,
                        y,
                        y + slice.error_bar,
                        RED.filled(),
                        6,
                    )
                }),
        )
        .map_err(plot_err)?
        .label("training data +/- 1.96 sigma")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, RED.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Negative log likelihood curve over one hyperparameter, NaN values are skipped
pub fn draw_nll_profile(
    profile: &NllProfile,
    xlabel: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let points: Vec<(f64, f64)> = profile
        .values
        .iter()
        .zip(profile.nll.iter())
        .filter(|(_, nll)| nll.is_finite())
        .map(|(&x, &nll)| (x, nll))
        .collect();
    if points.len() < profile.values.len() {
        warn!(
            "{} of {} likelihood values are undefined in {xlabel} profile",
            profile.values.len() - points.len(),
            profile.values.len()
        );
    }
    let (xmin, xmax) = padded_range(profile.values.iter().copied()).unwrap_or((0., 1.));
    let (ymin, ymax) = padded_range(points.iter().map(|p| p.1)).unwrap_or((0., 1.));

    let mut chart = ChartBuilder::on(&root)
        .caption("Negative log likelihood in kernel hyperparameters", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(xmin..xmax, ymin..ymax)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(xlabel)
        .y_desc("-log p(y|u,v0) + C")
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(points, &BLUE))
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Draws the four study figures in the configured output directory,
/// returns the written file paths.
pub fn draw_figures(report: &StudyReport, cfg: &StudyConfig) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&cfg.out_dir)?;
    let path = |name: &str| cfg.out_dir.join(name);

    let surface = path("response_surface.svg");
    draw_response_surface(&report.truth, &report.train, &surface, cfg.plot_size)?;
    let prediction = path("prediction.svg");
    draw_prediction(&report.slice, &prediction, cfg.plot_size)?;
    let nll_l = path("nll_length_scale.svg");
    draw_nll_profile(&report.length_scale_profile, "l", &nll_l, cfg.plot_size)?;
    let nll_sigma = path("nll_sigma.svg");
    draw_nll_profile(&report.noise_profile, "sigma", &nll_sigma, cfg.plot_size)?;

    let figures = vec![surface, prediction, nll_l, nll_sigma];
    for figure in figures.iter() {
        info!("Figure saved to {}", figure.display());
    }
    Ok(figures)
}
