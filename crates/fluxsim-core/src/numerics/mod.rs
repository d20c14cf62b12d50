pub mod healpix;

pub use healpix::{RingGeometry, npix_for_nside};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

/// Trapezoidal integral of `y` over the (ascending) abscissae `x`.
pub fn trapezoid_integrate(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }

    if !x.windows(2).all(|window| window[0] < window[1]) {
        return None;
    }

    let mut sum = 0.0;
    let mut correction = 0.0;
    for index in 1..x.len() {
        let width = x[index] - x[index - 1];
        kahan_add(&mut sum, &mut correction, 0.5 * width * (y[index] + y[index - 1]));
    }

    Some(sum)
}

/// Checks that `values` are uniformly spaced with the given step. Returns the
/// index of the first offending interval (its upper sample) otherwise.
pub fn first_nonuniform_step(values: &[f64], step: f64, tolerance: f64) -> Option<usize> {
    values
        .windows(2)
        .position(|window| ((window[1] - window[0]) - step).abs() > tolerance)
        .map(|index| index + 1)
}

#[cfg(test)]
mod tests {
    use super::{first_nonuniform_step, stable_sum, trapezoid_integrate};

    #[test]
    fn stable_sum_reduces_order_loss_for_large_and_small_values() {
        let input = [1.0e16, 1.0, -1.0e16];
        assert_eq!(stable_sum(&input), 0.0);
    }

    #[test]
    fn trapezoid_integrates_linear_functions_exactly() {
        let x = [1.0, 2.0, 4.0];
        let y = [1.0, 2.0, 4.0];
        let integral = trapezoid_integrate(&x, &y).expect("integral");
        assert!((integral - 7.5).abs() < 1.0e-12);
    }

    #[test]
    fn trapezoid_rejects_invalid_grids() {
        assert_eq!(trapezoid_integrate(&[0.0], &[1.0]), None);
        assert_eq!(trapezoid_integrate(&[0.0, 1.0], &[1.0]), None);
        assert_eq!(trapezoid_integrate(&[0.0, 0.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn nonuniform_step_reports_first_bad_interval() {
        assert_eq!(first_nonuniform_step(&[-1.0, 0.0, 1.0], 1.0, 1.0e-6), None);
        assert_eq!(
            first_nonuniform_step(&[-1.0, -0.5, 0.2, 1.0], 2.0 / 3.0, 1.0e-6),
            Some(1)
        );
        assert_eq!(
            first_nonuniform_step(&[-1.0, -0.5, 0.0, 0.4, 1.0], 0.5, 1.0e-6),
            Some(3)
        );
    }
}
