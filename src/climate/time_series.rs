/*
MIT License
Copyright (c) 2021 Germán Molina
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use super::HOURS_PER_YEAR;
use crate::error::ClimateError;
use crate::linear_spline::LinearSpline;
use crate::{Float, SECONDS_PER_YEAR};

/// Checks whether a series with these time points (in seconds)
/// can be repeated every year. This requires at least two points, the last
/// one not beyond 365 days, and not having both 0 and 365 days (which
/// would be the same point).
pub fn check_for_valid_cyclic_data(time_points: &[Float]) -> Result<(), ClimateError> {
    if time_points.len() < 2 {
        return Err(ClimateError::AnnualCyclicConstraintViolation(
            "at least two time points are required".into(),
        ));
    }
    let first = time_points[0];
    let last = time_points[time_points.len() - 1];
    if last > SECONDS_PER_YEAR {
        return Err(ClimateError::AnnualCyclicConstraintViolation(
            "time points must not exceed 365 d".into(),
        ));
    }
    if first == 0.0 && last == SECONDS_PER_YEAR {
        return Err(ClimateError::AnnualCyclicConstraintViolation(
            "must not have time points 0 d and 365 d at the same time".into(),
        ));
    }
    Ok(())
}

/// Takes a cyclic series with time points at full hours (possibly with gaps)
/// and returns 8760 hourly time points and values.
///
/// Gaps are filled with the value before the gap, which has to be the same as
/// the one after it. A value at time 0 is moved to the end of the year, so
/// the result always looks like data given at the end of each hour.
pub fn expand_to_annual_hourly_data(
    time_points: &[Float],
    values: &[Float],
) -> Result<(Vec<Float>, Vec<Float>), ClimateError> {
    check_for_valid_cyclic_data(time_points)?;
    if time_points.len() != values.len() {
        return Err(ClimateError::RowCountMismatch {
            expected: time_points.len(),
            found: values.len(),
        });
    }

    let mut times: Vec<Float> = Vec::with_capacity(HOURS_PER_YEAR);
    let mut expanded: Vec<Float> = Vec::with_capacity(HOURS_PER_YEAR);
    for (&t, &v) in time_points.iter().zip(values.iter()) {
        if t.fract() != 0.0 || (t as u64) % 3600 != 0 {
            return Err(ClimateError::AnnualCyclicConstraintViolation(format!(
                "time point '{}' is not a valid hourly value in seconds",
                t
            )));
        }
        if let (Some(&last_t), Some(&last_v)) = (times.last(), expanded.last()) {
            if t > last_t + 3600. {
                if last_v != v {
                    return Err(ClimateError::InconsistentGapFill {
                        time_before: last_t,
                        time_after: t,
                        value_before: last_v,
                        value_after: v,
                    });
                }
                let mut fill_t = last_t + 3600.;
                while fill_t < t {
                    times.push(fill_t);
                    expanded.push(last_v);
                    fill_t += 3600.;
                }
            }
        }
        times.push(t);
        expanded.push(v);
    }

    if times.len() != HOURS_PER_YEAR {
        return Err(ClimateError::RowCountMismatch {
            expected: HOURS_PER_YEAR,
            found: times.len(),
        });
    }

    if times[0] == 0.0 {
        times.remove(0);
        times.push(SECONDS_PER_YEAR);
        expanded.rotate_left(1);
    }

    Ok((times, expanded))
}

/// Evaluates a spline that repeats every year: between the last point and the
/// first point (of the next year) values are interpolated linearly.
pub fn interpolate_cyclic_data(spline: &LinearSpline, seconds_of_year: Float) -> Float {
    let x = spline.x();
    let y = spline.y();
    let t1 = x[0];
    let tn = x[x.len() - 1];
    if seconds_of_year >= t1 && seconds_of_year <= tn {
        return spline.value(seconds_of_year);
    }
    // The last point, moved one year back
    let tn = tn - SECONDS_PER_YEAR;
    let t = if seconds_of_year > t1 {
        seconds_of_year - SECONDS_PER_YEAR
    } else {
        seconds_of_year
    };
    let alpha = (t - tn) / (t1 - tn);
    y[y.len() - 1] * (1. - alpha) + y[0] * alpha
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::ErrorKind;
    use validate::assert_close;

    #[test]
    fn test_cyclic_check() {
        assert!(check_for_valid_cyclic_data(&[0., 3600.]).is_ok());
        assert!(check_for_valid_cyclic_data(&[3600., SECONDS_PER_YEAR]).is_ok());

        let e = check_for_valid_cyclic_data(&[0.]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AnnualCyclicConstraintViolation);
        let e = check_for_valid_cyclic_data(&[0., SECONDS_PER_YEAR + 1.]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AnnualCyclicConstraintViolation);
        let e = check_for_valid_cyclic_data(&[0., SECONDS_PER_YEAR]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AnnualCyclicConstraintViolation);
    }

    #[test]
    fn test_expand_full() -> Result<(), ClimateError> {
        let t: Vec<Float> = (1..=HOURS_PER_YEAR).map(|i| i as Float * 3600.).collect();
        let v: Vec<Float> = (0..HOURS_PER_YEAR).map(|i| i as Float).collect();
        let (t2, v2) = expand_to_annual_hourly_data(&t, &v)?;
        assert_eq!(t, t2);
        assert_eq!(v, v2);
        Ok(())
    }

    #[test]
    fn test_expand_with_gaps() -> Result<(), ClimateError> {
        // Constant data given only at a few points, starting at 0
        let t = vec![0., 3600. * 10., 3600. * 11., SECONDS_PER_YEAR - 3600.];
        let v = vec![5., 5., 5., 5.];
        let (t2, v2) = expand_to_annual_hourly_data(&t, &v)?;
        assert_eq!(t2.len(), HOURS_PER_YEAR);
        assert_eq!(v2.len(), HOURS_PER_YEAR);
        assert_close!(t2[0], 3600.);
        assert_close!(t2[HOURS_PER_YEAR - 1], SECONDS_PER_YEAR);
        assert!(v2.iter().all(|v| *v == 5.));
        Ok(())
    }

    #[test]
    fn test_expand_moves_first_value() -> Result<(), ClimateError> {
        let t: Vec<Float> = (0..HOURS_PER_YEAR).map(|i| i as Float * 3600.).collect();
        let v: Vec<Float> = (0..HOURS_PER_YEAR).map(|i| i as Float).collect();
        let (t2, v2) = expand_to_annual_hourly_data(&t, &v)?;
        assert_close!(t2[0], 3600.);
        assert_close!(v2[0], 1.);
        assert_close!(t2[HOURS_PER_YEAR - 1], SECONDS_PER_YEAR);
        assert_close!(v2[HOURS_PER_YEAR - 1], 0.);
        Ok(())
    }

    #[test]
    fn test_expand_fails() {
        let e = expand_to_annual_hourly_data(&[0., 7200.], &[1., 2.]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InconsistentGapFill);

        let e = expand_to_annual_hourly_data(&[0., 1800.], &[1., 1.]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AnnualCyclicConstraintViolation);

        let e = expand_to_annual_hourly_data(&[0., 3600.], &[1., 1.]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::RowCountMismatch);
    }

    #[test]
    fn test_interpolate_cyclic() -> Result<(), ClimateError> {
        let spline = LinearSpline::new(
            vec![86400., SECONDS_PER_YEAR - 86400.],
            vec![10., 20.],
        )?;
        // Inside
        assert_close!(interpolate_cyclic_data(&spline, SECONDS_PER_YEAR / 2.), 15.);
        // Midway through the wrap, from both sides
        assert_close!(interpolate_cyclic_data(&spline, 0.), 15.);
        assert_close!(interpolate_cyclic_data(&spline, SECONDS_PER_YEAR), 15.);
        assert_close!(
            interpolate_cyclic_data(&spline, SECONDS_PER_YEAR - 43200.),
            17.5
        );
        Ok(())
    }
}
