//! Numeric kernels used by the cleaner and the summaries, backed by polars
//! chunked arrays.  Callers pass present values only; missing cells are
//! filtered out beforehand.

use polars::prelude::{
    col, df, ChunkAgg, ChunkQuantile, ChunkVar, Float64Chunked, IntoLazy, NewChunkedArray, PolarsResult,
    QuantileMethod, RankMethod, RankOptions,
};

fn chunked(values: &[f64]) -> Float64Chunked {
    Float64Chunked::from_slice("values".into(), values)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    chunked(values).mean()
}

/// Standard deviation with `ddof` delta degrees of freedom (0 = population,
/// 1 = sample).  `None` when there are not enough values.
pub fn std_dev(values: &[f64], ddof: u8) -> Option<f64> {
    if values.len() <= ddof as usize {
        return None;
    }
    chunked(values).std(ddof)
}

/// Quantile `q` in `[0, 1]` with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    chunked(values)
        .quantile(q.clamp(0.0, 1.0), QuantileMethod::Linear)
        .ok()
        .flatten()
}

pub fn median(values: &[f64]) -> Option<f64> {
    chunked(values).median()
}

/// Five-number summary: min, 25%, 50%, 75%, max.
pub fn five_numbers(values: &[f64]) -> Option<[f64; 5]> {
    let ca = chunked(values);
    let q = |p: f64| ca.quantile(p, QuantileMethod::Linear).ok().flatten();
    Some([ca.min()?, q(0.25)?, ca.median()?, q(0.75)?, ca.max()?])
}

/// Pearson correlation of two equally long series.  NaN when undefined
/// (fewer than two points or zero variance).
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (chunked(&x[..n]), chunked(&y[..n]));
    let (Some(mx), Some(my)) = (x.mean(), y.mean()) else {
        return f64::NAN;
    };
    let dx = &x - mx;
    let dy = &y - my;
    let sxy = (&dx * &dy).sum().unwrap_or(0.0);
    let sxx = (&dx * &dx).sum().unwrap_or(0.0);
    let syy = (&dy * &dy).sum().unwrap_or(0.0);
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Ranks starting at 1 for both series; ties share their average rank.
pub fn average_ranks(x: &[f64], y: &[f64]) -> PolarsResult<(Vec<f64>, Vec<f64>)> {
    let options = RankOptions {
        method: RankMethod::Average,
        descending: false,
    };
    let ranked = df!("x" => x, "y" => y)?
        .lazy()
        .select([col("x").rank(options, None), col("y").rank(options, None)])
        .collect()?;
    let ranks = |name: &str| -> PolarsResult<Vec<f64>> {
        Ok(ranked
            .column(name)?
            .f64()?
            .into_iter()
            .map(|r| r.unwrap_or(f64::NAN))
            .collect())
    };
    Ok((ranks("x")?, ranks("y")?))
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    match average_ranks(&x[..n], &y[..n]) {
        Ok((rx, ry)) => pearson(&rx, &ry),
        Err(e) => {
            log::warn!("Ranking failed: {e}");
            f64::NAN
        }
    }
}

/// Pairs where both sides are present.
pub fn pairwise_complete(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

/// Equal-width histogram: `(bin_start, bin_end, count)` for each bin.  A
/// constant series gets a single unit-wide bin centred on its value.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo < f64::EPSILON {
        return vec![(lo - 0.5, lo + 0.5, finite.len())];
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, n)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, n))
        .collect()
}

/// Box-plot geometry with Tukey whiskers (1.5 × IQR, clipped to the data).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let [_, q1, median, q3, _] = five_numbers(values)?;
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let inside = values.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
    let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
    let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&[1.0, 2.0, 4.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let q = five_numbers(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(close(q[1], 1.75));
        assert!(close(q[3], 3.25));
    }

    #[test]
    fn std_population_and_sample() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(std_dev(&v, 0).unwrap(), 2.0));
        assert!(close(std_dev(&v, 1).unwrap(), (32.0f64 / 7.0).sqrt()));
        assert_eq!(std_dev(&[1.0], 1), None);
    }

    #[test]
    fn correlations() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]), 1.0));
        assert!(close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]), -1.0));
        // Monotone but non-linear: Spearman is exactly 1.
        assert!(close(spearman(&x, &[1.0, 10.0, 100.0, 1000.0]), 1.0));
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn ties_share_average_rank() {
        let (rx, ry) = average_ranks(&[10.0, 20.0, 10.0, 30.0], &[3.0, 2.0, 1.0, 0.5]).unwrap();
        assert_eq!(rx, vec![1.5, 3.0, 1.5, 4.0]);
        assert_eq!(ry, vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn spearman_handles_ties() {
        // ranks (1.5, 1.5, 3) against (1, 2, 3)
        let r = spearman(&[1.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!(close(r, 0.8660254037844387));
    }

    #[test]
    fn empty_input_has_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(five_numbers(&[]), None);
        assert!(spearman(&[], &[]).is_nan());
    }

    #[test]
    fn histogram_covers_all_values() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].2 + h[1].2, 5);
        assert_eq!(h[1].2, 3);
        assert_eq!(histogram(&[7.0, 7.0], 10), vec![(6.5, 7.5, 2)]);
    }

    #[test]
    fn whiskers_stop_at_fences() {
        let b = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.median, 3.0);
        assert_eq!(b.upper_whisker, 4.0);
        assert_eq!(b.lower_whisker, 1.0);
    }

    #[test]
    fn pairwise_drops_incomplete_pairs() {
        let (a, b) = pairwise_complete(&[Some(1.0), None, Some(3.0)], &[Some(2.0), Some(5.0), None]);
        assert_eq!(a, vec![1.0]);
        assert_eq!(b, vec![2.0]);
    }
}
