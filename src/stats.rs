use statrs::statistics::Statistics;

/// Mean and sample standard deviation (n - 1 denominator) of a column.
///
/// Returns `None` for an empty slice. With a single value the standard
/// deviation is reported as `0.0`, which callers treat as zero variance.
pub fn mean_sd(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().mean();
    let sd = if values.len() < 2 {
        0.0
    } else {
        values.iter().std_dev()
    };
    Some((mean, sd))
}

/// Standard error of the mean, `sd / sqrt(n)`; `0.0` for fewer than two values.
pub fn std_err(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().std_dev() / (values.len() as f64).sqrt()
}

/// True when every value equals the first one.
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v == first),
        None => true,
    }
}

/// Apportion `total` rows across groups of the given sizes in proportion
/// `prop`, using largest remainders.
///
/// Every group first receives `floor(prop * size)`. The rows still needed to
/// reach `round(prop * sum(sizes))` go one at a time to the groups with the
/// largest fractional parts; equal remainders favour the earlier group.
pub fn largest_remainder(sizes: &[usize], prop: f64) -> Vec<usize> {
    let n: usize = sizes.iter().sum();
    let target = (prop * n as f64).round() as usize;

    let exact: Vec<f64> = sizes.iter().map(|&s| prop * s as f64).collect();
    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let assigned: usize = alloc.iter().sum();

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    // stable sort keeps first-seen groups ahead on ties
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut remaining = target.saturating_sub(assigned);
    for &g in order.iter().cycle().take(order.len() * 2) {
        if remaining == 0 {
            break;
        }
        if alloc[g] < sizes[g] {
            alloc[g] += 1;
            remaining -= 1;
        }
    }
    alloc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn largest_remainder_balanced_classes() {
        // 34 / 33 / 33 at 0.75 -> 25.5, 24.75, 24.75
        let alloc = largest_remainder(&[34, 33, 33], 0.75);
        assert_eq!(alloc, vec![25, 25, 25]);
    }

    #[test]
    fn largest_remainder_never_exceeds_group() {
        let alloc = largest_remainder(&[1, 1, 1], 0.9);
        assert!(alloc.iter().all(|&a| a <= 1));
        assert_eq!(alloc.iter().sum::<usize>(), 3);
    }

    #[test]
    fn mean_sd_uses_sample_denominator() {
        let (m, sd) = mean_sd(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((m - 2.5).abs() < 1e-12);
        // var = 5/3
        assert!((sd - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
