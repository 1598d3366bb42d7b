//! Pure calculation functions for compression reporting.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fraction of the source size saved by the re-encode, floored at 0.
///
/// `1 - output/source`. An output larger than its source reports `0.0`, as
/// does an empty source.
///
/// # Examples
/// ```
/// # use imgdesk::imaging::size_reduction_ratio;
/// assert_eq!(size_reduction_ratio(1000, 250), 0.75);
/// assert_eq!(size_reduction_ratio(1000, 4000), 0.0);
/// ```
pub fn size_reduction_ratio(source_size: u64, output_size: u64) -> f64 {
    if source_size == 0 {
        return 0.0;
    }
    (1.0 - output_size as f64 / source_size as f64).max(0.0)
}

/// Whole-percent reduction: `max(0, 100 - round(output/source * 100))`.
///
/// # Examples
/// ```
/// # use imgdesk::imaging::reduction_percent;
/// // 500 KB → 123 KB rounds to 25% of the source, so 75% saved
/// assert_eq!(reduction_percent(500_000, 123_000), 75);
/// ```
pub fn reduction_percent(source_size: u64, output_size: u64) -> u32 {
    if source_size == 0 {
        return 0;
    }
    let kept = (output_size as f64 / source_size as f64 * 100.0).round();
    (100.0 - kept).max(0.0) as u32
}

/// Human-readable byte size: `B` below 1 KiB, one decimal `KB` below 1 MiB,
/// two decimal `MB` above.
pub fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}
