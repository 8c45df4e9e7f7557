use indicatif::ProgressStyle;

/// 将秒数格式化为合适的时间单位
pub fn format_time(seconds: f64) -> String {
    if seconds >= 3600. {
        format!("{:.2} h", seconds / 3600.)
    } else if seconds >= 60. {
        format!("{:.2} min", seconds / 60.)
    } else if seconds >= 1. {
        format!("{seconds:.2} s")
    } else if seconds >= 1e-3 {
        format!("{:.2} ms", seconds * 1e3)
    } else if seconds >= 1e-6 {
        format!("{:.2} us", seconds * 1e6)
    } else {
        format!("{:.2} ns", seconds * 1e9)
    }
}

/// 进度条的统一样式
pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .expect("invalid progress template")
    .progress_chars("=>-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(7200.), "2.00 h");
        assert_eq!(format_time(90.), "1.50 min");
        assert_eq!(format_time(1.5), "1.50 s");
        assert_eq!(format_time(0.5), "500.00 ms");
        assert_eq!(format_time(0.5e-3), "500.00 us");
        assert_eq!(format_time(0.5e-6), "500.00 ns");
    }
}
