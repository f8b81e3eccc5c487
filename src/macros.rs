/// Lets you simply create a [PerformanceData](crate::PerformanceData)
/// collection from multiple lines. It's a bit like the vec! macro.
///
/// ```rust
/// use checkplugin::PerformanceDataLine;
///
/// # fn main() -> Result<(), checkplugin::PerfDataError> {
/// let data = checkplugin::perf_data![
///     PerformanceDataLine::new("load", "0.5")?,
///     PerformanceDataLine::new("cpu", "42%")?,
/// ];
/// assert_eq!(data.lines().len(), 2);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! perf_data {
    ($( $line:expr ),* $(,)?) => {
        {
            let mut data = $crate::PerformanceData::new();
            $(
                data.push($line);
            )*
            data
        }
    };
}
