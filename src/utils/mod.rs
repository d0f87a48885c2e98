//! Common utilities and helpers

pub mod logging;

/// Utility functions for SceneSync
pub struct Utils;

impl Utils {
    /// Format timeline seconds as `MM:SS.mmm` (or `H:MM:SS.mmm` past one hour)
    pub fn format_timecode(seconds: f64) -> String {
        let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let secs = (total_millis % 60_000) / 1000;
        let millis = total_millis % 1000;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, secs, millis)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timecode() {
        assert_eq!(Utils::format_timecode(0.0), "00:00.000");
        assert_eq!(Utils::format_timecode(75.25), "01:15.250");
        assert_eq!(Utils::format_timecode(3661.5), "1:01:01.500");
        assert_eq!(Utils::format_timecode(-3.0), "00:00.000");
    }
}
