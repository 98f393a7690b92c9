// Like-ratio math and presentation: tier buckets, title prefixes, tooltips.

use crate::stats::VideoStat;

/// Color tier for an annotation, keyed off the like ratio in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioTier {
    High,
    Medium,
    Low,
    /// The lookup failed or the video has no usable counts.
    Error,
}

impl RatioTier {
    /// Bucket a ratio. NaN falls through the guards and lands in `Low`.
    pub fn from_ratio(ratio: f64) -> Self {
        match ratio {
            r if r >= 10.0 => RatioTier::High,
            r if r >= 5.0 => RatioTier::Medium,
            _ => RatioTier::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RatioTier::High => "high",
            RatioTier::Medium => "medium",
            RatioTier::Low => "low",
            RatioTier::Error => "error",
        }
    }

    /// CSS class carried by the injected prefix span.
    pub fn css_class(&self) -> &'static str {
        match self {
            RatioTier::High => "yt-ratioed-high-text",
            RatioTier::Medium => "yt-ratioed-medium-text",
            RatioTier::Low => "yt-ratioed-low-text",
            RatioTier::Error => "yt-ratioed-error-text",
        }
    }
}

impl std::fmt::Display for RatioTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What gets written into a title: the bracketed prefix and its tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioDisplay {
    pub prefix: String,
    pub tier: RatioTier,
}

/// Like ratio as a percentage. Zero when the video has no views.
pub fn like_ratio(views: i64, likes: i64) -> f64 {
    if views > 0 {
        (likes as f64 / views as f64) * 100.0
    } else {
        0.0
    }
}

/// Whether a stat stays un-annotated under the current threshold.
/// Failed lookups and like-less videos are never suppressed; they render
/// as `[N/A]` so the user can tell a miss from a filter.
pub fn below_threshold(stat: &VideoStat, min_ratio: f64) -> bool {
    !stat.error && stat.views >= 0 && stat.likes > 0 && stat.ratio_value() < min_ratio
}

/// Prefix and tier for a stat. Ratios of one percent and up show one
/// decimal, smaller ones show two.
pub fn display_for(stat: &VideoStat) -> RatioDisplay {
    if stat.error || stat.views <= 0 || stat.likes <= 0 {
        return RatioDisplay {
            prefix: "[N/A] ".to_string(),
            tier: RatioTier::Error,
        };
    }
    let ratio = stat.ratio_value();
    let formatted = if ratio >= 1.0 {
        format!("{ratio:.1}")
    } else {
        format!("{ratio:.2}")
    };
    RatioDisplay {
        prefix: format!("[{formatted}%] "),
        tier: RatioTier::from_ratio(ratio),
    }
}

/// Hover tooltip for an annotated title.
pub fn tooltip_for(stat: &VideoStat) -> String {
    if stat.error || stat.views <= 0 || stat.likes <= 0 {
        let reason = stat.message.as_deref().unwrap_or("No likes/views available");
        format!("Unable to retrieve data: {reason}")
    } else {
        format!(
            "Likes: {}, Views: {}, Ratio: {:.2}%",
            group_thousands(stat.likes),
            group_thousands(stat.views),
            stat.ratio_value()
        )
    }
}

/// Insert thousands separators: 1234567 -> "1,234,567".
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(views: i64, likes: i64) -> VideoStat {
        VideoStat {
            video_id: "abc123".to_string(),
            url: "https://www.youtube.com/watch?v=abc123".to_string(),
            views,
            likes,
            like_ratio: if views > 0 {
                format!("{:.4}", like_ratio(views, likes))
            } else {
                "0".to_string()
            },
            error: false,
            message: None,
        }
    }

    fn error_stat(message: Option<&str>) -> VideoStat {
        VideoStat {
            video_id: "abc123".to_string(),
            url: "https://www.youtube.com/watch?v=abc123".to_string(),
            views: -1,
            likes: -1,
            like_ratio: "0".to_string(),
            error: true,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(RatioTier::from_ratio(10.0), RatioTier::High);
        assert_eq!(RatioTier::from_ratio(9.999), RatioTier::Medium);
        assert_eq!(RatioTier::from_ratio(5.0), RatioTier::Medium);
        assert_eq!(RatioTier::from_ratio(4.999), RatioTier::Low);
        assert_eq!(RatioTier::from_ratio(0.0), RatioTier::Low);
    }

    #[test]
    fn nan_ratio_is_low_not_a_panic() {
        assert_eq!(RatioTier::from_ratio(f64::NAN), RatioTier::Low);
    }

    #[test]
    fn ratio_of_one_percent_and_up_gets_one_decimal() {
        let display = display_for(&stat(1000, 57));
        assert_eq!(display.prefix, "[5.7%] ");
        assert_eq!(display.tier, RatioTier::Medium);
    }

    #[test]
    fn sub_percent_ratio_gets_two_decimals() {
        let display = display_for(&stat(1000, 1));
        assert_eq!(display.prefix, "[0.10%] ");
        assert_eq!(display.tier, RatioTier::Low);
    }

    #[test]
    fn error_stat_displays_not_available() {
        let display = display_for(&error_stat(Some("quota")));
        assert_eq!(display.prefix, "[N/A] ");
        assert_eq!(display.tier, RatioTier::Error);
    }

    #[test]
    fn zero_views_and_zero_likes_display_not_available() {
        assert_eq!(display_for(&stat(0, 0)).tier, RatioTier::Error);
        assert_eq!(display_for(&stat(1000, 0)).tier, RatioTier::Error);
    }

    #[test]
    fn threshold_suppresses_only_clean_low_ratios() {
        assert!(below_threshold(&stat(1000, 1), 5.0));
        assert!(!below_threshold(&stat(1000, 200), 5.0));
        // boundary: a ratio exactly at the minimum passes
        assert!(!below_threshold(&stat(1000, 50), 5.0));
        // errors and like-less videos always get their N/A marker
        assert!(!below_threshold(&error_stat(None), 5.0));
        assert!(!below_threshold(&stat(1000, 0), 5.0));
    }

    #[test]
    fn tooltip_groups_counts_and_rounds_ratio() {
        let tooltip = tooltip_for(&stat(1_234_000, 1_234));
        assert_eq!(tooltip, "Likes: 1,234, Views: 1,234,000, Ratio: 0.10%");
    }

    #[test]
    fn tooltip_falls_back_when_no_message() {
        assert_eq!(
            tooltip_for(&error_stat(None)),
            "Unable to retrieve data: No likes/views available"
        );
        assert_eq!(
            tooltip_for(&error_stat(Some("API quota exceeded"))),
            "Unable to retrieve data: API quota exceeded"
        );
    }

    #[test]
    fn grouping_handles_short_and_negative_values() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-1500), "-1,500");
    }
}
