use crate::types::PositionedFragment;

/// Document-wide font-size statistics over fragments with a known size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontStatistics {
    pub max_font_size: f32,
    pub mean_font_size: f32,
    /// Number of fragments that contributed.
    pub sample_count: usize,
}

impl FontStatistics {
    /// The sentinel used when no fragment carries a font size.
    pub const UNSIZED: FontStatistics = FontStatistics {
        max_font_size: 0.0,
        mean_font_size: 0.0,
        sample_count: 0,
    };

    /// Compute statistics, ignoring fragments whose size is unknown (0).
    pub fn compute(fragments: &[PositionedFragment]) -> Self {
        let sizes: Vec<f32> = fragments
            .iter()
            .map(|f| f.font_size)
            .filter(|size| *size > 0.0)
            .collect();

        if sizes.is_empty() {
            return Self::UNSIZED;
        }

        let max_font_size = sizes.iter().copied().fold(f32::MIN, f32::max);
        let mean_font_size = sizes.iter().sum::<f32>() / sizes.len() as f32;

        FontStatistics {
            max_font_size,
            mean_font_size,
            sample_count: sizes.len(),
        }
    }

    pub fn has_size_info(&self) -> bool {
        self.max_font_size > 0.0
    }

    /// `font_size / max_font_size`, or 0 without size information.
    pub fn ratio(&self, font_size: f32) -> f32 {
        if self.has_size_info() {
            font_size / self.max_font_size
        } else {
            0.0
        }
    }

    /// Ratio of the mean size to the maximum size.
    pub fn mean_ratio(&self) -> f32 {
        self.ratio(self.mean_font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, PositionBucket};

    fn sized(size: f32) -> PositionedFragment {
        PositionedFragment {
            text: "text".to_string(),
            page: 1,
            bbox: BoundingBox::default(),
            font_size: size,
            font_name: String::new(),
            is_bold: false,
            is_italic: false,
            position: PositionBucket::Middle,
        }
    }

    #[test]
    fn test_compute_max_and_mean() {
        let stats = FontStatistics::compute(&[sized(12.0), sized(18.0), sized(12.0), sized(6.0)]);
        assert_eq!(stats.max_font_size, 18.0);
        assert_eq!(stats.mean_font_size, 12.0);
        assert_eq!(stats.sample_count, 4);
        assert!(stats.has_size_info());
    }

    #[test]
    fn test_compute_ignores_unknown_sizes() {
        let stats = FontStatistics::compute(&[sized(0.0), sized(10.0), sized(0.0)]);
        assert_eq!(stats.max_font_size, 10.0);
        assert_eq!(stats.mean_font_size, 10.0);
        assert_eq!(stats.sample_count, 1);
    }

    #[test]
    fn test_compute_without_sizes_is_sentinel() {
        assert_eq!(FontStatistics::compute(&[]), FontStatistics::UNSIZED);
        let stats = FontStatistics::compute(&[sized(0.0)]);
        assert!(!stats.has_size_info());
        assert_eq!(stats.ratio(12.0), 0.0);
        assert_eq!(stats.mean_ratio(), 0.0);
    }

    #[test]
    fn test_ratio() {
        let stats = FontStatistics::compute(&[sized(20.0), sized(10.0)]);
        assert_eq!(stats.ratio(10.0), 0.5);
        assert_eq!(stats.mean_ratio(), 0.75);
    }
}
