use crate::constants::{DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, MAX_QUALITY, MIN_QUALITY};
use crate::error::{CompressionError, Result};
use glob::Pattern;

/// Settings for one run, validated once up front.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub quality: u8,
    pub max_dimension: u32,
    pub excludes: Vec<Pattern>,
}

impl PipelineOptions {
    pub fn new(
        quality: Option<u8>,
        max_dimension: Option<u32>,
        excludes: &[String],
    ) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressionError::InvalidQuality(quality));
        }

        let max_dimension = max_dimension.unwrap_or(DEFAULT_MAX_DIMENSION);
        if max_dimension == 0 {
            return Err(CompressionError::InvalidMaxDimension(max_dimension));
        }

        let excludes = excludes
            .iter()
            .map(|raw| {
                Pattern::new(raw).map_err(|e| CompressionError::InvalidPattern {
                    pattern: raw.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            quality,
            max_dimension,
            excludes,
        })
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_dimension: DEFAULT_MAX_DIMENSION,
            excludes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = PipelineOptions::new(None, None, &[]).unwrap();
        assert_eq!(options.quality, 85);
        assert_eq!(options.max_dimension, 2400);
        assert!(options.excludes.is_empty());
    }

    #[test]
    fn test_options_custom() {
        let options =
            PipelineOptions::new(Some(70), Some(1200), &["drafts/**".to_string()]).unwrap();
        assert_eq!(options.quality, 70);
        assert_eq!(options.max_dimension, 1200);
        assert!(options.excludes[0].matches("drafts/a/b.jpg"));
    }

    #[test]
    fn test_options_invalid_quality() {
        let result = PipelineOptions::new(Some(0), None, &[]);
        assert!(matches!(result, Err(CompressionError::InvalidQuality(0))));

        let result = PipelineOptions::new(Some(101), None, &[]);
        assert!(matches!(result, Err(CompressionError::InvalidQuality(101))));
    }

    #[test]
    fn test_options_invalid_max_dimension() {
        let result = PipelineOptions::new(None, Some(0), &[]);
        assert!(matches!(result, Err(CompressionError::InvalidMaxDimension(0))));
    }

    #[test]
    fn test_options_invalid_pattern() {
        let result = PipelineOptions::new(None, None, &["[unclosed".to_string()]);
        assert!(matches!(result, Err(CompressionError::InvalidPattern { .. })));
    }
}
