use std::fmt;
use std::str::FromStr;

use egui::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target aspect ratio requested by the hosting workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported aspect ratio '{0}'")]
pub struct ParseAspectRatioError(pub String);

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }

    /// Width over height
    pub fn ratio(&self) -> f32 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Portrait3x4 => 3.0 / 4.0,
            AspectRatio::Landscape4x3 => 4.0 / 3.0,
            AspectRatio::Portrait9x16 => 9.0 / 16.0,
            AspectRatio::Landscape16x9 => 16.0 / 9.0,
        }
    }

    /// Size of an artboard of this ratio whose long side is `long_side`
    pub fn frame_size(&self, long_side: f32) -> Vec2 {
        let ratio = self.ratio();
        if ratio >= 1.0 {
            Vec2::new(long_side, long_side / ratio)
        } else {
            Vec2::new(long_side * ratio, long_side)
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ParseAspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == trimmed)
            .ok_or_else(|| ParseAspectRatioError(trimmed.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_ratio() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>(), Ok(ratio));
        }
        assert!("2:1".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn frame_keeps_long_side() {
        let frame = AspectRatio::Portrait9x16.frame_size(1024.0);
        assert_eq!(frame.y, 1024.0);
        assert!((frame.x - 576.0).abs() < 0.01);

        let frame = AspectRatio::Landscape4x3.frame_size(1024.0);
        assert_eq!(frame.x, 1024.0);
        assert!((frame.y - 768.0).abs() < 0.01);
    }
}
