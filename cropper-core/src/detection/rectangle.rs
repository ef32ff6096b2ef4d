//! Crop rectangle types shared by detection, cropping and the outer surfaces.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Visible picture area of a video, as found by the detector.
///
/// Serialized with the public field names used by the `detect` command and the
/// HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropRectangle {
    #[serde(rename = "file_width")]
    pub file_x: u32,
    #[serde(rename = "file_height")]
    pub file_y: u32,
    #[serde(rename = "actual_width")]
    pub x: u32,
    #[serde(rename = "actual_height")]
    pub y: u32,
    #[serde(rename = "left_offset")]
    pub x_offset: u32,
    #[serde(rename = "top_offset")]
    pub y_offset: u32,
    /// Label of the matched known ratio; set once validation succeeds.
    pub aspect: Option<String>,
}

impl CropRectangle {
    pub fn window(&self) -> CropWindow {
        CropWindow {
            width: self.x,
            height: self.y,
            left: self.x_offset,
            top: self.y_offset,
        }
    }

    /// Tab separated report used by the `detect` command.
    pub fn to_report(&self) -> String {
        format!(
            "file_width:\t{}\nfile_height:\t{}\nactual_width:\t{}\nactual_height:\t{}\nleft_offset:\t{}\ntop_offset:\t{}\naspect:\t\t{}",
            self.file_x,
            self.file_y,
            self.x,
            self.y,
            self.x_offset,
            self.y_offset,
            self.aspect.as_deref().unwrap_or("unknown"),
        )
    }
}

/// A `width:height:left:top` crop, either detected or given by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
}

impl CropWindow {
    /// ffmpeg `crop` filter expression.
    pub fn to_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.left, self.top)
    }

    /// True when the window spans the whole frame, leaving nothing to crop.
    pub fn is_full_frame(&self, file_width: u32, file_height: u32) -> bool {
        self.width == file_width && self.height == file_height
    }

    /// Whether the window lies inside a `file_width` x `file_height` frame.
    pub fn fits(&self, file_width: u32, file_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.left) + u64::from(self.width) <= u64::from(file_width)
            && u64::from(self.top) + u64::from(self.height) <= u64::from(file_height)
    }
}

impl fmt::Display for CropWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.width, self.height, self.left, self.top)
    }
}

impl FromStr for CropWindow {
    type Err = String;

    /// Parses `W:H:X:Y`, each an unsigned pixel count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            format!(
                "Crop must follow the format \"width:height:left_offset:top_offset\" where each value is in px, got \"{s}\""
            )
        };
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4
            || parts
                .iter()
                .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(invalid());
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| invalid())?;
        }
        Ok(CropWindow {
            width: values[0],
            height: values[1],
            left: values[2],
            top: values[3],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_window_parse() {
        assert_eq!(
            "1920:800:0:140".parse::<CropWindow>(),
            Ok(CropWindow { width: 1920, height: 800, left: 0, top: 140 })
        );
        assert!("1920:800:0".parse::<CropWindow>().is_err());
        assert!("1920:800:0:-4".parse::<CropWindow>().is_err());
        assert!("1920:800:0:+4".parse::<CropWindow>().is_err());
        assert!("auto".parse::<CropWindow>().is_err());
    }

    #[test]
    fn test_fits() {
        let window = CropWindow { width: 1920, height: 800, left: 0, top: 140 };
        assert!(window.fits(1920, 1080));
        assert!(!window.fits(1920, 900));
        assert!(!CropWindow { width: 0, height: 800, left: 0, top: 0 }.fits(1920, 1080));
    }

    #[test]
    fn test_is_full_frame() {
        let window = CropWindow { width: 1920, height: 1080, left: 0, top: 0 };
        assert!(window.is_full_frame(1920, 1080));
        assert!(!window.is_full_frame(1920, 1088));
        assert!(!CropWindow { width: 1920, height: 800, left: 0, top: 140 }.is_full_frame(1920, 1080));
    }

    #[test]
    fn test_serialized_field_names() {
        let rect = CropRectangle {
            file_x: 1920,
            file_y: 1080,
            x: 1920,
            y: 800,
            x_offset: 0,
            y_offset: 140,
            aspect: Some("2.35:1 (anamorphic)".to_string()),
        };
        let json = serde_json::to_string(&rect).unwrap();
        assert_eq!(
            json,
            r#"{"file_width":1920,"file_height":1080,"actual_width":1920,"actual_height":800,"left_offset":0,"top_offset":140,"aspect":"2.35:1 (anamorphic)"}"#
        );
        assert!(rect.to_report().starts_with("file_width:\t1920\n"));
        assert_eq!(rect.window().to_filter(), "crop=1920:800:0:140");
    }
}
