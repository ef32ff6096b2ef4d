//! Known display aspect ratios and snapping of near-miss detections.

use super::CropRectangle;

/// A named display aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownRatio {
    pub label: &'static str,
    pub value: f64,
}

/// Ratios a detection may resolve to. Order matters: the first entry within
/// tolerance wins, even when a later one is closer.
pub const KNOWN_RATIOS: [KnownRatio; 11] = [
    KnownRatio { label: "4:3 (sdtv)", value: 4.0 / 3.0 },
    KnownRatio { label: "16:9 (hdtv)", value: 16.0 / 9.0 },
    KnownRatio { label: "16:10 (golden ratio)", value: 16.0 / 10.0 },
    KnownRatio { label: "1.85:1 (cinema)", value: 1.85 },
    KnownRatio { label: "2.21:1 (widescreen)", value: 2.21 },
    KnownRatio { label: "2.35:1 (anamorphic)", value: 2.35 },
    KnownRatio { label: "2.39:1 (anamorphic)", value: 2.39 },
    KnownRatio { label: "2:1", value: 2.0 },
    KnownRatio { label: "5:3", value: 5.0 / 3.0 },
    KnownRatio { label: "5:4", value: 5.0 / 4.0 },
    KnownRatio { label: "1:1 (square)", value: 1.0 },
];

/// Maximum absolute distance (exclusive) between a detected and a known ratio.
pub const RATIO_TOLERANCE: f64 = 0.1;

/// Offsets below this are treated as detection noise when snapping.
pub const SNAP_OFFSET_LIMIT: u32 = 10;

/// First known ratio within tolerance of `width / height`.
pub fn match_known_ratio(width: u32, height: u32) -> Option<&'static KnownRatio> {
    if height == 0 {
        return None;
    }
    let ratio = f64::from(width) / f64::from(height);
    KNOWN_RATIOS
        .iter()
        .find(|known| (known.value - ratio).abs() < RATIO_TOLERANCE)
}

/// Pulls a rectangle that is a few pixels off onto the exact ratio.
///
/// Only the axis whose offset is already near zero is adjusted, and never past
/// the source frame.
pub fn snap_to_aspect(rect: &mut CropRectangle, ratio: f64) {
    if rect.x_offset == 0 && rect.y_offset < SNAP_OFFSET_LIMIT {
        let snapped = (f64::from(rect.x) / ratio).floor() as u32;
        rect.y = rect.file_y.min(snapped);
        rect.y_offset = 0;
    } else if rect.y_offset == 0 && rect.x_offset < SNAP_OFFSET_LIMIT {
        let snapped = (f64::from(rect.y) * ratio).floor() as u32;
        rect.x = rect.file_x.min(snapped);
        rect.x_offset = 0;
    }
}
