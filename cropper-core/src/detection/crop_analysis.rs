//! Parsing of cropdetect output and per-axis vote counting.
//!
//! Each probe contributes the last `crop=W:H:X:Y` value ffmpeg printed. The
//! four components are tallied independently and each axis resolves to its
//! most frequent value.

use std::collections::HashMap;

/// Raw `W:H:X:Y` components as printed by cropdetect.
pub type CropValues = [String; 4];

/// Extracts the `W:H:X:Y` values from one cropdetect log line.
///
/// Components are validated as signed integers (cropdetect prints negative
/// sizes for all-black frames) but kept in their printed form.
pub fn parse_crop_line(line: &str) -> Option<CropValues> {
    let crop_pos = line.find("crop=")?;
    let crop_part = &line[crop_pos + 5..];
    let end_pos = crop_part
        .find(|c: char| c.is_whitespace())
        .unwrap_or(crop_part.len());

    let parts: Vec<&str> = crop_part[..end_pos].split(':').collect();
    if parts.len() != 4 || parts.iter().any(|p| p.parse::<i64>().is_err()) {
        return None;
    }
    Some([
        parts[0].to_string(),
        parts[1].to_string(),
        parts[2].to_string(),
        parts[3].to_string(),
    ])
}

/// Last valid crop value among the given log lines.
pub fn last_crop<'a, I>(lines: I) -> Option<CropValues>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(parse_crop_line).last()
}

/// Most frequent value of one axis.
///
/// Ties go to the value that is greater as a string, so `"9"` beats `"10"`.
/// An empty table yields `"0"`.
pub fn mode(table: &HashMap<String, usize>) -> String {
    table
        .iter()
        .fold(("0", 0usize), |best, (value, &count)| {
            if count > best.1 || (count == best.1 && value.as_str() > best.0) {
                (value.as_str(), count)
            } else {
                best
            }
        })
        .0
        .to_string()
}

/// Frequency tables for the four crop components.
#[derive(Debug, Default)]
pub struct CropTally {
    width: HashMap<String, usize>,
    height: HashMap<String, usize>,
    left: HashMap<String, usize>,
    top: HashMap<String, usize>,
}

impl CropTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, values: &CropValues) {
        let tables = [&mut self.width, &mut self.height, &mut self.left, &mut self.top];
        for (table, value) in tables.into_iter().zip(values) {
            *table.entry(value.clone()).or_insert(0) += 1;
        }
    }

    pub fn samples(&self) -> usize {
        self.width.values().sum()
    }

    /// Per-axis modes as `(width, height, left, top)`.
    ///
    /// Every recorded value parsed as `i64`, so only the `"0"` fallback can
    /// reach the default here.
    pub fn resolve(&self) -> (i64, i64, i64, i64) {
        let axis = |table: &HashMap<String, usize>| mode(table).parse::<i64>().unwrap_or(0);
        (
            axis(&self.width),
            axis(&self.height),
            axis(&self.left),
            axis(&self.top),
        )
    }
}

impl<'a> FromIterator<&'a CropValues> for CropTally {
    fn from_iter<T: IntoIterator<Item = &'a CropValues>>(iter: T) -> Self {
        let mut tally = CropTally::new();
        for values in iter {
            tally.record(values);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(s: &str) -> CropValues {
        parse_crop_line(&format!("crop={s}")).unwrap()
    }

    #[test]
    fn test_parse_crop_line() {
        let line = "[Parsed_cropdetect_0 @ 0x7f8] x1:0 x2:1919 y1:140 y2:939 w:1920 h:800 x:0 y:140 pts:0 t:0.000000 crop=1920:800:0:140";
        assert_eq!(
            parse_crop_line(line),
            Some(["1920".into(), "800".into(), "0".into(), "140".into()])
        );
        assert_eq!(
            parse_crop_line("crop=-1904:-1072:1912:1076 trailing"),
            Some(["-1904".into(), "-1072".into(), "1912".into(), "1076".into()])
        );
        assert_eq!(parse_crop_line("crop=invalid:format"), None);
        assert_eq!(parse_crop_line("crop=1920:800:0"), None);
        assert_eq!(parse_crop_line("frame=  240 fps=0.0"), None);
    }

    #[test]
    fn test_last_crop_wins() {
        let output = "[Parsed_cropdetect_0 @ 0x7f8] crop=1920:1080:0:0\n\
                      [Parsed_cropdetect_0 @ 0x7f8] crop=1920:800:0:140\n\
                      [Parsed_cropdetect_0 @ 0x7f8] crop=bad\n\
                      frame=  120 fps=0.0 q=-0.0 size=N/A";
        assert_eq!(last_crop(output.lines()), Some(values("1920:800:0:140")));
        assert_eq!(last_crop("no crops here".lines()), None);
    }

    #[test]
    fn test_mode_prefers_highest_count() {
        let table: HashMap<String, usize> =
            [("800".to_string(), 3), ("1080".to_string(), 2)].into_iter().collect();
        assert_eq!(mode(&table), "800");
    }

    #[test]
    fn test_mode_tie_is_lexicographic() {
        let table: HashMap<String, usize> =
            [("9".to_string(), 3), ("10".to_string(), 3)].into_iter().collect();
        assert_eq!(mode(&table), "9");
    }

    #[test]
    fn test_mode_of_empty_table() {
        assert_eq!(mode(&HashMap::new()), "0");
        assert_eq!(CropTally::new().resolve(), (0, 0, 0, 0));
    }

    #[test]
    fn test_axes_resolve_independently() {
        let samples = [
            values("1920:800:0:140"),
            values("1920:800:0:140"),
            values("1916:804:2:138"),
            values("1916:800:2:140"),
            values("1916:804:0:138"),
        ];
        let tally: CropTally = samples.iter().collect();
        assert_eq!(tally.samples(), 5);
        assert_eq!(tally.resolve(), (1916, 800, 0, 140));
    }
}
