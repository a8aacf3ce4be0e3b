//! Display-pixel to native document coordinates

use serde::Serialize;

use super::controller::SelectionRect;

/// Map one display coordinate into native units at `scale` display pixels per unit
#[must_use]
pub fn to_native(display: f32, scale: f32) -> i64 {
    (f64::from(display) / f64::from(scale)).round() as i64
}

fn rounded(value: f32) -> i64 {
    f64::from(value).round() as i64
}

/// Everything reported for one finished selection, rounded to integers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionReport {
    /// Page number (1-indexed)
    pub page: usize,
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
    pub width: i64,
    pub height: i64,
    pub area: i64,
    pub native_x1: i64,
    pub native_y1: i64,
    pub native_x2: i64,
    pub native_y2: i64,
}

impl SelectionReport {
    /// Build the report for `rect` drawn on a page rendered at `scale`.
    ///
    /// Returns `None` for a scale that cannot be divided by.
    #[must_use]
    pub fn from_rect(rect: &SelectionRect, scale: f32) -> Option<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }

        Some(Self {
            page: rect.page,
            x1: rounded(rect.x1),
            y1: rounded(rect.y1),
            x2: rounded(rect.x2),
            y2: rounded(rect.y2),
            width: rounded(rect.width()),
            height: rounded(rect.height()),
            area: rounded(rect.area()),
            native_x1: to_native(rect.x1, scale),
            native_y1: to_native(rect.y1, scale),
            native_x2: to_native(rect.x2, scale),
            native_y2: to_native(rect.y2, scale),
        })
    }
}

impl std::fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Selection on page #{}", self.page)?;
        writeln!(
            f,
            "  display: X1 {} px, Y1 {} px, X2 {} px, Y2 {} px",
            self.x1, self.y1, self.x2, self.y2
        )?;
        writeln!(
            f,
            "  size:    {} x {} px (area {} px²)",
            self.width, self.height, self.area
        )?;
        write!(
            f,
            "  native:  X {} - {}, Y {} - {}",
            self.native_x1, self.native_x2, self.native_y1, self.native_y2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(page: usize, x1: f32, y1: f32, x2: f32, y2: f32) -> SelectionRect {
        SelectionRect {
            page,
            x1,
            y1,
            x2,
            y2,
        }
    }

    #[test]
    fn page_two_report_at_one_and_a_half() {
        let report = SelectionReport::from_rect(&rect(2, 10.0, 10.0, 50.0, 80.0), 1.5).unwrap();
        assert_eq!(
            report,
            SelectionReport {
                page: 2,
                x1: 10,
                y1: 10,
                x2: 50,
                y2: 80,
                width: 40,
                height: 70,
                area: 2800,
                native_x1: 7,
                native_y1: 7,
                native_x2: 33,
                native_y2: 53,
            }
        );
    }

    #[test]
    fn fractional_pointer_positions_are_rounded() {
        let report = SelectionReport::from_rect(&rect(1, 0.4, 0.6, 10.5, 3.2), 1.0).unwrap();
        assert_eq!((report.x1, report.y1, report.x2, report.y2), (0, 1, 11, 3));
        // area is computed before rounding: 10.1 * 2.6 = 26.26
        assert_eq!(report.area, 26);
    }

    #[test]
    fn each_page_uses_its_own_scale() {
        let r = rect(1, 30.0, 30.0, 60.0, 60.0);
        let at_one_and_half = SelectionReport::from_rect(&r, 1.5).unwrap();
        let at_double = SelectionReport::from_rect(&r, 2.0).unwrap();
        assert_eq!(at_one_and_half.native_x2, 40);
        assert_eq!(at_double.native_x2, 30);
    }

    #[test]
    fn degenerate_scale_is_rejected() {
        let r = rect(1, 0.0, 0.0, 1.0, 1.0);
        assert!(SelectionReport::from_rect(&r, 0.0).is_none());
        assert!(SelectionReport::from_rect(&r, -1.5).is_none());
        assert!(SelectionReport::from_rect(&r, f32::NAN).is_none());
    }

    #[test]
    fn native_round_trip_stays_within_half_scale() {
        for scale in [0.5_f32, 1.0, 1.5, 2.0, 3.25] {
            for step in 0..4000 {
                let d = step as f32 * 0.37;
                let back = to_native(d, scale) as f64 * f64::from(scale);
                let err = (back - f64::from(d)).abs();
                assert!(
                    err <= f64::from(scale) / 2.0 + 1e-6,
                    "d={d} scale={scale} err={err}"
                );
                // Rounding the mapped-back value to whole pixels adds at most half a pixel
                let rounded_err = (back.round() - f64::from(d)).abs();
                assert!(rounded_err <= f64::from(scale) / 2.0 + 0.5 + 1e-6);
            }
        }
    }

    #[test]
    fn text_block_lists_native_ranges() {
        let report = SelectionReport::from_rect(&rect(2, 10.0, 10.0, 50.0, 80.0), 1.5).unwrap();
        let text = report.to_string();
        assert!(text.starts_with("Selection on page #2"));
        assert!(text.contains("40 x 70 px (area 2800 px²)"));
        assert!(text.ends_with("native:  X 7 - 33, Y 7 - 53"));
    }
}
