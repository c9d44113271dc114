use shared::ReportShapeInfo;

use super::decoder;

pub const REPORT_ASPECT_RATIO: f64 = 1.5;

/// A multi-lead report sheet is wider than tall with a ratio strictly above 1.5.
pub fn is_report_shape(width: u32, height: u32) -> bool {
    width > height && f64::from(width) / f64::from(height) > REPORT_ASPECT_RATIO
}

/// Never fails: unreadable dimensions are reported inside the returned info.
pub fn detect(bytes: &[u8]) -> ReportShapeInfo {
    match decoder::dimensions(bytes) {
        Ok((_, 0)) => {
            log::error!("ECG type detection failed: image height is zero");
            ReportShapeInfo::failed("division by zero")
        }
        Ok((width, height)) => ReportShapeInfo::measured(is_report_shape(width, height), width, height),
        Err(e) => {
            log::error!("ECG type detection failed: {}", e);
            ReportShapeInfo::failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecg::test_support::png;

    #[test]
    fn ratio_boundary_is_strict() {
        assert!(!is_report_shape(300, 200));
        assert!(is_report_shape(301, 200));
        assert!(!is_report_shape(400, 400));
        assert!(!is_report_shape(200, 400));
        assert!(is_report_shape(1600, 1000));
    }

    #[test]
    fn detect_reports_dimensions() {
        let info = detect(&png(1920, 1080));
        assert_eq!(info, ReportShapeInfo::measured(true, 1920, 1080));

        let info = detect(&png(400, 400));
        assert!(!info.is_ecg_report);
        assert_eq!(info.image_width, Some(400));
        assert!(info.error.is_none());
    }

    #[test]
    fn detect_captures_read_errors() {
        let info = detect(&[0u8; 10]);
        assert!(!info.is_ecg_report);
        assert!(info.image_width.is_none());
        assert!(info.image_height.is_none());
        assert!(info.error.is_some());
    }
}
