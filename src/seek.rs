use crate::error::{RenderError, RenderResult};

/// Horizontal inset of the seek bar from each edge of the viewport, in CSS px.
pub const SEEK_MARGIN_PX: f64 = 16.0;

/// Proportion of a round's total frame length corresponding to a desired
/// start frame. Half a frame is added so the jump lands inside the start
/// frame rather than on its leading edge.
pub fn seek_fraction(start: u64, total_frames: u64) -> RenderResult<f64> {
    if total_frames == 0 {
        return Err(RenderError::validation(
            "invalid replay data: round has zero total frames",
        ));
    }
    Ok((start as f64 + 0.5) / total_frames as f64)
}

/// Maps a seek fraction onto a clientX coordinate on the seek bar.
pub fn seek_x(fraction: f64, viewport_width: f64) -> f64 {
    SEEK_MARGIN_PX + fraction * (viewport_width - 2.0 * SEEK_MARGIN_PX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_adds_half_a_frame() {
        assert_eq!(seek_fraction(100, 1000).unwrap(), 0.1005);
        assert_eq!(seek_fraction(0, 10).unwrap(), 0.05);
    }

    #[test]
    fn fraction_rejects_zero_length_round() {
        assert!(seek_fraction(0, 0).is_err());
    }

    #[test]
    fn pixel_mapping_matches_known_viewport() {
        // 1920 wide viewport leaves 1888 usable px between the margins.
        let x = seek_x(seek_fraction(100, 1000).unwrap(), 1920.0);
        assert!((x - 205.744).abs() < 1e-9, "got {x}");
    }

    #[test]
    fn pixel_mapping_is_bounded_by_margins() {
        assert_eq!(seek_x(0.0, 1920.0), SEEK_MARGIN_PX);
        assert_eq!(seek_x(1.0, 1920.0), 1920.0 - SEEK_MARGIN_PX);
    }
}
