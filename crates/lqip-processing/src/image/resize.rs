use image::imageops::FilterType;

/// Target dimensions for a width-bound proportional resize.
///
/// Height follows the source aspect ratio and never drops below one pixel.
pub fn scaled_dimensions(orig_width: u32, orig_height: u32, target_width: u32) -> (u32, u32) {
    let width = target_width.max(1);
    let aspect_ratio = orig_height as f64 / orig_width.max(1) as f64;
    let height = (width as f64 * aspect_ratio).round() as u32;
    (width, height.max(1))
}

/// Select a resampling filter based on the resize ratio.
///
/// Large reductions use a triangle filter, which the resizer widens to cover the
/// whole source footprint of each output pixel. Nearest-neighbour is never used.
pub fn select_filter(orig_width: u32, orig_height: u32, new_width: u32, new_height: u32) -> FilterType {
    let width_ratio = orig_width as f32 / new_width.max(1) as f32;
    let height_ratio = orig_height as f32 / new_height.max(1) as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_aspect_ratio() {
        assert_eq!(scaled_dimensions(120, 90, 8), (8, 6));
        assert_eq!(scaled_dimensions(50, 50, 8), (8, 8));
        assert_eq!(scaled_dimensions(1920, 1080, 8), (8, 5));
        assert_eq!(scaled_dimensions(300, 1000, 8), (8, 27));
    }

    #[test]
    fn height_never_zero() {
        assert_eq!(scaled_dimensions(4000, 10, 8), (8, 1));
    }

    #[test]
    fn small_sources_are_scaled_to_target_width() {
        assert_eq!(scaled_dimensions(4, 2, 8), (8, 4));
    }

    #[test]
    fn filter_by_ratio() {
        assert_eq!(select_filter(1200, 900, 8, 6), FilterType::Triangle);
        assert_eq!(select_filter(14, 14, 8, 8), FilterType::CatmullRom);
        assert_eq!(select_filter(10, 10, 8, 8), FilterType::Lanczos3);
    }
}
