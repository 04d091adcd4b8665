//! Change-region extraction: connected blobs of the change mask, area
//! filtered, with centroids from first-order moments.

use crate::contour::{external_contours, polygon_moments};
use crate::types::{ChangeRegion, GrayImage};

/// Regions that survived filtering plus a count of those that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionExtraction {
    /// Regions at or above the minimum area, in contour-tracing order.
    pub regions: Vec<ChangeRegion>,
    /// Regions discarded as noise (too small, or zero area).
    pub rejected: usize,
}

/// Extract change regions from a binary change mask.
///
/// Each external contour is measured with polygon moments. Regions whose
/// area is below `min_area` are dropped, as are zero-area slivers whose
/// centroid is undefined. Every surviving region is reported; nothing
/// caps how many.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn extract_regions(mask: &GrayImage, min_area: f64) -> RegionExtraction {
    let mut extraction = RegionExtraction::default();

    for contour in external_contours(mask) {
        let moments = polygon_moments(contour.points());
        if moments.m00 < min_area {
            extraction.rejected += 1;
            continue;
        }
        let Some(centroid) = moments.centroid() else {
            extraction.rejected += 1;
            continue;
        };

        log::trace!(
            "region area={:.1} centroid=({:.1}, {:.1})",
            moments.m00,
            centroid.x,
            centroid.y
        );
        extraction.regions.push(ChangeRegion {
            area: moments.m00,
            centroid: (centroid.x as u32, centroid.y as u32),
            contour,
        });
    }

    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    const WHITE: Luma<u8> = Luma([255]);

    #[test]
    fn empty_mask_has_no_regions() {
        let extraction = extract_regions(&GrayImage::new(50, 50), 0.0);
        assert!(extraction.regions.is_empty());
        assert_eq!(extraction.rejected, 0);
    }

    #[test]
    fn centroid_of_square_blob() {
        let mut mask = GrayImage::new(200, 200);
        draw_filled_rect_mut(&mut mask, Rect::at(40, 60).of_size(51, 51), WHITE);

        let extraction = extract_regions(&mask, 100.0);
        assert_eq!(extraction.regions.len(), 1);
        let region = &extraction.regions[0];
        assert_eq!(region.centroid, (65, 85));
        assert!((region.area - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn small_regions_are_rejected() {
        let mut mask = GrayImage::new(300, 300);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(60, 60), WHITE);
        draw_filled_rect_mut(&mut mask, Rect::at(200, 200).of_size(10, 10), WHITE);
        draw_filled_circle_mut(&mut mask, (150, 40), 4, WHITE);

        let extraction = extract_regions(&mask, 2000.0);
        assert_eq!(extraction.regions.len(), 1);
        assert_eq!(extraction.rejected, 2);
        assert_eq!(extraction.regions[0].centroid, (39, 39));
    }

    #[test]
    fn area_equal_to_threshold_is_kept() {
        let mut mask = GrayImage::new(100, 100);
        // Contour area of a filled n x n block is (n - 1)^2.
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(41, 41), WHITE);
        assert_eq!(extract_regions(&mask, 1600.0).regions.len(), 1);
        assert_eq!(extract_regions(&mask, 1600.5).regions.len(), 0);
    }

    #[test]
    fn single_pixel_line_has_no_centroid() {
        let mut mask = GrayImage::new(50, 50);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 20).of_size(30, 1), WHITE);
        let extraction = extract_regions(&mask, 0.0);
        assert!(extraction.regions.is_empty());
        assert_eq!(extraction.rejected, 1);
    }

    #[test]
    fn every_surviving_region_is_reported() {
        let mut mask = GrayImage::new(400, 400);
        for i in 0..6 {
            draw_filled_rect_mut(&mut mask, Rect::at(10 + i * 60, 100).of_size(50, 50), WHITE);
        }
        assert_eq!(extract_regions(&mask, 2000.0).regions.len(), 6);
    }
}
