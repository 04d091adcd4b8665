//! Visual overlays for inspecting a diff.
//!
//! Pure functions: each takes an image by reference and returns an
//! annotated copy.

use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::grid::BOARD_CELLS;
use crate::notation::Square;
use crate::types::{ChangeRegion, Point, Quad, RgbImage};

const GRID_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTROID_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const SQUARE_COLOR: Rgb<u8> = Rgb([0, 128, 255]);
const BORDER_COLOR: Rgb<u8> = Rgb([0, 255, 255]);

const CENTROID_RADIUS: i32 = 6;
const CORNER_RADIUS: i32 = 8;

/// Draw the 8x8 grid, each region's contour and centroid, and an outline
/// around every changed square onto a copy of `board`.
#[must_use = "returns the annotated board"]
pub fn annotate_changes(board: &RgbImage, regions: &[ChangeRegion], squares: &[Square]) -> RgbImage {
    let mut canvas = board.clone();
    let (width, height) = canvas.dimensions();
    let cell_width = width / BOARD_CELLS;
    let cell_height = height / BOARD_CELLS;

    for i in 1..BOARD_CELLS {
        let x = px(i * cell_width);
        let y = px(i * cell_height);
        draw_line_segment_mut(&mut canvas, (x, 0.0), (x, px(height)), GRID_COLOR);
        draw_line_segment_mut(&mut canvas, (0.0, y), (px(width), y), GRID_COLOR);
    }

    if cell_width > 2 && cell_height > 2 {
        for square in squares {
            let cell = square.cell();
            #[allow(clippy::cast_possible_wrap)]
            let rect = Rect::at(
                (cell.col * cell_width + 1) as i32,
                (cell.row * cell_height + 1) as i32,
            )
            .of_size(cell_width - 2, cell_height - 2);
            draw_hollow_rect_mut(&mut canvas, rect, SQUARE_COLOR);
        }
    }

    for region in regions {
        draw_closed(&mut canvas, region.contour.points(), CONTOUR_COLOR);
        #[allow(clippy::cast_possible_wrap)]
        let (cx, cy) = (region.centroid.0 as i32, region.centroid.1 as i32);
        draw_filled_circle_mut(&mut canvas, (cx, cy), CENTROID_RADIUS, CENTROID_COLOR);
    }

    canvas
}

/// Outline the detected border on a copy of the oriented frame, with a
/// dot on each corner.
#[must_use = "returns the annotated frame"]
pub fn annotate_border(frame: &RgbImage, quad: &Quad) -> RgbImage {
    let mut canvas = frame.clone();
    let corners = quad.corners();
    draw_closed(&mut canvas, &corners, BORDER_COLOR);
    for corner in corners {
        #[allow(clippy::cast_possible_truncation)]
        let center = (corner.x.round() as i32, corner.y.round() as i32);
        draw_filled_circle_mut(&mut canvas, center, CORNER_RADIUS, BORDER_COLOR);
    }
    canvas
}

/// Draw a closed polyline.
#[allow(clippy::cast_possible_truncation)]
fn draw_closed(canvas: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    let Some(&last) = points.last() else {
        return;
    };
    let mut prev = last;
    for &p in points {
        draw_line_segment_mut(
            canvas,
            (prev.x as f32, prev.y as f32),
            (p.x as f32, p.y as f32),
            color,
        );
        prev = p;
    }
}

#[allow(clippy::cast_precision_loss)]
const fn px(v: u32) -> f32 {
    v as f32
}
