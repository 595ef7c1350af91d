//! Small geometry utilities around pixel boxes and geotransforms

use crate::types::{GeoTransform, PixelPoint};

/// Clockwise angle in degrees [0, 360) between north (+y) and the vector (x, y).
pub fn angle_to_north(xy: (f64, f64)) -> f64 {
    let (x, y) = xy;
    let angle = (90.0 - y.atan2(x).to_degrees()).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

/// [`angle_to_north`] for a sequence of vectors.
pub fn angle_to_north_batch(vectors: &[(f64, f64)]) -> Vec<f64> {
    vectors.iter().map(|&xy| angle_to_north(xy)).collect()
}

/// Geotransform of a sub-array whose upper-left pixel is `subset_box[0]`.
///
/// `subset_box` is [UL, UR, LR, LL] in pixel (row, col) space.
pub fn get_subset_geotransform(full_gt: &GeoTransform, subset_box: &[PixelPoint; 4]) -> GeoTransform {
    let origin = full_gt.pixel_to_map(subset_box[0]);
    GeoTransform {
        top_left_x: origin.x,
        top_left_y: origin.y,
        ..*full_gt
    }
}

/// GDAL read window `(col_start, row_start, cols_count, rows_count)` for a
/// [UL, UR, LR, LL] pixel box.
pub fn get_gdal_read_inputs_from_box(box_im: &[PixelPoint; 4]) -> (usize, usize, usize, usize) {
    let ul = box_im[0];
    let ur = box_im[1];
    let ll = box_im[3];
    let clip_size_x = ur.col.abs_diff(ul.col);
    let clip_size_y = ul.row.abs_diff(ll.row);
    (ul.col, ul.row, clip_size_x, clip_size_y)
}

/// Array position `(row_start, row_end, col_start, col_end)` for a
/// [UL, UR, LR, LL] pixel box.
pub fn get_array_position_from_box(box_im: &[PixelPoint; 4]) -> (usize, usize, usize, usize) {
    let ul = box_im[0];
    let lr = box_im[2];
    (ul.row, lr.row, ul.col, lr.col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_box() -> [PixelPoint; 4] {
        [
            PixelPoint::new(0, 0),
            PixelPoint::new(0, 9),
            PixelPoint::new(9, 9),
            PixelPoint::new(9, 0),
        ]
    }

    #[test]
    fn test_angle_to_north_cardinal_directions() {
        assert_relative_eq!(angle_to_north((0.0, 1.0)), 0.0, epsilon = 1e-9);
        assert_relative_eq!(angle_to_north((1.0, 0.0)), 90.0, epsilon = 1e-9);
        assert_relative_eq!(angle_to_north((0.0, -1.0)), 180.0, epsilon = 1e-9);
        assert_relative_eq!(angle_to_north((-1.0, 0.0)), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_to_north_diagonals() {
        assert_relative_eq!(angle_to_north((1.0, 1.0)), 45.0, epsilon = 1e-9);
        assert_relative_eq!(angle_to_north((-1.0, 1.0)), 315.0, epsilon = 1e-9);
        assert_relative_eq!(angle_to_north((-3.0, -3.0)), 225.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_to_north_batch_matches_single() {
        let vectors = vec![(0.0, 1.0), (1.0, 0.0), (0.5, -2.0)];
        let angles = angle_to_north_batch(&vectors);
        assert_eq!(angles.len(), 3);
        for (angle, xy) in angles.iter().zip(vectors.iter()) {
            assert_eq!(*angle, angle_to_north(*xy));
            assert!(*angle >= 0.0 && *angle < 360.0);
        }
    }

    #[test]
    fn test_gdal_read_inputs() {
        assert_eq!(get_gdal_read_inputs_from_box(&square_box()), (0, 0, 9, 9));

        let offset = [
            PixelPoint::new(4, 10),
            PixelPoint::new(4, 30),
            PixelPoint::new(12, 30),
            PixelPoint::new(12, 10),
        ];
        assert_eq!(get_gdal_read_inputs_from_box(&offset), (10, 4, 20, 8));
    }

    #[test]
    fn test_array_position_agrees_with_read_window() {
        let boxes = [
            square_box(),
            [
                PixelPoint::new(4, 10),
                PixelPoint::new(4, 30),
                PixelPoint::new(12, 30),
                PixelPoint::new(12, 10),
            ],
        ];
        for b in boxes.iter() {
            let (col_start, row_start, width, height) = get_gdal_read_inputs_from_box(b);
            let (rs, re, cs, ce) = get_array_position_from_box(b);
            assert_eq!(rs, row_start);
            assert_eq!(cs, col_start);
            assert_eq!(re - rs, height);
            assert_eq!(ce - cs, width);
        }
    }

    #[test]
    fn test_subset_geotransform() {
        let gt = GeoTransform::from_gdal([500000.0, 30.0, 0.0, 4200000.0, 0.0, -30.0]);
        let subset_box = [
            PixelPoint::new(10, 20),
            PixelPoint::new(10, 40),
            PixelPoint::new(30, 40),
            PixelPoint::new(30, 20),
        ];

        let subset = get_subset_geotransform(&gt, &subset_box);
        assert_relative_eq!(subset.top_left_x, 500600.0);
        assert_relative_eq!(subset.top_left_y, 4199700.0);
        assert_eq!(subset.pixel_width, gt.pixel_width);
        assert_eq!(subset.pixel_height, gt.pixel_height);

        // deterministic for the same UL pixel
        assert_eq!(get_subset_geotransform(&gt, &subset_box), subset);
    }
}
