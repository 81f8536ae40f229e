use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::Array2;

/// Display color of each human-parsing class, background first.
pub const LABEL_COLOURS: [[u8; 3]; 20] = [
    [0, 0, 0],
    [128, 0, 0],
    [255, 0, 0],
    [0, 85, 0],
    [170, 0, 51],
    [255, 85, 0],
    [0, 0, 85],
    [0, 119, 221],
    [85, 85, 0],
    [0, 85, 85],
    [85, 51, 0],
    [52, 86, 128],
    [0, 128, 0],
    [0, 0, 255],
    [51, 170, 221],
    [0, 255, 255],
    [85, 255, 170],
    [170, 255, 85],
    [255, 255, 0],
    [255, 170, 0],
];

/// Color of a class index; indices outside the table render as background.
#[inline]
pub fn colour_of(label: u8) -> [u8; 3] {
    LABEL_COLOURS
        .get(label as usize)
        .copied()
        .unwrap_or(LABEL_COLOURS[0])
}

/// Render a label map as an RGB visualization.
pub fn decode_labels(labels: &Array2<u8>) -> RgbImage {
    let (height, width) = labels.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        Rgb(colour_of(labels[[y as usize, x as usize]]))
    })
}

/// Store the raw class indices as an 8-bit grayscale image.
pub fn label_image(labels: &Array2<u8>) -> GrayImage {
    let (height, width) = labels.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([labels[[y as usize, x as usize]]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_class_same_colour() {
        for label in 0..20u8 {
            assert_eq!(colour_of(label), colour_of(label));
            assert_eq!(colour_of(label), LABEL_COLOURS[label as usize]);
        }
        assert_eq!(colour_of(2), [255, 0, 0]);
        assert_eq!(colour_of(13), [0, 0, 255]);
        assert_eq!(colour_of(19), [255, 170, 0]);
    }

    #[test]
    fn test_out_of_range_is_black() {
        assert_eq!(colour_of(20), [0, 0, 0]);
        assert_eq!(colour_of(255), [0, 0, 0]);
    }

    #[test]
    fn test_decode_labels_layout() {
        // 2 rows x 3 cols, row-major
        let labels = Array2::from_shape_vec((2, 3), vec![0, 1, 2, 13, 19, 42]).unwrap();
        let img = decode_labels(&labels);

        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 0).0, [128, 0, 0]);
        assert_eq!(img.get_pixel(2, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(2, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_label_image_keeps_indices() {
        let labels = Array2::from_shape_vec((1, 3), vec![0, 7, 19]).unwrap();
        let img = label_image(&labels);
        assert_eq!(img.as_raw(), &vec![0, 7, 19]);
    }
}
