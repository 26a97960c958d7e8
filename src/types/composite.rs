//! Decoded renderer response.

/// The composite sprite image and the per-image packing heights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeResult {
    image: Vec<u8>,
    heights: Vec<i64>,
    max_height: i64,
}

impl CompositeResult {
    /// Create a result. `heights` is index-aligned with the batch it was
    /// rendered from.
    pub fn new(image: Vec<u8>, heights: Vec<i64>, max_height: i64) -> Self {
        Self {
            image,
            heights,
            max_height,
        }
    }

    /// Encoded composite image (PNG).
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn heights(&self) -> &[i64] {
        &self.heights
    }

    /// Height of the tallest packed image; the vertical anchor for offsets.
    pub fn max_height(&self) -> i64 {
        self.max_height
    }

    /// Vertical background offset of every image, in batch order.
    ///
    /// The tallest image sits at 0; every other offset is negative.
    pub fn offsets(&self) -> impl Iterator<Item = i64> + '_ {
        self.heights
            .iter()
            .map(move |&height| offset(height, self.max_height))
    }

    /// Pixel dimensions of the composite, if the image header can be read.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::ImageReader::new(std::io::Cursor::new(&self.image))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

/// Offset of an image of `height` within a strip anchored at `max_height`.
pub fn offset(height: i64, max_height: i64) -> i64 {
    height - max_height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_tallest_is_zero() {
        assert_eq!(offset(32, 32), 0);
        assert_eq!(offset(16, 32), -16);
    }

    #[test]
    fn test_offsets_in_order() {
        let result = CompositeResult::new(vec![], vec![10, 30, 0], 30);
        let offsets: Vec<i64> = result.offsets().collect();
        assert_eq!(offsets, vec![-20, 0, -30]);
        assert!(offsets.iter().all(|&o| o <= 0));
    }

    #[test]
    fn test_dimensions_unreadable() {
        let result = CompositeResult::new(b"not an image".to_vec(), vec![], 0);
        assert_eq!(result.dimensions(), None);
    }

    #[test]
    fn test_dimensions_png() {
        let img = image::RgbaImage::new(3, 7);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let result = CompositeResult::new(bytes, vec![7], 7);
        assert_eq!(result.dimensions(), Some((3, 7)));
    }
}
