//! Renderer wire format.

use serde::{Deserialize, Serialize};

use crate::encode::decode_base64;
use crate::error::{Result, SpriteError};
use crate::types::{CompositeResult, SpriteBatch};

/// End-of-response marker written by the renderer.
pub const SENTINEL: &str = "<<<<ENDIMAGE";

/// Prefix of the composite image data URL.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Request payload passed to the renderer.
#[derive(Debug, Serialize)]
pub struct RenderRequest<'a> {
    pub images: Vec<&'a str>,
    pub spacing: u32,
}

impl<'a> RenderRequest<'a> {
    pub fn from_batch(batch: &'a SpriteBatch) -> Self {
        Self {
            images: batch.images().iter().map(|image| image.data.as_str()).collect(),
            spacing: batch.spacing(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SpriteError::Config {
            message: format!("Failed to serialize renderer request: {}", e),
            help: None,
        })
    }
}

/// Response payload, everything before the sentinel.
#[derive(Debug, Deserialize)]
struct RenderResponse {
    image: String,
    heights: Vec<i64>,
    maxheight: i64,
}

/// Accumulates renderer stdout until the sentinel arrives.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    complete: bool,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Returns true once the sentinel has been seen.
    ///
    /// Only the tail that could straddle the previous chunk boundary is
    /// rescanned.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        if self.complete {
            self.bytes.extend_from_slice(chunk);
            return true;
        }

        let rescan_from = self.bytes.len().saturating_sub(SENTINEL.len() - 1);
        self.bytes.extend_from_slice(chunk);
        self.complete = find(&self.bytes[rescan_from..], SENTINEL.as_bytes()).is_some();
        self.complete
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode accumulated renderer output into a composite for `expected`
/// images.
///
/// The first sentinel is removed and the rest parsed as the response.
pub fn decode_output(output: &[u8], expected: usize) -> Result<CompositeResult> {
    let at = find(output, SENTINEL.as_bytes()).ok_or_else(|| {
        SpriteError::malformed(format!(
            "renderer exited without sending {} ({} byte(s) received)",
            SENTINEL,
            output.len()
        ))
    })?;

    let mut payload = Vec::with_capacity(output.len() - SENTINEL.len());
    payload.extend_from_slice(&output[..at]);
    payload.extend_from_slice(&output[at + SENTINEL.len()..]);

    let response: RenderResponse = serde_json::from_slice(&payload)
        .map_err(|e| SpriteError::malformed(format!("response is not valid JSON: {}", e)))?;

    if response.heights.len() != expected {
        return Err(SpriteError::malformed(format!(
            "renderer returned {} height(s) for {} image(s)",
            response.heights.len(),
            expected
        )));
    }

    let encoded = response
        .image
        .strip_prefix(DATA_URL_PREFIX)
        .unwrap_or(&response.image);
    let image = decode_base64(encoded)
        .map_err(|e| SpriteError::malformed(format!("composite image is not base64: {}", e)))?;

    if image::guess_format(&image).ok() != Some(image::ImageFormat::Png) {
        return Err(SpriteError::malformed("composite image is not a PNG"));
    }

    Ok(CompositeResult::new(image, response.heights, response.maxheight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_base64;
    use crate::types::SpriteImage;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::new(2, 2);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn response(heights: &str, maxheight: i64) -> String {
        format!(
            r#"{{"image":"{}{}","heights":{},"maxheight":{}}}"#,
            DATA_URL_PREFIX,
            encode_base64(&png_bytes()),
            heights,
            maxheight
        )
    }

    #[test]
    fn test_request_json() {
        let batch = SpriteBatch::new(
            vec![SpriteImage::new("a.png", "QUJD"), SpriteImage::new("b.png", "REVG")],
            5,
        );
        let json = RenderRequest::from_batch(&batch).to_json().unwrap();
        assert_eq!(json, r#"{"images":["QUJD","REVG"],"spacing":5}"#);
    }

    #[test]
    fn test_buffer_detects_sentinel_in_one_chunk() {
        let mut buffer = OutputBuffer::new();
        assert!(!buffer.push(b"{\"image\":"));
        assert!(buffer.push(b"\"x\"}<<<<ENDIMAGE"));
        assert!(buffer.is_complete());
    }

    #[test]
    fn test_buffer_detects_sentinel_across_chunks() {
        let mut buffer = OutputBuffer::new();
        assert!(!buffer.push(b"{}<<<"));
        assert!(!buffer.push(b"<END"));
        assert!(buffer.push(b"IMAGE"));
        assert_eq!(buffer.as_bytes(), b"{}<<<<ENDIMAGE");
    }

    #[test]
    fn test_buffer_without_sentinel() {
        let mut buffer = OutputBuffer::new();
        buffer.push(b"<<<<ENDIMAG");
        buffer.push(b"");
        assert!(!buffer.is_complete());
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn test_decode_output() {
        let output = format!("{}{}", response("[4,8]", 8), SENTINEL);
        let result = decode_output(output.as_bytes(), 2).unwrap();

        assert_eq!(result.heights(), &[4, 8]);
        assert_eq!(result.max_height(), 8);
        assert_eq!(result.image(), png_bytes().as_slice());
    }

    #[test]
    fn test_decode_output_trailing_bytes_after_sentinel() {
        let output = format!("{}{}\n", response("[1]", 1), SENTINEL);
        assert!(decode_output(output.as_bytes(), 1).is_ok());
    }

    #[test]
    fn test_decode_output_missing_sentinel() {
        let err = decode_output(response("[1]", 1).as_bytes(), 1).unwrap_err();
        assert!(matches!(err, SpriteError::MalformedRendererOutput { .. }));
    }

    #[test]
    fn test_decode_output_not_json() {
        let err = decode_output(b"PhantomJS crashed<<<<ENDIMAGE", 1).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_decode_output_height_count_mismatch() {
        let output = format!("{}{}", response("[1,2,3]", 3), SENTINEL);
        let err = decode_output(output.as_bytes(), 2).unwrap_err();
        assert!(err.to_string().contains("3 height(s) for 2 image(s)"));
    }

    #[test]
    fn test_decode_output_rejects_non_png() {
        let output = format!(
            r#"{{"image":"{}{}","heights":[1],"maxheight":1}}{}"#,
            DATA_URL_PREFIX,
            encode_base64(b"GIF89a"),
            SENTINEL
        );
        let err = decode_output(output.as_bytes(), 1).unwrap_err();
        assert!(err.to_string().contains("not a PNG"));
    }
}
