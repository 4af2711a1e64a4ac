//! The encoded image artifact and its binary wire format.
//!
//! An [`Artifact`] is an immutable `(format, bytes)` pair: the format names a
//! registered codec (`"jpeg"`, `"png"`, ...) and the bytes are the fully
//! encoded payload. Artifacts are what enter and leave the pipeline, and what
//! a cache stores.
//!
//! ## Wire format
//!
//! ```text
//! +-----------------+--------------+-----------------+------------+
//! | format len (u32 LE) | format bytes | data len (u32 LE) | data bytes |
//! +-----------------+--------------+-----------------+------------+
//! ```
//!
//! No padding, no checksum, no trailing bytes. Both lengths are capped by
//! [`FORMAT_MAX_LEN`] and [`DATA_MAX_LEN`], checked on write and, on read,
//! before the field itself is touched.

use thiserror::Error;

/// Maximum length of the format tag, in bytes.
pub const FORMAT_MAX_LEN: usize = 1 << 8;

/// Maximum length of the encoded payload, in bytes (1 GiB).
pub const DATA_MAX_LEN: usize = 1 << 30;

const LEN_SIZE: usize = 4;

/// Structural problem with an artifact: oversized or truncated wire data,
/// undecodable payload, or a payload whose real format differs from its tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("image error: {message}")]
pub struct ImageError {
    pub message: String,
}

impl ImageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An encoded image. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Artifact {
    format: String,
    data: Vec<u8>,
}

impl Artifact {
    pub fn new(format: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            format: format.into(),
            data,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Serialize to the wire format. Every call returns a freshly allocated
    /// buffer that shares nothing with earlier results.
    pub fn marshal_binary(&self) -> Result<Vec<u8>, ImageError> {
        check_lengths(self.format.len(), self.data.len())?;

        let mut buf = Vec::with_capacity(LEN_SIZE * 2 + self.format.len() + self.data.len());
        buf.extend_from_slice(&(self.format.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.format.as_bytes());
        buf.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }

    /// Parse the wire format. The returned artifact owns copies of the
    /// format and data; `input` is not retained.
    pub fn unmarshal_binary(input: &[u8]) -> Result<Self, ImageError> {
        let mut reader = Reader { input, pos: 0 };

        let format_len = reader.read_len("format length")?;
        if format_len > FORMAT_MAX_LEN {
            return Err(ImageError::new(format!(
                "format length {format_len} exceeds maximum {FORMAT_MAX_LEN}"
            )));
        }
        let format = reader.read_bytes(format_len, "format")?;
        let format = std::str::from_utf8(format)
            .map_err(|e| ImageError::new(format!("format is not valid UTF-8: {e}")))?
            .to_string();

        let data_len = reader.read_len("data length")?;
        if data_len > DATA_MAX_LEN {
            return Err(ImageError::new(format!(
                "data length {data_len} exceeds maximum {DATA_MAX_LEN}"
            )));
        }
        let data = reader.read_bytes(data_len, "data")?.to_vec();

        if reader.remaining() != 0 {
            return Err(ImageError::new(format!(
                "{} unexpected trailing bytes",
                reader.remaining()
            )));
        }

        Ok(Self { format, data })
    }
}

/// `None`-aware equality: both absent, or both present with the same format
/// and byte content.
pub fn equal(a: Option<&Artifact>, b: Option<&Artifact>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.format == b.format && a.data == b.data,
        _ => false,
    }
}

/// Validate field lengths against the protocol limits.
fn check_lengths(format_len: usize, data_len: usize) -> Result<(), ImageError> {
    if format_len > FORMAT_MAX_LEN {
        return Err(ImageError::new(format!(
            "format length {format_len} exceeds maximum {FORMAT_MAX_LEN}"
        )));
    }
    if data_len > DATA_MAX_LEN {
        return Err(ImageError::new(format!(
            "data length {data_len} exceeds maximum {DATA_MAX_LEN}"
        )));
    }
    Ok(())
}

/// Bounds-checked cursor over the wire bytes.
struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn read_bytes(&mut self, n: usize, field: &str) -> Result<&'a [u8], ImageError> {
        if self.remaining() < n {
            return Err(ImageError::new(format!(
                "unexpected end of data reading {field}: need {n} bytes, have {}",
                self.remaining()
            )));
        }
        let bytes = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_len(&mut self, field: &str) -> Result<usize, ImageError> {
        let bytes = self.read_bytes(LEN_SIZE, field)?;
        let mut le = [0u8; LEN_SIZE];
        le.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(le) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn medium() -> Artifact {
        Artifact::new("jpeg", (0..=255u8).cycle().take(4096).collect())
    }

    fn small() -> Artifact {
        Artifact::new("jpeg", vec![1, 2, 3, 4, 5, 6, 7, 8])
    }

    fn animated() -> Artifact {
        Artifact::new("gif", medium().into_data())
    }

    #[test]
    fn marshal_layout() {
        let bytes = Artifact::new("png", vec![0xAA, 0xBB]).marshal_binary().unwrap();
        assert_eq!(
            bytes,
            vec![3, 0, 0, 0, b'p', b'n', b'g', 2, 0, 0, 0, 0xAA, 0xBB]
        );
    }

    #[test]
    fn marshal_roundtrip() {
        let im = medium();
        let back = Artifact::unmarshal_binary(&im.marshal_binary().unwrap()).unwrap();
        assert!(equal(Some(&back), Some(&im)));
    }

    #[test]
    fn marshal_roundtrip_empty_fields() {
        let im = Artifact::default();
        let bytes = im.marshal_binary().unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(Artifact::unmarshal_binary(&bytes).unwrap(), im);
    }

    #[test]
    fn marshal_rejects_long_format() {
        let im = Artifact::new("a".repeat(FORMAT_MAX_LEN + 1), vec![]);
        assert!(im.marshal_binary().is_err());
    }

    #[test]
    fn marshal_accepts_format_at_limit() {
        let im = Artifact::new("a".repeat(FORMAT_MAX_LEN), vec![1]);
        let back = Artifact::unmarshal_binary(&im.marshal_binary().unwrap()).unwrap();
        assert_eq!(back, im);
    }

    #[test]
    fn length_check_rejects_long_data() {
        // Allocating a real 1 GiB payload is not worth it; exercise the guard
        // marshal_binary runs first.
        assert!(check_lengths(0, DATA_MAX_LEN).is_ok());
        assert!(check_lengths(0, DATA_MAX_LEN + 1).is_err());
        assert!(check_lengths(FORMAT_MAX_LEN + 1, 0).is_err());
    }

    #[test]
    fn unmarshal_truncated_at_each_boundary() {
        let im = medium();
        let data = im.marshal_binary().unwrap();
        // Always truncate one byte short of each field's end.
        let mut end = 0;
        for field_len in [4, im.format().len(), 4, im.data().len()] {
            end += field_len;
            let err = Artifact::unmarshal_binary(&data[..end - 1]).unwrap_err();
            assert!(err.message.contains("unexpected end of data"), "{err}");
        }
    }

    #[test]
    fn unmarshal_rejects_format_len_over_limit() {
        let mut data = medium().marshal_binary().unwrap();
        data[0..4].copy_from_slice(&((FORMAT_MAX_LEN + 1) as u32).to_le_bytes());
        let err = Artifact::unmarshal_binary(&data).unwrap_err();
        assert!(err.message.contains("format length"));
    }

    #[test]
    fn unmarshal_rejects_data_len_over_limit() {
        let im = medium();
        let mut data = im.marshal_binary().unwrap();
        let pos = 4 + im.format().len();
        data[pos..pos + 4].copy_from_slice(&((DATA_MAX_LEN + 1) as u32).to_le_bytes());
        let err = Artifact::unmarshal_binary(&data).unwrap_err();
        assert!(err.message.contains("data length"));
    }

    #[test]
    fn unmarshal_rejects_trailing_bytes() {
        let mut data = small().marshal_binary().unwrap();
        data.push(0);
        assert!(Artifact::unmarshal_binary(&data).is_err());
    }

    #[test]
    fn unmarshal_rejects_non_utf8_format() {
        let data = vec![2, 0, 0, 0, 0xFF, 0xFE, 0, 0, 0, 0];
        assert!(Artifact::unmarshal_binary(&data).is_err());
    }

    #[test]
    fn successive_marshals_do_not_share_storage() {
        let mut d1 = small().marshal_binary().unwrap();
        let d2 = medium().marshal_binary().unwrap();

        let im1 = Artifact::unmarshal_binary(&d1).unwrap();
        let im2 = Artifact::unmarshal_binary(&d2).unwrap();

        // Scribbling on the first buffer and re-marshaling must not leak
        // into anything decoded earlier.
        d1.iter_mut().for_each(|b| *b = 0xFF);
        let _again = medium().marshal_binary().unwrap();

        assert_eq!(im1, small());
        assert_eq!(im2, medium());
    }

    #[test]
    fn equal_truth_table() {
        let m = medium();
        let copy = m.clone();
        let anim = animated();
        let sm = small();
        let cases: [(Option<&Artifact>, Option<&Artifact>, bool, &str); 7] = [
            (None, None, true, "both none"),
            (None, Some(&m), false, "none / some"),
            (Some(&m), None, false, "some / none"),
            (Some(&m), Some(&m), true, "same"),
            (Some(&m), Some(&copy), true, "copy"),
            (Some(&m), Some(&anim), false, "different format"),
            (Some(&m), Some(&sm), false, "different data"),
        ];
        for (a, b, expected, description) in cases {
            assert_eq!(equal(a, b), expected, "{description}");
        }
    }

    #[test]
    fn image_error_display() {
        assert_eq!(ImageError::new("test").to_string(), "image error: test");
    }

    proptest! {
        #[test]
        fn roundtrip_any_artifact(
            format in "[a-z0-9]{0,32}",
            data in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let im = Artifact::new(format, data);
            let back = Artifact::unmarshal_binary(&im.marshal_binary().unwrap()).unwrap();
            prop_assert!(equal(Some(&back), Some(&im)));
        }
    }
}
