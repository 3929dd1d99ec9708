//! Minimal zstd frame-header inspection.
//!
//! The codec only needs two facts from a frame before handing it to the
//! decoder: which dictionary (if any) the frame was produced with, and the
//! declared decompressed size. Both live in the fixed-layout frame header,
//! so they can be read without touching any payload byte — which is what
//! makes reject-before-decode dictionary checks possible.

use crate::error::{Error, Result};

/// Magic number opening every zstd frame (little-endian on the wire).
pub const FRAME_MAGIC: u32 = 0xFD2F_B528;

/// Magic number opening a trained dictionary blob, followed by the 4-byte
/// little-endian dictionary id.
pub const DICTIONARY_MAGIC: u32 = 0xEC30_A437;

/// Facts decoded from a zstd frame header.
///
/// `dictionary_id == 0` means the frame does not reference a dictionary.
/// `content_size` is `None` when the encoder did not declare it (streaming
/// encoders usually don't).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub dictionary_id: u32,
    pub content_size: Option<u64>,
}

impl FrameInfo {
    /// Parse the header of `frame`.
    ///
    /// Layout after the 4-byte magic: a descriptor byte whose low two bits
    /// give the dictionary-id field width (0/1/2/4 bytes), bit 5 the
    /// single-segment flag, and the top two bits the content-size field
    /// width; a window-descriptor byte follows unless single-segment.
    pub fn parse(frame: &[u8]) -> Result<Self> {
        if frame.len() < 5 {
            return Err(Error::Corruption(format!(
                "frame header truncated: {} bytes",
                frame.len()
            )));
        }
        let magic = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
        if magic != FRAME_MAGIC {
            return Err(Error::Corruption(format!(
                "bad frame magic {magic:#010x}"
            )));
        }

        let descriptor = frame[4];
        if descriptor & 0x08 != 0 {
            return Err(Error::Corruption(
                "reserved frame descriptor bit set".into(),
            ));
        }
        let single_segment = descriptor & 0x20 != 0;
        let did_len = match descriptor & 0x03 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        let fcs_len = match descriptor >> 6 {
            0 => {
                if single_segment {
                    1
                } else {
                    0
                }
            }
            1 => 2,
            2 => 4,
            _ => 8,
        };

        let mut offset = 5usize;
        if !single_segment {
            offset += 1; // window descriptor
        }
        if frame.len() < offset + did_len + fcs_len {
            return Err(Error::Corruption(format!(
                "frame header truncated: {} bytes, need {}",
                frame.len(),
                offset + did_len + fcs_len
            )));
        }

        let dictionary_id = read_le(&frame[offset..offset + did_len]) as u32;
        offset += did_len;

        let content_size = match fcs_len {
            0 => None,
            1 => Some(frame[offset] as u64),
            2 => Some(read_le(&frame[offset..offset + 2]) + 256),
            _ => Some(read_le(&frame[offset..offset + fcs_len])),
        };

        Ok(Self {
            dictionary_id,
            content_size,
        })
    }
}

/// Little-endian integer of 0–8 bytes.
fn read_le(bytes: &[u8]) -> u64 {
    let mut value = 0u64;
    for (i, b) in bytes.iter().enumerate() {
        value |= (*b as u64) << (8 * i);
    }
    value
}

/// Dictionary id embedded in a trained dictionary blob, or 0 for
/// raw-content dictionaries (no zdict magic).
pub fn dictionary_blob_id(blob: &[u8]) -> u32 {
    if blob.len() >= 8
        && u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]) == DICTIONARY_MAGIC
    {
        u32::from_le_bytes([blob[4], blob[5], blob[6], blob[7]])
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_input() {
        assert!(matches!(
            FrameInfo::parse(&[0x28, 0xB5]),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = FrameInfo::parse(&[0, 1, 2, 3, 4, 5, 6, 7]).unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
    }

    #[test]
    fn parses_real_frame() {
        let data = b"frame header parsing sample payload";
        let compressed = zstd::bulk::compress(data, 3).unwrap();
        let info = FrameInfo::parse(&compressed).unwrap();
        assert_eq!(info.dictionary_id, 0);
        assert_eq!(info.content_size, Some(data.len() as u64));
    }

    #[test]
    fn blob_id_of_raw_content_is_zero() {
        assert_eq!(dictionary_blob_id(b"not a trained dictionary"), 0);
        assert_eq!(dictionary_blob_id(b""), 0);
    }

    #[test]
    fn blob_id_reads_zdict_header() {
        let mut blob = vec![0x37, 0xA4, 0x30, 0xEC];
        blob.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        blob.extend_from_slice(&[0u8; 16]);
        assert_eq!(dictionary_blob_id(&blob), 0xDEAD_BEEF);
    }
}
