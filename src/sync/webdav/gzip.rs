use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// First two bytes of every gzip member
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}

pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

pub fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_output_carries_magic() {
        let packed = compress(br#"{"update_timestamp":1}"#).unwrap();
        assert!(is_gzip(&packed));
        assert_eq!(decompress(&packed).unwrap(), br#"{"update_timestamp":1}"#);
    }

    #[test]
    fn test_plain_json_is_not_gzip() {
        assert!(!is_gzip(b"{}"));
        assert!(!is_gzip(b"\x1f"));
        assert!(!is_gzip(b""));
    }

    #[test]
    fn test_truncated_stream_fails() {
        let packed = compress(b"some longer payload that will be cut short").unwrap();
        assert!(decompress(&packed[..packed.len() / 2]).is_err());
    }
}
