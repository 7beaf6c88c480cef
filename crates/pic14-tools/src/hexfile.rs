//! Intel HEX images of 14-bit program words.
//!
//! Each program word occupies two bytes, little-endian, at byte address
//! `2 * word_address`. Record checksums are verified by the `ihex` reader.

use std::fs;
use std::path::Path;

use ihex::{Reader, Record};
use tracing::debug;

use crate::errors::HexError;
use crate::image::ProgramImage;

/// Bytes per data record written.
pub const RECORD_BYTES: usize = 16;

/// Parses HEX text into a program image.
///
/// # Errors
///
/// Record syntax and checksum errors, and data that is not word aligned.
pub fn read_hex(text: &str) -> Result<ProgramImage, HexError> {
    let mut image = ProgramImage::new();
    let mut upper: u32 = 0;
    for record in Reader::new(text) {
        match record? {
            Record::Data { offset, value } => {
                let address = upper + u32::from(offset);
                if address & 1 != 0 || value.len() & 1 != 0 {
                    return Err(HexError::Misaligned { address });
                }
                let base = address / 2;
                for (word_address, pair) in (base..).zip(value.chunks_exact(2)) {
                    image.insert(word_address, u16::from_le_bytes([pair[0], pair[1]]));
                }
            }
            Record::ExtendedLinearAddress(high) => upper = u32::from(high) << 16,
            Record::ExtendedSegmentAddress(segment) => upper = u32::from(segment) << 4,
            Record::EndOfFile => break,
            Record::StartSegmentAddress { .. } | Record::StartLinearAddress(_) => {}
        }
    }
    debug!(words = image.len(), "read HEX image");
    Ok(image)
}

/// Reads a HEX file.
///
/// # Errors
///
/// I/O failures and [`read_hex`] errors.
pub fn load_hex(path: &Path) -> Result<ProgramImage, HexError> {
    read_hex(&fs::read_to_string(path)?)
}

/// Serializes an image as 16-byte data records followed by an EOF record.
///
/// # Errors
///
/// [`HexError::Write`] if the record stream cannot be represented.
pub fn write_hex(image: &ProgramImage) -> Result<String, HexError> {
    let mut records = Vec::new();
    let mut upper: u16 = 0;
    let mut pending: Option<(u32, Vec<u8>)> = None;

    for (address, word) in image.iter() {
        let byte = address.saturating_mul(2);
        let continues = pending.as_ref().is_some_and(|(start, bytes)| {
            u32::try_from(bytes.len()).is_ok_and(|len| start + len == byte)
                && bytes.len() < RECORD_BYTES
                && start >> 16 == byte >> 16
        });
        if !continues {
            if let Some((start, bytes)) = pending.take() {
                push_data(&mut records, &mut upper, start, bytes);
            }
            pending = Some((byte, Vec::with_capacity(RECORD_BYTES)));
        }
        if let Some((_, bytes)) = pending.as_mut() {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
    }
    if let Some((start, bytes)) = pending {
        push_data(&mut records, &mut upper, start, bytes);
    }
    records.push(Record::EndOfFile);
    Ok(ihex::create_object_file_representation(&records)?)
}

/// Writes an image to `path`.
///
/// # Errors
///
/// Serialization and I/O failures.
pub fn save_hex(path: &Path, image: &ProgramImage) -> Result<(), HexError> {
    fs::write(path, write_hex(image)?)?;
    Ok(())
}

fn push_data(records: &mut Vec<Record>, upper: &mut u16, start: u32, bytes: Vec<u8>) {
    let high = u16::try_from(start >> 16).unwrap_or(u16::MAX);
    if high != *upper {
        records.push(Record::ExtendedLinearAddress(high));
        *upper = high;
    }
    records.push(Record::Data {
        offset: u16::try_from(start & 0xFFFF).unwrap_or_default(),
        value: bytes,
    });
}

#[cfg(test)]
mod tests {
    use ihex::Record;

    use super::{load_hex, read_hex, save_hex, write_hex};
    use crate::errors::HexError;
    use crate::image::ProgramImage;

    #[test]
    fn reads_little_endian_words() {
        let image = read_hex(":040000001030A0001C\n:00000001FF\n").expect("valid");
        assert_eq!(image.get(0), Some(0x3010));
        assert_eq!(image.get(1), Some(0x00A0));
        assert_eq!(image.len(), 2);
    }

    #[test]
    fn bad_checksum_is_rejected() {
        assert!(matches!(
            read_hex(":040000001030A0001D\n:00000001FF\n"),
            Err(HexError::Read(_))
        ));
    }

    #[test]
    fn config_word_lands_above_program_memory() {
        let image: ProgramImage = [(0, 0x3010), (0x8007, 0x3FE4)].into_iter().collect();
        let text = write_hex(&image).expect("writes");
        assert_eq!(read_hex(&text).expect("reads"), image);
        let upper: Vec<String> = text.lines().map(str::to_ascii_uppercase).collect();
        assert!(upper.contains(&":020000040001F9".to_owned()));
        assert_eq!(upper.last().map(String::as_str), Some(":00000001FF"));
    }

    #[test]
    fn long_runs_split_into_sixteen_byte_records() {
        let image: ProgramImage = (0..20).map(|address| (address, 0x0000)).collect();
        let text = write_hex(&image).expect("writes");
        assert_eq!(text.lines().filter(|line| !line.is_empty()).count(), 4);
        assert_eq!(read_hex(&text).expect("reads"), image);
    }

    #[test]
    fn odd_byte_address_is_misaligned() {
        let text = ihex::create_object_file_representation(&[
            Record::Data {
                offset: 1,
                value: vec![0, 0],
            },
            Record::EndOfFile,
        ])
        .expect("writes");
        assert!(matches!(
            read_hex(&text),
            Err(HexError::Misaligned { address: 1 })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prog.hex");
        let image: ProgramImage = [(0, 0x2802), (2, 0x3400)].into_iter().collect();
        save_hex(&path, &image).expect("saves");
        assert_eq!(load_hex(&path).expect("loads"), image);
    }
}
