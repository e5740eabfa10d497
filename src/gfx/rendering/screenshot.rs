//! Uncompressed TGA screenshots
//!
//! Layout: an 18-byte header (true-colour image type, width, height, 24 bits per
//! pixel, bottom-left origin) followed by BGR pixels with the bottom row first.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AutomataError, Result};

use super::render_engine::CapturedFrame;

pub const HEADER_LEN: usize = 18;
const IMAGE_TYPE_TRUE_COLOR: u8 = 2;
const BITS_PER_PIXEL: u8 = 24;
const FILE_PREFIX: &str = "screenshot-";
const FILE_EXTENSION: &str = "tga";

/// Header followed by pixel data for a `width` x `height` RGBA8 image, top row first
pub fn encode_tga(width: u16, height: u16, rgba: &[u8]) -> Vec<u8> {
    let pixel_count = width as usize * height as usize;
    let mut out = Vec::with_capacity(HEADER_LEN + 3 * pixel_count);

    out.extend_from_slice(&[0, 0, IMAGE_TYPE_TRUE_COLOR]);
    out.extend_from_slice(&[0; 9]);
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&[BITS_PER_PIXEL, 0]);

    let row_bytes = width as usize * 4;
    if row_bytes > 0 {
        for row in rgba.chunks_exact(row_bytes).take(height as usize).rev() {
            for pixel in row.chunks_exact(4) {
                out.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
            }
        }
    }

    out
}

/// First `screenshot-NNNN.tga` in `dir` that does not exist yet
pub fn next_screenshot_path(dir: &Path) -> PathBuf {
    (0u32..)
        .map(|index| dir.join(format!("{FILE_PREFIX}{index:04}.{FILE_EXTENSION}")))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(format!("{FILE_PREFIX}last.{FILE_EXTENSION}")))
}

/// Encode `frame` and write it under `dir`, creating the directory when needed.
/// Frames larger than the format can describe are cropped to 65535 in each axis.
pub fn write_screenshot(dir: &Path, frame: &CapturedFrame) -> Result<PathBuf> {
    let path = next_screenshot_path(dir);
    let io_error = |source| AutomataError::Screenshot {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_error)?;

    let width = frame.width.min(u16::MAX as u32);
    let height = frame.height.min(u16::MAX as u32);
    let data = if width == frame.width {
        encode_tga(width as u16, height as u16, &frame.pixels)
    } else {
        let cropped: Vec<u8> = frame
            .pixels
            .chunks_exact(frame.width as usize * 4)
            .flat_map(|row| row[..width as usize * 4].iter().copied())
            .collect();
        encode_tga(width as u16, height as u16, &cropped)
    };

    fs::write(&path, data).map_err(io_error)?;
    log::info!("Saved screenshot {} ({}x{})", path.display(), width, height);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> CapturedFrame {
        // red channel encodes the row, green the column
        let pixels = (0..height)
            .flat_map(|y| (0..width).flat_map(move |x| [y as u8, x as u8, 7, 255]))
            .collect();
        CapturedFrame {
            width,
            height,
            pixels,
        }
    }

    fn header_dimensions(data: &[u8]) -> Option<(u16, u16)> {
        let header = data.get(..HEADER_LEN)?;
        Some((
            u16::from_le_bytes([header[12], header[13]]),
            u16::from_le_bytes([header[14], header[15]]),
        ))
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("automata_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_buffer_length_and_header() {
        let captured = frame(5, 3);
        let data = encode_tga(5, 3, &captured.pixels);

        assert_eq!(data.len() - HEADER_LEN, 3 * 5 * 3);
        assert_eq!(header_dimensions(&data), Some((5, 3)));
        assert_eq!(data[2], 2);
        assert_eq!(data[16], 24);
    }

    #[test]
    fn test_rows_reversed_and_bgr() {
        let captured = frame(2, 2);
        let data = encode_tga(2, 2, &captured.pixels);
        let pixels = &data[HEADER_LEN..];

        // first stored pixel is bottom-left: row 1, column 0
        assert_eq!(&pixels[0..3], &[7, 0, 1]);
        // last stored pixel is top-right: row 0, column 1
        assert_eq!(&pixels[9..12], &[7, 1, 0]);
    }

    #[test]
    fn test_written_file_decodes() {
        let dir = scratch_dir("screenshot_decode");
        let path = write_screenshot(&dir, &frame(4, 3)).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(3, 0).0, [0, 3, 7]);
        assert_eq!(decoded.get_pixel(1, 2).0, [2, 1, 7]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_screenshots_do_not_overwrite() {
        let dir = scratch_dir("screenshot_numbering");
        let first = write_screenshot(&dir, &frame(2, 2)).unwrap();
        let second = write_screenshot(&dir, &frame(2, 2)).unwrap();

        assert_ne!(first, second);
        assert!(first.ends_with("screenshot-0000.tga"));
        assert!(second.ends_with("screenshot-0001.tga"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unwritable_directory() {
        let dir = scratch_dir("screenshot_blocked");
        fs::write(&dir, b"not a directory").unwrap();

        let result = write_screenshot(&dir, &frame(1, 1));
        assert!(matches!(result, Err(AutomataError::Screenshot { .. })));

        let _ = fs::remove_file(&dir);
    }
}
