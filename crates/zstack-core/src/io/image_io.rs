use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma, Rgb};
use ndarray::Array2;

use crate::error::{Result, ZStackError};
use crate::frame::{ColorFrame, Composite, Frame};
use crate::quality::FrameSource;

/// File extensions picked up when an input is a directory.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "tif", "tiff", "jpg", "jpeg", "bmp"];

/// Save a frame as 16-bit grayscale TIFF.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();

    let pixels: Vec<u16> = frame
        .data
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
        .collect();

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .expect("buffer size matches dimensions");
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a frame as 8-bit grayscale PNG.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();

    let mut img = GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let val = (frame.data[[row, col]].clamp(0.0, 1.0) * 255.0).round() as u8;
            img.put_pixel(col as u32, row as u32, Luma([val]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save frame, choosing format from file extension.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png(frame, path),
        _ => save_tiff(frame, path),
    }
}

/// Save a ColorFrame as 16-bit RGB TIFF.
pub fn save_color_tiff(color: &ColorFrame, path: &Path) -> Result<()> {
    let h = color.height();
    let w = color.width();

    let mut pixels: Vec<u16> = Vec::with_capacity(h * w * 3);
    for row in 0..h {
        for col in 0..w {
            for channel in color.channels() {
                pixels.push((channel.data[[row, col]].clamp(0.0, 1.0) * 65535.0).round() as u16);
            }
        }
    }

    let img = image::ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .expect("buffer size matches dimensions");
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a ColorFrame as 8-bit RGB PNG.
pub fn save_color_png(color: &ColorFrame, path: &Path) -> Result<()> {
    let h = color.height();
    let w = color.width();

    let mut img = image::RgbImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let [r, g, b] = color
                .channels()
                .map(|ch| (ch.data[[row, col]].clamp(0.0, 1.0) * 255.0).round() as u8);
            img.put_pixel(col as u32, row as u32, Rgb([r, g, b]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a ColorFrame, choosing format from file extension.
pub fn save_color_image(color: &ColorFrame, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_color_png(color, path),
        _ => save_color_tiff(color, path),
    }
}

/// Save either kind of composite.
pub fn save_composite(composite: &Composite, path: &Path) -> Result<()> {
    match composite {
        Composite::Mono(frame) => save_image(frame, path),
        Composite::Color(color) => save_color_image(color, path),
    }
}

/// `(height, width)` of an image file, read from its header only.
pub fn image_dimensions(path: &Path) -> Result<(usize, usize)> {
    let (w, h) = image::image_dimensions(path)?;
    Ok((h as usize, w as usize))
}

/// Load a grayscale image file into a Frame.
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] as f32 / 65535.0
    });

    let mut frame = Frame::new(data, 16);
    frame.metadata.source = Some(path.to_path_buf());
    Ok(frame)
}

/// Load an image file as three channel frames.
pub fn load_color_image(path: &Path) -> Result<ColorFrame> {
    let img = image::open(path)?;
    let rgb = img.to_rgb16();
    let (w, h) = rgb.dimensions();

    let channel = |c: usize| {
        let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
            rgb.get_pixel(col as u32, row as u32).0[c] as f32 / 65535.0
        });
        let mut frame = Frame::new(data, 16);
        frame.metadata.source = Some(path.to_path_buf());
        frame
    };

    Ok(ColorFrame {
        red: channel(0),
        green: channel(1),
        blue: channel(2),
    })
}

/// Expand directories into their image files, sorted by name; files are kept
/// as given. The result is the z-stack order.
pub fn collect_image_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_image_extension(p))
                .collect();
            entries.sort();
            paths.extend(entries);
        } else {
            paths.push(input.clone());
        }
    }

    if paths.is_empty() {
        return Err(ZStackError::InvalidInput("no input images found".into()));
    }
    Ok(paths)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files decoded on demand, in the order given.
pub struct ImageFileSource {
    paths: Vec<PathBuf>,
    luminance_of_color: bool,
}

impl ImageFileSource {
    /// Frames are decoded straight to grayscale.
    pub fn mono(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            luminance_of_color: false,
        }
    }

    /// Frames are decoded as RGB and reduced to BT.601 luminance, matching
    /// what color compositing scores.
    pub fn luminance(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            luminance_of_color: true,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageFileSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> Result<Frame> {
        let path = self.paths.get(index).ok_or_else(|| {
            ZStackError::InvalidInput(format!(
                "frame {index} out of range (total: {})",
                self.paths.len()
            ))
        })?;
        let frame = if self.luminance_of_color {
            load_color_image(path)?.luminance()
        } else {
            load_image(path)?
        };
        Ok(frame.with_index(index))
    }
}
