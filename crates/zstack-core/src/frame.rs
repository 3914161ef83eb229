use ndarray::Array2;
use std::path::PathBuf;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};

/// A single grayscale image frame.
/// Pixel values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth before conversion (8 or 16)
    pub original_bit_depth: u8,
    /// Position in the z-stack and provenance
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
            metadata: FrameMetadata::default(),
        }
    }

    /// Same frame, tagged with its z-stack position.
    pub fn with_index(mut self, index: usize) -> Self {
        self.metadata.frame_index = index;
        self
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    /// Ordinal position in the z-stack.
    pub frame_index: usize,
    /// File the frame was decoded from, if any.
    pub source: Option<PathBuf>,
}

/// Color image composed of separate channel frames.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    pub red: Frame,
    pub green: Frame,
    pub blue: Frame,
}

impl ColorFrame {
    pub fn width(&self) -> usize {
        self.red.width()
    }

    pub fn height(&self) -> usize {
        self.red.height()
    }

    pub fn channels(&self) -> [&Frame; 3] {
        [&self.red, &self.green, &self.blue]
    }

    /// BT.601 luminance, carrying the red channel's metadata.
    pub fn luminance(&self) -> Frame {
        let mut data = self.red.data.mapv(|v| v * LUMINANCE_R);
        data.scaled_add(LUMINANCE_G, &self.green.data);
        data.scaled_add(LUMINANCE_B, &self.blue.data);
        Frame {
            data,
            original_bit_depth: self.red.original_bit_depth,
            metadata: self.red.metadata.clone(),
        }
    }
}

/// Sharpness of one frame in the stack. Higher means sharper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SharpnessScore {
    pub index: usize,
    pub value: f64,
}

/// Point of interest, in pixel coordinates of the full-resolution frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Focus score of a square region around one point in one frame.
///
/// `score` is `None` when the region could not be scored; the entry is kept
/// so that every (frame, point) pair stays accounted for.
#[derive(Clone, Debug, PartialEq)]
pub struct PointScore {
    pub frame_index: usize,
    pub point_index: usize,
    pub point: Point,
    pub score: Option<f64>,
}

/// Final output of a compositing run.
#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Composite {
    Mono(Frame),
    Color(ColorFrame),
}

impl Composite {
    /// Get a mono frame. Color output is converted to luminance.
    pub fn to_mono(&self) -> Frame {
        match self {
            Self::Mono(f) => f.clone(),
            Self::Color(cf) => cf.luminance(),
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Self::Mono(f) => f.data.dim(),
            Self::Color(cf) => cf.red.data.dim(),
        }
    }
}
