pub mod image_io;

pub use image_io::{
    collect_image_paths, image_dimensions, load_color_image, load_image, save_color_image,
    save_composite, save_image, ImageFileSource,
};
