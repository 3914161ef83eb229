pub mod consts;
pub mod error;
pub mod filters;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod pool;
pub mod pyramid;
pub mod quality;
pub mod select;

pub use error::{Result, ZStackError};
pub use pipeline::{composite, composite_color};
