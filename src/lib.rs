#![doc = include_str!("../README.md")]

pub mod amr;
pub mod array;
mod data;
pub mod extent;
pub mod hypertree;
pub mod image;
pub mod iter;
pub mod parse;
pub mod prelude;
pub mod structured;
mod utils;
mod write_vtk;

pub use extent::{CellType, DataDescription, Extent, ExtentError};
pub use image::ImageGrid;

pub use array::{ArrayError, FieldArray, FieldData};

pub use data::{AmrIndex, AmrIndexBlock, AmrIndexLevel, ImageData};

pub use write_vtk::{write_amr_index, write_image_data, write_image_data_with_header, HeaderType};
pub use write_vtk::{write_appended_dataarray, write_appended_dataarray_header, write_inline_dataarray, Encoding};

pub use parse::{parse_amr_index, parse_image_data, read_amr_index, read_image_data, ParseError};

pub use ndarray;

pub use quick_xml::writer::Writer;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing VTK xml: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Could not convert file to uf8 encoding: `{0}`")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("invalid extent: {0}")]
    Extent(#[from] ExtentError),
    #[error("invalid data array: {0}")]
    Array(#[from] ArrayError),
    #[error("AMR connectivity failed: {0}")]
    Connectivity(#[from] amr::ConnectivityError),
    #[error("hyper tree grid error: {0}")]
    HyperTree(#[from] hypertree::HyperTreeError),
    #[error("array `{0}` is too large for a UInt32 block header")]
    BlockTooLarge(String),
}
