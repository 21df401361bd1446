use crate::array::{FieldArray, FieldData};
use crate::data::{AmrIndex, ImageData};
use crate::Error;

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

/// the integer type of the block header in front of every binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderType {
    UInt32,
    #[default]
    UInt64,
}

impl HeaderType {
    fn to_str(self) -> &'static str {
        match self {
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
        }
    }

    fn bytes(self) -> usize {
        match self {
            Self::UInt32 => 4,
            Self::UInt64 => 8,
        }
    }
}

/// the encoding to use when writing a data array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// whitespace separated values inside the `DataArray` element
    Ascii,
    /// base64 encoded little endian values inside the `DataArray` element
    Base64,
    /// raw little endian values in the `AppendedData` section at the end of the file
    Appended,
}

impl Encoding {
    fn to_str(&self) -> &'static str {
        match &self {
            Self::Ascii => "ascii",
            Self::Base64 => "binary",
            Self::Appended => "appended",
        }
    }
}

/// Write an image data (`.vti`) file.
///
/// Every array is written as `Float64`. Binary arrays are preceded by a `UInt64` header
/// holding the number of bytes that follow.
pub fn write_image_data<W: Write>(writer: W, data: &ImageData, encoding: Encoding) -> Result<(), Error> {
    write_image_data_with_header(writer, data, encoding, HeaderType::UInt64)
}

/// Write an image data (`.vti`) file whose binary arrays use `header` block headers
pub fn write_image_data_with_header<W: Write>(
    writer: W,
    data: &ImageData,
    encoding: Encoding,
    header: HeaderType,
) -> Result<(), Error> {
    let mut writer = Writer::new(writer);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    vtk_file_start(&mut writer, "ImageData", "1.0", header)?;

    let grid = &data.grid;
    let span_str = grid.extent.to_span_string();
    let origin = format_triple(grid.origin);
    let spacing = format_triple(grid.spacing);

    writer.write_event(Event::Start(BytesStart::new("ImageData").with_attributes([
        ("WholeExtent", span_str.as_str()),
        ("Origin", origin.as_str()),
        ("Spacing", spacing.as_str()),
    ])))?;

    writer.write_event(Event::Start(
        BytesStart::new("Piece").with_attributes([("Extent", span_str.as_str())]),
    ))?;

    let mut offset = 0;
    write_field_data(&mut writer, "PointData", &data.point_data, encoding, header, &mut offset)?;
    write_field_data(&mut writer, "CellData", &data.cell_data, encoding, header, &mut offset)?;

    writer.write_event(Event::End(BytesEnd::new("Piece")))?;
    writer.write_event(Event::End(BytesEnd::new("ImageData")))?;

    if encoding == Encoding::Appended {
        appended_binary_header_start(&mut writer)?;
        for array in data.point_data.iter().chain(data.cell_data.iter()) {
            write_appended_block(&mut writer, array, header)?;
        }
        appended_binary_header_end(&mut writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new("VTKFile")))?;

    Ok(())
}

/// Write an overlapping AMR index (`.vthb`) that points at one `.vti` file per block.
pub fn write_amr_index<W: Write>(writer: W, index: &AmrIndex) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    vtk_file_start(&mut writer, "vtkOverlappingAMR", "1.1", HeaderType::UInt64)?;

    let origin = format_triple(index.origin);
    writer.write_event(Event::Start(BytesStart::new("vtkOverlappingAMR").with_attributes([
        ("origin", origin.as_str()),
        ("grid_description", index.description.grid_description()),
    ])))?;

    for (level, blocks) in index.levels.iter().enumerate() {
        let level_str = level.to_string();
        let spacing = format_triple(blocks.spacing);
        writer.write_event(Event::Start(BytesStart::new("Block").with_attributes([
            ("level", level_str.as_str()),
            ("spacing", spacing.as_str()),
        ])))?;

        for block in &blocks.blocks {
            let index_str = block.index.to_string();
            let amr_box = block.amr_box.to_span_string();
            let mut element = BytesStart::new("DataSet")
                .with_attributes([("index", index_str.as_str()), ("amr_box", amr_box.as_str())]);
            if let Some(file) = &block.file {
                element.push_attribute(("file", file.as_str()));
            }
            writer.write_event(Event::Empty(element))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Block")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("vtkOverlappingAMR")))?;
    writer.write_event(Event::End(BytesEnd::new("VTKFile")))?;

    Ok(())
}

fn vtk_file_start<W: Write>(
    writer: &mut Writer<W>,
    file_type: &str,
    version: &str,
    header: HeaderType,
) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new("VTKFile").with_attributes([
        ("type", file_type),
        ("version", version),
        ("byte_order", "LittleEndian"),
        ("header_type", header.to_str()),
    ])))?;
    Ok(())
}

fn write_field_data<W: Write>(
    writer: &mut Writer<W>,
    section: &str,
    data: &FieldData,
    encoding: Encoding,
    header: HeaderType,
    offset: &mut usize,
) -> Result<(), Error> {
    if data.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(section)))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new(section)))?;

    for array in data.iter() {
        match encoding {
            Encoding::Ascii | Encoding::Base64 => write_inline_block(writer, array, encoding, header)?,
            Encoding::Appended => {
                write_appended_dataarray_header(writer, array, *offset)?;
                *offset += header.bytes() + array.num_tuples() * array.components() * 8;
            }
        }
    }

    writer.write_event(Event::End(BytesEnd::new(section)))?;
    Ok(())
}

fn write_inline_array_header<W: Write>(
    writer: &mut Writer<W>,
    encoding: Encoding,
    array: &FieldArray,
) -> Result<(), Error> {
    let components = array.components().to_string();
    writer.write_event(Event::Start(BytesStart::new("DataArray").with_attributes([
        ("type", "Float64"),
        ("Name", array.name()),
        ("NumberOfComponents", components.as_str()),
        ("format", encoding.to_str()),
    ])))?;

    Ok(())
}

/// write a single (inline) array of data (such as x-velocity) to the vtk file.
pub fn write_inline_dataarray<W: Write>(
    writer: &mut Writer<W>,
    array: &FieldArray,
    encoding: Encoding,
) -> Result<(), Error> {
    write_inline_block(writer, array, encoding, HeaderType::UInt64)
}

fn write_inline_block<W: Write>(
    writer: &mut Writer<W>,
    array: &FieldArray,
    encoding: Encoding,
    header: HeaderType,
) -> Result<(), Error> {
    write_inline_array_header(writer, encoding, array)?;

    let text = match encoding {
        Encoding::Base64 => base64::encode(binary_block(array, header)?),
        // appended arrays never reach here, fall back to ascii
        Encoding::Ascii | Encoding::Appended => {
            let mut data = String::with_capacity(array.num_tuples() * array.components() * 8);
            let mut buffer = ryu::Buffer::new();
            for float in array.iter_values() {
                data.push_str(buffer.format(float));
                data.push(' ');
            }
            data
        }
    };

    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new("DataArray")))?;

    Ok(())
}

/// Write the header for an appended data array whose values are later written in the
/// appended section of the file, `offset` bytes after its start.
///
/// If you call this function you are also responsible for calling
/// `write_appended_dataarray` with the data in the correct order
#[inline]
pub fn write_appended_dataarray_header<W: Write>(
    writer: &mut Writer<W>,
    array: &FieldArray,
    offset: usize,
) -> Result<(), Error> {
    let components = array.components().to_string();
    let offset = offset.to_string();
    writer.write_event(Event::Empty(BytesStart::new("DataArray").with_attributes([
        ("type", "Float64"),
        ("Name", array.name()),
        ("NumberOfComponents", components.as_str()),
        ("format", Encoding::Appended.to_str()),
        ("offset", offset.as_str()),
    ])))?;

    Ok(())
}

/// write the header and raw bytes of an array into the appended section
pub fn write_appended_dataarray<W: Write>(writer: &mut Writer<W>, array: &FieldArray) -> Result<(), Error> {
    write_appended_block(writer, array, HeaderType::UInt64)
}

fn write_appended_block<W: Write>(writer: &mut Writer<W>, array: &FieldArray, header: HeaderType) -> Result<(), Error> {
    let block = binary_block(array, header)?;
    writer.inner().write_all(&block)?;
    Ok(())
}

pub(crate) fn appended_binary_header_start<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.inner().write_all(b"\n<AppendedData encoding=\"raw\">\n_")?;
    Ok(())
}

pub(crate) fn appended_binary_header_end<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.inner().write_all(b"\n</AppendedData>\n")?;
    Ok(())
}

/// the byte count followed by the little endian values
fn binary_block(array: &FieldArray, header: HeaderType) -> Result<Vec<u8>, Error> {
    let len = array.num_tuples() * array.components() * 8;
    let mut bytes = Vec::with_capacity(header.bytes() + len);
    match header {
        HeaderType::UInt32 => {
            let len = u32::try_from(len).map_err(|_| Error::BlockTooLarge(array.name().to_string()))?;
            bytes.extend_from_slice(&len.to_le_bytes());
        }
        HeaderType::UInt64 => bytes.extend_from_slice(&(len as u64).to_le_bytes()),
    }
    for float in array.iter_values() {
        bytes.extend_from_slice(&float.to_le_bytes());
    }
    Ok(bytes)
}

fn format_triple(values: [f64; 3]) -> String {
    let mut buffer = ryu::Buffer::new();
    values
        .iter()
        .map(|value| buffer.format(*value).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extent, ImageGrid};

    fn sample() -> ImageData {
        let grid = ImageGrid::new([0.0; 3], [0.5, 0.5, 1.0], Extent::from_dimensions(2, 2, 1));
        let points = FieldData::from_arrays(vec![FieldArray::from_slice("p", 1, &[1.0, 2.0, 3.0, 4.0]).unwrap()])
            .unwrap();
        ImageData::new(grid, points, FieldData::new())
    }

    #[test]
    fn ascii_output() {
        let mut out = Vec::new();
        write_image_data(&mut out, &sample(), Encoding::Ascii).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(r#"<ImageData WholeExtent="0 1 0 1 0 0" Origin="0.0 0.0 0.0" Spacing="0.5 0.5 1.0">"#));
        assert!(text.contains(r#"format="ascii">1.0 2.0 3.0 4.0 </DataArray>"#));
        assert!(text.contains("<CellData/>"));
        assert!(!text.contains("AppendedData"));
    }

    #[test]
    fn appended_offsets() {
        let mut data = sample();
        data.point_data
            .add_array(FieldArray::from_slice("q", 1, &[0.0, 0.0, 0.0, 0.0]).unwrap())
            .unwrap();

        let mut out = Vec::new();
        write_image_data(&mut out, &data, Encoding::Appended).unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains(r#"Name="p" NumberOfComponents="1" format="appended" offset="0"/>"#));
        assert!(text.contains(r#"Name="q" NumberOfComponents="1" format="appended" offset="40"/>"#));
    }

    #[test]
    fn binary_block_has_a_byte_count() {
        let array = FieldArray::from_slice("x", 1, &[1.5]).unwrap();
        let block = binary_block(&array, HeaderType::UInt64).unwrap();
        assert_eq!(block.len(), 16);
        assert_eq!(&block[..8], &8u64.to_le_bytes());
        assert_eq!(&block[8..], &1.5f64.to_le_bytes());

        let block = binary_block(&array, HeaderType::UInt32).unwrap();
        assert_eq!(block.len(), 12);
        assert_eq!(&block[..4], &8u32.to_le_bytes());
    }
}
