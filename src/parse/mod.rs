//! Reading `.vti` image data files and `.vthb` overlapping AMR index files.
//!
//! Only inline (`ascii` or base64 `binary`) data arrays are supported. Files whose
//! arrays live in the `AppendedData` section are rejected with
//! [`ParseError::AppendedData`].

pub mod error;
mod event_summary;

pub use error::ParseError;

use crate::array::{FieldArray, FieldData};
use crate::data::{AmrIndex, AmrIndexBlock, AmrIndexLevel, ImageData};
use crate::extent::{DataDescription, Extent};
use crate::image::ImageGrid;
use crate::utils;
use crate::Error;

use event_summary::EventSummary;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use std::path::Path;

/// Read and parse an image data (`.vti`) file
pub fn read_image_data<P: AsRef<Path>>(path: P) -> Result<ImageData, Error> {
    let bytes = std::fs::read(path)?;
    let xml = String::from_utf8(bytes)?;
    Ok(parse_image_data(&xml)?)
}

/// Read and parse an overlapping AMR index (`.vthb`) file
pub fn read_amr_index<P: AsRef<Path>>(path: P) -> Result<AmrIndex, Error> {
    let bytes = std::fs::read(path)?;
    let xml = String::from_utf8(bytes)?;
    Ok(parse_amr_index(&xml)?)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Outside,
    PointData,
    CellData,
}

/// the attributes of a `DataArray` element and the text collected so far
#[derive(Debug)]
struct DataArrayHeader {
    name: String,
    type_name: String,
    components: usize,
    format: String,
    text: String,
}

/// Parse the contents of an image data (`.vti`) file
pub fn parse_image_data(xml: &str) -> Result<ImageData, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let header_bytes = read_to_vtk_file(&mut reader, "ImageData")?;

    let mut whole_extent: Option<Extent> = None;
    let mut piece_extent: Option<Extent> = None;
    let mut origin = [0.0; 3];
    let mut spacing = [1.0; 3];

    let mut section = Section::Outside;
    let mut current: Option<DataArrayHeader> = None;
    let mut point_data = FieldData::new();
    let mut cell_data = FieldData::new();

    loop {
        let event = reader.read_event().map_err(error::MalformedXml::from)?;

        match event {
            Event::Start(start) | Event::Empty(start) if start.name().as_ref() == b"ImageData" => {
                let extent = get_attribute_value(&start, "WholeExtent", "ImageData")?;
                whole_extent = Some(Extent::from_span_string(&attribute_string(&extent)?)?);

                if let Some(value) = find_attribute(&start, "Origin")? {
                    origin = parse_triple(&value, "ImageData", "Origin")?;
                }
                if let Some(value) = find_attribute(&start, "Spacing")? {
                    spacing = parse_triple(&value, "ImageData", "Spacing")?;
                }
            }
            Event::Start(start) | Event::Empty(start) if start.name().as_ref() == b"Piece" => {
                let extent = get_attribute_value(&start, "Extent", "Piece")?;
                piece_extent = Some(Extent::from_span_string(&attribute_string(&extent)?)?);
            }
            Event::Start(start) => match start.name().as_ref() {
                b"PointData" => section = Section::PointData,
                b"CellData" => section = Section::CellData,
                b"DataArray" => current = Some(read_dataarray_header(&start)?),
                _ => (),
            },
            Event::Empty(start) if start.name().as_ref() == b"DataArray" => {
                let header = read_dataarray_header(&start)?;
                let array = finish_dataarray(header, header_bytes)?;
                push_array(section, array, &mut point_data, &mut cell_data)?;
            }
            Event::Text(text) => {
                if let Some(header) = current.as_mut() {
                    let text = text.unescape().map_err(error::MalformedXml::from)?;
                    header.text.push_str(&text);
                }
            }
            Event::End(end) => match end.name().as_ref() {
                b"DataArray" => {
                    if let Some(header) = current.take() {
                        let array = finish_dataarray(header, header_bytes)?;
                        push_array(section, array, &mut point_data, &mut cell_data)?;
                    }
                }
                b"PointData" | b"CellData" => section = Section::Outside,
                _ => (),
            },
            Event::Eof => break,
            _ => (),
        }
    }

    let whole_extent = whole_extent
        .ok_or_else(|| error::MissingAttribute::new("ImageData".into(), "WholeExtent".into()))?;
    let extent = piece_extent.unwrap_or(whole_extent);

    log::debug!(
        "parsed image data with extent `{}`, {} point arrays and {} cell arrays",
        extent,
        point_data.len(),
        cell_data.len()
    );

    Ok(ImageData::new(
        ImageGrid::new(origin, spacing, extent),
        point_data,
        cell_data,
    ))
}

/// Parse the contents of an overlapping AMR index (`.vthb`) file
pub fn parse_amr_index(xml: &str) -> Result<AmrIndex, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    read_to_vtk_file(&mut reader, "vtkOverlappingAMR")?;

    let mut origin = [0.0; 3];
    let mut description: Option<DataDescription> = None;
    let mut levels: Vec<AmrIndexLevel> = Vec::new();
    let mut current_level: Option<usize> = None;

    loop {
        let event = reader.read_event().map_err(error::MalformedXml::from)?;

        match event {
            Event::Start(start) | Event::Empty(start) => match start.name().as_ref() {
                b"vtkOverlappingAMR" => {
                    if let Some(value) = find_attribute(&start, "origin")? {
                        origin = parse_triple(&value, "vtkOverlappingAMR", "origin")?;
                    }
                    let grid = get_attribute_value(&start, "grid_description", "vtkOverlappingAMR")?;
                    let grid = attribute_string(&grid)?;
                    description = Some(DataDescription::from_grid_description(&grid).ok_or_else(|| {
                        error::UnexpectedAttributeValue::new(
                            "vtkOverlappingAMR".into(),
                            "grid_description".into(),
                            "one of X, Y, Z, XY, YZ, XZ or XYZ".into(),
                            grid.as_str().into(),
                        )
                    })?);
                }
                b"Block" => {
                    let level = get_attribute_value(&start, "level", "Block")?;
                    let level_str = attribute_string(&level)?;
                    let level: usize = level_str.trim().parse().map_err(|_| {
                        error::UnexpectedAttributeValue::new(
                            "Block".into(),
                            "level".into(),
                            "a non-negative integer".into(),
                            level_str.as_str().into(),
                        )
                    })?;

                    let spacing = match find_attribute(&start, "spacing")? {
                        Some(value) => parse_triple(&value, "Block", "spacing")?,
                        None => [1.0; 3],
                    };

                    // levels are listed in order, a block may only reopen a level or add the next one
                    if level > levels.len() {
                        return Err(error::UnexpectedAttributeValue::new(
                            "Block".into(),
                            "level".into(),
                            format!("a level no greater than {}", levels.len()),
                            level_str.as_str().into(),
                        )
                        .into());
                    }
                    if level == levels.len() {
                        levels.push(AmrIndexLevel {
                            spacing,
                            blocks: Vec::new(),
                        });
                    }
                    levels[level].spacing = spacing;
                    current_level = Some(level);
                }
                b"DataSet" => {
                    let level = current_level.ok_or_else(|| {
                        error::UnexpectedElement::new("Block", EventSummary::new(&Event::Start(start.clone())))
                    })?;

                    let index = match find_attribute(&start, "index")? {
                        Some(value) => value.trim().parse().unwrap_or(levels[level].blocks.len()),
                        None => levels[level].blocks.len(),
                    };
                    let amr_box = get_attribute_value(&start, "amr_box", "DataSet")?;
                    let amr_box = Extent::from_span_string(&attribute_string(&amr_box)?)?;
                    let file = find_attribute(&start, "file")?;

                    levels[level].blocks.push(AmrIndexBlock { index, amr_box, file });
                }
                _ => (),
            },
            Event::End(end) if end.name().as_ref() == b"Block" => current_level = None,
            Event::Eof => break,
            _ => (),
        }
    }

    let description = description
        .ok_or_else(|| error::MissingAttribute::new("vtkOverlappingAMR".into(), "grid_description".into()))?;

    log::debug!(
        "parsed AMR index with {} levels and {} blocks",
        levels.len(),
        levels.iter().map(|level| level.blocks.len()).sum::<usize>()
    );

    Ok(AmrIndex {
        origin,
        description,
        levels,
    })
}

/// Find the leading `VTKFile` element, check its type and return the size of the binary
/// block headers
fn read_to_vtk_file(reader: &mut Reader<&[u8]>, file_type: &str) -> Result<usize, ParseError> {
    loop {
        let event = reader.read_event().map_err(error::MalformedXml::from)?;

        match &event {
            Event::Start(start) if start.name().as_ref() == b"VTKFile" => {
                let type_att = get_attribute_value(start, "type", "VTKFile")?;
                check_attribute_value(type_att, "VTKFile", "type", file_type)?;

                if let Some(order) = find_attribute(start, "byte_order")? {
                    if order != "LittleEndian" {
                        return Err(error::UnexpectedAttributeValue::new(
                            "VTKFile".into(),
                            "byte_order".into(),
                            "LittleEndian".into(),
                            order.as_str().into(),
                        )
                        .into());
                    }
                }

                if find_attribute(start, "compressor")?.is_some() {
                    log::warn!("compressed vtk files are not supported, binary arrays will fail to decode");
                }

                return match find_attribute(start, "header_type")?.as_deref() {
                    None | Some("UInt32") => Ok(4),
                    Some("UInt64") => Ok(8),
                    Some(other) => Err(error::UnexpectedAttributeValue::new(
                        "VTKFile".into(),
                        "header_type".into(),
                        "UInt32 or UInt64".into(),
                        other.into(),
                    )
                    .into()),
                };
            }
            Event::Decl(_) | Event::Comment(_) | Event::DocType(_) | Event::PI(_) => continue,
            Event::Eof => {
                return Err(error::UnexpectedElement::new("VTKFile", EventSummary::eof()).into());
            }
            other => {
                return Err(error::UnexpectedElement::new("VTKFile", EventSummary::new(other)).into());
            }
        }
    }
}

fn read_dataarray_header(start: &BytesStart<'_>) -> Result<DataArrayHeader, ParseError> {
    let name = find_attribute(start, "Name")?.unwrap_or_default();
    let type_name = find_attribute(start, "type")?.unwrap_or_else(|| "Float64".to_string());
    let format = find_attribute(start, "format")?.unwrap_or_else(|| "ascii".to_string());

    let components = match find_attribute(start, "NumberOfComponents")? {
        Some(value) => value.trim().parse().map_err(|_| {
            error::UnexpectedAttributeValue::new(
                "DataArray".into(),
                "NumberOfComponents".into(),
                "a positive integer".into(),
                value.as_str().into(),
            )
        })?,
        None => 1,
    };

    if format == "appended" {
        return Err(error::AppendedData::new(name).into());
    }

    Ok(DataArrayHeader {
        name,
        type_name,
        components,
        format,
        text: String::new(),
    })
}

fn finish_dataarray(header: DataArrayHeader, header_bytes: usize) -> Result<FieldArray, ParseError> {
    let values = match header.format.as_str() {
        "binary" => parse_base64_inner_dataarray(&header, header_bytes)?,
        _ => parse_ascii_inner_dataarray(&header)?,
    };

    log::trace!("read {} values for array `{}`", values.len(), header.name);

    Ok(FieldArray::from_slice(header.name, header.components, &values[..])?)
}

fn push_array(
    section: Section,
    array: FieldArray,
    point_data: &mut FieldData,
    cell_data: &mut FieldData,
) -> Result<(), ParseError> {
    match section {
        Section::PointData => point_data.add_array(array)?,
        Section::CellData => cell_data.add_array(array)?,
        // field data and coordinates of other dataset types
        Section::Outside => log::trace!("skipping array `{}` outside of point and cell data", array.name()),
    }
    Ok(())
}

fn parse_ascii_inner_dataarray(header: &DataArrayHeader) -> Result<Vec<f64>, ParseError> {
    header
        .text
        .split_ascii_whitespace()
        .map(|x| x.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| error::InlineAsciiArray::new(header.name.clone()).into())
}

/// Decode a base64 array made of a block header (the number of data bytes) followed by
/// the data. Writers either encode both parts together or each part on its own.
fn parse_base64_inner_dataarray(header: &DataArrayHeader, header_bytes: usize) -> Result<Vec<f64>, ParseError> {
    let fail = |reason: &str| -> ParseError {
        error::InlineBinaryArray::new(header.name.clone(), reason.to_string()).into()
    };

    let text: String = header.text.split_ascii_whitespace().collect();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let joined = base64::decode(&text).ok().and_then(|bytes| {
        let len = utils::read_header(&bytes, header_bytes)?;
        let end = header_bytes.checked_add(len)?;
        bytes.get(header_bytes..end).map(<[u8]>::to_vec)
    });

    let data = match joined {
        Some(data) => data,
        None => {
            let split = (header_bytes + 2) / 3 * 4;
            let (head, body) = (text.get(..split), text.get(split..));
            let (head, body) = head.zip(body).ok_or_else(|| fail("the block header is truncated"))?;

            let head = base64::decode(head).map_err(|e| fail(&e.to_string()))?;
            let len = utils::read_header(&head, header_bytes).ok_or_else(|| fail("the block header is truncated"))?;
            let body = base64::decode(body).map_err(|e| fail(&e.to_string()))?;
            body.get(..len)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| fail("the data is shorter than its block header"))?
        }
    };

    utils::le_bytes_to_floats(&data, &header.type_name)
        .ok_or_else(|| fail(&format!("unsupported data type `{}`", header.type_name)))
}

fn get_attribute_value<'a>(
    bytes_start: &'a BytesStart<'_>,
    attribute_key: &str,
    element_name: &str,
) -> Result<Attribute<'a>, ParseError> {
    for attribute in bytes_start.attributes() {
        let attribute = attribute.map_err(error::MalformedAttribute::from)?;
        if attribute.key.as_ref() == attribute_key.as_bytes() {
            return Ok(attribute);
        }
    }

    Err(error::MissingAttribute::new(element_name.into(), attribute_key.into()).into())
}

/// the unescaped value of an optional attribute
fn find_attribute(bytes_start: &BytesStart<'_>, attribute_key: &str) -> Result<Option<String>, ParseError> {
    for attribute in bytes_start.attributes() {
        let attribute = attribute.map_err(error::MalformedAttribute::from)?;
        if attribute.key.as_ref() == attribute_key.as_bytes() {
            return Ok(Some(attribute_string(&attribute)?));
        }
    }
    Ok(None)
}

fn attribute_string(attribute: &Attribute<'_>) -> Result<String, ParseError> {
    let value = attribute.unescape_value().map_err(error::MalformedXml::from)?;
    Ok(value.into_owned())
}

/// ensure that an attribute's value is what we expect it to be, otherwise return an error with
/// some location information
fn check_attribute_value(
    att: Attribute<'_>,
    element_name: &str,
    attribute_name: &str,
    expected_attribute_value: &str,
) -> Result<(), error::UnexpectedAttributeValue> {
    if att.value.as_ref() != expected_attribute_value.as_bytes() {
        let unexpected_value = error::UnexpectedAttributeValue {
            element_name: element_name.into(),
            attribute_name: attribute_name.into(),
            expected_value: expected_attribute_value.into(),
            actual_value: error::ParsedNameOrBytes::from(String::from_utf8_lossy(att.value.as_ref()).as_ref()),
        };

        Err(unexpected_value)
    } else {
        Ok(())
    }
}

fn parse_triple(value: &str, element_name: &str, attribute_name: &str) -> Result<[f64; 3], ParseError> {
    let invalid = || {
        error::UnexpectedAttributeValue::new(
            element_name.into(),
            attribute_name.into(),
            "three floats".into(),
            value.into(),
        )
    };

    let values = value
        .split_ascii_whitespace()
        .map(|x| x.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    let triple: [f64; 3] = values.try_into().map_err(|_| invalid())?;
    Ok(triple)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_image_data() {
        let xml = r#"<?xml version="1.0"?>
<VTKFile type="ImageData" version="1.0" byte_order="LittleEndian" header_type="UInt64">
  <ImageData WholeExtent="0 2 0 1 0 0" Origin="1 0 0" Spacing="0.5 0.5 1">
    <Piece Extent="0 2 0 1 0 0">
      <PointData>
        <DataArray type="Float64" Name="p" format="ascii">0 1 2 3 4 5</DataArray>
      </PointData>
      <CellData>
        <DataArray type="Int32" Name="v" NumberOfComponents="2" format="ascii">1 2 3 4</DataArray>
      </CellData>
    </Piece>
  </ImageData>
</VTKFile>"#;

        let data = parse_image_data(xml).unwrap();
        assert_eq!(data.grid.extent, Extent::new(0, 2, 0, 1, 0, 0));
        assert_eq!(data.grid.origin, [1.0, 0.0, 0.0]);
        assert_eq!(data.grid.spacing, [0.5, 0.5, 1.0]);
        assert_eq!(data.point_data[0].num_tuples(), 6);
        assert_eq!(data.cell_data.get("v").unwrap().components(), 2);
        assert_eq!(data.cell_data[0].iter_values().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn separately_encoded_header() {
        let values = [1.0f64, 2.0];
        let mut body = Vec::new();
        values.iter().for_each(|v| body.extend_from_slice(&v.to_le_bytes()));

        let text = format!(
            "{}{}",
            base64::encode(16u64.to_le_bytes()),
            base64::encode(&body)
        );
        let header = DataArrayHeader {
            name: "a".into(),
            type_name: "Float64".into(),
            components: 1,
            format: "binary".into(),
            text,
        };

        assert_eq!(parse_base64_inner_dataarray(&header, 8).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn appended_arrays_are_rejected() {
        let xml = r#"<VTKFile type="ImageData" header_type="UInt64">
  <ImageData WholeExtent="0 1 0 0 0 0">
    <Piece Extent="0 1 0 0 0 0">
      <PointData>
        <DataArray type="Float64" Name="p" format="appended" offset="0"/>
      </PointData>
    </Piece>
  </ImageData>
</VTKFile>"#;

        assert!(matches!(parse_image_data(xml), Err(ParseError::AppendedData(_))));
    }

    #[test]
    fn wrong_file_type() {
        let xml = r#"<VTKFile type="RectilinearGrid"></VTKFile>"#;
        assert!(matches!(
            parse_image_data(xml),
            Err(ParseError::UnexpectedAttributeValue(_))
        ));
    }

    #[test]
    fn amr_index() {
        let xml = r#"<?xml version="1.0"?>
<VTKFile type="vtkOverlappingAMR" version="1.1" byte_order="LittleEndian" header_type="UInt64">
  <vtkOverlappingAMR origin="0 0 0" grid_description="XY">
    <Block level="0" spacing="1 1 1">
      <DataSet index="0" amr_box="0 3 0 3 0 0" file="a/a_0_0.vti"/>
    </Block>
    <Block level="1" spacing="0.5 0.5 1">
      <DataSet index="0" amr_box="2 5 2 5 0 0"/>
    </Block>
  </vtkOverlappingAMR>
</VTKFile>"#;

        let index = parse_amr_index(xml).unwrap();
        assert_eq!(index.description, DataDescription::XYPlane);
        assert_eq!(index.levels.len(), 2);
        assert_eq!(index.levels[1].spacing, [0.5, 0.5, 1.0]);
        assert_eq!(index.levels[0].blocks[0].file.as_deref(), Some("a/a_0_0.vti"));
        assert_eq!(index.levels[1].blocks[0].amr_box, Extent::new(2, 5, 2, 5, 0, 0));
    }

    fn binary_header(text: String) -> DataArrayHeader {
        DataArrayHeader {
            name: "a".into(),
            type_name: "Float64".into(),
            components: 1,
            format: "binary".into(),
            text,
        }
    }

    #[test]
    fn oversized_block_header() {
        let mut block = Vec::new();
        block.extend_from_slice(&u64::MAX.to_le_bytes());
        block.extend_from_slice(&1.0f64.to_le_bytes());

        let header = binary_header(base64::encode(&block));
        assert!(matches!(
            parse_base64_inner_dataarray(&header, 8),
            Err(ParseError::InlineBinaryArray(_))
        ));
    }

    #[test]
    fn truncated_block_header() {
        let header = binary_header(base64::encode([16u8, 0, 0]));
        assert!(matches!(
            parse_base64_inner_dataarray(&header, 8),
            Err(ParseError::InlineBinaryArray(_))
        ));
    }

    #[test]
    fn amr_levels_cannot_skip() {
        let xml = r#"<VTKFile type="vtkOverlappingAMR" header_type="UInt64">
  <vtkOverlappingAMR origin="0 0 0" grid_description="XY">
    <Block level="0" spacing="1 1 1">
      <DataSet index="0" amr_box="0 3 0 3 0 0"/>
    </Block>
    <Block level="4000000000" spacing="0.5 0.5 1">
      <DataSet index="0" amr_box="2 5 2 5 0 0"/>
    </Block>
  </vtkOverlappingAMR>
</VTKFile>"#;

        assert!(matches!(
            parse_amr_index(xml),
            Err(ParseError::UnexpectedAttributeValue(_))
        ));
    }

    #[test]
    fn amr_level_may_be_reopened() {
        let xml = r#"<VTKFile type="vtkOverlappingAMR" header_type="UInt64">
  <vtkOverlappingAMR origin="0 0 0" grid_description="X">
    <Block level="0" spacing="1 1 1">
      <DataSet index="0" amr_box="0 3 0 0 0 0"/>
    </Block>
    <Block level="0" spacing="1 1 1">
      <DataSet index="1" amr_box="4 7 0 0 0 0"/>
    </Block>
  </vtkOverlappingAMR>
</VTKFile>"#;

        let index = parse_amr_index(xml).unwrap();
        assert_eq!(index.levels.len(), 1);
        assert_eq!(index.levels[0].blocks.len(), 2);
    }
}
