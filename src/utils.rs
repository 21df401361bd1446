pub(crate) fn bytes_to_float(bytes: &[u8]) -> f64 {
    let mut arr = [0; 8];
    bytes
        .iter()
        .take(8)
        .enumerate()
        .for_each(|(idx, value)| arr[idx] = *value);
    f64::from_le_bytes(arr)
}

/// the byte count stored in a `UInt32` or `UInt64` block header
pub(crate) fn read_header(bytes: &[u8], header_bytes: usize) -> Option<usize> {
    let header = bytes.get(..header_bytes)?;
    let mut arr = [0; 8];
    arr[..header_bytes].copy_from_slice(header);
    usize::try_from(u64::from_le_bytes(arr)).ok()
}

/// Convert little endian values of the vtk type `type_name` into floats. `None` for types
/// that are not supported or byte counts that are not a multiple of the type size.
pub(crate) fn le_bytes_to_floats(bytes: &[u8], type_name: &str) -> Option<Vec<f64>> {
    let size = match type_name {
        "Float64" | "Int64" | "UInt64" => 8,
        "Float32" | "Int32" | "UInt32" => 4,
        "Int16" | "UInt16" => 2,
        "Int8" | "UInt8" => 1,
        _ => return None,
    };
    if bytes.len() % size != 0 {
        return None;
    }

    let values = bytes
        .chunks_exact(size)
        .map(|chunk| match type_name {
            "Float64" => bytes_to_float(chunk),
            "Float32" => f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
            "Int64" => i64::from_le_bytes(eight(chunk)) as f64,
            "UInt64" => u64::from_le_bytes(eight(chunk)) as f64,
            "Int32" => i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
            "UInt32" => u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
            "Int16" => i16::from_le_bytes([chunk[0], chunk[1]]) as f64,
            "UInt16" => u16::from_le_bytes([chunk[0], chunk[1]]) as f64,
            "Int8" => chunk[0] as i8 as f64,
            _ => chunk[0] as f64,
        })
        .collect();

    Some(values)
}

fn eight(chunk: &[u8]) -> [u8; 8] {
    let mut arr = [0; 8];
    arr.copy_from_slice(&chunk[..8]);
    arr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_values() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.0f32).to_le_bytes());
        assert_eq!(le_bytes_to_floats(&bytes, "Float32"), Some(vec![1.5, -2.0]));
        assert_eq!(le_bytes_to_floats(&[255, 1], "UInt8"), Some(vec![255.0, 1.0]));
        assert_eq!(le_bytes_to_floats(&[0, 0, 0], "Int32"), None);
        assert_eq!(le_bytes_to_floats(&[0], "String"), None);
    }

    #[test]
    fn headers() {
        assert_eq!(read_header(&16u64.to_le_bytes(), 8), Some(16));
        assert_eq!(read_header(&[4, 0, 0, 0, 99], 4), Some(4));
        assert_eq!(read_header(&[4, 0], 4), None);
    }
}
