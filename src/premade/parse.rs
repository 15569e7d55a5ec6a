use std::{fs::File, path::Path};

use memmap::{Mmap, MmapOptions};
use nalgebra::{point, vector};
use nom::{
    bytes::complete::take,
    number::complete::{be_f32, be_u32, le_u16},
    sequence::tuple,
    IResult,
};
use thiserror::Error;

use crate::volumetric::{VolumeDesc, VoxelFormat};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot open volume file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed volume header")]
    Header,

    #[error("sample data shorter than the header dimensions")]
    Truncated,
}

/// Backing storage of a raw volume file.
pub enum DataSource {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl DataSource {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DataSource, ParseError> {
        let file = File::open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file) }?;
        Ok(DataSource::Mmap(mmap))
    }

    pub fn get_slice(&self) -> &[u8] {
        match self {
            DataSource::Vec(v) => &v[..],
            DataSource::Mmap(m) => &m[..],
        }
    }
}

// Big endian header: 3x u32 voxel counts, 4 reserved bytes,
// 3x f32 voxel spacing. Samples follow, one byte each.
fn dense_header(s: &[u8]) -> IResult<&[u8], ((u32, u32, u32), (f32, f32, f32))> {
    let mut header = tuple((
        tuple((be_u32, be_u32, be_u32)),
        take(4_u8),
        tuple((be_f32, be_f32, be_f32)),
    ));

    let (s, (size, _, spacing)) = header(s)?;
    Ok((s, (size, spacing)))
}

/// Parser for 8-bit volumes with a big-endian header.
pub fn dense_parser(data_source: &DataSource) -> Result<VolumeDesc, ParseError> {
    let slice = data_source.get_slice();
    let (samples, (size, spacing)) = dense_header(slice).map_err(|_| ParseError::Header)?;

    let size = vector![size.0 as usize, size.1 as usize, size.2 as usize];
    let voxels = size.x * size.y * size.z;
    if samples.len() < voxels {
        return Err(ParseError::Truncated);
    }

    Ok(VolumeDesc {
        size,
        format: VoxelFormat::U8,
        extent: vector![
            size.x as f32 * spacing.0,
            size.y as f32 * spacing.1,
            size.z as f32 * spacing.2
        ],
        position: point![0.0, 0.0, 0.0],
        frames: vec![samples[..voxels].to_vec()],
    })
}

// Little endian 2 byte values
// Values <0;4095>
fn scan_header(s: &[u8]) -> IResult<&[u8], (u16, u16, u16)> {
    let mut header = tuple((le_u16, le_u16, le_u16));
    let (s, size) = header(s)?;
    Ok((s, size))
}

/// Parser for 12-bit-in-16 scanner dumps with a little-endian header.
pub fn scan16_parser(data_source: &DataSource) -> Result<VolumeDesc, ParseError> {
    let slice = data_source.get_slice();
    let (samples, size) = scan_header(slice).map_err(|_| ParseError::Header)?;

    let size = vector![size.0 as usize, size.1 as usize, size.2 as usize];
    let bytes = size.x * size.y * size.z * 2;
    if samples.len() < bytes {
        return Err(ParseError::Truncated);
    }

    Ok(VolumeDesc {
        size,
        format: VoxelFormat::U16,
        extent: vector![size.x as f32, size.y as f32, size.z as f32],
        position: point![0.0, 0.0, 0.0],
        frames: vec![samples[..bytes].to_vec()],
    })
}

#[cfg(test)]
mod test {

    use nalgebra::vector;

    use super::*;

    fn dense_file(size: (u32, u32, u32), spacing: f32, samples: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(size.0.to_be_bytes());
        bytes.extend(size.1.to_be_bytes());
        bytes.extend(size.2.to_be_bytes());
        bytes.extend([0u8; 4]);
        for _ in 0..3 {
            bytes.extend(spacing.to_be_bytes());
        }
        bytes.extend(samples);
        bytes
    }

    #[test]
    fn dense_roundtrip() {
        let file = dense_file((2, 2, 2), 1.5, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let desc = dense_parser(&DataSource::Vec(file)).unwrap();

        assert_eq!(desc.size, vector![2, 2, 2]);
        assert_eq!(desc.format, VoxelFormat::U8);
        assert_eq!(desc.extent, vector![3.0, 3.0, 3.0]);
        assert_eq!(desc.frames[0], vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn dense_rejects_short_data() {
        let file = dense_file((4, 4, 4), 1.0, &[0; 10]);
        assert!(matches!(
            dense_parser(&DataSource::Vec(file)),
            Err(ParseError::Truncated)
        ));
    }

    #[test]
    fn dense_rejects_short_header() {
        assert!(matches!(
            dense_parser(&DataSource::Vec(vec![0; 10])),
            Err(ParseError::Header)
        ));
    }

    #[test]
    fn scan16_roundtrip() {
        let mut file = Vec::new();
        file.extend(2u16.to_le_bytes());
        file.extend(1u16.to_le_bytes());
        file.extend(1u16.to_le_bytes());
        file.extend([0x12, 0x34, 0x56, 0x78]);

        let desc = scan16_parser(&DataSource::Vec(file)).unwrap();
        assert_eq!(desc.size, vector![2, 1, 1]);
        assert_eq!(desc.format, VoxelFormat::U16);
        assert_eq!(desc.frames[0].len(), 4);
        assert!(desc.validate().is_ok());
    }
}
