//! Raw binary weight files.
//!
//! Layout, repeated for every layer in network order:
//!
//! ```text
//! weights: rows (u64 LE) | cols (u64 LE) | rows*cols f64 LE, row-major
//! biases:  rows (u64 LE) | cols (u64 LE) | rows*cols f64 LE, row-major
//! ```
//!
//! There is no header and no architecture description; a file can only be
//! loaded into a network whose layer shapes already match it.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

use log::debug;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;

pub fn save_model(network: &Network, path: &str) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_model(network, &mut writer)?;
    writer.flush()?;
    debug!("saved {} layers to {}", network.layers().len(), path);
    Ok(())
}

/// Overwrites the parameters of `network` with the contents of `path`.
/// On a `Format` error the network may be partially overwritten.
pub fn load_model(network: &mut Network, path: &str) -> Result<()> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_model(network, &mut reader)?;
    debug!("loaded {} layers from {}", network.layers().len(), path);
    Ok(())
}

pub fn write_model<W: Write>(network: &Network, writer: &mut W) -> Result<()> {
    for layer in network.layers() {
        write_matrix(writer, layer.weights())?;
        write_matrix(writer, layer.biases())?;
    }
    Ok(())
}

pub fn read_model<R: Read>(network: &mut Network, reader: &mut R) -> Result<()> {
    for (index, layer) in network.layers_mut().iter_mut().enumerate() {
        let weights = read_matrix(reader, layer.weights().shape(), index, "weights")?;
        let biases = read_matrix(reader, layer.biases().shape(), index, "biases")?;
        layer.set_parameters(weights, biases)?;
    }

    let mut trailing = [0u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(NnError::Format(
            "model file has more data than the network has layers".into(),
        ));
    }
    Ok(())
}

fn write_matrix<W: Write>(writer: &mut W, matrix: &Matrix) -> Result<()> {
    writer.write_all(&(matrix.rows() as u64).to_le_bytes())?;
    writer.write_all(&(matrix.cols() as u64).to_le_bytes())?;
    for value in matrix.as_slice() {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn read_matrix<R: Read>(
    reader: &mut R,
    expected: (usize, usize),
    layer: usize,
    what: &str,
) -> Result<Matrix> {
    let rows = read_u64(reader)? as usize;
    let cols = read_u64(reader)? as usize;
    if (rows, cols) != expected {
        return Err(NnError::Format(format!(
            "layer {} {}: file holds {}x{}, network expects {}x{}",
            layer, what, rows, cols, expected.0, expected.1
        )));
    }

    let mut data = Vec::with_capacity(rows * cols);
    let mut buf = [0u8; 8];
    for _ in 0..rows * cols {
        read_exact(reader, &mut buf)?;
        data.push(f64::from_le_bytes(buf));
    }
    Matrix::from_vec(rows, cols, data)
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// `read_exact` that reports a short file as `Format` rather than `Io`.
fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => NnError::Format("model file is truncated".into()),
        _ => NnError::Io(e),
    })
}
