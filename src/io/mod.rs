//! Reading and writing of integral results and configuration files.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{self, format_err};
use bincode;
use serde::{de::DeserializeOwned, Serialize};
use serde_yaml;

pub(crate) mod format;


/// File types written by `GTOInts`.
pub enum GtoIntsFileType {
    /// Binary files containing integral results.
    Int,
}

impl GtoIntsFileType {
    /// Returns the extension of the file type.
    pub fn ext(&self) -> String {
        match self {
            GtoIntsFileType::Int => "gtoints.int".to_string(),
        }
    }
}

/// Reads a `GTOInts` binary file and deserialises it.
///
/// # Arguments
///
/// * `name` - The name of the file to be read in (without `GTOInts`-specific extensions).
/// * `file_type` - The type of the file.
pub fn read_gtoints_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: GtoIntsFileType,
) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut reader = BufReader::new(File::open(path).map_err(|err| format_err!(err))?);
    bincode::deserialize_from(&mut reader).map_err(|err| format_err!(err))
}

/// Serialises a structure into a `GTOInts` binary file.
///
/// # Arguments
///
/// * `name` - The name of the file to be written (without `GTOInts`-specific extensions).
/// * `file_type` - The type of the file.
/// * `value` - The structure to be written.
pub fn write_gtoints_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: GtoIntsFileType,
    value: &T,
) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, value).map_err(|err| format_err!(err))
}

/// Reads a YAML file (with its `.yml` or `.yaml` extension) and deserialises it.
pub fn read_gtoints_yaml<T, P: AsRef<Path>>(name: P) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut reader = BufReader::new(File::open(name).map_err(|err| format_err!(err))?);
    serde_yaml::from_reader(&mut reader).map_err(|err| format_err!(err))
}

/// Serialises a structure into a YAML file. The name is given without extensions; the written
/// file has the `.yml` extension.
pub fn write_gtoints_yaml<T, P: AsRef<Path>>(name: P, value: &T) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension("yml");
    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, value).map_err(|err| format_err!(err))
}
