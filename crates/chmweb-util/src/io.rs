use std::fs;
use std::path::Path;

use crate::error::ChmIoError;

pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String, ChmIoError> {
    fs::read_to_string(path.as_ref()).map_err(|e| ChmIoError {
        source: e,
        path: path.as_ref().to_path_buf(),
    })
}

pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ChmIoError> {
    fs::read(path.as_ref()).map_err(|e| ChmIoError {
        source: e,
        path: path.as_ref().to_path_buf(),
    })
}

pub fn write<P: AsRef<Path>>(path: P, contents: impl AsRef<[u8]>) -> Result<(), ChmIoError> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent).map_err(|e| ChmIoError {
            source: e,
            path: parent.to_path_buf(),
        })?;
    }
    fs::write(path.as_ref(), contents).map_err(|e| ChmIoError {
        source: e,
        path: path.as_ref().to_path_buf(),
    })
}
