pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a JSON document from `--input <path>` if given, else from piped
/// stdin. `None` means neither was supplied and flags should be used.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
