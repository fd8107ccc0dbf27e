pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Parameters from `--input <file>` or piped stdin, if either was given.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(file::read_input(path)?)),
        None => stdin::read_stdin(),
    }
}
