use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Parses the metadata container of `path`. Missing or unparseable metadata is `None`.
pub fn read_exif(path: &Path) -> Option<Exif> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "metadata source could not be opened");
            return None;
        }
    };
    let mut buf = BufReader::new(file);
    match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => Some(exif),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no usable EXIF container");
            None
        }
    }
}

// Non-ASCII value types count as absent.
pub fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Ascii(parts) = &field.value else {
        return None;
    };
    parts
        .iter()
        .map(|raw| {
            String::from_utf8_lossy(raw)
                .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string()
        })
        .find(|value| !value.is_empty())
}
