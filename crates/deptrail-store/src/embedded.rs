//! Descriptors packed inside archives
//!
//! Published archives usually carry their own descriptor at
//! `META-INF/maven/<group>/<artifact>/pom.xml`. Stores fall back to it when
//! no descriptor file was stored next to the archive.

use std::io::{Cursor, Read};

use deptrail_core::StoreError;
use tracing::trace;

/// Location of the embedded descriptor inside an archive
pub fn embedded_descriptor_path(group: &str, artifact: &str) -> String {
    format!("META-INF/maven/{}/{}/pom.xml", group, artifact)
}

/// Extract the embedded descriptor of `group:artifact` from archive bytes
pub fn embedded_descriptor(
    content: &[u8],
    group: &str,
    artifact: &str,
) -> Result<Option<Vec<u8>>, StoreError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(content)).map_err(|e| StoreError::archive(e.to_string()))?;
    let path = embedded_descriptor_path(group, artifact);

    let mut entry = match archive.by_name(&path) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            trace!(group, artifact, "No embedded descriptor");
            return Ok(None);
        }
        Err(e) => return Err(StoreError::archive(e.to_string())),
    };

    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            for (name, data) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_extracts_embedded_descriptor() {
        let bytes = archive(&[
            ("com/acme/Widget.class", b"\xca\xfe"),
            ("META-INF/maven/com.acme/widget/pom.xml", b"<project/>"),
        ]);
        let descriptor = embedded_descriptor(&bytes, "com.acme", "widget").unwrap();
        assert_eq!(descriptor.as_deref(), Some(&b"<project/>"[..]));
    }

    #[test]
    fn test_missing_embedded_descriptor() {
        let bytes = archive(&[("com/acme/Widget.class", b"\xca\xfe")]);
        assert!(embedded_descriptor(&bytes, "com.acme", "widget").unwrap().is_none());
    }

    #[test]
    fn test_not_an_archive() {
        let err = embedded_descriptor(b"plain text", "g", "a").unwrap_err();
        assert!(matches!(err, StoreError::Archive(_)));
    }
}
