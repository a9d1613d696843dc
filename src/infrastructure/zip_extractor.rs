// Zip archive extractor
use crate::application::artifact_source::ArchiveExtractor;
use indexmap::IndexMap;
use std::io::{Cursor, Read};

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ZipExtractor {
    fn try_extract(bytes: &[u8]) -> zip::result::ZipResult<IndexMap<String, Vec<u8>>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = IndexMap::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            entries.insert(file.name().to_string(), contents);
        }

        Ok(entries)
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, bytes: &[u8]) -> IndexMap<String, Vec<u8>> {
        if bytes.is_empty() {
            return IndexMap::new();
        }
        match Self::try_extract(bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, size = bytes.len(), "unreadable archive, treating as empty");
                IndexMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::zip_archive;

    #[test]
    fn test_extracts_nested_entries_in_order() {
        let bytes = zip_archive(&[
            ("b/second.xml", "<testsuite/>"),
            ("a/first.txt", "hello"),
        ]);

        let entries = ZipExtractor.extract(&bytes);
        let paths: Vec<_> = entries.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["b/second.xml", "a/first.txt"]);
        assert_eq!(entries["a/first.txt"], b"hello");
    }

    #[test]
    fn test_skips_directories() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("reports/", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file("reports/api30.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut writer, b"<testsuites/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let entries = ZipExtractor.extract(&bytes);
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("reports/api30.xml"));
    }

    #[test]
    fn test_invalid_or_empty_archive_is_empty() {
        assert!(ZipExtractor.extract(&[]).is_empty());
        assert!(ZipExtractor.extract(b"not a zip at all").is_empty());
    }
}
