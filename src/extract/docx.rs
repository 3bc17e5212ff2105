use std::io::{Cursor, Read};

use xml::reader::{EventReader, XmlEvent};
use zip::ZipArchive;

use super::{ExtractError, Extraction, Extractor};
use crate::walker::FileKind;

const DOCUMENT_PART: &str = "word/document.xml";

/// Word-processor documents (`.docx`): paragraph text in document order,
/// one paragraph per line.
pub struct DocxExtractor;

impl Extractor for DocxExtractor {
    fn kind(&self) -> FileKind {
        FileKind::WordDoc
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, ExtractError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::decode("docx", e))?;
        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| ExtractError::decode("docx", e))?
            .read_to_string(&mut xml)?;

        let paragraphs = paragraphs(&xml)?;
        Ok(Extraction::text(paragraphs.join("\n")))
    }
}

/// Collect the text of every `w:p` element. Runs (`w:t`) are concatenated
/// as-is; tabs and line breaks inside a paragraph become spaces.
fn paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    for event in EventReader::new(xml.as_bytes()) {
        match event.map_err(|e| ExtractError::decode("docx", e))? {
            XmlEvent::StartElement { name, .. } => {
                match name.local_name.as_str() {
                    "t" => in_text = true,
                    "tab" | "br" | "cr" => current.push(' '),
                    _ => {}
                }
            }
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "t" => in_text = false,
                "p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            XmlEvent::Characters(text)
            | XmlEvent::Whitespace(text)
            | XmlEvent::CData(text)
                if in_text =>
            {
                current.push_str(&text);
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::*;

    fn docx_bytes(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_are_newline_joined_in_order() {
        let bytes = docx_bytes(
            "<w:p><w:r><w:t>Sealed </w:t></w:r><w:r><w:t>affidavit</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Palm Beach</w:t></w:r></w:p>",
        );
        let out = DocxExtractor.extract(&bytes).unwrap();
        assert_eq!(out.text, "Sealed affidavit\nPalm Beach");
    }

    #[test]
    fn tabs_and_empty_paragraphs() {
        let bytes = docx_bytes(
            "<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p><w:p/>\
             <w:p><w:r><w:t>c</w:t></w:r></w:p>",
        );
        let out = DocxExtractor.extract(&bytes).unwrap();
        assert_eq!(out.text, "a b\n\nc");
    }

    #[test]
    fn text_outside_runs_is_ignored() {
        let bytes = docx_bytes(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>",
        );
        assert_eq!(DocxExtractor.extract(&bytes).unwrap().text, "Title");
    }

    #[test]
    fn non_zip_is_a_decode_error() {
        let err = DocxExtractor.extract(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, ExtractError::Decode { format: "docx", .. }));
    }

    #[test]
    fn zip_without_document_part_is_a_decode_error() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = DocxExtractor.extract(&bytes).unwrap_err();
        assert!(matches!(err, ExtractError::Decode { format: "docx", .. }));
    }
}
