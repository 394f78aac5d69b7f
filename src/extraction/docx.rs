use super::ExtractionError;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a DOCX package, one paragraph per line.
pub(super) fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|error| ExtractionError::Docx(error.to_string()))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|error| ExtractionError::Docx(format!("{DOCUMENT_PART}: {error}")))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    paragraphs_from_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Property subtrees whose children never contribute document text.
const PROPERTY_ELEMENTS: [&[u8]; 4] = [b"w:pPr", b"w:rPr", b"w:tabs", b"w:sectPr"];

fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;
    let mut run_depth = 0usize;
    let mut property_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.name().as_ref() {
                name if PROPERTY_ELEMENTS.contains(&name) => property_depth += 1,
                b"w:r" => run_depth += 1,
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::Empty(element)) => {
                let in_run_content = run_depth > 0 && property_depth == 0;
                match element.name().as_ref() {
                    b"w:tab" if in_run_content => current.push('\t'),
                    b"w:br" | b"w:cr" if in_run_content => current.push('\n'),
                    b"w:p" => paragraphs.push(String::new()),
                    _ => {}
                }
            }
            Ok(Event::End(element)) => match element.name().as_ref() {
                name if PROPERTY_ELEMENTS.contains(&name) => {
                    property_depth = property_depth.saturating_sub(1);
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text_run = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text_run && property_depth == 0 => {
                let unescaped = text
                    .unescape()
                    .map_err(|error| ExtractionError::Docx(error.to_string()))?;
                current.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(error) => {
                return Err(ExtractionError::Docx(format!(
                    "malformed XML at byte {}: {error}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", FileOptions::default())
            .expect("start content types");
        writer.write_all(b"<Types/>").expect("write content types");
        writer
            .start_file(DOCUMENT_PART, FileOptions::default())
            .expect("start document");
        writer
            .write_all(document_xml.as_bytes())
            .expect("write document");
        writer.finish().expect("finish zip").into_inner()
    }

    #[test]
    fn extracts_paragraphs_tabs_and_entities() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>LEASE AGREEMENT</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Landlord: </w:t></w:r><w:r><w:t>Acme &amp; Sons LLC</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Rent</w:t><w:tab/><w:t>$1,500.00</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = extract_docx_text(&build_docx(xml)).expect("docx text");
        assert_eq!(
            text,
            "LEASE AGREEMENT\nLandlord: Acme & Sons LLC\n\nRent\t$1,500.00"
        );
    }

    #[test]
    fn tab_stop_definitions_do_not_leak_into_text() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p>
      <w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/><w:tab w:val="right" w:pos="9360"/></w:tabs></w:pPr>
      <w:r><w:rPr><w:b/></w:rPr><w:t>WHEREAS the parties agree</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>Term</w:t><w:tab/><w:t>12 months</w:t><w:br/><w:t>renewable</w:t></w:r></w:p>
    <w:sectPr><w:pgSz w:w="12240"/></w:sectPr>
  </w:body>
</w:document>"#;
        let text = extract_docx_text(&build_docx(xml)).expect("docx text");
        assert_eq!(text, "WHEREAS the parties agree\nTerm\t12 months\nrenewable");
    }

    #[test]
    fn missing_document_part_is_an_error() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", FileOptions::default())
            .expect("start");
        writer.write_all(b"<x/>").expect("write");
        let bytes = writer.finish().expect("finish").into_inner();

        let error = extract_docx_text(&bytes).expect_err("missing part");
        assert!(matches!(error, ExtractionError::Docx(ref message) if message.contains(DOCUMENT_PART)));
    }

    #[test]
    fn non_zip_input_is_an_error() {
        assert!(matches!(
            extract_docx_text(b"plain text"),
            Err(ExtractionError::Docx(_))
        ));
    }
}
