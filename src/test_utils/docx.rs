//! In-memory `.docx` templates.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::templating::archive::{DOCUMENT_PART, run_text};

const NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const WORD_SHAPED_DOCUMENT: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\r\n",
    r#"<w:document xmlns:wpc="http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" mc:Ignorable="w14">"#,
    "<w:body>",
    // Title
    r#"<w:p w14:paraId="1C5E3A20" w14:textId="77777777" w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B">"#,
    r#"<w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>Pełnomocnictwo</w:t></w:r></w:p>"#,
    // Tag split by spell checking
    r#"<w:p w14:paraId="2A7B9C11" w14:textId="5F0E2D33" w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B">"#,
    r#"<w:r><w:t xml:space="preserve">Mocodawca: </w:t></w:r>"#,
    r#"<w:r w:rsidR="008E1A4C"><w:t>{cli</w:t></w:r><w:proofErr w:type="spellStart"/>"#,
    r#"<w:r w:rsidR="008E1A4C"><w:rPr><w:b/><w:bCs/></w:rPr><w:t>ent.na</w:t></w:r>"#,
    r#"<w:proofErr w:type="spellEnd"/><w:r w:rsidR="008E1A4C"><w:t>me}</w:t></w:r></w:p>"#,
    // Logo
    r#"<w:p w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B"><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:noProof/></w:rPr>"#,
    r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="952500" cy="952500"/>"#,
    r#"<wp:docPr id="1" name="Obraz 1"><a:extLst><a:ext uri="{FF2B5EF4-FFF2-40B4-BE49-F238E27FC236}">"#,
    r#"<a16:creationId xmlns:a16="http://schemas.microsoft.com/office/drawing/2014/main" id="{6A1F3C52-0B7D-4E8A-9C21-3D5E7F9A1B2C}"/>"#,
    r#"</a:ext></a:extLst></wp:docPr><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
    r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="1" name="logo.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
    r#"<pic:blipFill><a:blip r:embed="rId4"><a:extLst><a:ext uri="{28A0092B-C50C-407E-A947-70E740481C1C}">"#,
    r#"<a14:useLocalDpi xmlns:a14="http://schemas.microsoft.com/office/drawing/2010/main" val="0"/>"#,
    r#"</a:ext></a:extLst></a:blip><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
    r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="952500" cy="952500"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
    r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
    // Page field followed by a tag
    r#"<w:p w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B"><w:r><w:t xml:space="preserve">Strona </w:t></w:r>"#,
    r#"<w:fldSimple w:instr=" PAGE  \* MERGEFORMAT "><w:r><w:rPr><w:noProof/></w:rPr><w:t>1</w:t></w:r></w:fldSimple>"#,
    r#"<w:r><w:t xml:space="preserve">, sprawa {case.case_number}</w:t></w:r></w:p>"#,
    // Content control
    r#"<w:sdt><w:sdtPr><w:alias w:val="Urząd"/><w:tag w:val="office"/><w:id w:val="-1837453120"/>"#,
    r#"<w:placeholder><w:docPart w:val="DefaultPlaceholder_-1854013440"/></w:placeholder></w:sdtPr>"#,
    r#"<w:sdtContent><w:p w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B"><w:r><w:t>{case.office_name}</w:t></w:r></w:p></w:sdtContent></w:sdt>"#,
    // Paragraph loop
    r#"<w:p w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B"><w:r><w:t>{#assignees}</w:t></w:r></w:p>"#,
    r#"<w:p w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B"><w:pPr><w:pStyle w:val="ListBullet"/></w:pPr>"#,
    r#"<w:r><w:t>{name}</w:t></w:r></w:p>"#,
    r#"<w:p w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B"><w:r><w:t>{/assignees}</w:t></w:r></w:p>"#,
    // Run text with extra attributes
    r#"<w:p w:rsidR="00D41F2B" w:rsidRDefault="00D41F2B"><w:r><w:t xml:space="preserve" w14:hint="n/a">Data: </w:t></w:r>"#,
    r#"<w:r><w:t w14:hint="a/b">{date.today}</w:t></w:r></w:p>"#,
    r#"<w:sectPr w:rsidR="00D41F2B"><w:pgSz w:w="11906" w:h="16838"/>"#,
    r#"<w:pgMar w:top="1417" w:right="1417" w:bottom="1417" w:left="1417" w:header="708" w:footer="708" w:gutter="0"/>"#,
    r#"</w:sectPr></w:body></w:document>"#,
);

/// Builder for minimal Word documents.
///
/// Every paragraph becomes one `<w:p>`; [`split_runs`](Self::split_runs)
/// spreads its text over several runs the way word processors do after
/// editing, which is how tags end up split.
#[derive(Debug, Clone, Default)]
pub struct DocxFixture {
    paragraphs: Vec<String>,
    header: Option<String>,
    footer: Option<String>,
}

impl DocxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph with a single run.
    #[must_use]
    pub fn paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape(text)
        ));
        self
    }

    /// Append a paragraph with one run per piece; every other run is bold.
    #[must_use]
    pub fn split_runs(mut self, pieces: &[&str]) -> Self {
        let runs: String = pieces
            .iter()
            .enumerate()
            .map(|(i, piece)| {
                let props = if i % 2 == 1 { "<w:rPr><w:b/></w:rPr>" } else { "" };
                format!("<w:r>{props}<w:t>{}</w:t></w:r>", escape(piece))
            })
            .collect();
        self.paragraphs.push(format!("<w:p>{runs}</w:p>"));
        self
    }

    /// Set the text of `word/header1.xml`.
    #[must_use]
    pub fn header(mut self, text: &str) -> Self {
        self.header = Some(text.to_string());
        self
    }

    /// Set the text of `word/footer1.xml`.
    #[must_use]
    pub fn footer(mut self, text: &str) -> Self {
        self.footer = Some(text.to_string());
        self
    }

    /// Zip the document.
    pub fn build(&self) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{NAMESPACE}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            self.paragraphs.concat()
        );

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
            ("_rels/.rels".to_string(), ROOT_RELS.to_string()),
            (DOCUMENT_PART.to_string(), document),
            ("word/styles.xml".to_string(), format!(r#"<w:styles xmlns:w="{NAMESPACE}"/>"#)),
        ];
        if let Some(text) = &self.header {
            parts.push(("word/header1.xml".to_string(), side_part("hdr", text)));
        }
        if let Some(text) = &self.footer {
            parts.push(("word/footer1.xml".to_string(), side_part("ftr", text)));
        }

        let entries: Vec<(&str, &str)> =
            parts.iter().map(|(name, content)| (name.as_str(), content.as_str())).collect();
        Self::raw(&entries)
    }

    /// Zip arbitrary entries.
    pub fn raw(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in entries {
            writer.start_file(*name, options).expect("start zip entry");
            writer.write_all(content.as_bytes()).expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    /// XML of one part of a `.docx` binary.
    pub fn part(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).expect("valid zip");
        let mut file = archive.by_name(name).expect("part exists");
        let mut xml = String::new();
        file.read_to_string(&mut xml).expect("utf-8 part");
        xml
    }

    /// A document the way Word saves it.
    ///
    /// Besides plain paragraphs it has a picture whose extension GUIDs are
    /// wrapped in braces, a `PAGE` field, a content control, a tag split by
    /// spell-check markers, runs with extra attributes, and an assignee list
    /// whose `{#assignees}` and `{/assignees}` tags sit in paragraphs of their
    /// own. Tags, in order: `client.name`, `case.case_number`,
    /// `case.office_name`, `assignees`, `name`, `date.today`.
    pub fn word_shaped() -> Vec<u8> {
        Self::raw(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            (DOCUMENT_PART, WORD_SHAPED_DOCUMENT),
        ])
    }

    /// Visible text of the document body, with XML entities decoded.
    pub fn document_text(docx: &[u8]) -> String {
        let text = run_text(&Self::part(docx, DOCUMENT_PART)).expect("well-formed document part");
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}

fn side_part(element: &str, text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:{element} xmlns:w="{NAMESPACE}"><w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p></w:{element}>"#,
        escape(text)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
