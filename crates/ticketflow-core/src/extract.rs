use crate::error::{Result, TicketflowError};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Txt,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(TicketflowError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// Read a requirements document as plain text. Line endings are normalized
/// and surrounding whitespace is trimmed.
pub fn extract_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(TicketflowError::InputNotFound(path.display().to_string()));
    }
    let format = DocumentFormat::from_path(path)?;
    let raw = match format {
        DocumentFormat::Txt => std::fs::read_to_string(path)?,
        DocumentFormat::Pdf => pdf_extract::extract_text(path).map_err(|e| extraction(path, e))?,
        DocumentFormat::Docx => docx_text(path)?,
    };
    let text = normalize(&raw);
    tracing::info!(path = %path.display(), chars = text.len(), "extracted document text");
    Ok(text)
}

fn extraction(path: &Path, reason: impl std::fmt::Display) -> TicketflowError {
    TicketflowError::Extraction {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// docx
// ---------------------------------------------------------------------------

static PARAGRAPH_RE: OnceLock<Regex> = OnceLock::new();
static RUN_TEXT_RE: OnceLock<Regex> = OnceLock::new();
static CHAR_REF_RE: OnceLock<Regex> = OnceLock::new();

fn paragraph_re() -> &'static Regex {
    PARAGRAPH_RE.get_or_init(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>|<w:p/>").unwrap())
}

fn run_text_re() -> &'static Regex {
    RUN_TEXT_RE.get_or_init(|| Regex::new(r"(?s)<w:t(?: [^>]*)?>(.*?)</w:t>|<w:tab/>").unwrap())
}

fn char_ref_re() -> &'static Regex {
    CHAR_REF_RE.get_or_init(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").unwrap())
}

fn docx_text(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| extraction(path, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| extraction(path, e))?
        .read_to_string(&mut xml)?;
    Ok(document_xml_text(&xml))
}

/// One output line per `<w:p>` paragraph, concatenating its `<w:t>` runs.
pub fn document_xml_text(xml: &str) -> String {
    paragraph_re()
        .find_iter(xml)
        .map(|para| {
            run_text_re()
                .captures_iter(para.as_str())
                .map(|c| match c.get(1) {
                    Some(t) => unescape_xml(t.as_str()),
                    None => "\t".to_string(),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `&amp;` goes last so `&amp;#39;` stays a literal `&#39;`.
fn unescape_xml(s: &str) -> String {
    let named = s
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");
    char_ref_re()
        .replace_all(&named, |caps: &regex::Captures<'_>| {
            let code = match caps.get(1) {
                Some(hex) => u32::from_str_radix(hex.as_str(), 16).ok(),
                None => caps[2].parse().ok(),
            };
            match code.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .replace("&amp;", "&")
}
