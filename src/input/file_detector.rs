//! File type detection

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Text,
    Markdown,
    /// PDF, DOCX and friends. Text must be extracted before analysis.
    Binary,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            "pdf" | "doc" | "docx" | "odt" | "rtf" => FileType::Binary,
            _ => FileType::Unknown,
        }
    }
}
