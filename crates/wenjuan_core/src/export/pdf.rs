//! PDF typesetting for exports.
//!
//! # Responsibility
//! - Compile generated Typst markup into PDF bytes with embedded fonts.
//!
//! # Invariants
//! - Compilation never reads the filesystem or the clock, so identical
//!   markup yields identical bytes.

use once_cell::sync::Lazy;
use typst::diag::{FileError, FileResult, SourceDiagnostic};
use typst::foundations::{Bytes, Datetime};
use typst::layout::PagedDocument;
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};

static LIBRARY: Lazy<LazyHash<Library>> =
    Lazy::new(|| LazyHash::new(Library::builder().build()));

static FONTS: Lazy<EmbeddedFonts> = Lazy::new(EmbeddedFonts::load);

struct EmbeddedFonts {
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
}

impl EmbeddedFonts {
    fn load() -> Self {
        let fonts: Vec<Font> = typst_assets::fonts()
            .flat_map(|data| Font::iter(Bytes::new(data)))
            .collect();
        Self {
            book: LazyHash::new(FontBook::from_fonts(&fonts)),
            fonts,
        }
    }
}

/// Single-file world: only the generated main source is visible.
struct ExportWorld {
    main: Source,
}

impl ExportWorld {
    fn new(markup: &str) -> Self {
        let id = FileId::new(None, VirtualPath::new("export.typ"));
        Self {
            main: Source::new(id, markup.to_string()),
        }
    }
}

impl World for ExportWorld {
    fn library(&self) -> &LazyHash<Library> {
        &LIBRARY
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &FONTS.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::AccessDenied)
        }
    }

    fn file(&self, _id: FileId) -> FileResult<Bytes> {
        Err(FileError::AccessDenied)
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        None
    }
}

/// Compiles Typst `markup` to PDF bytes.
pub(crate) fn compile_pdf(markup: &str) -> Result<Vec<u8>, String> {
    let world = ExportWorld::new(markup);
    let document = typst::compile::<PagedDocument>(&world)
        .output
        .map_err(|diagnostics| join_diagnostics(&diagnostics))?;
    typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default())
        .map_err(|diagnostics| join_diagnostics(&diagnostics))
}

fn join_diagnostics(diagnostics: &[SourceDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::compile_pdf;

    #[test]
    fn markup_compiles_to_pdf() {
        let bytes = compile_pdf("= Hello\n\nBody text.").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn broken_markup_reports_diagnostics() {
        let message = compile_pdf("#let x = ").unwrap_err();
        assert!(!message.is_empty());
    }
}
