use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::foundation::error::{PressPlayError, PressPlayResult};

/// Font used to draw captions, loaded once per run.
#[derive(Clone)]
pub struct CaptionFont {
    /// Raw font file bytes (may be a collection).
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside `bytes`.
    pub index: u32,
    /// Primary family name of the face.
    pub family: String,
    /// Where the font was found.
    pub origin: FontOrigin,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .field("family", &self.family)
            .field("origin", &self.origin)
            .finish()
    }
}

/// How a [`CaptionFont`] was located.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontOrigin {
    /// Explicit font file from configuration.
    File(PathBuf),
    /// Installed system font.
    System,
}

// Bold sans-serif faces that read well as subtitles, most preferred first.
const PREFERRED_FAMILIES: &[&str] = &[
    "Arial",
    "Liberation Sans",
    "DejaVu Sans",
    "Noto Sans",
    "Helvetica",
    "FreeSans",
];

/// Locate the caption font.
///
/// An explicit `font_path` wins; otherwise installed system fonts are searched for a bold
/// sans-serif face. Missing fonts are a deployment problem and surface as
/// [`PressPlayError::RenderDependency`].
pub fn resolve_caption_font(font_path: Option<&Path>) -> PressPlayResult<CaptionFont> {
    if let Some(path) = font_path {
        return load_font_file(path);
    }

    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if db.is_empty() {
        return Err(missing_font_error());
    }

    let mut families: Vec<usvg::fontdb::Family<'_>> = PREFERRED_FAMILIES
        .iter()
        .map(|&name| usvg::fontdb::Family::Name(name))
        .collect();
    families.push(usvg::fontdb::Family::SansSerif);

    let query = usvg::fontdb::Query {
        families: &families,
        weight: usvg::fontdb::Weight::BOLD,
        stretch: usvg::fontdb::Stretch::Normal,
        style: usvg::fontdb::Style::Normal,
    };

    let id = match db.query(&query) {
        Some(id) => id,
        None => {
            let first = db.faces().next().map(|f| f.id).ok_or_else(missing_font_error)?;
            tracing::warn!("no sans-serif font matched; falling back to the first system face");
            first
        }
    };

    let family = db
        .face(id)
        .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
        .unwrap_or_else(|| "unknown".to_string());
    let (bytes, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| {
            PressPlayError::render_dependency(format!(
                "system font '{family}' could not be loaded"
            ))
        })?;

    tracing::debug!(family = %family, "resolved caption font");
    Ok(CaptionFont {
        bytes: Arc::new(bytes),
        index,
        family,
        origin: FontOrigin::System,
    })
}

fn load_font_file(path: &Path) -> PressPlayResult<CaptionFont> {
    let bytes = std::fs::read(path).map_err(|e| {
        PressPlayError::render_dependency(format!(
            "caption font '{}' could not be read: {e}",
            path.display()
        ))
    })?;

    let mut db = usvg::fontdb::Database::new();
    db.load_font_data(bytes.clone());
    let face = db.faces().next().ok_or_else(|| {
        PressPlayError::render_dependency(format!(
            "'{}' does not contain a usable font face",
            path.display()
        ))
    })?;
    let family = face
        .families
        .first()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(CaptionFont {
        index: face.index,
        family,
        bytes: Arc::new(bytes),
        origin: FontOrigin::File(path.to_path_buf()),
    })
}

fn missing_font_error() -> PressPlayError {
    PressPlayError::render_dependency(
        "no sans-serif font is installed for caption rendering; install one \
         (e.g. DejaVu Sans or Liberation Sans), pass --font, or set PRESSPLAY_FONT",
    )
}

#[cfg(test)]
#[path = "../../tests/unit/assets/font.rs"]
mod tests;
