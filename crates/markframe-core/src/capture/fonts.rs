//! System font lookup for the rasterizer.
//!
//! Families are resolved through `fontdb`; a missing family falls back to
//! common sans faces and finally to any installed face, so text still paints
//! on machines without the preset fonts.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use parking_lot::RwLock;
use swash::FontRef;
use tracing::{debug, warn};

const SANS_FALLBACKS: [&str; 4] = ["DejaVu Sans", "Liberation Sans", "Noto Sans", "Arial"];

const MONO_FAMILIES: [&str; 5] = [
    "JetBrains Mono",
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Courier New",
];

/// Which face of the family a run needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceRequest {
    pub bold: bool,
    pub italic: bool,
    pub mono: bool,
}

/// Font bytes and the face index inside them.
pub struct FontFace {
    data: Vec<u8>,
    index: u32,
    /// Bold was asked for but the face is lighter
    pub synthetic_bold: bool,
}

impl FontFace {
    pub fn font(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index as usize)
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .field("synthetic_bold", &self.synthetic_bold)
            .finish()
    }
}

type FaceKey = (String, FaceRequest);

/// A font database plus a cache of loaded faces.
pub struct FontLibrary {
    db: Database,
    faces: RwLock<HashMap<FaceKey, Option<Arc<FontFace>>>>,
}

impl fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontLibrary")
            .field("faces", &self.db.len())
            .finish_non_exhaustive()
    }
}

impl FontLibrary {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            faces: RwLock::new(HashMap::new()),
        }
    }

    /// A library with no fonts; text is measured but never painted.
    pub fn empty() -> Self {
        Self::new(Database::new())
    }

    /// The installed system fonts, loaded once per process.
    pub fn system() -> Arc<Self> {
        static SYSTEM: OnceLock<Arc<FontLibrary>> = OnceLock::new();
        Arc::clone(SYSTEM.get_or_init(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            debug!(faces = db.len(), "loaded system fonts");
            Arc::new(Self::new(db))
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.db.len() == 0
    }

    /// Best face for `family`, or `None` when nothing is installed.
    pub fn face(&self, family: &str, request: FaceRequest) -> Option<Arc<FontFace>> {
        let key = (family.to_string(), request);
        if let Some(cached) = self.faces.read().get(&key) {
            return cached.clone();
        }
        let face = self.load(family, request).map(Arc::new);
        self.faces.write().insert(key, face.clone());
        face
    }

    fn load(&self, family: &str, request: FaceRequest) -> Option<FontFace> {
        let mut families: Vec<Family<'_>> = Vec::new();
        if request.mono {
            families.extend(MONO_FAMILIES.iter().copied().map(Family::Name));
            families.push(Family::Monospace);
        } else {
            families.push(Family::Name(family));
            families.extend(SANS_FALLBACKS.iter().copied().map(Family::Name));
            families.push(Family::SansSerif);
        }

        let query = Query {
            families: &families,
            weight: if request.bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: if request.italic { Style::Italic } else { Style::Normal },
        };
        let id = self
            .db
            .query(&query)
            .or_else(|| self.db.faces().next().map(|info| info.id))?;
        let synthetic_bold = request.bold && self.db.face(id).is_some_and(|info| info.weight.0 < Weight::SEMIBOLD.0);

        let face = self.db.with_face_data(id, |data, index| FontFace {
            data: data.to_vec(),
            index,
            synthetic_bold,
        });
        if face.is_none() {
            warn!(family, "font face could not be read");
        }
        face
    }
}
