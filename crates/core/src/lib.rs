//! PDF Viewer Core Library
//!
//! Text selection and search for rendered PDF pages: per-glyph indexing of
//! extracted text runs, line/word segmentation, the selection state machine,
//! fuzzy matching, find-in-page and undoable highlights.

pub mod char_index;
pub mod config;
pub mod error;
pub mod events;
pub mod fuzzy;
pub mod geometry;
pub mod highlight;
pub mod history;
pub mod layout;
pub mod page_cache;
pub mod search;
pub mod selection;
pub mod text_source;

#[cfg(test)]
mod test_support;

pub use char_index::{CharacterIndex, Glyph};
pub use config::{SearchConfig, SelectionConfig, ViewerConfig};
pub use error::{
    ConfigError, ConfigResult, ExtractionError, ExtractionResult, HistoryError, HistoryResult,
};
pub use events::{EventBus, SelectionEvent, SubscriptionId};
pub use fuzzy::{
    damerau_levenshtein_distance, fuzzy_search, fuzzy_search_words, is_fuzzy_match,
    jaro_winkler_similarity, levenshtein_distance, levenshtein_distance_bounded,
    ngram_similarity, similarity, soundex, soundex_match, FuzzyMatch, WordSearchOptions,
};
pub use geometry::{PageCoordinate, TextBoundingBox};
pub use highlight::{Color, Highlight, HighlightId, HighlightModel};
pub use history::{CommandHistory, HighlightCommand};
pub use layout::LayoutAnalyzer;
pub use page_cache::{PageText, PageTextCache};
pub use search::{PageSearch, SearchHit, SearchResults};
pub use selection::{Selection, SelectionEngine, SelectionSnapshot, SelectionState};
pub use text_source::{MemoryTextSource, TextBox, TextBoxSource};
