use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use pdf_viewer_core::selection::range_text;
use pdf_viewer_core::{
    damerau_levenshtein_distance, fuzzy_search_words, jaro_winkler_similarity,
    levenshtein_distance, similarity, FuzzyMatch, MemoryTextSource, PageCoordinate, PageSearch,
    PageText, PageTextCache, SearchConfig, SearchHit, SelectionEngine, SelectionState,
    TextBoundingBox, TextBoxSource, ViewerConfig, WordSearchOptions,
};
use pdf_viewer_render::PdfDocument;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "pdf-viewer-cli")]
#[command(about = "Select and search text on PDF pages")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// PDF file to read text from.
    #[arg(value_name = "FILE", required_unless_present = "boxes", conflicts_with = "boxes")]
    file: Option<PathBuf>,

    /// JSON dump of positioned text boxes to use instead of a PDF.
    #[arg(long, value_name = "JSON")]
    boxes: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum SelectMode {
    Drag,
    Word,
    Line,
    All,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the text of a page.
    Text {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Select text at a point (or between two points) and print the selection as JSON.
    Select {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, allow_hyphen_values = true)]
        x: f32,
        #[arg(long, allow_hyphen_values = true)]
        y: f32,
        #[arg(long, allow_hyphen_values = true, requires = "to_y")]
        to_x: Option<f32>,
        #[arg(long, allow_hyphen_values = true, requires = "to_x")]
        to_y: Option<f32>,
        #[arg(long, value_enum, default_value_t = SelectMode::Drag)]
        mode: SelectMode,
    },
    /// Find text and print one JSON line per page with matches.
    Search {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        query: String,
        /// Limit the search to one page.
        #[arg(long, conflicts_with_all = ["from_page", "to_page"])]
        page: Option<u32>,
        /// First page of the searched range.
        #[arg(long)]
        from_page: Option<u32>,
        /// Last page of the searched range.
        #[arg(long)]
        to_page: Option<u32>,
        /// Tolerate typos.
        #[arg(long)]
        fuzzy: bool,
        /// Compare whole words and print their surrounding text.
        #[arg(long, conflicts_with = "fuzzy")]
        words: bool,
        #[arg(long)]
        max_distance: Option<usize>,
        #[arg(long)]
        case_sensitive: bool,
        /// Only report matches that are whole words.
        #[arg(long)]
        whole_words: bool,
    },
    /// Print edit distance and similarity scores of two strings.
    Distance { a: String, b: String },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct SelectOutput {
    page: u32,
    mode: SelectMode,
    state: SelectionState,
    anchor: Option<usize>,
    cursor: Option<usize>,
    text: String,
    rects: Vec<TextBoundingBox>,
}

#[derive(Debug, Serialize)]
struct PageHitsOutput {
    page: u32,
    hits: Vec<HitOutput>,
}

#[derive(Debug, Serialize)]
struct HitOutput {
    start: usize,
    end: usize,
    text: String,
    edit_distance: usize,
    similarity: f64,
    rects: Vec<TextBoundingBox>,
}

impl From<SearchHit> for HitOutput {
    fn from(hit: SearchHit) -> Self {
        Self {
            start: hit.char_start,
            end: hit.char_end,
            text: hit.text,
            edit_distance: hit.edit_distance,
            similarity: hit.similarity,
            rects: hit.rects,
        }
    }
}

#[derive(Debug, Serialize)]
struct PageWordsOutput {
    page: u32,
    matches: Vec<FuzzyMatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchMode {
    Exact,
    Fuzzy,
    Words,
}

#[derive(Debug, Serialize)]
struct DistanceOutput {
    distance: usize,
    damerau_distance: usize,
    similarity: f64,
    jaro_winkler: f64,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    debug!("effective config: {:?}", config);

    match cli.command {
        Commands::Text { input, page } => run_text(&input, page, &config),
        Commands::Select { input, page, x, y, to_x, to_y, mode } => {
            let to = to_x.zip(to_y).map(|(x, y)| PageCoordinate::new(x, y));
            run_select(&input, page, PageCoordinate::new(x, y), to, mode, &config)
        }
        Commands::Search {
            input,
            query,
            page,
            from_page,
            to_page,
            fuzzy,
            words,
            max_distance,
            case_sensitive,
            whole_words,
        } => {
            let mut search = config.search;
            search.case_sensitive |= case_sensitive;
            search.whole_words |= whole_words;
            if let Some(max_distance) = max_distance {
                search.max_distance = max_distance;
            }
            let mode = match (fuzzy, words) {
                (_, true) => SearchMode::Words,
                (true, false) => SearchMode::Fuzzy,
                (false, false) => SearchMode::Exact,
            };
            let range = PageRange { page, from_page, to_page };
            run_search(&input, &query, range, mode, &search, &config)
        }
        Commands::Distance { a, b } => run_distance(&a, &b),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    // A logger may already be installed when run() is called more than once
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    let base = match path {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    base.apply_env(|key| std::env::var(key).ok())
        .context("invalid PDF_VIEWER_* environment override")
}

fn run_text(input: &InputArgs, page: u32, config: &ViewerConfig) -> Result<()> {
    let source = open_source(input)?;
    let page_text = load_page(source.as_ref(), page, config)?;

    let mut engine = SelectionEngine::with_page(page_text);
    engine.select_all();

    println!("{}", engine.selected_text());
    Ok(())
}

fn run_select(
    input: &InputArgs,
    page: u32,
    from: PageCoordinate,
    to: Option<PageCoordinate>,
    mode: SelectMode,
    config: &ViewerConfig,
) -> Result<()> {
    let source = open_source(input)?;
    let page_text = load_page(source.as_ref(), page, config)?;
    let mut engine = SelectionEngine::with_page(page_text);

    match mode {
        SelectMode::Drag => {
            engine.start_selection(from);
            engine.update_selection(to.unwrap_or(from));
            engine.end_selection();
        }
        SelectMode::Word => engine.select_word_at(from),
        SelectMode::Line => engine.select_line_at(from),
        SelectMode::All => engine.select_all(),
    }

    let snapshot = engine.snapshot();
    let payload = SelectOutput {
        page,
        mode,
        state: engine.state(),
        anchor: engine.anchor(),
        cursor: engine.cursor(),
        text: snapshot.text,
        rects: snapshot.rects,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_search(
    input: &InputArgs,
    query: &str,
    range: PageRange,
    mode: SearchMode,
    search: &SearchConfig,
    config: &ViewerConfig,
) -> Result<()> {
    let source = open_source(input)?;
    let mut cache = PageTextCache::new(config.cache_capacity, config.selection);
    let pages = range.indices(source.page_count())?;
    let word_options = WordSearchOptions::from(search);

    let mut remaining = if search.max_results == 0 {
        usize::MAX
    } else {
        search.max_results
    };

    for index in pages {
        if remaining == 0 {
            break;
        }

        let page_text = cache
            .get_or_build(source.as_ref(), index)
            .with_context(|| format!("failed to extract text from page {}", index + 1))?;

        let line = match mode {
            SearchMode::Words => {
                let mut matches = fuzzy_search_words(&page_string(&page_text), query, &word_options);
                if matches.is_empty() {
                    continue;
                }
                matches.truncate(remaining);
                remaining -= matches.len();
                serde_json::to_string(&PageWordsOutput { page: index + 1, matches })?
            }
            SearchMode::Exact | SearchMode::Fuzzy => {
                let mut hits =
                    PageSearch::find(&page_text, query, mode == SearchMode::Fuzzy, search);
                if hits.is_empty() {
                    continue;
                }
                hits.truncate(remaining);
                remaining -= hits.len();
                serde_json::to_string(&PageHitsOutput {
                    page: index + 1,
                    hits: hits.into_iter().map(HitOutput::from).collect(),
                })?
            }
        };
        println!("{line}");
    }

    info!("search for {:?} done", query);
    Ok(())
}

/// Page text with a line feed between visual lines
fn page_string(page: &PageText) -> String {
    if page.is_empty() {
        return String::new();
    }
    range_text(page, 0, page.len() - 1)
}

/// Pages chosen on the command line, all 1-based and inclusive
#[derive(Debug, Clone, Copy, Default)]
struct PageRange {
    page: Option<u32>,
    from_page: Option<u32>,
    to_page: Option<u32>,
}

impl PageRange {
    /// Page indices to visit. The end of a range is clamped to the document.
    fn indices(&self, page_count: u32) -> Result<Vec<u32>> {
        if let Some(page) = self.page {
            return Ok(vec![page_index(page, page_count)?]);
        }
        if self.from_page.is_none() && self.to_page.is_none() {
            return Ok((0..page_count).collect());
        }

        let first = page_index(self.from_page.unwrap_or(1), page_count)?;
        let last = match self.to_page {
            Some(0) => bail!("--to-page is 1-based and must be >= 1"),
            Some(to) => to.min(page_count) - 1,
            None => page_count - 1,
        };
        if last < first {
            bail!("--to-page {} is before --from-page {}", last + 1, first + 1);
        }
        Ok((first..=last).collect())
    }
}

fn run_distance(a: &str, b: &str) -> Result<()> {
    let payload = DistanceOutput {
        distance: levenshtein_distance(a, b),
        damerau_distance: damerau_levenshtein_distance(a, b),
        similarity: similarity(a, b),
        jaro_winkler: jaro_winkler_similarity(a, b),
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn open_source(input: &InputArgs) -> Result<Box<dyn TextBoxSource>> {
    if let Some(boxes) = &input.boxes {
        ensure_file_exists(boxes)?;
        let source = MemoryTextSource::from_json_file(boxes)
            .with_context(|| format!("failed to read text boxes from {}", boxes.display()))?;
        return Ok(Box::new(source));
    }

    let Some(file) = &input.file else {
        bail!("either FILE or --boxes is required");
    };
    ensure_file_exists(file)?;
    let document = PdfDocument::open(file).context("failed to open PDF")?;
    Ok(Box::new(document))
}

fn load_page(source: &dyn TextBoxSource, page: u32, config: &ViewerConfig) -> Result<Arc<PageText>> {
    let index = page_index(page, source.page_count())?;
    let mut cache = PageTextCache::new(config.cache_capacity, config.selection);

    cache
        .get_or_build(source, index)
        .with_context(|| format!("failed to extract text from page {page}"))
}

/// Convert a 1-based CLI page number into a page index
fn page_index(page: u32, page_count: u32) -> Result<u32> {
    if page == 0 {
        bail!("--page is 1-based and must be >= 1");
    }
    if page > page_count {
        bail!("page {page} out of range (document has {page_count} pages)");
    }
    Ok(page - 1)
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
