//! TypeScript/JavaScript import extraction using tree-sitter.
//!
//! Pulls the module specifiers a file depends on out of its syntax tree:
//! static imports and re-exports, `require()`, dynamic `import()`, and the
//! module arguments of `jest.mock` and friends.

use crate::error::{Error, Result};
use crate::normalize::truncate_for_log;
use std::path::Path;
use tracing::{debug, warn};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

/// Maximum number of imports to extract per file.
const MAX_IMPORTS_PER_FILE: usize = 500;

/// Extensions whose contents are parsed for imports.
pub const PARSEABLE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

const IMPORT_QUERY: &str = r#"
    (import_statement source: (string) @source)
    (export_statement source: (string) @source)
    (call_expression
        function: (identifier) @func (#eq? @func "require")
        arguments: (arguments (string) @source))
"#;

const EXTRA_QUERY: &str = r#"
    (call_expression
        function: (import)
        arguments: (arguments (string) @source))
    (call_expression
        function: (member_expression
            object: (identifier) @obj (#eq? @obj "jest")
            property: (property_identifier) @method
            (#match? @method "^(mock|unmock|doMock|requireActual|requireMock)$"))
        arguments: (arguments . (string) @source))
"#;

struct GrammarQueries {
    language: Language,
    imports: Query,
    extras: Option<Query>,
}

impl GrammarQueries {
    fn new(language: Language, name: &str) -> Result<Self> {
        let imports = Query::new(&language, IMPORT_QUERY)
            .map_err(|e| Error::Query(format!("{name}: {e}")))?;
        let extras = match Query::new(&language, EXTRA_QUERY) {
            Ok(q) => Some(q),
            Err(e) => {
                warn!("dynamic import and mock queries unavailable for {name}: {e}");
                None
            }
        };
        Ok(Self { language, imports, extras })
    }
}

/// Reusable import extractor holding one parser and the compiled queries.
pub struct ImportParser {
    parser: Parser,
    typescript: GrammarQueries,
    tsx: GrammarQueries,
}

impl ImportParser {
    /// Compile the import queries for both grammars.
    ///
    /// # Errors
    /// Returns `Error::Query` if the core import query does not compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: Parser::new(),
            typescript: GrammarQueries::new(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), "typescript")?,
            tsx: GrammarQueries::new(tree_sitter_typescript::LANGUAGE_TSX.into(), "tsx")?,
        })
    }

    /// Parse imports from a file on disk.
    ///
    /// Unreadable files yield no imports (logged as warnings).
    pub fn parse_file(&mut self, path: &Path) -> Vec<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => self.parse_source(&content, path),
            Err(e) => {
                warn!("cannot read {}: {e}", truncate_for_log(path));
                Vec::new()
            }
        }
    }

    /// Module specifiers imported by `content`, in source order; `path` picks
    /// the grammar.
    ///
    /// Syntax errors do not discard the file: imports that survive in the
    /// recovered tree are still returned. More than 500 imports are truncated.
    pub fn parse_source(&mut self, content: &str, path: &Path) -> Vec<String> {
        let grammar = if uses_typescript_grammar(path) { &self.typescript } else { &self.tsx };

        if let Err(e) = self.parser.set_language(&grammar.language) {
            warn!("failed to set language for {}: {e}", truncate_for_log(path));
            return Vec::new();
        }

        let Some(tree) = self.parser.parse(content, None) else {
            warn!("parse returned nothing for {}", truncate_for_log(path));
            return Vec::new();
        };

        let root = tree.root_node();
        if root.has_error() {
            warn!("syntax errors in {}, using imports from the recovered tree", truncate_for_log(path));
        }

        let mut imports = Vec::new();
        collect_matches(&grammar.imports, content, root, &mut imports);
        if let Some(extras) = &grammar.extras {
            collect_matches(extras, content, root, &mut imports);
        }

        if imports.len() > MAX_IMPORTS_PER_FILE {
            warn!(
                "{} has {} imports, truncating to {MAX_IMPORTS_PER_FILE}",
                truncate_for_log(path),
                imports.len()
            );
            imports.truncate(MAX_IMPORTS_PER_FILE);
        }

        debug!("{}: {} imports", truncate_for_log(path), imports.len());
        imports
    }
}

/// Whether `path` is a JS/TS module this parser understands.
pub fn is_parseable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PARSEABLE_EXTENSIONS.contains(&ext))
}

fn uses_typescript_grammar(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext, "ts" | "mts" | "cts")
}

fn collect_matches(query: &Query, content: &str, root: Node<'_>, out: &mut Vec<String>) {
    let Some(source_idx) = query.capture_index_for_name("source") else {
        return;
    };

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, content.as_bytes());

    while let Some(m) = matches.next() {
        for capture in m.captures.iter().filter(|c| c.index == source_idx) {
            if let Some(specifier) = specifier_text(content, capture.node) {
                out.push(specifier);
            }
        }
    }
}

fn specifier_text(content: &str, source: Node<'_>) -> Option<String> {
    let text = source.utf8_text(content.as_bytes()).ok()?;
    let specifier = text.trim_matches(|c| c == '"' || c == '\'');
    (!specifier.is_empty()).then(|| specifier.to_string())
}
