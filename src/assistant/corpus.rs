//! Training corpus and its SQLite store.
//!
//! `Corpus` is the read-only set of examples a session matches against. It is
//! built once (from the store or a YAML seed file) and passed to the
//! assistant; nothing writes to it afterwards.
//!
//! Examples come in two origins. Curated ones (seed files, operator edits)
//! are replayed before any dialogue rule. Learned ones (provider answers to
//! context-free turns) are only consulted once no local rule applies.
//!
//! `CorpusStore` is append-only. New examples land in the database and become
//! visible the next time a `Corpus` is loaded.

use std::path::Path;

use rusqlite::{params, Connection};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::errors::AssistantError;
use super::similarity::{best_match, DEFAULT_THRESHOLD};
use super::types::{ContextHint, Intent, TrainingExample};

// ─── Corpus ─────────────────────────────────────────────────────────────────

/// Where a stored example came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleOrigin {
    Curated,
    Learned,
}

impl ExampleOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ExampleOrigin::Curated => "curated",
            ExampleOrigin::Learned => "learned",
        }
    }
}

/// Read-only training examples in stable iteration order.
#[derive(Debug, Clone)]
pub struct Corpus {
    examples: Vec<TrainingExample>,
    learned: Vec<TrainingExample>,
    threshold: f64,
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Shape of a YAML seed file: `examples: [...]`.
#[derive(Deserialize)]
struct SeedFile {
    #[serde(default)]
    examples: Vec<TrainingExample>,
}

impl Corpus {
    pub fn new(examples: Vec<TrainingExample>) -> Self {
        Self {
            examples,
            learned: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Attach learned examples.
    pub fn with_learned(mut self, learned: Vec<TrainingExample>) -> Self {
        self.learned = learned;
        self
    }

    /// Override the minimum similarity for a hit (exclusive).
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Parse a YAML seed document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AssistantError> {
        let seed: SeedFile = serde_yaml::from_str(yaml)?;
        Ok(Self::new(seed.examples))
    }

    /// The closest curated example strictly above the threshold, first wins
    /// on ties.
    pub fn find_matching_example(&self, input: &str) -> Option<&TrainingExample> {
        Self::lookup(input, &self.examples, self.threshold, ExampleOrigin::Curated)
    }

    /// Same lookup over learned examples only.
    pub fn find_learned_example(&self, input: &str) -> Option<&TrainingExample> {
        Self::lookup(input, &self.learned, self.threshold, ExampleOrigin::Learned)
    }

    fn lookup<'a>(
        input: &str,
        examples: &'a [TrainingExample],
        threshold: f64,
        origin: ExampleOrigin,
    ) -> Option<&'a TrainingExample> {
        let (example, score) = best_match(input, examples, threshold)?;
        tracing::debug!(
            score,
            origin = origin.as_str(),
            example_id = example.id.as_deref().unwrap_or("-"),
            "corpus match"
        );
        Some(example)
    }

    /// Curated examples.
    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn learned(&self) -> &[TrainingExample] {
        &self.learned
    }

    /// Curated and learned examples together.
    pub fn len(&self) -> usize {
        self.examples.len() + self.learned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty() && self.learned.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

// ─── CorpusStore ────────────────────────────────────────────────────────────

/// SQLite-backed, append-only store of training examples.
pub struct CorpusStore {
    conn: Connection,
}

impl CorpusStore {
    /// Open (or create) the corpus database at the given path.
    ///
    /// Pass `":memory:"` for an in-memory database (tests).
    pub fn open(path: &str) -> Result<Self, AssistantError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<(), AssistantError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS training_examples (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                input_hash TEXT NOT NULL UNIQUE,
                user_input TEXT NOT NULL,
                ai_response TEXT NOT NULL,
                intent TEXT,
                entities TEXT NOT NULL DEFAULT '{}',
                context TEXT,
                origin TEXT NOT NULL DEFAULT 'curated',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    /// Load every example in insertion order, split by origin.
    pub fn load(&self) -> Result<Corpus, AssistantError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_input, ai_response, intent, entities, context, origin
             FROM training_examples
             ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut examples = Vec::new();
        let mut learned = Vec::new();
        for row in rows {
            let (id, user_input, ai_response, intent, entities, context, origin) = row?;
            let example = TrainingExample {
                id: Some(id),
                user_input,
                ai_response,
                intent: intent
                    .map(|i| serde_json::from_value::<Intent>(Value::String(i)))
                    .transpose()?,
                entities: serde_json::from_str(&entities)?,
                context: context
                    .map(|c| serde_json::from_str::<ContextHint>(&c))
                    .transpose()?,
            };
            if origin == ExampleOrigin::Learned.as_str() {
                learned.push(example);
            } else {
                examples.push(example);
            }
        }

        tracing::info!(
            curated = examples.len(),
            learned = learned.len(),
            "training corpus loaded"
        );
        Ok(Corpus::new(examples).with_learned(learned))
    }

    /// Append a curated example. Returns `false` if an example with the same
    /// normalized input already exists.
    pub fn append(&self, example: &TrainingExample) -> Result<bool, AssistantError> {
        self.insert(example, ExampleOrigin::Curated)
    }

    /// Append a learned example, with the same dedup as [`append`](Self::append).
    pub fn append_learned(&self, example: &TrainingExample) -> Result<bool, AssistantError> {
        self.insert(example, ExampleOrigin::Learned)
    }

    fn insert(
        &self,
        example: &TrainingExample,
        origin: ExampleOrigin,
    ) -> Result<bool, AssistantError> {
        if example.user_input.trim().is_empty() || example.ai_response.trim().is_empty() {
            return Err(AssistantError::InvalidExample {
                reason: "user input and response must not be blank".into(),
            });
        }

        let id = example
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let entities = serde_json::to_string(&example.entities)?;
        let context = example
            .context
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO training_examples
             (id, input_hash, user_input, ai_response, intent, entities, context, origin)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                input_hash(&example.user_input),
                example.user_input,
                example.ai_response,
                example.intent.map(Intent::as_str),
                entities,
                context,
                origin.as_str(),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Number of stored examples.
    pub fn count(&self) -> Result<usize, AssistantError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM training_examples", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Append every example of a YAML seed file. Returns how many were new.
    pub fn seed_from_yaml(&self, path: &Path) -> Result<usize, AssistantError> {
        let raw = std::fs::read_to_string(path).map_err(|e| AssistantError::IoError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let corpus = Corpus::from_yaml_str(&raw)?;

        let mut added = 0;
        for example in corpus.examples() {
            if self.append(example)? {
                added += 1;
            }
        }
        tracing::info!(path = %path.display(), added, "corpus seeded");
        Ok(added)
    }
}

/// Dedup key: SHA-256 of the lowercased, whitespace-collapsed input.
fn input_hash(user_input: &str) -> String {
    let normalized = user_input
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ─── Tests ──────────────────────────────────────────────────────────────────
