//! Turn pipeline: `Assistant` facade.
//!
//! Runs one turn end to end: analyze the message, resolve it locally or
//! delegate to the provider chain, and hand back the reply together with the
//! context the caller should persist for the next turn.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;

use super::corpus::{Corpus, CorpusStore};
use super::resolver::{delegated_response, outage_response, resolve, Decision, TurnInput};
use super::types::{AiResponse, ConversationContext, Intent, Rule, TrainingExample};
use crate::config::AppConfig;
use crate::inference::client::{CompletionSource, ProviderChain};
use crate::inference::style::Style;

/// Result of one turn.
#[derive(Debug, Clone)]
pub struct Turn {
    pub response: AiResponse,
    /// The rule that produced the reply.
    pub rule: Rule,
    pub intent: Intent,
    /// Context for the next turn.
    pub context: ConversationContext,
}

/// The booking assistant: a read-only corpus, a provider chain and an
/// optional store that learns from context-free delegated turns.
pub struct Assistant {
    corpus: Corpus,
    chain: ProviderChain,
    default_style: Style,
    store: Option<Mutex<CorpusStore>>,
}

impl Assistant {
    pub fn new(corpus: Corpus, chain: ProviderChain, default_style: Style) -> Self {
        Self {
            corpus,
            chain,
            default_style,
            store: None,
        }
    }

    /// Persist provider answers to `store` as learned examples.
    pub fn with_store(mut self, store: CorpusStore) -> Self {
        self.store = Some(Mutex::new(store));
        self
    }

    /// Build an assistant from a loaded config.
    ///
    /// Relative corpus paths resolve against the project root (the parent
    /// of the config file's directory). With a database configured, the seed
    /// file is appended to it first and the corpus is loaded from it;
    /// otherwise the seed file alone is the corpus.
    pub fn bootstrap(config: &AppConfig, config_path: &Path) -> anyhow::Result<Self> {
        let chain = ProviderChain::from_config(&config.providers)
            .context("failed to build provider chain")?;
        let threshold = config.dialogue.similarity_threshold;
        let seed_path = config
            .corpus
            .seed_file
            .as_deref()
            .map(|s| AppConfig::resolve_path(config_path, s));

        let Some(database) = config.corpus.database.as_deref() else {
            let corpus = match &seed_path {
                Some(path) => {
                    let raw = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read seed file {}", path.display()))?;
                    Corpus::from_yaml_str(&raw)
                        .with_context(|| format!("invalid seed file {}", path.display()))?
                }
                None => Corpus::default(),
            };
            tracing::info!(examples = corpus.len(), "assistant ready without corpus store");
            return Ok(Self::new(corpus.with_threshold(threshold), chain, config.default_style));
        };

        let db_path = AppConfig::resolve_path(config_path, database);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let store = CorpusStore::open(&db_path.to_string_lossy())
            .with_context(|| format!("failed to open corpus database {}", db_path.display()))?;
        if let Some(path) = &seed_path {
            store
                .seed_from_yaml(path)
                .with_context(|| format!("failed to seed corpus from {}", path.display()))?;
        }
        let corpus = store.load().context("failed to load training corpus")?;

        tracing::info!(
            examples = corpus.len(),
            providers = ?chain.provider_names(),
            static_fallback = chain.has_static_fallback(),
            "assistant ready"
        );
        Ok(Self::new(corpus.with_threshold(threshold), chain, config.default_style)
            .with_store(store))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn default_style(&self) -> Style {
        self.default_style
    }

    /// Reply to `message`. The caller persists `context.advance(&reply)`.
    pub async fn generate_ai_response(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> AiResponse {
        self.handle_turn(message, context).await.response
    }

    /// Run a turn in the default style.
    pub async fn handle_turn(&self, message: &str, context: &ConversationContext) -> Turn {
        self.respond_with_style(message, context, self.default_style)
            .await
    }

    /// Run a turn; `style` only affects delegated replies.
    pub async fn respond_with_style(
        &self,
        message: &str,
        context: &ConversationContext,
        style: Style,
    ) -> Turn {
        let input = TurnInput::analyze(message, context, &self.corpus);
        let intent = input.intent;
        let learnable = input.is_context_free();
        let decision = resolve(&input);
        let rule = decision.rule();

        let response = match decision {
            Decision::Reply { response, .. } => response,
            Decision::Delegate { prompt } => match self.chain.generate(&prompt, style).await {
                Ok(completion) => {
                    if let CompletionSource::Provider(provider) = &completion.source {
                        tracing::debug!(provider = %provider, learnable, "delegated reply");
                        if learnable {
                            let mut example =
                                TrainingExample::new(message.trim(), &completion.content);
                            example.intent = Some(intent);
                            self.learn(&example);
                        }
                    }
                    delegated_response(context, completion.content)
                }
                Err(e) => {
                    tracing::error!(error = %e, "no completion available");
                    outage_response(context)
                }
            },
        };

        tracing::info!(
            rule = rule.as_str(),
            intent = intent.as_str(),
            has_booking = response.booking.is_some(),
            "turn resolved"
        );

        Turn {
            context: context.advance(&response),
            response,
            rule,
            intent,
        }
    }

    /// Append a learned example to the store. Failures are logged, never
    /// returned. Returns whether a new example was stored.
    pub fn learn(&self, example: &TrainingExample) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let store = match store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match store.append_learned(example) {
            Ok(added) => added,
            Err(e) => {
                tracing::warn!(error = %e, "failed to store training example");
                false
            }
        }
    }

    /// Number of examples in the store, if there is one.
    pub fn stored_examples(&self) -> Option<usize> {
        let store = self.store.as_ref()?;
        let store = match store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match store.count() {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!(error = %e, "failed to count training examples");
                None
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::context::{DialogueState, PICKUP_OR_DROPOFF};
    use crate::assistant::resolver::{GREETING_REPLY, OUTAGE_REPLY, PICKUP_TIME_QUESTION};
    use crate::assistant::types::{PendingLocation, Slot};
    use crate::config::parse_config;
    use crate::inference::errors::InferenceError;
    use crate::inference::provider::CompletionProvider;
    use crate::inference::types::CompletionRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => Err(InferenceError::Timeout { duration_secs: 30 }),
            }
        }
    }

    fn chain(replies: &[Option<&'static str>], static_fallback: bool) -> (ProviderChain, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let names = ["primary", "secondary", "tertiary"];
        let providers = replies
            .iter()
            .zip(names)
            .map(|(reply, name)| {
                Box::new(Scripted {
                    name,
                    reply: *reply,
                    calls: calls.clone(),
                }) as Box<dyn CompletionProvider>
            })
            .collect();
        (ProviderChain::new(providers, static_fallback), calls)
    }

    fn assistant(replies: &[Option<&'static str>], static_fallback: bool) -> (Assistant, Arc<AtomicUsize>) {
        let (chain, calls) = chain(replies, static_fallback);
        (Assistant::new(Corpus::default(), chain, Style::Quick), calls)
    }

    #[tokio::test]
    async fn test_multi_turn_booking_flow() {
        let (assistant, calls) = assistant(&[Some("unused")], false);

        let turn = assistant.handle_turn("hi", &ConversationContext::default()).await;
        assert_eq!(turn.rule, Rule::Greeting);
        assert_eq!(turn.response.content, GREETING_REPLY);

        let turn = assistant.handle_turn("42 Harbour Road", &turn.context).await;
        assert_eq!(turn.rule, Rule::BareAddress);
        assert_eq!(turn.context.state(), DialogueState::AwaitingLocationType);

        let turn = assistant.handle_turn("yes", &turn.context).await;
        assert_eq!(turn.rule, Rule::AffirmativeReask);

        let turn = assistant.handle_turn("pickup", &turn.context).await;
        assert_eq!(turn.rule, Rule::SlotAssigned);
        assert_eq!(turn.context.state(), DialogueState::LocationTyped(Slot::Pickup));

        let turn = assistant.handle_turn("Central Station", &turn.context).await;
        assert_eq!(turn.rule, Rule::ComplementaryFill);
        let booking = turn.response.booking.unwrap();
        assert_eq!(booking.pickup_location.unwrap().address, "42 Harbour Road");
        assert_eq!(booking.dropoff_location.unwrap().address, "Central Station");
        assert_eq!(turn.context.state(), DialogueState::Idle);
        assert_eq!(turn.context.last_question.as_deref(), Some(PICKUP_TIME_QUESTION));

        // every turn was answered locally
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delegated_turn_uses_secondary_and_keeps_context() {
        let (assistant, calls) = assistant(&[None, Some("A ride usually costs about $20.")], false);
        let ctx = ConversationContext {
            last_question: Some("What's your dropoff address?".into()),
            pending_location: Some(PendingLocation {
                address: "Main St".into(),
                slot: Some(Slot::Pickup),
            }),
            previous_bookings: Vec::new(),
        };

        let turn = assistant.handle_turn("how much does it cost?", &ctx).await;
        assert_eq!(turn.rule, Rule::Delegated);
        assert_eq!(turn.intent, Intent::Payment);
        assert_eq!(turn.response.content, "A ride usually costs about $20.");
        assert_eq!(turn.context.pending_location, ctx.pending_location);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_total_outage_returns_apology_and_preserves_context() {
        let (assistant, _) = assistant(&[None, None], false);
        let ctx = ConversationContext {
            last_question: Some("pickup or dropoff".into()),
            pending_location: Some(PendingLocation {
                address: "Elm St".into(),
                slot: None,
            }),
            previous_bookings: Vec::new(),
        };
        let response = assistant
            .generate_ai_response("can I bring my dog?", &ctx)
            .await;
        assert_eq!(response.content, OUTAGE_REPLY);
        assert_eq!(response.pending_location, ctx.pending_location);
        assert_eq!(response.last_question, ctx.last_question);
        assert!(response.booking.is_none());
    }

    #[tokio::test]
    async fn test_static_fallback_by_style() {
        let (assistant, _) = assistant(&[None], true);
        let turn = assistant
            .respond_with_style("can I bring my dog?", &ConversationContext::default(), Style::Schedule)
            .await;
        assert_eq!(turn.response.content, Style::Schedule.static_response());
    }

    #[tokio::test]
    async fn test_provider_reply_is_learned_once() {
        let (chain, _) = chain(&[Some("Yes, pets are welcome.")], false);
        let assistant = Assistant::new(Corpus::default(), chain, Style::Quick)
            .with_store(CorpusStore::open(":memory:").unwrap());

        assistant
            .handle_turn("can I bring my dog?", &ConversationContext::default())
            .await;
        assistant
            .handle_turn("Can I bring my dog?", &ConversationContext::default())
            .await;
        assert_eq!(assistant.stored_examples(), Some(1));
    }

    #[tokio::test]
    async fn test_learned_replies_survive_reload_without_shadowing_rules() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("corpus.db");
        let db = db.to_str().unwrap();

        let (first_chain, _) = chain(&[Some("Great, see you then!")], false);
        let first = Assistant::new(Corpus::default(), first_chain, Style::Quick)
            .with_store(CorpusStore::open(db).unwrap());

        // answers shaped by dialogue state are not learned
        let asked_time = ConversationContext {
            last_question: Some(PICKUP_TIME_QUESTION.into()),
            ..Default::default()
        };
        let turn = first.handle_turn("yes", &asked_time).await;
        assert_eq!(turn.rule, Rule::Delegated);
        let with_pending = ConversationContext {
            last_question: Some("What's your dropoff address?".into()),
            pending_location: Some(PendingLocation {
                address: "Main St".into(),
                slot: Some(Slot::Pickup),
            }),
            previous_bookings: Vec::new(),
        };
        first.handle_turn("how much does it cost?", &with_pending).await;
        assert_eq!(first.stored_examples(), Some(0));

        first
            .handle_turn("can I bring my dog?", &ConversationContext::default())
            .await;
        assert_eq!(first.stored_examples(), Some(1));
        drop(first);

        let corpus = CorpusStore::open(db).unwrap().load().unwrap();
        assert!(corpus.examples().is_empty());
        assert_eq!(corpus.learned().len(), 1);

        let (second_chain, calls) = chain(&[None], false);
        let second = Assistant::new(corpus, second_chain, Style::Quick);

        let disambiguating = ConversationContext {
            last_question: Some(PICKUP_OR_DROPOFF.into()),
            pending_location: Some(PendingLocation {
                address: "Main St".into(),
                slot: None,
            }),
            previous_bookings: Vec::new(),
        };
        let turn = second.handle_turn("yes", &disambiguating).await;
        assert_eq!(turn.rule, Rule::AffirmativeReask);
        assert_eq!(turn.context.pending_location, disambiguating.pending_location);

        let turn = second
            .handle_turn("Can I bring my dog?", &ConversationContext::default())
            .await;
        assert_eq!(turn.rule, Rule::LearnedMatch);
        assert_eq!(turn.response.content, "Great, see you then!");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_static_reply_is_not_learned() {
        let (chain, _) = chain(&[None], true);
        let assistant = Assistant::new(Corpus::default(), chain, Style::Quick)
            .with_store(CorpusStore::open(":memory:").unwrap());
        assistant
            .handle_turn("can I bring my dog?", &ConversationContext::default())
            .await;
        assert_eq!(assistant.stored_examples(), Some(0));
    }

    #[test]
    fn test_learn_without_store() {
        let (assistant, _) = assistant(&[], true);
        assert!(!assistant.learn(&TrainingExample::new("a", "b")));
        assert_eq!(assistant.stored_examples(), None);
    }

    #[tokio::test]
    async fn test_bootstrap_from_config_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(
            dir.path().join("config/corpus.yaml"),
            "examples:\n  - userInput: what payment methods do you accept\n    aiResponse: Card or cash.\n",
        )
        .unwrap();
        let config_path = dir.path().join("config/ridechat.yaml");
        let config = parse_config(
            "default_style: detailed\n\
             fallback_chain: [static_response]\n\
             corpus:\n  database: data/corpus.db\n  seed_file: config/corpus.yaml\n",
        )
        .unwrap();

        let assistant = Assistant::bootstrap(&config, &config_path).unwrap();
        assert_eq!(assistant.corpus().len(), 1);
        assert_eq!(assistant.default_style(), Style::Detailed);
        assert!(dir.path().join("data/corpus.db").exists());

        let turn = assistant
            .handle_turn("What payment methods do you accept?", &ConversationContext::default())
            .await;
        assert_eq!(turn.rule, Rule::CorpusMatch);
        assert_eq!(turn.response.content, "Card or cash.");

        let turn = assistant
            .handle_turn("is there a child seat", &ConversationContext::default())
            .await;
        assert_eq!(turn.response.content, Style::Detailed.static_response());
    }

    #[test]
    fn test_bootstrap_without_database() {
        let config = parse_config("fallback_chain: [static_response]\n").unwrap();
        let assistant = Assistant::bootstrap(&config, Path::new("/nowhere/config/ridechat.yaml")).unwrap();
        assert!(assistant.corpus().is_empty());
        assert_eq!(assistant.stored_examples(), None);
    }

    #[test]
    fn test_bootstrap_rejects_unknown_provider() {
        let config = parse_config("fallback_chain: [missing]\n").unwrap();
        let err = Assistant::bootstrap(&config, Path::new("config/ridechat.yaml")).err().unwrap();
        assert!(err.to_string().contains("provider chain"));
    }
}
