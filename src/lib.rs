pub mod classifier;
pub mod cli;
pub mod config;
pub mod discard;
pub mod error;
pub mod heuristic;
pub mod llm;
pub mod model;
pub mod output;
pub mod reconcile;
pub mod runner;
pub mod scanner;
pub mod sources;

pub use classifier::{Classifier, normalize_response, parse_verdict};
pub use config::Config;
pub use discard::{IdSet, StagedList, load_discard_ids, save_discard_list, stage_discard_list};
pub use error::{CurateError, Result};
pub use heuristic::heuristic_is_relevant;
pub use llm::{ChatClient, TextModel};
pub use model::{DiscardEntry, ItemId, QuestionItem, RelevanceVerdict, SourceKind, VerdictMethod};
pub use reconcile::{ReconcileStats, reconcile, reconcile_record};
pub use runner::{CleanResult, CollectResult, run_clean, run_collect};
pub use scanner::{ScanReport, Scanner};
pub use sources::{CollectionSnapshot, JsonVectorStore, VectorStore, load_validation_items};
