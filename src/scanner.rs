use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::model::{DiscardEntry, QuestionItem, SourceKind};

/// Outcome of scanning one source.
///
/// `seen == processed + skipped` and `processed == relevant + discarded + failed`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub source: SourceKind,
    pub seen: usize,
    pub processed: usize,
    pub relevant: usize,
    pub discarded: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(skip)]
    pub entries: Vec<DiscardEntry>,
}

impl ScanReport {
    fn new(source: SourceKind) -> Self {
        Self {
            source,
            seen: 0,
            processed: 0,
            relevant: 0,
            discarded: 0,
            skipped: 0,
            failed: 0,
            entries: Vec::new(),
        }
    }
}

pub struct Scanner<'a> {
    classifier: &'a Classifier<'a>,
    delay: Duration,
}

impl<'a> Scanner<'a> {
    /// `delay` is slept after every model call to stay under provider rate limits.
    pub fn new(classifier: &'a Classifier<'a>, delay: Duration) -> Self {
        Self { classifier, delay }
    }

    /// Classifies every usable item of `source` and collects the ones judged
    /// not relevant, in input order. `limit` restricts the scan to a prefix.
    pub fn scan<I>(&self, source: SourceKind, items: I, limit: Option<usize>) -> ScanReport
    where
        I: IntoIterator<Item = QuestionItem>,
    {
        let mut report = ScanReport::new(source);
        let limit = limit.unwrap_or(usize::MAX);
        info!(%source, "scanning source");

        for item in items.into_iter().take(limit) {
            report.seen += 1;

            let question = match (&item.question, &item.image_reference) {
                (Some(q), Some(_)) => q.as_str(),
                _ => {
                    warn!(%source, id = %item.id, "skipping item: missing image_url or question");
                    report.skipped += 1;
                    continue;
                }
            };

            report.processed += 1;
            let verdict = self.classifier.classify(question);

            if !verdict.success {
                report.failed += 1;
            } else if verdict.is_relevant {
                report.relevant += 1;
            } else {
                info!(%source, id = %item.id, reason = %verdict.reason, "discarding");
                report.discarded += 1;
                report.entries.push(DiscardEntry::new(&item, &verdict));
            }

            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }

        info!(
            %source,
            seen = report.seen,
            discarded = report.discarded,
            skipped = report.skipped,
            failed = report.failed,
            "scan finished"
        );
        report
    }
}
