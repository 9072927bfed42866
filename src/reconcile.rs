use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::discard::IdSet;
use crate::error::{CurateError, Result};
use crate::model::ItemId;

/// Field holding a record's own id, matched against validation discards.
pub const PRIMARY_ID_FIELD: &str = "validation_id";
/// Field holding the retrieval results, pruned against training discards.
pub const NESTED_LIST_FIELD: &str = "similar_images";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub seen: usize,
    pub eliminated: usize,
    pub retained: usize,
    /// Nested references removed across all retained records.
    pub pruned_references: usize,
    /// Empty lines in the input. They carry no record and are not counted in `seen`.
    pub blank_lines: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Eliminated,
    Retained { record: Value, pruned: usize },
}

fn primary_id(record: &Value) -> Option<ItemId> {
    record
        .get(PRIMARY_ID_FIELD)
        .filter(|v| !v.is_null())
        .map(ItemId::from_value)
}

fn nested_id(entry: &Value) -> ItemId {
    entry
        .get("id")
        .map(ItemId::from_value)
        .unwrap_or_else(|| ItemId::from_value(&Value::Null))
}

/// Applies both discard sets to one evaluation record.
pub fn reconcile_record(mut record: Value, training_ids: &IdSet, validation_ids: &IdSet) -> RecordOutcome {
    if let Some(id) = primary_id(&record) {
        if validation_ids.contains(&id) {
            return RecordOutcome::Eliminated;
        }
    }

    let mut pruned = 0;
    if let Some(Value::Array(nested)) = record.get_mut(NESTED_LIST_FIELD) {
        let before = nested.len();
        nested.retain(|entry| !training_ids.contains(&nested_id(entry)));
        pruned = before - nested.len();
    }

    RecordOutcome::Retained { record, pruned }
}

/// Streams line-delimited evaluation records from `reader` to `writer`,
/// dropping records whose own id was discarded and pruning discarded
/// training items from their nested lists. Order is preserved.
pub fn reconcile<R, W>(
    reader: R,
    mut writer: W,
    training_ids: &IdSet,
    validation_ids: &IdSet,
) -> Result<ReconcileStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = ReconcileStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            warn!(line = idx + 1, "blank line in evaluation file, skipped");
            stats.blank_lines += 1;
            continue;
        }
        let record: Value = serde_json::from_str(&line).map_err(|err| {
            CurateError::InvalidArg(format!("evaluation line {}: {err}", idx + 1))
        })?;
        stats.seen += 1;

        let id = primary_id(&record).map(ItemId::into_string).unwrap_or_default();
        match reconcile_record(record, training_ids, validation_ids) {
            RecordOutcome::Eliminated => {
                stats.eliminated += 1;
                info!(validation_id = %id, "eliminating record");
            }
            RecordOutcome::Retained { record, pruned } => {
                if pruned > 0 {
                    debug!(pruned, line = idx + 1, "pruned nested references");
                }
                stats.retained += 1;
                stats.pruned_references += pruned;
                serde_json::to_writer(&mut writer, &record)?;
                writer.write_all(b"\n")?;
            }
        }
    }

    writer.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(list: &[&str]) -> IdSet {
        list.iter().map(|s| ItemId::new(*s)).collect()
    }

    fn run(input: &str, train: &IdSet, val: &IdSet) -> (String, ReconcileStats) {
        let mut out = Vec::new();
        let stats = reconcile(input.as_bytes(), &mut out, train, val).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    const INPUT: &str = concat!(
        r#"{"validation_id": "V1", "answer": "a", "similar_images": [{"id": "A"}]}"#,
        "\n",
        r#"{"validation_id": "V2", "answer": "b", "similar_images": [{"id": "A", "score": 0.9}, {"id": "B"}]}"#,
        "\n\n",
        r#"{"validation_id": 3, "similar_images": [{"id": 17}, {"id": "18"}]}"#,
        "\n",
    );

    #[test]
    fn nested_references_are_pruned() {
        let record = json!({"validation_id": "V9", "similar_images": [{"id": "A"}, {"id": "B"}]});
        let outcome = reconcile_record(record, &ids(&["A"]), &ids(&[]));
        assert_eq!(
            outcome,
            RecordOutcome::Retained {
                record: json!({"validation_id": "V9", "similar_images": [{"id": "B"}]}),
                pruned: 1
            }
        );
    }

    #[test]
    fn discarded_record_is_dropped_whatever_it_contains() {
        let record = json!({"validation_id": "V1", "similar_images": [{"id": "B"}]});
        assert_eq!(
            reconcile_record(record, &ids(&[]), &ids(&["V1"])),
            RecordOutcome::Eliminated
        );
    }

    #[test]
    fn ids_compare_by_string_form() {
        let (out, stats) = run(INPUT, &ids(&["17"]), &ids(&["3"]));
        assert_eq!(stats.eliminated, 1);
        assert!(!out.contains("\"validation_id\":3"));

        let record = json!({"validation_id": "x", "similar_images": [{"id": 17}, {"id": "18"}]});
        let RecordOutcome::Retained { record, .. } = reconcile_record(record, &ids(&["17"]), &ids(&[])) else {
            panic!("record should be retained");
        };
        assert_eq!(record["similar_images"], json!([{"id": "18"}]));
    }

    #[test]
    fn counts_always_balance() {
        let (_, stats) = run(INPUT, &ids(&["A"]), &ids(&["V1", "V2"]));
        assert_eq!(stats.seen, 3);
        assert_eq!(stats.eliminated, 2);
        assert_eq!(stats.retained, 1);
        assert_eq!(stats.seen, stats.eliminated + stats.retained);

        let (_, stats) = run(INPUT, &ids(&[]), &ids(&[]));
        assert_eq!(stats.seen, stats.eliminated + stats.retained);
        assert_eq!(stats.retained, 3);
    }

    #[test]
    fn output_keeps_order_and_unknown_fields() {
        let (out, stats) = run(INPUT, &ids(&["A"]), &ids(&["V1"]));
        let lines: Vec<Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["validation_id"], "V2");
        assert_eq!(lines[0]["answer"], "b");
        assert_eq!(lines[0]["similar_images"], json!([{"id": "B"}]));
        assert_eq!(lines[1]["validation_id"], 3);
        assert_eq!(stats.pruned_references, 1);
        assert_eq!(stats.blank_lines, 1);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let train = ids(&["A", "17"]);
        let val = ids(&["V1"]);
        let (first, _) = run(INPUT, &train, &val);
        let (second, stats) = run(&first, &train, &val);
        assert_eq!(first, second);
        assert_eq!(stats.eliminated, 0);
        assert_eq!(stats.pruned_references, 0);
    }

    #[test]
    fn records_without_nested_list_pass_through() {
        let (out, stats) = run("{\"validation_id\": \"V5\"}\n", &ids(&["A"]), &ids(&[]));
        assert_eq!(stats.retained, 1);
        assert_eq!(out.trim(), r#"{"validation_id":"V5"}"#);
    }

    #[test]
    fn blank_lines_are_counted_apart_from_records() {
        let (out, stats) = run("\n{\"validation_id\": \"V1\"}\n   \n", &ids(&[]), &ids(&[]));
        assert_eq!(stats.blank_lines, 2);
        assert_eq!(stats.seen, 1);
        assert_eq!(stats.seen, stats.eliminated + stats.retained);
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn malformed_line_reports_its_position() {
        let mut out = Vec::new();
        let err = reconcile("{}\nnot json\n".as_bytes(), &mut out, &ids(&[]), &ids(&[])).unwrap_err();
        assert!(err.to_string().contains("evaluation line 2"));
    }
}
