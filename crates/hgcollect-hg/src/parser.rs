use std::path::Path;

use hgcollect_types::{ErrorEvent, LogRecord, Results};

/// Fields per serialized history entry.
const FIELD_COUNT: usize = 10;

/// Parse raw `hg log` output into ordered records and error events.
///
/// Every non-blank line either becomes one `LogRecord` or is accounted for
/// by one `ErrorEvent`; a bad line never aborts the rest of the batch. Both
/// sequences preserve input line order.
///
/// Quote handling: the log template wraps each serialized entry in a literal
/// quote character, so consecutive entries meet as doubled quotes at line
/// boundaries and the final entry leaves a lone quote behind the last
/// newline. All leading/trailing quotes are trimmed, and a line that is
/// nothing but quote wrapping is skipped outright.
pub fn parse_log(raw: &str, repo: &Path) -> Results {
    let mut results = Results::default();

    for line in raw.split('\n') {
        let row = line.trim_matches('\'');
        if row.is_empty() {
            continue;
        }

        match split_row(row) {
            Ok(fields) if fields.len() >= FIELD_COUNT => {
                results.records.push(to_record(&fields, repo));
            }
            Ok(fields) => {
                // A short row is malformed input, not a blank: record it
                // rather than letting it vanish.
                let message = format!(
                    "malformed log entry: expected {} fields, got {}",
                    FIELD_COUNT,
                    fields.len()
                );
                results.events.push(ErrorEvent::capture(message, repo));
            }
            Err(err) => {
                results
                    .events
                    .push(ErrorEvent::capture(format!("unreadable log entry: {}", err), repo));
            }
        }
    }

    results
}

/// Split one unwrapped line as a single tab-separated row.
fn split_row(row: &str) -> csv::Result<csv::StringRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(row.as_bytes());

    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record)
}

/// Map row fields positionally; anything past the tenth field is ignored.
fn to_record(fields: &csv::StringRecord, repo: &Path) -> LogRecord {
    let field = |i: usize| fields.get(i).unwrap_or_default().to_string();
    LogRecord {
        ts: field(0),
        node_id: field(1),
        rev_id: field(2),
        parent_ids: field(3),
        author: field(4),
        tags: field(5),
        branch: field(6),
        diffstat: field(7),
        files: field(8),
        graph_node: field(9),
        repo_path: repo.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "'2022-06-10 23:43:47 +0000\t71efee2949bd457bac92e3f21215a1bc310fd62f\t0\t\tSome User <some.user@email.com>\ttip\tdefault\t1: +1/-0\thi.txt\t@\n'";

    // Two concatenated entries: the template's wrapping quotes double up at
    // the interior line boundary.
    const TWO_ENTRIES: &str = "'2022-06-10 23:43:47 +0000\t71efee2949bd457bac92e3f21215a1bc310fd62f\t0\t\tSome User <some.user@email.com>\ttip\tdefault\t1: +1/-0\thi.txt\t@\n''2022-06-13 03:33:33 +0000\t8a1c5b0f6d2e49c3a7b8d94e0f1a2b3c4d5e6f70\t1\t\tSome User <some.user@email.com>\t\tdefault\t1: +2/-1\tbye.txt\to\n'";

    fn repo() -> &'static Path {
        Path::new("/data/repos/test_repo")
    }

    #[test]
    fn well_formed_line_maps_all_ten_fields() {
        let results = parse_log(WELL_FORMED, repo());

        assert_eq!(results.events.len(), 0);
        assert_eq!(results.records.len(), 1);

        let rec = &results.records[0];
        assert_eq!(rec.ts, "2022-06-10 23:43:47 +0000");
        assert_eq!(rec.node_id, "71efee2949bd457bac92e3f21215a1bc310fd62f");
        assert_eq!(rec.rev_id, "0");
        assert_eq!(rec.parent_ids, "");
        assert_eq!(rec.author, "Some User <some.user@email.com>");
        assert_eq!(rec.tags, "tip");
        assert_eq!(rec.branch, "default");
        assert_eq!(rec.diffstat, "1: +1/-0");
        assert_eq!(rec.files, "hi.txt");
        assert_eq!(rec.graph_node, "@");
        assert_eq!(rec.repo_path, "/data/repos/test_repo");
    }

    #[test]
    fn concatenated_entries_parse_in_input_order() {
        let results = parse_log(TWO_ENTRIES, repo());

        assert_eq!(results.events.len(), 0);
        assert_eq!(results.records.len(), 2);
        assert_eq!(results.records[0].rev_id, "0");
        assert_eq!(results.records[1].rev_id, "1");
        assert_eq!(results.records[1].files, "bye.txt");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_log("", repo()).is_empty());
    }

    #[test]
    fn trailing_bare_quote_is_skipped() {
        // What remains after the last entry's newline.
        assert!(parse_log("'", repo()).is_empty());
        assert!(parse_log("'\n", repo()).is_empty());
    }

    #[test]
    fn short_row_becomes_an_error_event() {
        let results = parse_log("'a\tb\tc\n'", repo());

        assert_eq!(results.records.len(), 0);
        assert_eq!(results.events.len(), 1);
        assert!(results.events[0].message.contains("expected 10 fields, got 3"));
        assert_eq!(results.events[0].repo_path, "/data/repos/test_repo");
    }

    #[test]
    fn bad_line_does_not_abort_the_batch() {
        let mixed = format!("'x\ty\n'{}", TWO_ENTRIES);
        let results = parse_log(&mixed, repo());

        assert_eq!(results.records.len(), 2);
        assert_eq!(results.events.len(), 1);
        // Record order still matches input order.
        assert_eq!(results.records[0].rev_id, "0");
        assert_eq!(results.records[1].rev_id, "1");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let line = "'ts\tnode\trev\tparents\tauthor\ttags\tbranch\tdiff\tfiles\t@\textra\n'";
        let results = parse_log(line, repo());

        assert_eq!(results.records.len(), 1);
        assert_eq!(results.records[0].graph_node, "@");
    }
}
