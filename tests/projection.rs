/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use rstest::*;
use spectral::assert_that;
use spectral::prelude::*;

use common::*;
use rcs_store::backend::Settings;
use rcs_store::repo::{
    migrate_keyformat, ReadState, RevisionStore, RevisionView, Source, VersionedField,
};
use rcs_store::{KeyFormat, Revision};

mod common;

#[fixture]
fn store() -> RevisionStore {
    let settings = Settings {
        backend: Some(String::from("memory")),
        path: None,
    };
    RevisionStore::from_settings(&settings).unwrap()
}

#[fixture]
fn body() -> VersionedField {
    VersionedField::new("wiki", "page", "body")
}

#[test]
fn read_state_follows_requested_revision() -> anyhow::Result<()> {
    let revision: Revision = "7".parse()?;

    assert_that!(ReadState::for_revision(None)).is_equal_to(ReadState::Head);
    assert_that!(ReadState::for_revision(Some(&Revision::Head))).is_equal_to(ReadState::Head);
    assert_that!(ReadState::for_revision(Some(&revision)))
        .is_equal_to(ReadState::Historical(revision.id().unwrap()));

    Ok(())
}

#[rstest]
fn field_keys_use_format(body: VersionedField) -> anyhow::Result<()> {
    assert_that!(body.key("42")?.as_str()).is_equal_to("wiki/page/body/42.txt");
    assert_that!(body.prefix()?).is_equal_to(String::from("wiki/page/body"));

    let flat = body.with_format(KeyFormat::new("{collection}/{entity_type}_{field}_{identifier}")?);
    assert_that!(flat.key("42")?.as_str()).is_equal_to("wiki/page_body_42");
    assert_that!(flat.prefix()?).is_equal_to(String::from("wiki"));

    Ok(())
}

#[rstest]
fn post_save_commits_current_value(
    store: RevisionStore,
    body: VersionedField,
) -> anyhow::Result<()> {
    body.initial(&store)?;
    let mut record = TestRecord::new(1).with("body", "draft");
    let draft = body.post_save(&store, &record)?;
    record.set("body", "final");
    body.post_save(&store, &record)?;

    assert_that!(body.revisions(&store, &record)?).is_equal_to(vec![draft]);
    assert_that!(store.fetch(&body.key("1")?, &draft)?).is_equal_to(b"draft".to_vec());

    Ok(())
}

#[rstest]
fn head_view_does_not_read(body: VersionedField) -> anyhow::Result<()> {
    let (backend, calls) = CountingBackend::new();
    let store = RevisionStore::new(Box::new(backend));
    let mut record = TestRecord::new(1).with("body", "unsaved edit");
    body.post_save(&store, &TestRecord::new(1).with("body", "saved"))?;

    let fields = [body];
    for requested in [None, Some(Revision::Head)] {
        let view = RevisionView::new(&store, &fields, requested.as_ref());
        let projection = view.project(&mut record);

        assert_that!(matches!(projection.source("body"), Some(Source::Head))).is_true();
    }

    assert_that!(record.get("body")).is_equal_to("unsaved edit");
    assert_eq!(calls.reads(), 0);

    Ok(())
}

#[rstest]
fn historical_view_substitutes_content(
    store: RevisionStore,
    body: VersionedField,
) -> anyhow::Result<()> {
    let title = VersionedField::new("wiki", "page", "title");
    let mut record = TestRecord::new(1)
        .with("body", "first body")
        .with("title", "first title");
    let first = body.post_save(&store, &record)?;
    title.post_save(&store, &record)?;

    record.set("body", "second body");
    record.set("title", "second title");
    body.post_save(&store, &record)?;
    title.post_save(&store, &record)?;

    let fields = [body, title];
    let view = RevisionView::new(&store, &fields, Some(&first));
    let projection = view.project(&mut record);

    assert_that!(projection.has_fallback()).is_false();
    assert_that!(matches!(projection.source("body"), Some(Source::Historical))).is_true();
    assert_that!(record.get("body")).is_equal_to("first body");
    // The title was not committed until after `first`.
    assert_that!(record.get("title")).is_equal_to("");

    Ok(())
}

#[rstest]
fn failed_read_falls_back_to_head(body: VersionedField) -> anyhow::Result<()> {
    let (backend, calls) = CountingBackend::new();
    let store = RevisionStore::new(Box::new(backend));
    let mut record = TestRecord::new(1).with("body", "old");
    let old = body.post_save(&store, &record)?;
    record.set("body", "current");
    body.post_save(&store, &record)?;
    calls.fail_reads();

    let fields = [body];
    let view = RevisionView::new(&store, &fields, Some(&old));
    let projection = view.project(&mut record);

    assert_that!(projection.has_fallback()).is_true();
    match projection.source("body") {
        Some(Source::Fallback(rcs_store::Error::Unavailable(_))) => {}
        other => panic!("expected an unavailable fallback, got {:?}", other),
    }
    assert_that!(record.get("body")).is_equal_to("current");

    Ok(())
}

#[rstest]
fn records_are_projected_in_order(
    store: RevisionStore,
    body: VersionedField,
) -> anyhow::Result<()> {
    for id in 1..=3 {
        body.post_save(&store, &TestRecord::new(id).with("body", &format!("old {}", id)))?;
    }
    let records: Vec<TestRecord> = (1..=3)
        .map(|id| TestRecord::new(id).with("body", &format!("new {}", id)))
        .collect();
    for record in &records {
        body.post_save(&store, record)?;
    }

    // The revision which saved the old body of the last record.
    let at = store.revisions(&body.key("3")?)?[0];
    let fields = [body];
    let view = RevisionView::new(&store, &fields, Some(&at));
    let bodies: Vec<String> = view
        .records(records)
        .map(|(record, projection)| {
            assert!(!projection.has_fallback());
            record.get("body").to_string()
        })
        .collect();

    assert_that!(bodies).is_equal_to(vec![
        String::from("old 1"),
        String::from("old 2"),
        String::from("old 3"),
    ]);

    Ok(())
}

#[rstest]
fn field_diff_uses_live_value(
    store: RevisionStore,
    body: VersionedField,
) -> anyhow::Result<()> {
    let mut record = TestRecord::new(1).with("body", "saved\n");
    let saved = body.post_save(&store, &record)?;
    record.set("body", "not saved yet\n");

    let lines: Vec<String> = body
        .diff(&store, &record, &saved, &Revision::Head)?
        .lines()?
        .collect();

    assert_that!(lines).has_removed_line("saved");
    assert_that!(lines).has_added_line("not saved yet");

    Ok(())
}

#[rstest]
fn migration_moves_keys_and_reports_failures(
    store: RevisionStore,
    body: VersionedField,
) -> anyhow::Result<()> {
    let old_format = KeyFormat::new("{collection}/{entity_type}_{field}_{identifier}.txt")?;
    let new_format = KeyFormat::default();
    let old_field = body.clone().with_format(old_format.clone());

    let mut revisions = Vec::new();
    for id in 1..=2 {
        let record = TestRecord::new(id).with("body", &format!("body {}", id));
        revisions.push(old_field.post_save(&store, &record)?);
    }
    // Entity 3 was never saved, so it has nothing to move.
    let report = migrate_keyformat(&store, &body, ["1", "2", "3", ""], &old_format, &new_format);

    assert_that!(report.moved).has_length(2);
    assert_that!(report.failed).has_length(2);
    assert_that!(report.is_complete()).is_false();

    for (id, revision) in ["1", "2"].iter().zip(&revisions) {
        let key = body.key(id)?;
        assert_that!(store.fetch(&key, revision)?)
            .is_equal_to(format!("body {}", id).into_bytes());
        assert_that!(store.revisions(&key)?).is_equal_to(vec![*revision]);
    }

    // Keys which were already moved have nothing left to move.
    let report = migrate_keyformat(&store, &body, ["1", "2"], &old_format, &new_format);
    assert_that!(report.moved).has_length(0);
    assert_that!(report.failed).has_length(2);

    let report = migrate_keyformat(&store, &body, ["1"], &new_format, &new_format);
    assert_that!(report.unchanged).has_length(1);

    Ok(())
}
