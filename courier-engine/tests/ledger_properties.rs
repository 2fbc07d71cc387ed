use chrono::{DateTime, Utc};
use courier_engine::phases::complete_phase;
use courier_engine::{
    Answer, CheckpointKey, HintTable, MachineCheck, ManualClock, MemoryStorage, Moment, PhaseId,
    ProgressRecord, ProtocolConfig, ProtocolSession, ShardId, ToolId, Verdict,
};

const STORAGE_KEY: &str = "rcp_state";

fn clock() -> ManualClock {
    ManualClock::new(
        DateTime::parse_from_rfc3339("2025-12-24T18:00:00-07:00")
            .unwrap()
            .with_timezone(&Utc),
    )
}

/// A record positioned so that every checkpoint is open for work.
fn record_with_everything_open() -> ProgressRecord {
    let mut record = ProgressRecord::default();
    record.current_phase = PhaseId::LAST;
    record
}

fn wrong_answer(key: CheckpointKey) -> Answer {
    match key {
        CheckpointKey::Login => Answer::credentials("intruder", "nope"),
        CheckpointKey::FinalAssembly => Answer::assembly("x", "y", "z", "D"),
        _ => Answer::text("definitely-wrong"),
    }
}

#[test]
fn hint_tiers_never_pass_the_list_length() {
    let table = HintTable::from_config(&ProtocolConfig::default());
    for key in CheckpointKey::ALL {
        let storage = MemoryStorage::new();
        let mut seeded = record_with_everything_open();
        if key != CheckpointKey::Login {
            seeded.authenticated = true;
            // Open the later shards by verifying their predecessors.
            if let CheckpointKey::Shard(shard) = key {
                let mut previous = shard.predecessor();
                while let Some(p) = previous {
                    seeded.sub_checkpoints.insert(CheckpointKey::Shard(p), true);
                    previous = p.predecessor();
                }
            }
        }
        storage.insert_raw(STORAGE_KEY, seeded.to_blob().unwrap());
        let mut session = ProtocolSession::open(ProtocolConfig::default(), storage, clock());

        let max = table.max_tier(key);
        for _ in 0..(usize::from(max) + 3) {
            let verdict = session.submit_answer(key, &wrong_answer(key)).unwrap();
            assert!(!verdict.is_accepted(), "{key}");
            assert!(session.snapshot().hint_tier(key) <= max, "{key}");
        }
        assert_eq!(session.snapshot().hint_tier(key), max, "{key}");

        let before = session.snapshot().to_blob().unwrap();
        assert!(session.request_hint(key).is_none(), "{key}");
        assert_eq!(session.snapshot().to_blob().unwrap(), before, "{key}");
    }
}

#[test]
fn explicit_requests_walk_the_ladder_in_order() {
    let storage = MemoryStorage::new();
    let mut session = ProtocolSession::open(ProtocolConfig::default(), storage, clock());
    session.authenticate("Ezra", "RCP-2025-XMAS-COURIER").unwrap();
    let key = CheckpointKey::Whitelist;
    let texts: Vec<String> = std::iter::from_fn(|| session.request_hint(key))
        .map(|hint| hint.text)
        .collect();
    assert_eq!(
        texts,
        vec![
            "It is not something you craft or find.",
            "It is where your first step begins.",
            "Choose option B.",
        ]
    );
    assert_eq!(session.snapshot().activity_log.count_message("Hint Tier 3 issued"), 1);
    // Hints for phases that are not open yet are refused.
    assert!(session.request_hint(CheckpointKey::Binding).is_none());
}

#[test]
fn complete_phase_twice_equals_once_for_every_phase() {
    let at = Moment::fixed("12:00");
    for phase in PhaseId::ALL {
        let mut once = ProgressRecord::default();
        once.current_phase = phase;
        let mut twice = once.clone();
        complete_phase(&mut once, phase, &at);
        complete_phase(&mut twice, phase, &at);
        complete_phase(&mut twice, phase, &at);
        assert_eq!(once, twice, "phase {phase}");
    }
}

#[test]
fn merge_preserves_present_fields_and_defaults_the_rest() {
    let mut full = ProgressRecord::default();
    full.authenticated = true;
    full.current_phase = PhaseId::ThreeShards;
    full.completed_phases.extend([PhaseId::Whitelist, PhaseId::Origin]);
    full.hint_tiers.insert(CheckpointKey::Binding, 2);
    full.unlocked_tools.insert(ToolId::ByteGrouper);
    full.sub_checkpoints
        .insert(CheckpointKey::Machine(MachineCheck::B), true);
    full.decoded_shard_values.insert(ShardId::A, "1Z".into());
    let full_json = serde_json::to_value(&full).unwrap();
    let fields: Vec<String> = full_json.as_object().unwrap().keys().cloned().collect();

    let defaults = serde_json::to_value(ProgressRecord::default()).unwrap();
    for dropped in &fields {
        let mut partial = full_json.clone();
        partial.as_object_mut().unwrap().remove(dropped);
        let merged = ProgressRecord::merge_over_defaults(&partial.to_string()).unwrap();
        let merged_json = serde_json::to_value(&merged).unwrap();
        for field in &fields {
            let expected = if field == dropped {
                &defaults[field]
            } else {
                &full_json[field]
            };
            assert_eq!(&merged_json[field], expected, "dropped {dropped}, field {field}");
        }
    }
}

#[test]
fn loaded_activity_log_never_exceeds_the_cap() {
    let entries: Vec<_> = (0..20)
        .map(|i| {
            serde_json::json!({ "time": "08:00", "message": format!("entry {i}"), "category": "system" })
        })
        .collect();
    let blob = serde_json::json!({ "authenticated": true, "activityLog": entries }).to_string();

    let record = ProgressRecord::merge_over_defaults(&blob).unwrap();
    assert_eq!(record.activity_log.len(), 12);
    assert_eq!(record.activity_log.latest().unwrap().message, "entry 0");

    let storage = MemoryStorage::new();
    storage.insert_raw(STORAGE_KEY, blob);
    let session = ProtocolSession::open(ProtocolConfig::default(), storage, clock());
    assert!(session.snapshot().activity_log.len() <= 12);
}

#[test]
fn malformed_blob_falls_back_to_defaults() {
    for junk in ["", "{", "null", "[]", r#"{"completedPhases": "all"}"#] {
        let storage = MemoryStorage::new();
        storage.insert_raw(STORAGE_KEY, junk);
        let session = ProtocolSession::open(ProtocolConfig::default(), storage, clock());
        assert_eq!(session.snapshot(), &ProgressRecord::default(), "{junk:?}");
    }
}

#[test]
fn load_reconciles_tools_from_completed_phases() {
    let storage = MemoryStorage::new();
    storage.insert_raw(
        STORAGE_KEY,
        r#"{"authenticated":true,"currentPhase":5,"completedPhases":[1,2,3,4],"unlockedTools":["byte-grouper","integrity-check"]}"#,
    );
    let session = ProtocolSession::open(ProtocolConfig::default(), storage.clone(), clock());
    let record = session.snapshot();
    assert!(record.unlocked_tools.contains(&ToolId::BaseReference));
    assert_eq!(record.activity_log.count_message("Tool unlocked: Base Reference"), 1);
    assert_eq!(
        record.activity_log.count_message("Tool unlocked: Byte Grouper"),
        0
    );
    let stored = ProgressRecord::merge_over_defaults(&storage.raw(STORAGE_KEY).unwrap()).unwrap();
    assert_eq!(&stored, record);
}

#[test]
fn final_assembly_flips_on_any_single_wrong_input() {
    let config = ProtocolConfig::default();
    let good = ["1Z", "09X43G03", "08186005", "C"];
    let bad = ["1z", "09X43G0", "08186006", "A"];
    let accepted = courier_engine::validation::validate(
        &config,
        CheckpointKey::FinalAssembly,
        &Answer::assembly(good[0], good[1], good[2], good[3]),
    )
    .unwrap();
    assert_eq!(accepted, Verdict::Accepted);
    for i in 0..4 {
        let mut inputs = good;
        inputs[i] = bad[i];
        let verdict = courier_engine::validation::validate(
            &config,
            CheckpointKey::FinalAssembly,
            &Answer::assembly(inputs[0], inputs[1], inputs[2], inputs[3]),
        )
        .unwrap();
        assert!(!verdict.is_accepted(), "input {i} = {:?}", bad[i]);
    }
}
