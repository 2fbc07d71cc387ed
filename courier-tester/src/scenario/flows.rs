//! Scripted playthroughs run against an in-memory session.

use anyhow::{Context, Result, ensure};
use chrono::Duration;
use courier_engine::{
    Answer, CheckpointKey, MemoryStorage, PhaseId, ProgressRecord, ProtocolSession, Rejection,
    RevealStage, ShardId, StateChange, SubmitError, ToolId, Verdict,
};

use super::{ScenarioCtx, Session};

fn stored_record(ctx: &ScenarioCtx, storage: &MemoryStorage) -> Result<ProgressRecord> {
    let blob = storage
        .raw(&ctx.config.storage_key())
        .context("no progress blob was written")?;
    Ok(ProgressRecord::merge_over_defaults(&blob)?)
}

pub fn smoke(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, storage, _) = ctx.open(ctx.opening_time());
    ctx.login(&mut session)?;
    let verdict = session.submit_answer(
        CheckpointKey::Whitelist,
        &Answer::text(ctx.config.answers.phase1.as_str()),
    )?;
    ensure!(verdict == Verdict::Accepted, "phase 1 rejected: {verdict:?}");

    let stored = stored_record(ctx, &storage)?;
    ensure!(stored.authenticated, "authentication was not persisted");
    ensure!(
        stored.current_phase == PhaseId::Origin,
        "expected phase 2 active, found {}",
        stored.current_phase
    );
    ensure!(stored.is_completed(PhaseId::Whitelist), "phase 1 not completed");
    Ok(())
}

pub fn full_run(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, storage, clock) = ctx.open(ctx.opening_time());
    ctx.play_through_shards(&mut session)?;
    let verdict = session.submit_answer(CheckpointKey::FinalAssembly, &ctx.final_assembly())?;
    ensure!(verdict == Verdict::Accepted, "final assembly rejected: {verdict:?}");
    ensure!(
        session.tracking_number().is_none(),
        "tracking value exposed before the reveal finished"
    );

    let mut started = 0;
    let mut completed = 0;
    for _ in 0..60 {
        clock.advance(Duration::seconds(1));
        for change in session.tick() {
            match change {
                StateChange::RevealStarted => started += 1,
                StateChange::RevealCompleted => completed += 1,
                _ => {}
            }
        }
    }
    ensure!(started == 1, "reveal started {started} times");
    ensure!(completed == 1, "reveal completed {completed} times");

    let record = session.snapshot();
    ensure!(record.final_sequence_revealed, "reveal flag not set");
    ensure!(
        record.unlocked_tools.len() == courier_engine::TOOLS.len(),
        "tools still locked after a full run"
    );
    ensure!(
        session.tracking_number() == Some(ctx.config.tracking_number.as_str()),
        "tracking value mismatch"
    );
    ensure!(
        stored_record(ctx, &storage)?.final_sequence_revealed,
        "reveal flag not persisted"
    );
    Ok(())
}

fn exhaust_ladder(session: &mut Session, key: CheckpointKey) -> Result<()> {
    let max_tier = session.hints().max_tier(key);
    for expected in (session.snapshot().hint_tier(key) + 1)..=max_tier {
        let hint = session
            .request_hint(key)
            .with_context(|| format!("{key} ladder stopped before tier {expected}"))?;
        ensure!(hint.tier == expected, "{key} issued tier {} out of order", hint.tier);
    }
    ensure!(
        session.request_hint(key).is_none(),
        "{key} issued a hint past its last tier"
    );
    ensure!(
        session.snapshot().hint_tier(key) == max_tier,
        "{key} tier drifted past the ladder"
    );
    Ok(())
}

pub fn hint_ladder(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, storage, _) = ctx.open(ctx.opening_time());
    exhaust_ladder(&mut session, CheckpointKey::Login)?;
    ctx.login(&mut session)?;

    let key = CheckpointKey::Whitelist;
    let wrong = Answer::text(format!("{}-wrong", ctx.config.answers.phase1));
    let max_tier = session.hints().max_tier(key);
    for expected in 1..=max_tier {
        let verdict = session.submit_answer(key, &wrong)?;
        ensure!(
            verdict == Verdict::Rejected(Rejection::Mismatch(key)),
            "wrong answer judged {verdict:?}"
        );
        let tier = session.snapshot().hint_tier(key);
        ensure!(tier == expected, "expected tier {expected}, found {tier}");
    }
    session.submit_answer(key, &wrong)?;
    ensure!(
        session.snapshot().hint_tier(key) == max_tier,
        "tier climbed past the ladder"
    );
    let before = storage.raw(&ctx.config.storage_key());
    ensure!(
        session.request_hint(key).is_none(),
        "exhausted ladder still issued a hint"
    );
    ensure!(
        storage.raw(&ctx.config.storage_key()) == before,
        "exhausted hint request touched storage"
    );

    for (key, value) in ctx.scripted_answers() {
        exhaust_ladder(&mut session, key)?;
        let verdict = session.submit_answer(key, &Answer::text(value))?;
        ensure!(verdict == Verdict::Accepted, "{key} rejected: {verdict:?}");
    }
    exhaust_ladder(&mut session, CheckpointKey::FinalAssembly)?;
    let revealed = session.hints().revealed(session.snapshot(), CheckpointKey::FinalAssembly);
    ensure!(
        revealed.len() == usize::from(session.hints().max_tier(CheckpointKey::FinalAssembly)),
        "final assembly revealed {} hints",
        revealed.len()
    );
    Ok(())
}

pub fn deadline_freeze(ctx: &ScenarioCtx) -> Result<()> {
    let deadline = ctx.config.deadline.with_timezone(&chrono::Utc);
    let (mut session, _, clock) = ctx.open(deadline - Duration::seconds(2));
    ctx.login(&mut session)?;
    ensure!(session.tick().is_empty(), "tick before the deadline changed state");

    clock.advance(Duration::seconds(3));
    ensure!(
        session.tick() == vec![StateChange::Frozen],
        "crossing the deadline did not freeze"
    );
    clock.advance(Duration::seconds(1));
    ensure!(session.tick().is_empty(), "freeze announced twice");
    ensure!(
        session
            .snapshot()
            .activity_log
            .count_message("AUTHORIZATION WINDOW CLOSED")
            == 1,
        "freeze warning not logged exactly once"
    );

    let submitted = session.submit_answer(
        CheckpointKey::Whitelist,
        &Answer::text(ctx.config.answers.phase1.as_str()),
    );
    ensure!(
        submitted == Err(SubmitError::Frozen),
        "frozen session accepted a submission: {submitted:?}"
    );
    ensure!(
        session.request_hint(CheckpointKey::Whitelist).is_none(),
        "frozen session issued a hint"
    );
    Ok(())
}

pub fn shard_ordering(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, _, clock) = ctx.open(ctx.opening_time());
    ctx.login(&mut session)?;
    let answers = &ctx.config.answers;
    let scripted = ctx.scripted_answers();
    let (before_shards, shards) = scripted.split_at(scripted.len() - 3);
    for (key, value) in before_shards {
        session.submit_answer(*key, &Answer::text(value.as_str()))?;
    }

    let early = session.submit_answer(
        CheckpointKey::Shard(ShardId::B),
        &Answer::text(answers.shard_b.as_str()),
    );
    ensure!(
        early == Err(SubmitError::CheckpointLocked(CheckpointKey::Shard(ShardId::B))),
        "shard B opened before shard A: {early:?}"
    );
    for (key, value) in shards {
        let verdict = session.submit_answer(*key, &Answer::text(value.as_str()))?;
        ensure!(verdict == Verdict::Accepted, "{key} rejected: {verdict:?}");
    }

    let wrong_ordering = if answers.ordering.eq_ignore_ascii_case("A") { "B" } else { "A" };
    let both_wrong = Answer::assembly(
        format!("{}X", answers.shard_a),
        answers.shard_b.as_str(),
        answers.shard_c.as_str(),
        wrong_ordering,
    );
    ensure!(
        session.submit_answer(CheckpointKey::FinalAssembly, &both_wrong)?
            == Verdict::Rejected(Rejection::ShardContent),
        "shard content was not checked first"
    );
    let ordering_only = Answer::assembly(
        answers.shard_a.as_str(),
        answers.shard_b.as_str(),
        answers.shard_c.as_str(),
        wrong_ordering,
    );
    ensure!(
        session.submit_answer(CheckpointKey::FinalAssembly, &ordering_only)?
            == Verdict::Rejected(Rejection::OrderingRule),
        "ordering rule was not enforced"
    );
    ensure!(
        session.snapshot().hint_tier(CheckpointKey::FinalAssembly) == 2,
        "final assembly rejections did not advance hints"
    );

    ensure!(
        session.submit_answer(CheckpointKey::FinalAssembly, &ctx.final_assembly())?
            == Verdict::Accepted,
        "correct assembly rejected"
    );
    clock.advance(Duration::seconds(2));
    session.tick();
    let frame = session.reveal_frame().context("reveal not armed")?;
    ensure!(frame.stage == RevealStage::Steps, "unexpected stage {:?}", frame.stage);
    Ok(())
}

pub fn resume(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, storage, clock) = ctx.open(ctx.opening_time());
    ctx.login(&mut session)?;
    for (key, value) in ctx.scripted_answers().into_iter().take(5) {
        session.submit_answer(key, &Answer::text(value))?;
    }
    let before = session.snapshot().clone();
    drop(session);

    let reloaded = ProtocolSession::open(ctx.config.clone(), storage.clone(), clock.clone());
    ensure!(reloaded.snapshot() == &before, "reload changed the record");
    ensure!(
        reloaded.snapshot().current_phase == PhaseId::WorldLink,
        "expected phase 4 active after reload"
    );
    drop(reloaded);

    // Strip the tool list; opening again must restore it from completed phases.
    let mut stripped = before.clone();
    stripped.unlocked_tools.clear();
    storage.insert_raw(&ctx.config.storage_key(), stripped.to_blob()?);
    let reconciled = ProtocolSession::open(ctx.config.clone(), storage.clone(), clock.clone());
    let tools = &reconciled.snapshot().unlocked_tools;
    ensure!(
        tools.contains(&ToolId::ByteGrouper) && !tools.contains(&ToolId::IntegrityCheck),
        "tools not reconciled on load: {tools:?}"
    );
    drop(reconciled);

    storage.insert_raw(&ctx.config.storage_key(), r#"{"authenticated":true}"#);
    let partial = ProtocolSession::open(ctx.config.clone(), storage, clock);
    let record = partial.snapshot();
    ensure!(
        record.authenticated && record.current_phase == PhaseId::FIRST,
        "partial blob did not merge over defaults"
    );
    ensure!(record.completed_phases.is_empty(), "defaults not applied");
    Ok(())
}
