//! Orchestrator tests: phases, batch runs, edits and reset.

use shotlist_core::{
    ImagePromptField, PromptField, ScriptTarget, SettingKind, ShotField,
};
use shotlist_error::{
    EditError, EditErrorKind, GenerationErrorKind, PipelineErrorKind, ShotlistError,
    ShotlistErrorKind, ValidationErrorKind,
};
use shotlist_pipeline::{
    GenerationQueue, Pipeline, PipelineEvent, PipelinePhase, ResetConfirmation,
};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

mod test_utils;
use test_utils::{DETECTIVE_BRIEF, MockStudio, bundle, prompt_for};

fn pipeline(studio: MockStudio) -> Pipeline<MockStudio> {
    Pipeline::new(studio, GenerationQueue::new(Duration::from_millis(500)))
}

fn drain(rx: &mut Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn phases(events: &[PipelineEvent]) -> Vec<PipelinePhase> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

fn pipeline_kind(err: &ShotlistError) -> Option<&PipelineErrorKind> {
    match err.kind() {
        ShotlistErrorKind::Pipeline(e) => Some(&e.kind),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn detective_scenario_generates_two_groups() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    let mut rx = pipeline.subscribe();

    pipeline.submit_brief(DETECTIVE_BRIEF, 8).await?;
    let state = pipeline.snapshot().await;
    let script = state.bundle().as_ref().unwrap();
    assert_eq!(script.script.len(), 8);
    let groups: Vec<_> = script
        .groups
        .iter()
        .map(|g| (g.id, g.range.as_str()))
        .collect();
    assert_eq!(groups, vec![(1, "1-4"), (2, "5-8")]);

    let report = pipeline.confirm_script().await?;
    assert_eq!(*report.attempted(), 2);
    assert!(report.failed().is_empty());

    let state = pipeline.snapshot().await;
    assert_eq!(state.phase(), PipelinePhase::ReviewingPrompts);
    assert_eq!(
        state.prompts().keys().copied().collect::<BTreeSet<_>>(),
        BTreeSet::from([1, 2])
    );
    assert!(state.progress().is_none());

    let events = drain(&mut rx);
    assert_eq!(
        phases(&events),
        vec![
            PipelinePhase::GeneratingScript,
            PipelinePhase::ReviewingScript,
            PipelinePhase::GeneratingPrompts,
            PipelinePhase::ReviewingPrompts,
        ]
    );
    let totals: BTreeSet<_> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::Progress(Some(p)) => Some(*p.total()),
            _ => None,
        })
        .collect();
    assert_eq!(totals, BTreeSet::from([2]));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn invalid_brief_is_rejected_before_any_call() {
    let pipeline = pipeline(MockStudio::default());

    for (brief, count) in [("", 8), ("   ", 8), (DETECTIVE_BRIEF, 0), (DETECTIVE_BRIEF, 6)] {
        let err = pipeline.submit_brief(brief, count).await.unwrap_err();
        assert!(
            matches!(err.kind(), ShotlistErrorKind::Validation(_)),
            "{brief:?} {count}"
        );
        assert_eq!(pipeline.phase().await, PipelinePhase::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn script_failure_returns_to_idle_with_message() {
    let pipeline = pipeline(MockStudio::failing_script(GenerationErrorKind::Http {
        status_code: 500,
        message: "backend exploded".to_string(),
    }));
    let mut rx = pipeline.subscribe();

    let err = pipeline.submit_brief(DETECTIVE_BRIEF, 8).await.unwrap_err();
    assert!(matches!(err.kind(), ShotlistErrorKind::Generation(_)));

    let state = pipeline.snapshot().await;
    assert_eq!(state.phase(), PipelinePhase::Idle);
    assert!(state.bundle().is_none());
    assert!(state.last_error().as_deref().unwrap().contains("backend exploded"));

    let events = drain(&mut rx);
    assert_eq!(
        phases(&events),
        vec![PipelinePhase::GeneratingScript, PipelinePhase::Idle]
    );
    assert!(events.iter().any(|e| matches!(e, PipelineEvent::Error(_))));
}

#[tokio::test(start_paused = true)]
async fn generated_script_with_wrong_count_is_a_failure() {
    let studio = MockStudio {
        script_override: Some(bundle(4)),
        ..MockStudio::default()
    };
    let pipeline = pipeline(studio);

    let err = pipeline.submit_brief(DETECTIVE_BRIEF, 8).await.unwrap_err();
    assert!(matches!(err.kind(), ShotlistErrorKind::Sanitize(_)));
    assert_eq!(pipeline.phase().await, PipelinePhase::Idle);
    assert!(pipeline.snapshot().await.bundle().is_none());
}

#[tokio::test(start_paused = true)]
async fn confirm_with_all_results_skips_the_run() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.submit_brief(DETECTIVE_BRIEF, 8).await?;
    pipeline.confirm_script().await?;
    pipeline.select_group(2).await?;

    let snapshot = pipeline.export_snapshot().await?;
    pipeline.import_snapshot(snapshot).await?;
    assert_eq!(pipeline.phase().await, PipelinePhase::ReviewingScript);
    pipeline.select_group(2).await?;

    let calls_before = pipeline.studio().prompt_calls().len();
    let mut rx = pipeline.subscribe();

    let report = pipeline.confirm_script().await?;
    assert_eq!(*report.attempted(), 0);

    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Progress(_))));
    assert_eq!(phases(&events), vec![PipelinePhase::ReviewingPrompts]);

    let state = pipeline.snapshot().await;
    assert!(state.progress().is_none());
    assert_eq!(*state.active_group(), Some(2));
    assert_eq!(pipeline.studio().prompt_calls().len(), calls_before);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn confirm_generates_only_missing_groups() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    let mut snapshot = shotlist_pipeline::Snapshot::capture(&bundle(12), &Default::default());
    snapshot.prompts.insert(2, prompt_for(2));
    pipeline.import_snapshot(snapshot).await?;

    let report = pipeline.confirm_script().await?;
    assert_eq!(*report.attempted(), 2);
    assert_eq!(pipeline.studio().prompt_calls(), vec![1, 3]);
    assert_eq!(pipeline.snapshot().await.prompts().len(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_groups_stay_unresolved_and_run_completes() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::failing_groups(&[2]));
    pipeline.import_bundle(bundle(12)).await?;

    let report = pipeline.confirm_script().await?;
    assert_eq!(*report.attempted(), 3);
    assert_eq!(report.failed(), &vec![2]);

    let state = pipeline.snapshot().await;
    assert_eq!(state.phase(), PipelinePhase::ReviewingPrompts);
    assert_eq!(state.prompts().keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(state.pending_groups(), vec![2]);
    assert_eq!(pipeline.studio().max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn regenerate_group_keeps_other_results() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;
    pipeline.confirm_script().await?;

    pipeline
        .edit_prompt(1, |result| {
            result.set(PromptField::Camera, "hand-held");
            Ok(())
        })
        .await?;
    pipeline
        .edit_prompt(2, |result| {
            result.set(PromptField::Camera, "crane up");
            Ok(())
        })
        .await?;

    let report = pipeline.regenerate_group(2).await?;
    assert_eq!(*report.attempted(), 1);

    let state = pipeline.snapshot().await;
    assert_eq!(state.prompts()[&1].camera_prompts, "hand-held");
    assert_eq!(state.prompts()[&2], prompt_for(2));
    assert_eq!(state.phase(), PipelinePhase::ReviewingPrompts);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn regenerate_all_clears_and_reruns_every_group() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::failing_groups(&[1]));
    pipeline.import_bundle(bundle(8)).await?;
    pipeline.confirm_script().await?;
    assert_eq!(pipeline.snapshot().await.prompts().len(), 1);

    let report = pipeline.regenerate_all().await?;
    assert_eq!(*report.attempted(), 2);
    assert_eq!(pipeline.studio().prompt_calls(), vec![1, 2, 1, 2]);
    assert_eq!(
        pipeline.snapshot().await.prompts().keys().copied().collect::<Vec<_>>(),
        vec![2]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn regeneration_requires_reviewing_prompts() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;

    let err = pipeline.regenerate_all().await.unwrap_err();
    assert!(matches!(
        pipeline_kind(&err),
        Some(PipelineErrorKind::IllegalTransition { .. })
    ));
    assert_eq!(pipeline.phase().await, PipelinePhase::ReviewingScript);

    pipeline.confirm_script().await?;
    let err = pipeline.regenerate_group(9).await.unwrap_err();
    assert!(matches!(err.kind(), ShotlistErrorKind::Edit(_)));
    assert_eq!(pipeline.phase().await, PipelinePhase::ReviewingPrompts);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn commands_during_a_run_are_rejected() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;

    let (report, probes) = tokio::join!(pipeline.confirm_script(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let progress = pipeline.progress().await;
        let regenerate = pipeline.regenerate_all().await;
        let busy = pipeline
            .edit_prompt(1, |result| {
                result.set(PromptField::Camera, "too early");
                Ok(())
            })
            .await;
        let reset = pipeline.reset(ResetConfirmation::Confirmed).await;
        (progress, regenerate, busy, reset)
    });

    let (progress, regenerate, busy, reset) = probes;
    assert_eq!(progress.map(|p| (*p.current(), *p.total())), Some((0, 2)));
    assert!(matches!(
        pipeline_kind(&regenerate.unwrap_err()),
        Some(PipelineErrorKind::RunInProgress)
    ));
    assert!(matches!(
        pipeline_kind(&busy.unwrap_err()),
        Some(PipelineErrorKind::GroupBusy(1))
    ));
    assert!(matches!(
        pipeline_kind(&reset.unwrap_err()),
        Some(PipelineErrorKind::RunInProgress)
    ));

    assert_eq!(*report?.attempted(), 2);
    assert_eq!(pipeline.snapshot().await.prompts().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn selecting_a_group_mid_run_keeps_the_generating_group_busy() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;
    pipeline.confirm_script().await?;

    let (report, checks) = tokio::join!(pipeline.regenerate_group(2), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let selected = pipeline.select_group(1).await;
        let edited = pipeline
            .edit_prompt(2, |result| {
                result.set(PromptField::Camera, "hand edit");
                Ok(())
            })
            .await;
        let refined = pipeline.refine_prompt(2, "moonlight", None).await;
        let state = pipeline.snapshot().await;
        let groups = (*state.active_group(), *state.generating_group());
        (selected, edited, refined, groups)
    });

    let (selected, edited, refined, groups) = checks;
    selected?;
    assert!(matches!(
        pipeline_kind(&edited.unwrap_err()),
        Some(PipelineErrorKind::GroupBusy(2))
    ));
    assert!(matches!(
        pipeline_kind(&refined.unwrap_err()),
        Some(PipelineErrorKind::GroupBusy(2))
    ));
    assert_eq!(groups, (Some(1), Some(2)));

    assert_eq!(*report?.attempted(), 1);
    let state = pipeline.snapshot().await;
    assert_eq!(state.prompts()[&2], prompt_for(2));
    assert!(state.generating_group().is_none());
    assert_eq!(*state.active_group(), Some(1));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reset_during_script_generation_drops_the_late_reply() -> anyhow::Result<()> {
    let studio = MockStudio {
        script_delay: Duration::from_millis(1000),
        ..MockStudio::default()
    };
    let pipeline = pipeline(studio);

    let (submitted, reset) = tokio::join!(pipeline.submit_brief(DETECTIVE_BRIEF, 8), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let phase = pipeline.phase().await;
        (phase, pipeline.reset(ResetConfirmation::Confirmed).await)
    });

    let (phase_before_reset, reset) = reset;
    assert_eq!(phase_before_reset, PipelinePhase::GeneratingScript);
    reset?;
    assert!(matches!(
        pipeline_kind(&submitted.unwrap_err()),
        Some(PipelineErrorKind::ScriptDiscarded)
    ));

    let state = pipeline.snapshot().await;
    assert_eq!(state.phase(), PipelinePhase::Idle);
    assert!(state.bundle().is_none());
    assert!(state.last_error().is_none());

    pipeline.submit_brief(DETECTIVE_BRIEF, 8).await?;
    assert_eq!(pipeline.phase().await, PipelinePhase::ReviewingScript);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refinement_does_not_overwrite_a_newer_result() -> anyhow::Result<()> {
    let studio = MockStudio {
        refine_delay: Duration::from_millis(1000),
        ..MockStudio::default()
    };
    let pipeline = pipeline(studio);
    pipeline.import_bundle(bundle(8)).await?;
    pipeline.confirm_script().await?;

    let (refined, edited) = tokio::join!(pipeline.refine_prompt(1, "moonlight", None), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        pipeline
            .edit_prompt(1, |result| {
                result.set(PromptField::Camera, "hand edit");
                Ok(())
            })
            .await
    });

    edited?;
    assert!(matches!(
        pipeline_kind(&refined.unwrap_err()),
        Some(PipelineErrorKind::ResultChanged(1))
    ));
    let result = pipeline.snapshot().await.prompts()[&1].clone();
    assert_eq!(result.camera_prompts, "hand edit");
    assert_eq!(result.image_prompts.lighting, prompt_for(1).image_prompts.lighting);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn finished_groups_can_be_edited_during_a_run() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;

    let (report, edited) = tokio::join!(pipeline.confirm_script(), async {
        // Group 1 finishes at 1s; group 2 is in flight from 1.5s to 2.5s.
        tokio::time::sleep(Duration::from_millis(2000)).await;
        pipeline
            .edit_prompt(1, |result| {
                result.set(PromptField::Image(ImagePromptField::Style), "charcoal");
                Ok(())
            })
            .await
    });

    report?;
    edited?;
    let state = pipeline.snapshot().await;
    assert_eq!(state.prompts()[&1].image_prompts.style, "charcoal");
    assert_eq!(state.prompts()[&2], prompt_for(2));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn import_rejects_bad_partition() {
    let pipeline = pipeline(MockStudio::default());
    let mut malformed = bundle(8);
    malformed.groups.truncate(1);

    let err = pipeline.import_bundle(malformed).await.unwrap_err();
    match err.kind() {
        ShotlistErrorKind::Validation(e) => {
            assert!(matches!(e.kind, ValidationErrorKind::PartitionMismatch(_)))
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert_eq!(pipeline.phase().await, PipelinePhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn import_rejects_mislabelled_group_ranges() {
    let pipeline = pipeline(MockStudio::default());
    let mut mislabelled = bundle(8);
    mislabelled.groups[0].range = "5-8".to_string();
    mislabelled.groups[1].range = "1-4".to_string();

    let err = pipeline.import_bundle(mislabelled).await.unwrap_err();
    match err.kind() {
        ShotlistErrorKind::Validation(e) => {
            assert!(matches!(e.kind, ValidationErrorKind::PartitionMismatch(_)))
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert_eq!(pipeline.phase().await, PipelinePhase::Idle);
    assert!(pipeline.snapshot().await.bundle().is_none());
}

#[tokio::test(start_paused = true)]
async fn bundle_edits_are_checked_and_committed_atomically() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;

    pipeline
        .edit_bundle(|b| b.update_shot(3, ShotField::Voiceover, "Stop right there"))
        .await?;
    let index = pipeline
        .edit_bundle(|b| Ok(b.settings.add_item(SettingKind::Scene)))
        .await?;
    assert_eq!(index, 0);

    let err = pipeline
        .edit_bundle(|b| b.update_shot(42, ShotField::Description, "nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ShotlistErrorKind::Edit(_)));

    let err = pipeline
        .edit_bundle(|b| {
            b.settings.overview = "changed".to_string();
            b.script.pop();
            Ok::<_, EditError>(())
        })
        .await
        .unwrap_err();
    match err.kind() {
        ShotlistErrorKind::Edit(e) => assert!(matches!(e.kind, EditErrorKind::ShapeChanged(_))),
        other => panic!("expected edit error, got {other}"),
    }

    let state = pipeline.snapshot().await;
    let current = state.bundle().as_ref().unwrap();
    assert_eq!(current.script.len(), 8);
    assert_eq!(current.script[2].voiceover, "Stop right there");
    assert_eq!(current.settings.overview, "Rain-soaked pursuit");
    assert_eq!(current.settings.scenes[0].name, "New scene 1");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refine_prompt_field_leaves_other_fields() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;
    pipeline.confirm_script().await?;

    pipeline
        .refine_prompt(
            1,
            "moonlight",
            Some(PromptField::Image(ImagePromptField::Lighting)),
        )
        .await?;

    let result = pipeline.snapshot().await.prompts()[&1].clone();
    assert_eq!(result.image_prompts.lighting, "moonlight");
    assert_eq!(result.image_prompts.subject, prompt_for(1).image_prompts.subject);
    assert_eq!(result.camera_prompts, prompt_for(1).camera_prompts);

    pipeline.refine_prompt(2, "redo", None).await?;
    let result = pipeline.snapshot().await.prompts()[&2].clone();
    assert_eq!(result.camera_prompts, "rewritten camera");
    assert_eq!(result.group_id, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refine_script_targets_settings_only() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(8)).await?;

    pipeline
        .refine_script("watercolour", Some(ScriptTarget::Settings))
        .await?;
    let state = pipeline.snapshot().await;
    let current = state.bundle().as_ref().unwrap();
    assert_eq!(current.settings.style, "watercolour");
    assert_eq!(current.script[0].description, "Shot 1");

    pipeline.refine_script("tighter", None).await?;
    let state = pipeline.snapshot().await;
    assert_eq!(
        state.bundle().as_ref().unwrap().script[0].description,
        "Shot 1 (tighter)"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn setting_from_image_appends_item() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.import_bundle(bundle(4)).await?;

    let index = pipeline
        .add_setting_from_image(SettingKind::Character, &[0u8; 16], "image/png")
        .await?;
    assert_eq!(index, 1);

    let state = pipeline.snapshot().await;
    let item = &state.bundle().as_ref().unwrap().settings.characters[1];
    assert_eq!(item.name, "New character 2");
    assert_eq!(item.prompt, "SettingPrompt of 16 bytes of image/png");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reset_requires_confirmation_and_discards_everything() -> anyhow::Result<()> {
    let pipeline = pipeline(MockStudio::default());
    pipeline.submit_brief(DETECTIVE_BRIEF, 8).await?;
    pipeline.confirm_script().await?;
    pipeline.select_group(1).await?;

    let err = pipeline.reset(ResetConfirmation::Declined).await.unwrap_err();
    assert!(matches!(
        pipeline_kind(&err),
        Some(PipelineErrorKind::ResetNotConfirmed)
    ));
    assert_eq!(pipeline.phase().await, PipelinePhase::ReviewingPrompts);

    pipeline.reset(ResetConfirmation::Confirmed).await?;
    let state = pipeline.snapshot().await;
    assert_eq!(state.phase(), PipelinePhase::Idle);
    assert!(state.bundle().is_none());
    assert!(state.prompts().is_empty());
    assert!(state.active_group().is_none());

    let err = pipeline.export_snapshot().await.unwrap_err();
    assert!(matches!(pipeline_kind(&err), Some(PipelineErrorKind::NoBundle)));
    Ok(())
}
