mod common;

use std::sync::atomic::Ordering;

use tempfile::TempDir;

use studycast_models::{GenerationRequest, TranscriptSegment};
use studycast_worker::{
    BackgroundPolicy, JobLogger, SynthesisMode, VideoPipeline, WorkerError,
};

use common::{files_under, test_config, FakeMedia, FakeText, Fakes, RenderBehavior};

fn request(out: &TempDir) -> GenerationRequest {
    GenerationRequest::new(
        "Zellatmung",
        "Glykolyse und Citratzyklus",
        "Notizen zur Zellatmung",
        out.path().join("videos").join("0_1.mp4"),
    )
}

fn logger() -> JobLogger {
    JobLogger::detached("video", "test")
}

fn speech_segments() -> Vec<TranscriptSegment> {
    vec![
        TranscriptSegment::new(0.0, 6.0, "Hello."),
        TranscriptSegment::new(6.0, 15.0, "Hi there."),
    ]
}

#[tokio::test]
async fn two_lines_are_assembled_in_order() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let fakes = Fakes::new("Tom: Hello.\nLisa: Hi there.", speech_segments(), FakeMedia::new(60.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    let req = request(&out);
    let artifact = pipeline.run(&req, &logger()).await.unwrap();

    // "Hello." is 6 bytes and "Hi there." 9, one second per byte
    assert_eq!(artifact.duration_secs, Some(15.0));
    assert!(req.output_path.exists());

    let voices = fakes.speech.voices.lock().unwrap().clone();
    assert!(voices.contains(&("Hello.".to_string(), "de-DE-ConradNeural".to_string())));
    assert!(voices.contains(&("Hi there.".to_string(), "de-DE-AmalaNeural".to_string())));

    let inputs = fakes.media.concat_inputs.lock().unwrap().clone();
    assert_eq!(inputs.len(), 2);
    assert!(inputs[0].ends_with("line_0000.mp3"));
    assert!(inputs[1].ends_with("line_0001.mp3"));

    let job = fakes.media.last_job().unwrap();
    assert_eq!(job.narration_secs, 15.0);
    assert!(!job.loop_background);
    assert!(job.captions.is_some());
}

#[tokio::test]
async fn stray_speaker_is_skipped() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let script = "Tom: Hello.\nMODERATOR: welcome\nLisa: Hi there.";
    let fakes = Fakes::new(script, speech_segments(), FakeMedia::new(60.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    let artifact = pipeline.run(&request(&out), &logger()).await.unwrap();

    assert_eq!(fakes.speech.calls.load(Ordering::SeqCst), 2);
    assert_eq!(artifact.duration_secs, Some(15.0));
    let inputs = fakes.media.concat_inputs.lock().unwrap().clone();
    assert!(inputs[1].ends_with("line_0002.mp3"));
}

#[tokio::test]
async fn no_dialogue_fails_before_transcription() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let fakes = Fakes::new("Sure! Here is a podcast about cells.", vec![], FakeMedia::new(60.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    let err = pipeline.run(&request(&out), &logger()).await.unwrap_err();

    assert!(matches!(err, WorkerError::NoDialogueLines));
    assert_eq!(fakes.speech.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.transcriber.calls.load(Ordering::SeqCst), 0);
    assert!(files_under(out.path()).is_empty());
    assert!(files_under(work.path()).is_empty());
}

#[tokio::test]
async fn short_background_loops_and_trims_to_narration() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let fakes = Fakes::new("Tom: Hello.\nLisa: Hi there.", speech_segments(), FakeMedia::new(10.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    pipeline.run(&request(&out), &logger()).await.unwrap();

    let job = fakes.media.last_job().unwrap();
    assert!(job.loop_background);
    let args = job.build_command("staging.mp4").build_args();
    let loop_at = args.iter().position(|a| a == "-stream_loop").unwrap();
    assert_eq!(args[loop_at + 1], "-1");
    let t_at = args.iter().position(|a| a == "-t").unwrap();
    assert_eq!(args[t_at + 1], "15.000");
}

#[tokio::test]
async fn short_background_fails_under_fail_policy() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let fakes = Fakes::new("Tom: Hello.\nLisa: Hi there.", speech_segments(), FakeMedia::new(10.0));
    let mut config = test_config();
    config.background_policy = BackgroundPolicy::Fail;
    let pipeline = VideoPipeline::new(fakes.capabilities(), config, work.path());

    let err = pipeline.run(&request(&out), &logger()).await.unwrap_err();

    match err {
        WorkerError::BackgroundTooShort {
            background_secs,
            narration_secs,
        } => {
            assert_eq!(background_secs, 10.0);
            assert_eq!(narration_secs, 15.0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fakes.media.last_job().is_none());
}

#[tokio::test]
async fn lenient_mode_drops_failed_lines() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let script = "Tom: Hello.\nLisa: FAIL\nTom: Bye.";
    let fakes = Fakes::new(script, speech_segments(), FakeMedia::new(60.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    let artifact = pipeline.run(&request(&out), &logger()).await.unwrap();

    assert_eq!(artifact.duration_secs, Some(10.0));
    assert_eq!(fakes.media.concat_inputs.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn strict_mode_aborts_on_failed_line() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let script = "Tom: Hello.\nLisa: FAIL\nTom: Bye.";
    let fakes = Fakes::new(script, speech_segments(), FakeMedia::new(60.0));
    let mut config = test_config();
    config.synthesis_mode = SynthesisMode::Strict;
    let pipeline = VideoPipeline::new(fakes.capabilities(), config, work.path());

    let err = pipeline.run(&request(&out), &logger()).await.unwrap_err();

    assert!(matches!(err, WorkerError::SynthesisFailed { line_index: 1, .. }));
    assert!(err.is_retryable());
    assert!(files_under(work.path()).is_empty());
}

#[tokio::test]
async fn speech_outage_is_retryable_in_lenient_mode() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let fakes = Fakes::new("Tom: FAIL one\nLisa: FAIL two", speech_segments(), FakeMedia::new(60.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    let err = pipeline.run(&request(&out), &logger()).await.unwrap_err();

    assert!(matches!(err, WorkerError::SynthesisFailed { line_index: 1, .. }));
    assert!(err.is_retryable());
    assert_eq!(err.code(), "synthesis_failed");
    assert_eq!(fakes.speech.calls.load(Ordering::SeqCst), 2);
    assert_eq!(fakes.transcriber.calls.load(Ordering::SeqCst), 0);
    assert!(files_under(work.path()).is_empty());
}

#[tokio::test]
async fn empty_transcript_is_fatal_unless_uncaptioned_allowed() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let fakes = Fakes::new("Tom: Hello.", vec![TranscriptSegment::new(0.0, 6.0, "  ")], FakeMedia::new(60.0));

    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());
    let err = pipeline.run(&request(&out), &logger()).await.unwrap_err();
    assert!(matches!(err, WorkerError::TranscriptionFailed(_)));

    let mut config = test_config();
    config.allow_uncaptioned = true;
    let pipeline = VideoPipeline::new(fakes.capabilities(), config, work.path());
    let artifact = pipeline.run(&request(&out), &logger()).await.unwrap();
    assert_eq!(artifact.caption_count, 0);
    assert!(fakes.media.last_job().unwrap().captions.is_none());
}

#[tokio::test]
async fn captions_are_chunked_and_sidecar_written() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let segments = vec![TranscriptSegment::new(0.0, 5.0, "one two three four five six seven")];
    let fakes = Fakes::new("Tom: one two three four five six seven", segments, FakeMedia::new(60.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    let req = request(&out);
    let artifact = pipeline.run(&req, &logger()).await.unwrap();

    assert_eq!(artifact.caption_count, 2);
    assert_eq!(*fakes.media.sidecar_at_render.lock().unwrap(), vec![true]);
    let srt = std::fs::read_to_string(req.output_path.with_extension("srt")).unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:02,500\none two three four five\n\n\
         2\n00:00:02,500 --> 00:00:05,000\nsix seven\n\n"
    );
}

#[tokio::test]
async fn uncaptioned_rerender_removes_old_sidecar() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let req = request(&out);
    let sidecar = req.output_path.with_extension("srt");

    let fakes = Fakes::new("Tom: Hello.", vec![TranscriptSegment::new(0.0, 6.0, "Hello")], FakeMedia::new(60.0));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());
    pipeline.run(&req, &logger()).await.unwrap();
    assert!(sidecar.exists());

    let fakes = Fakes::new("Tom: Hello.", vec![TranscriptSegment::new(0.0, 6.0, " ")], FakeMedia::new(60.0));
    let mut config = test_config();
    config.allow_uncaptioned = true;
    let pipeline = VideoPipeline::new(fakes.capabilities(), config, work.path());
    let artifact = pipeline.run(&req, &logger()).await.unwrap();

    assert_eq!(artifact.caption_count, 0);
    assert!(req.output_path.exists());
    assert!(!sidecar.exists());
    assert_eq!(*fakes.media.sidecar_at_render.lock().unwrap(), vec![false]);
}

#[tokio::test]
async fn encode_failure_leaves_nothing_behind() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let media = FakeMedia::new(60.0).with_render(RenderBehavior::Fail);
    let fakes = Fakes::new("Tom: Hello.\nLisa: Hi there.", speech_segments(), media);
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    let req = request(&out);
    let err = pipeline.run(&req, &logger()).await.unwrap_err();

    assert!(matches!(err, WorkerError::EncodingFailed(_)));
    assert!(!req.output_path.exists());
    assert!(!req.output_path.with_extension("srt").exists());
    assert!(files_under(work.path()).is_empty());
}

#[tokio::test]
async fn unavailable_text_generation_is_retried() {
    let out = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let fakes = Fakes::new("", speech_segments(), FakeMedia::new(60.0))
        .with_text(FakeText::new("Tom: Hello.\nLisa: Hi there.").failing_first(2));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());

    pipeline.run(&request(&out), &logger()).await.unwrap();
    assert_eq!(fakes.text.calls.load(Ordering::SeqCst), 3);

    let fakes = Fakes::new("", speech_segments(), FakeMedia::new(60.0))
        .with_text(FakeText::new("Tom: Hello.").failing_first(10));
    let pipeline = VideoPipeline::new(fakes.capabilities(), test_config(), work.path());
    let err = pipeline.run(&request(&out), &logger()).await.unwrap_err();
    assert!(matches!(err, WorkerError::GenerationUnavailable(_)));
    assert_eq!(fakes.text.calls.load(Ordering::SeqCst), 3);
}
