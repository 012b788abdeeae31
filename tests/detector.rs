//! End-to-end pipeline tests with an in-memory opener and model.

mod common;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{AI_VERDICT, AUTHENTIC_VERDICT, FailingTransport, MockOpener, RecordingTransport};
use vidverdict::{
    AnalysisClient, AnalysisOptions, CancellationToken, Detector, OperationType, Part, Phase,
    ProgressCallback, ProgressInfo, SampleOptions, SelectedFile, Session, Severity, VerdictError,
};

#[derive(Default)]
struct RecordingProgress {
    updates: Mutex<Vec<(OperationType, u64)>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.updates
            .lock()
            .unwrap()
            .push((info.operation, info.current));
    }
}

fn detector_with<T: vidverdict::ModelTransport>(
    transport: T,
    opener: MockOpener,
) -> Detector<T, MockOpener> {
    Detector::new(
        AnalysisClient::new(transport, AnalysisOptions::new()),
        SampleOptions::new(),
    )
    .with_opener(opener)
}

#[tokio::test]
async fn ten_second_video_yields_a_high_severity_verdict() {
    let transport = RecordingTransport::replying(AI_VERDICT);
    let opener = MockOpener::new(Duration::from_secs(10));
    let detector = detector_with(transport.clone(), opener.clone());

    let mut session = Session::new();
    session.select_file(SelectedFile::new("clip.mp4")).unwrap();
    detector.run(&mut session).await.unwrap();

    assert_eq!(session.phase(), Phase::Success);
    let result = session.result().unwrap();
    assert!(result.is_ai_generated);
    assert_eq!(result.severity(), Severity::High);
    assert_eq!(result.confidence_percent(), "92.0%");
    assert_eq!(result.artifacts_detected.len(), 1);

    assert_eq!(opener.open_count(), 1);
    assert_eq!(transport.request_count(), 1);
    let (_, request) = transport.last_request();
    let images = request.parts().filter(|part| part.is_image()).count();
    assert_eq!(images, 5);
}

#[tokio::test]
async fn authentic_verdict_is_low_severity() {
    let detector = detector_with(
        RecordingTransport::replying(AUTHENTIC_VERDICT),
        MockOpener::new(Duration::from_secs(4)),
    );

    let result = detector
        .analyze_path(Path::new("clip.mp4"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.is_ai_generated);
    assert_eq!(result.severity(), Severity::Low);
    assert!(result.artifacts_detected.is_empty());
}

#[tokio::test]
async fn non_video_selection_never_opens_anything() {
    let opener = MockOpener::new(Duration::from_secs(10));
    let transport = RecordingTransport::replying(AI_VERDICT);
    let detector = detector_with(transport.clone(), opener.clone());

    let mut session = Session::new();
    assert!(session.select_file(SelectedFile::new("notes.pdf")).is_err());

    let error = detector.run(&mut session).await.unwrap_err();

    assert!(matches!(error, VerdictError::NoFileSelected));
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(opener.open_count(), 0);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn transport_failure_ends_in_error_phase() {
    let detector = detector_with(FailingTransport, MockOpener::new(Duration::from_secs(10)));

    let mut session = Session::new();
    session.select_file(SelectedFile::new("clip.mp4")).unwrap();
    detector.run(&mut session).await.unwrap();

    assert_eq!(session.phase(), Phase::Error);
    assert!(session.result().is_none());
    let message = session.message().unwrap();
    assert!(message.starts_with("Failed to analyze video frames"));
}

#[tokio::test]
async fn zero_duration_video_fails_before_the_model_is_called() {
    let transport = RecordingTransport::replying(AI_VERDICT);
    let detector = detector_with(transport.clone(), MockOpener::new(Duration::ZERO));

    let mut session = Session::new();
    session.select_file(SelectedFile::new("empty.webm")).unwrap();
    detector.run(&mut session).await.unwrap();

    assert_eq!(session.phase(), Phase::Error);
    assert_eq!(session.message(), Some("Video has no duration."));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn empty_frame_list_is_not_sent() {
    let transport = RecordingTransport::replying(AI_VERDICT);
    let detector = detector_with(transport.clone(), MockOpener::new(Duration::from_secs(10)));

    let error = detector
        .analyze_frames(&[], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, VerdictError::NoFramesExtracted));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn cancelled_ticket_stops_before_sampling() {
    let transport = RecordingTransport::replying(AI_VERDICT);
    let detector = detector_with(transport.clone(), MockOpener::new(Duration::from_secs(10)));

    let mut session = Session::new();
    session.select_file(SelectedFile::new("clip.mp4")).unwrap();
    let ticket = session.begin_analysis().unwrap();
    ticket.cancellation().cancel();

    let error = detector.execute(&ticket).await.unwrap_err();

    assert!(matches!(error, VerdictError::Cancelled));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn sampled_frames_follow_the_configured_count() {
    let detector = Detector::new(
        AnalysisClient::new(
            RecordingTransport::replying(AI_VERDICT),
            AnalysisOptions::new(),
        ),
        SampleOptions::new().with_frame_count(3),
    )
    .with_opener(MockOpener::new(Duration::from_secs(8)));

    let frames = detector
        .sample(Path::new("clip.mp4"), &CancellationToken::new())
        .await
        .unwrap();

    let seconds: Vec<f64> = frames
        .iter()
        .map(|frame| frame.timestamp().as_secs_f64())
        .collect();
    assert_eq!(seconds.len(), 3);
    for (actual, expected) in seconds.iter().zip([2.0, 4.0, 6.0]) {
        assert!((actual - expected).abs() < 1e-6);
    }

    let client = detector.client();
    let request = client.build_request(&frames);
    assert!(matches!(request.parts().next(), Some(Part::Text(_))));
}

#[tokio::test]
async fn remote_call_is_reported_after_sampling() {
    let progress = Arc::new(RecordingProgress::default());
    let detector = Detector::new(
        AnalysisClient::new(
            RecordingTransport::replying(AI_VERDICT),
            AnalysisOptions::new(),
        ),
        SampleOptions::new()
            .with_frame_count(2)
            .with_progress(progress.clone()),
    )
    .with_opener(MockOpener::new(Duration::from_secs(6)));

    detector
        .analyze_path(Path::new("clip.mp4"), &CancellationToken::new())
        .await
        .unwrap();

    let updates = progress.updates.lock().unwrap();
    assert_eq!(
        *updates,
        [
            (OperationType::FrameSampling, 1),
            (OperationType::FrameSampling, 2),
            (OperationType::FrameSampling, 2),
            (OperationType::RemoteAnalysis, 0),
            (OperationType::RemoteAnalysis, 1),
        ]
    );
}

#[tokio::test]
async fn failed_remote_call_is_not_reported_as_done() {
    let progress = Arc::new(RecordingProgress::default());
    let detector = Detector::new(
        AnalysisClient::new(FailingTransport, AnalysisOptions::new()),
        SampleOptions::new().with_progress(progress.clone()),
    )
    .with_opener(MockOpener::new(Duration::from_secs(6)));

    let frames = detector
        .sample(Path::new("clip.mp4"), &CancellationToken::new())
        .await
        .unwrap();
    progress.updates.lock().unwrap().clear();

    assert!(
        detector
            .analyze_frames(&frames, &CancellationToken::new())
            .await
            .is_err()
    );
    assert_eq!(
        *progress.updates.lock().unwrap(),
        [(OperationType::RemoteAnalysis, 0)]
    );
}
