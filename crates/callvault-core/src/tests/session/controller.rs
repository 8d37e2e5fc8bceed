use crate::{
    CallRecorder, Capability, RecorderError, RecordingDirectory, SessionState,
    tests::support::{FakeBackend, FakeGate, FakeRoute, temp_dir},
};

use std::sync::atomic::Ordering;

fn recorder_in(
    dir: &std::path::Path,
    backend: FakeBackend,
    gate: FakeGate,
    route: FakeRoute,
) -> CallRecorder<FakeBackend, FakeGate, FakeRoute> {
    CallRecorder::new(backend, gate, route, RecordingDirectory::new(dir))
}

/// WHAT: A second beginSession while one is active returns AlreadyRecording
/// WHY: The controller enforces single-session exclusivity
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_active_session_when_beginning_again_then_already_recording() {
    // Given: A recorder with a session in Recording state
    let dir = temp_dir("exclusive");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );
    let first = recorder.begin_session("555-1234").await.unwrap();

    // When: Starting a second session
    let second = recorder.begin_session("555-9999").await;

    // Then: AlreadyRecording, and the first session is untouched
    assert!(matches!(second, Err(RecorderError::AlreadyRecording { .. })));
    assert_eq!(recorder.state(), SessionState::Recording);

    recorder.on_call_ended();
    let record = recorder.finalize().unwrap();
    assert_eq!(record.phone_number, "555-1234");
    let _ = first;
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: Denied microphone permission fails the session with the capability
/// WHY: Permission errors must surface for user-facing messaging
#[tokio::test]
async fn given_denied_microphone_when_beginning_then_permission_denied_and_idle() {
    // Given: A gate denying the microphone
    let dir = temp_dir("denied");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::denying(Capability::Microphone),
        FakeRoute::healthy(),
    );

    // When: Beginning a session
    let result = recorder.begin_session("555-1234").await;

    // Then: PermissionDenied carrying the microphone capability, state Idle
    assert!(matches!(
        result,
        Err(RecorderError::PermissionDenied {
            capability: Capability::Microphone,
            ..
        })
    ));
    assert_eq!(recorder.state(), SessionState::Idle);
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: A zero-frame recording finalizes as RecordingEmptyOrMissing
/// WHY: Empty captures must leave no catalog entry and no dangling file
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_silent_capture_when_finalizing_then_empty_error_and_no_residue() {
    // Given: A backend whose handle wrote zero frames
    let dir = temp_dir("silent");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::silent(),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );
    recorder.begin_session("555-1234").await.unwrap();

    // When: The call ends and the session is finalized
    assert!(recorder.on_call_ended());
    let result = recorder.finalize();

    // Then: RecordingEmptyOrMissing, Idle, empty catalog, empty directory
    assert!(matches!(
        result,
        Err(RecorderError::RecordingEmptyOrMissing { .. })
    ));
    assert_eq!(recorder.state(), SessionState::Idle);
    assert!(recorder.catalog().is_empty());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: Abort from Recording returns to Idle with no open handle
/// WHY: The capture handle must be released on every exit path
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_session_when_aborting_then_idle_and_handle_released() {
    // Given: A recording session with one open handle
    let dir = temp_dir("abort");
    let backend = FakeBackend::healthy(64);
    let open_handles = backend.open_handles.clone();
    let mut recorder = recorder_in(&dir, backend, FakeGate::all_granted(), FakeRoute::healthy());
    recorder.begin_session("555-1234").await.unwrap();
    assert_eq!(open_handles.load(Ordering::SeqCst), 1);

    // When: Aborting (e.g. the dial itself failed)
    recorder.abort();

    // Then: Idle, handle released, partial file removed
    assert_eq!(recorder.state(), SessionState::Idle);
    assert_eq!(open_handles.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: Abort with no session is a harmless no-op
/// WHY: Abort never fails outwardly
#[tokio::test]
async fn given_idle_recorder_when_aborting_then_still_idle() {
    let dir = temp_dir("abort-idle");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );

    recorder.abort();

    assert_eq!(recorder.state(), SessionState::Idle);
}

/// WHAT: Finalized record agrees with the record re-parsed from disk
/// WHY: Filename encoding and parsing must round-trip
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_finalized_recording_when_listing_then_records_agree() {
    // Given: A completed session
    let dir = temp_dir("roundtrip");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(128),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );
    recorder.begin_session("555-1234").await.unwrap();
    recorder.on_call_ended();
    let finalized = recorder.finalize().unwrap();

    // When: Re-enumerating the directory
    let listed = recorder.directory().list_existing().unwrap();

    // Then: One record, field-for-field equal to the finalized one
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, finalized.file_name);
    assert_eq!(listed[0].timestamp, finalized.timestamp);
    assert_eq!(listed[0].phone_number, finalized.phone_number);
    assert_eq!(finalized.phone_number, "555-1234");
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: A number with no filename-safe characters still round-trips
/// WHY: Finalized and re-parsed records must agree for every dialed input
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unsanitizable_number_when_finalizing_then_listing_agrees() {
    // Given: A completed session dialed with only stripped characters
    let dir = temp_dir("unknown-number");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );
    recorder.begin_session("()").await.unwrap();
    recorder.on_call_ended();
    let finalized = recorder.finalize().unwrap();

    // When: Re-enumerating the directory
    let listed = recorder.directory().list_existing().unwrap();

    // Then: The placeholder number survives the filename codec
    assert_eq!(finalized.phone_number, "unknown");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].phone_number, finalized.phone_number);
    assert_eq!(listed[0].file_name, finalized.file_name);
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: seedCatalog loads pre-existing recordings into the catalog
/// WHY: The history surface must survive a process restart
#[test]
#[allow(clippy::unwrap_used)]
fn given_prepopulated_directory_when_seeding_then_catalog_loaded() {
    // Given: A directory with two recordings and one foreign file
    let dir = temp_dir("seed");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("2024-01-01T00-00-00-000Z_5551234.m4a"), b"x").unwrap();
    std::fs::write(dir.join("2024-01-02T00-00-00-000Z_5559999.m4a"), b"x").unwrap();
    std::fs::write(dir.join("notes.txt"), b"x").unwrap();

    // When: Seeding a fresh recorder
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );
    let count = recorder.seed_catalog().unwrap();

    // Then: Both recordings are cataloged, oldest first
    assert_eq!(count, 2);
    assert_eq!(recorder.catalog().len(), 2);
    assert_eq!(recorder.catalog().records()[0].phone_number, "5551234");
    assert_eq!(recorder.catalog().records()[1].phone_number, "5559999");
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: A failing routing hook does not prevent recording
/// WHY: Call-capture routing is a best-effort hardware hint
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_failing_route_when_beginning_then_session_still_starts() {
    let dir = temp_dir("route-fail");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::all_granted(),
        FakeRoute::failing(),
    );

    let result = recorder.begin_session("555-1234").await;

    assert!(result.is_ok());
    assert_eq!(recorder.state(), SessionState::Recording);
    recorder.abort();
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: Finalize restores the default audio route
/// WHY: Capture mode must not outlive the session
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_session_when_finalizing_then_routing_restored() {
    let dir = temp_dir("route-restore");
    let route = FakeRoute::healthy();
    let exited = route.exited.clone();
    let mut recorder = recorder_in(&dir, FakeBackend::healthy(64), FakeGate::all_granted(), route);

    recorder.begin_session("555-1234").await.unwrap();
    recorder.on_call_ended();
    recorder.finalize().unwrap();

    assert_eq!(exited.load(Ordering::SeqCst), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: A failed handle open surfaces RecordingStartFailed and restores Idle
/// WHY: Preparation failures must not leak a half-built session
#[tokio::test]
async fn given_unopenable_backend_when_beginning_then_start_failed_and_idle() {
    let dir = temp_dir("open-fail");
    let mut backend = FakeBackend::healthy(64);
    backend.fail_open = true;
    let mut recorder = recorder_in(&dir, backend, FakeGate::all_granted(), FakeRoute::healthy());

    let result = recorder.begin_session("555-1234").await;

    assert!(matches!(
        result,
        Err(RecorderError::RecordingStartFailed { .. })
    ));
    assert_eq!(recorder.state(), SessionState::Idle);
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: The call-ended signal is ignored outside Recording
/// WHY: A foreground transition with no call in flight must be harmless
#[tokio::test]
async fn given_idle_recorder_when_call_ended_then_signal_ignored() {
    let dir = temp_dir("signal-idle");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );

    assert!(!recorder.on_call_ended());
    assert_eq!(recorder.state(), SessionState::Idle);
}

/// WHAT: Permissions are re-queried on every beginSession
/// WHY: The user may change grants in system settings between calls
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_two_sessions_when_beginning_each_then_gate_queried_each_time() {
    let dir = temp_dir("requery");
    let gate = FakeGate::all_granted();
    let calls = gate.calls.clone();
    let mut recorder = recorder_in(&dir, FakeBackend::healthy(64), gate, FakeRoute::healthy());

    recorder.begin_session("555-0001").await.unwrap();
    recorder.abort();
    recorder.begin_session("555-0002").await.unwrap();
    recorder.abort();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let _ = std::fs::remove_dir_all(&dir);
}

/// WHAT: deleteRecording removes the file and the catalog entry together
/// WHY: A record's uri must never dangle
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_cataloged_recording_when_deleting_then_file_and_entry_gone() {
    let dir = temp_dir("delete");
    let mut recorder = recorder_in(
        &dir,
        FakeBackend::healthy(64),
        FakeGate::all_granted(),
        FakeRoute::healthy(),
    );
    recorder.begin_session("555-1234").await.unwrap();
    recorder.on_call_ended();
    let record = recorder.finalize().unwrap();
    assert_eq!(recorder.catalog().len(), 1);

    recorder.delete_recording(&record.uri).unwrap();

    assert!(recorder.catalog().is_empty());
    assert!(!std::path::Path::new(&record.uri).exists());

    // Deleting again reports NotFound
    let again = recorder.delete_recording(&record.uri);
    assert!(matches!(again, Err(RecorderError::NotFound { .. })));
    let _ = std::fs::remove_dir_all(&dir);
}
