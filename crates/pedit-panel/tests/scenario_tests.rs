use std::sync::Arc;
use std::time::Duration;

use pedit_core::{ParameterAddress, ParameterValue};
use pedit_panel::{
    EditorConfig, EditorEvent, EditorSession, EditorView, InputType, JsonFileStore, MemoryStore,
    PersistedState, SelectionPhase, ServiceCallTransport, ServiceCaller, SettingsAction,
    SettingsRecord, TransportError,
};
use pedit_test_utils::{camera_snapshot, session_with, RecordingTransport};
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use tokio::time::{sleep, timeout};

#[derive(Default)]
struct ServiceLog {
    calls: Mutex<Vec<(String, JsonValue)>>,
}

#[async_trait::async_trait]
impl ServiceCaller for ServiceLog {
    async fn call_service(
        &self,
        service: &str,
        request: JsonValue,
    ) -> Result<JsonValue, TransportError> {
        self.calls.lock().push((service.to_string(), request));
        Ok(json!({"results": [{"successful": true}]}))
    }
}

#[tokio::test(start_paused = true)]
async fn test_camera_gain_edit_ends_in_one_service_call() {
    let transport = Arc::new(ServiceCallTransport::new(ServiceLog::default()));
    let mut session = EditorSession::new(
        &EditorConfig::default(),
        transport.clone(),
        Arc::new(MemoryStore::new()),
    );

    session
        .handle(EditorEvent::Snapshot(camera_snapshot()))
        .await
        .unwrap();
    session
        .handle(EditorEvent::SelectNode("camera".into()))
        .await
        .unwrap();
    assert_eq!(session.machine().available_parameters(), &["exposure", "gain", "mode"]);

    session
        .handle(EditorEvent::SelectParameter("gain".into()))
        .await
        .unwrap();
    for text in ["3", "3.", "3.7"] {
        let _ = session.handle(EditorEvent::Edit(text.into())).await;
    }
    sleep(Duration::from_millis(300)).await;

    let calls = transport.caller().calls.lock().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "camera/set_parameters");
    assert_eq!(
        calls[0].1,
        json!({"parameters": [{"name": "gain", "value": {"type": 3, "double_value": 3.7}}]})
    );
    assert_eq!(
        session.machine().displayed_value(),
        Some(&ParameterValue::Double(3.7))
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_dispatches_and_saves() {
    let transport = RecordingTransport::new();
    let (session, store) = session_with(transport.clone());
    let (events, task) = session.spawn(16);

    events.send(EditorEvent::Snapshot(camera_snapshot())).await.unwrap();
    events
        .send(EditorEvent::Action(SettingsAction::update(
            ["dataSource", "selectedNode"],
            json!("camera"),
        )))
        .await
        .unwrap();
    events
        .send(EditorEvent::Action(SettingsAction::update(
            ["dataSource", "selectedParameterName"],
            json!("exposure"),
        )))
        .await
        .unwrap();
    events.send(EditorEvent::Edit("150".into())).await.unwrap();
    sleep(Duration::from_millis(200)).await;
    events.send(EditorEvent::Shutdown).await.unwrap();
    task.await.unwrap();

    assert_eq!(
        transport.sent_to(&ParameterAddress::new("camera", "exposure")),
        vec![ParameterValue::Integer(150)]
    );
    let saved = store.snapshot().unwrap();
    assert_eq!(saved.settings.selected_parameter_name.as_deref(), Some("exposure"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_dispatch_keeps_optimistic_value() {
    let transport = RecordingTransport::failing(TransportError::Rejected {
        reason: "read only".into(),
    });
    let (mut session, _store) = session_with(transport.clone());

    session.handle(EditorEvent::Snapshot(camera_snapshot())).await.unwrap();
    session.handle(EditorEvent::SelectNode("camera".into())).await.unwrap();
    session
        .handle(EditorEvent::SelectParameter("gain".into()))
        .await
        .unwrap();
    session.handle(EditorEvent::Edit("9.5".into())).await.unwrap();
    session.handle(EditorEvent::Flush).await.unwrap();

    assert_eq!(transport.sent().len(), 1);
    assert!(session.machine().pending().is_some());
    assert_eq!(
        session.machine().displayed_value(),
        Some(&ParameterValue::Double(9.5))
    );
    assert_eq!(
        session.machine().registry().find("camera", "gain").map(|d| &d.value),
        Some(&ParameterValue::Double(2.5))
    );
}

#[tokio::test(start_paused = true)]
async fn test_vanished_parameter_regresses_view() {
    let (mut session, _store) = session_with(RecordingTransport::new());
    session.handle(EditorEvent::Snapshot(camera_snapshot())).await.unwrap();
    session.handle(EditorEvent::SelectNode("camera".into())).await.unwrap();
    session
        .handle(EditorEvent::SelectParameter("mode".into()))
        .await
        .unwrap();
    assert!(matches!(session.view(), EditorView::Invalid { .. }));

    session
        .handle(EditorEvent::Snapshot(pedit_core::Snapshot::default().with(
            "camera.gain",
            json!(1.0),
        )))
        .await
        .unwrap();
    assert_eq!(session.machine().phase(), SelectionPhase::NodeSelectedNoParameter);
    assert_eq!(session.machine().state().selected_node, "camera");
    assert_eq!(session.view(), EditorView::SelectParameterPrompt);
}

#[tokio::test(start_paused = true)]
async fn test_selection_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("editor.json");

    {
        let store = Arc::new(JsonFileStore::new(&path));
        let mut session =
            EditorSession::new(&EditorConfig::default(), RecordingTransport::new(), store);
        session.handle(EditorEvent::Snapshot(camera_snapshot())).await.unwrap();
        session.handle(EditorEvent::SelectNode("camera".into())).await.unwrap();
        session
            .handle(EditorEvent::SelectParameter("gain".into()))
            .await
            .unwrap();
    }

    let store = Arc::new(JsonFileStore::new(&path));
    let mut session =
        EditorSession::new(&EditorConfig::default(), RecordingTransport::new(), store);
    assert_eq!(session.machine().phase(), SelectionPhase::NodeSelectedNoParameter);
    session.handle(EditorEvent::Snapshot(camera_snapshot())).await.unwrap();
    assert_eq!(session.machine().phase(), SelectionPhase::ParameterSelected);
    assert_eq!(session.machine().state().selected_parameter_name, "gain");
}

#[tokio::test(start_paused = true)]
async fn test_flush_after_many_dispatches_without_run_loop() {
    let transport = RecordingTransport::new();
    let (mut session, _store) = session_with(transport.clone());
    session.handle(EditorEvent::Snapshot(camera_snapshot())).await.unwrap();
    session.handle(EditorEvent::SelectNode("camera".into())).await.unwrap();
    session
        .handle(EditorEvent::SelectParameter("exposure".into()))
        .await
        .unwrap();

    let capacity = EditorConfig::default().outcome_channel_capacity;
    for n in 0..capacity + 6 {
        session.handle(EditorEvent::Edit(n.to_string())).await.unwrap();
        sleep(Duration::from_millis(200)).await;
    }
    session.handle(EditorEvent::Edit("7".into())).await.unwrap();
    timeout(Duration::from_secs(10), session.handle(EditorEvent::Flush))
        .await
        .expect("flush completes")
        .unwrap();

    assert_eq!(transport.sent().len(), capacity + 7);
    assert_eq!(
        transport.sent_to(&ParameterAddress::new("camera", "exposure")).last(),
        Some(&ParameterValue::Integer(7))
    );
    assert!(session.machine().pending().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_restored_parameter_saved_before_first_snapshot() {
    let store = Arc::new(MemoryStore::with_state(PersistedState {
        settings: SettingsRecord {
            selected_node: Some("camera".into()),
            selected_parameter_name: Some("gain".into()),
            ..SettingsRecord::default()
        },
    }));
    let mut session =
        EditorSession::new(&EditorConfig::default(), RecordingTransport::new(), store.clone());

    session
        .handle(EditorEvent::SetInputType(InputType::Slider))
        .await
        .unwrap();
    let saved = store.snapshot().unwrap();
    assert_eq!(saved.settings.selected_node.as_deref(), Some("camera"));
    assert_eq!(saved.settings.selected_parameter_name.as_deref(), Some("gain"));
    assert_eq!(saved.settings.input_type, Some(InputType::Slider));

    session.handle(EditorEvent::Snapshot(camera_snapshot())).await.unwrap();
    assert_eq!(session.machine().state().selected_parameter_name, "gain");
}
