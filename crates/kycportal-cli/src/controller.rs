//! Submission controller: drives the intake session for one operator.
//!
//! Owns the session state, turns acquisition results into session events,
//! performs the effects the state machine asks for, and issues the create
//! request. In scan mode the request runs as a spawned task so camera events
//! keep flowing; while it is in flight the session is `Submitting` and those
//! events are dropped.
//!
//! The camera reports a code on every frame it stays in view. The controller
//! remembers the last code it handled and ignores it until a different code
//! shows up, the view clears, or the mode changes.

use crate::decoder::decode_symbol;
use crate::image_source::{DecodeSurface, read_upload};
use crate::notify::Notifier;
use crate::qr_reader::{CameraEvent, DetectedSymbol};
use kycportal_api::{ApiError, CREATE_FAILED_MESSAGE, KycBackend};
use kycportal_core::{
    CreatedRequest, Effect, Payload, PipelineError, SessionEvent, SessionState, parse_payload,
    transition,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Acquisition mode; exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionMode {
    #[default]
    Upload,
    Scan,
}

impl AcquisitionMode {
    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionMode::Upload => "Upload File",
            AcquisitionMode::Scan => "Use Camera",
        }
    }
}

pub struct SubmissionController<N: Notifier> {
    backend: Arc<dyn KycBackend>,
    notifier: N,
    state: SessionState,
    mode: AcquisitionMode,
    surface: DecodeSurface,
    selected_file: Option<PathBuf>,
    last_scanned: Option<String>,
}

impl<N: Notifier> SubmissionController<N> {
    pub fn new(backend: Arc<dyn KycBackend>, notifier: N) -> Self {
        Self {
            backend,
            notifier,
            state: SessionState::Idle,
            mode: AcquisitionMode::default(),
            surface: DecodeSurface::new(),
            selected_file: None,
            last_scanned: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn selected_file(&self) -> Option<&Path> {
        self.selected_file.as_deref()
    }

    pub fn set_mode(&mut self, mode: AcquisitionMode) {
        if self.mode != mode {
            tracing::debug!("Acquisition mode: {}", mode.label());
            self.mode = mode;
            self.last_scanned = None;
        }
    }

    /// Apply one event and run its effects. Returns the payload to submit,
    /// if the transition asked for one.
    fn apply(&mut self, event: SessionEvent) -> Option<Payload> {
        let next = transition(&self.state, event);
        if next.state != self.state {
            tracing::debug!("Session {} -> {}", self.state.label(), next.state.label());
        }
        self.state = next.state;

        let mut submit = None;
        for effect in next.effects {
            match effect {
                Effect::Submit(payload) => submit = Some(payload),
                Effect::Notify(notification) => self.notifier.notify(&notification),
                Effect::ClearSelection => {
                    self.selected_file = None;
                    self.surface.clear();
                }
            }
        }
        submit
    }

    fn reject(&mut self, err: PipelineError) {
        tracing::debug!("{}: {}", err.category(), err);
        self.apply(SessionEvent::InputRejected(err));
    }

    /// Validate decoded text and, if the session is idle, start a submission.
    fn accept_text(&mut self, text: &str) -> Option<Payload> {
        match parse_payload(text) {
            Ok(payload) => self.apply(SessionEvent::PayloadAccepted(payload)),
            Err(PipelineError::InvalidPayload(reason)) if self.mode == AcquisitionMode::Scan => {
                self.reject(PipelineError::InvalidScan(reason));
                None
            }
            Err(err) => {
                self.reject(err);
                None
            }
        }
    }

    /// Upload mode: decode one image file and submit its payload.
    pub async fn upload(&mut self, path: &Path) -> &SessionState {
        self.set_mode(AcquisitionMode::Upload);
        if !self.state.accepts_input() {
            tracing::debug!("Ignoring upload while {}", self.state.label());
            return &self.state;
        }
        self.selected_file = Some(path.to_path_buf());

        if let Some(payload) = self.decode_upload(path).await {
            self.submit(payload).await;
        }
        &self.state
    }

    async fn decode_upload(&mut self, path: &Path) -> Option<Payload> {
        let bytes = match read_upload(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.reject(err);
                return None;
            }
        };

        let decoded = self.surface.draw(&bytes).and_then(decode_symbol);
        self.surface.clear();
        match decoded {
            Ok(text) => self.accept_text(&text),
            Err(err) => {
                self.reject(err);
                None
            }
        }
    }

    /// Issue the create request and wait for it.
    pub async fn submit(&mut self, payload: Payload) -> &SessionState {
        let result = self.backend.create_request(&payload).await;
        self.finish(result);
        &self.state
    }

    /// Feed a create result back into the session.
    pub fn finish(&mut self, result: Result<CreatedRequest, ApiError>) {
        let event = match result {
            Ok(created) => SessionEvent::SubmissionSucceeded {
                request_id: created.request_id,
            },
            Err(e) => {
                tracing::warn!("Create request failed: {}", e);
                SessionEvent::SubmissionFailed(e.user_message(CREATE_FAILED_MESSAGE))
            }
        };
        self.apply(event);
    }

    /// Scan mode: handle one detection batch. Only the first symbol is used.
    ///
    /// Returns the payload to submit when the batch wins the transition to
    /// `Submitting`; batches arriving while busy are dropped, and so is the
    /// code handled last.
    pub fn on_detection(&mut self, batch: &[DetectedSymbol]) -> Option<Payload> {
        if self.mode != AcquisitionMode::Scan {
            return None;
        }
        let first = batch.first()?;
        if !self.state.accepts_input() {
            return None;
        }
        if self.last_scanned.as_deref() == Some(first.raw_value.as_str()) {
            tracing::trace!("Ignoring code already handled");
            return None;
        }
        self.last_scanned = Some(first.raw_value.clone());
        self.accept_text(&first.raw_value)
    }

    /// The camera no longer sees a code; the next one is handled even if it
    /// repeats the last.
    pub fn on_view_cleared(&mut self) {
        self.last_scanned = None;
    }

    pub fn on_camera_error(&mut self, message: String) {
        self.reject(PipelineError::Camera(message));
    }

    /// "Create another": clear the outcome and input artifacts.
    pub fn create_another(&mut self) {
        self.apply(SessionEvent::CreateAnother);
    }

    /// Run the scan pipeline over a stream of camera events.
    ///
    /// Returns after the first successful creation, or, with `continuous`,
    /// resets and keeps going until the event stream closes.
    pub async fn run_scan(
        &mut self,
        mut events: UnboundedReceiver<CameraEvent>,
        continuous: bool,
    ) -> &SessionState {
        self.set_mode(AcquisitionMode::Scan);
        let mut in_flight: Option<JoinHandle<Result<CreatedRequest, ApiError>>> = None;
        let mut events_open = true;

        loop {
            if !events_open && in_flight.is_none() {
                break;
            }

            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(CameraEvent::Detected(batch)) => {
                        if let Some(payload) = self.on_detection(&batch) {
                            let backend = Arc::clone(&self.backend);
                            in_flight = Some(tokio::spawn(async move {
                                backend.create_request(&payload).await
                            }));
                        }
                    }
                    Some(CameraEvent::Cleared) => self.on_view_cleared(),
                    Some(CameraEvent::Error(message)) => self.on_camera_error(message),
                    None => {
                        tracing::debug!("Camera event stream closed");
                        events_open = false;
                    }
                },
                joined = async {
                    match in_flight.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if in_flight.is_some() => {
                    in_flight = None;
                    match joined {
                        Ok(result) => self.finish(result),
                        Err(e) => {
                            tracing::error!("Submission task failed: {}", e);
                            self.apply(SessionEvent::SubmissionFailed(e.to_string()));
                        }
                    }
                    if self.state.outcome().is_some() {
                        if !continuous {
                            break;
                        }
                        self.create_another();
                    }
                }
            }
        }

        &self.state
    }
}
