//! JavaScript facade over a [`ProtocolSession`] persisted in `localStorage`.

use courier_engine::{ProtocolSession, StateChange};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::bridge::{
    self, FacadeError, SubmissionOutcome, answer_from_json, parse_checkpoint, parse_phase,
};
use crate::clock::BrowserClock;
use crate::storage::LocalStorageProgress;

impl From<FacadeError> for JsValue {
    fn from(err: FacadeError) -> Self {
        Self::from_str(&err.to_string())
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

#[wasm_bindgen]
pub struct CourierApp {
    session: ProtocolSession<LocalStorageProgress, BrowserClock>,
}

#[wasm_bindgen]
impl CourierApp {
    /// Open the session, optionally with a JSON configuration document.
    ///
    /// # Errors
    /// Rejects configuration that fails to parse or validate.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Self, JsValue> {
        let config = bridge::load_config(config_json.as_deref())?;
        let session = ProtocolSession::open(config, LocalStorageProgress, BrowserClock);
        Ok(Self { session })
    }

    /// # Errors
    /// Rejects phase numbers outside the catalog.
    #[wasm_bindgen(js_name = getPhaseState)]
    pub fn get_phase_state(&self, phase: u8) -> Result<String, JsValue> {
        let phase = parse_phase(phase)?;
        Ok(self.session.phase_state(phase).as_str().to_string())
    }

    /// `null` when the phase is still locked.
    ///
    /// # Errors
    /// Rejects phase numbers outside the catalog.
    #[wasm_bindgen(js_name = viewPhase)]
    pub fn view_phase(&self, phase: u8) -> Result<JsValue, JsValue> {
        let phase = parse_phase(phase)?;
        to_js(&self.session.view_phase(phase))
    }

    /// # Errors
    /// Fails when either field is blank or the session is already authenticated.
    pub fn authenticate(&mut self, operator: &str, session_key: &str) -> Result<JsValue, JsValue> {
        let verdict = self
            .session
            .authenticate(operator, session_key)
            .map_err(FacadeError::from)?;
        to_js(&SubmissionOutcome::new(
            courier_engine::CheckpointKey::Login,
            verdict,
        ))
    }

    /// `answer_json` is either a bare JSON string or a tagged answer object.
    ///
    /// # Errors
    /// Fails for unknown keys, malformed payloads, and submissions the
    /// checkpoint cannot take right now.
    #[wasm_bindgen(js_name = submitAnswer)]
    pub fn submit_answer(&mut self, key: &str, answer_json: &str) -> Result<JsValue, JsValue> {
        let key = parse_checkpoint(key)?;
        let answer = answer_from_json(answer_json)?;
        let verdict = self
            .session
            .submit_answer(key, &answer)
            .map_err(FacadeError::from)?;
        to_js(&SubmissionOutcome::new(key, verdict))
    }

    /// `null` once the ladder is exhausted or the checkpoint is closed.
    ///
    /// # Errors
    /// Rejects unknown checkpoint keys.
    #[wasm_bindgen(js_name = requestHint)]
    pub fn request_hint(&mut self, key: &str) -> Result<JsValue, JsValue> {
        let key = parse_checkpoint(key)?;
        to_js(&self.session.request_hint(key))
    }

    /// # Errors
    /// Fails only if the snapshot cannot be converted to a JS value.
    #[wasm_bindgen(js_name = getProgressSnapshot)]
    pub fn get_progress_snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.snapshot())
    }

    #[wasm_bindgen(js_name = resetProgress)]
    pub fn reset_progress(&mut self, credential: &str) -> bool {
        self.session.reset_progress(credential)
    }

    #[wasm_bindgen(js_name = isFrozen)]
    pub fn is_frozen(&self) -> bool {
        self.session.is_frozen()
    }

    /// Drive the once-per-second heartbeat; returns the changes it applied.
    ///
    /// # Errors
    /// Fails only on JS conversion.
    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.session.tick())
    }

    /// # Errors
    /// Fails only on JS conversion.
    #[wasm_bindgen(js_name = revealFrame)]
    pub fn reveal_frame(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.session.reveal_frame())
    }

    #[wasm_bindgen(js_name = trackingNumber)]
    pub fn tracking_number(&self) -> Option<String> {
        self.session.tracking_number().map(str::to_string)
    }

    /// # Errors
    /// Fails only on JS conversion.
    pub fn countdown(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.countdown())
    }

    /// # Errors
    /// Fails only on JS conversion.
    pub fn urgency(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.urgency())
    }

    /// # Errors
    /// Fails only on JS conversion.
    pub fn tools(&self) -> Result<JsValue, JsValue> {
        to_js(&bridge::tool_states(self.session.snapshot()))
    }

    /// Call `callback(changes, snapshot)` after every committed mutation.
    pub fn subscribe(&mut self, callback: js_sys::Function) {
        self.session.subscribe(Box::new(
            move |changes: &[StateChange], record: &courier_engine::ProgressRecord| {
                let args = to_js(changes).and_then(|changes| Ok((changes, to_js(record)?)));
                let result = args.and_then(|(changes, snapshot)| {
                    callback.call2(&JsValue::NULL, &changes, &snapshot)
                });
                if let Err(err) = result {
                    log::warn!(
                        "state change subscriber failed: {}",
                        crate::dom::js_error_message(&err)
                    );
                }
            },
        ));
    }
}
