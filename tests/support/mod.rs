//! Scripted engine and recording sinks shared by the integration suites.

#![allow(dead_code)]

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wallet_bridge::{
    EngineError, Envelope, EventSink, InteractiveEngine, Mnemonics, Passphrase, Stage, TransactionRequest,
    WalletEngine, WorkflowCallback,
};

pub const SALT: &str = "3f9a1c7e5b2d8f4a6c0e9b1d7f3a5c8e";

/// One engine entry point call, with the callback the engine was handed
#[derive(Clone)]
pub struct Dispatched {
    pub op: &'static str,
    pub user_id: String,
    pub detail: Value,
    pub callback: Arc<dyn WorkflowCallback>,
}

/// Records dispatches instead of doing wallet work. Tests drive the
/// recorded callbacks to play the engine's part.
#[derive(Default)]
pub struct ScriptedEngine {
    dispatched: Mutex<Vec<Dispatched>>,
    users: Mutex<HashMap<String, Value>>,
    refuse_next: Mutex<Option<EngineError>>,
    initialized: Mutex<Option<(String, Value)>>,
    biometric: Mutex<HashMap<String, bool>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_user(self: Arc<Self>, user_id: &str, record: Value) -> Arc<Self> {
        self.users.lock().unwrap().insert(user_id.to_string(), record);
        self
    }

    pub fn with_biometric(self: Arc<Self>, user_id: &str, enabled: bool) -> Arc<Self> {
        self.biometric.lock().unwrap().insert(user_id.to_string(), enabled);
        self
    }

    /// The next entry point call fails to start with this error
    pub fn refuse_next(&self, err: EngineError) {
        *self.refuse_next.lock().unwrap() = Some(err);
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.dispatched.lock().unwrap().iter().map(|d| d.op).collect()
    }

    pub fn last(&self) -> Dispatched {
        self.dispatched.lock().unwrap().last().cloned().expect("nothing dispatched")
    }

    pub fn initialized(&self) -> Option<(String, Value)> {
        self.initialized.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, user_id: &str, detail: Value, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        if let Some(err) = self.refuse_next.lock().unwrap().take() {
            return Err(err.into());
        }
        self.dispatched.lock().unwrap().push(Dispatched { op, user_id: user_id.to_string(), detail, callback });
        Ok(())
    }
}

impl WalletEngine for ScriptedEngine {
    fn initialize(&self, base_url: &str, config: Value) -> Result<()> {
        if base_url.is_empty() {
            return Err(EngineError::new("INVALID_API_END_POINT", "base url is empty").into());
        }
        *self.initialized.lock().unwrap() = Some((base_url.to_string(), config));
        Ok(())
    }

    fn get_user(&self, user_id: &str) -> Result<Option<Value>> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    fn get_token(&self, token_id: &str) -> Result<Option<Value>> {
        if token_id == "broken" {
            anyhow::bail!("token store unreadable");
        }
        Ok(Some(json!({"id": token_id, "symbol": "STT", "decimals": 18})))
    }

    fn get_current_device(&self, user_id: &str) -> Result<Option<Value>> {
        Ok(self.users.lock().unwrap().get(user_id).map(|_| json!({"user_id": user_id, "status": "AUTHORIZED"})))
    }

    fn get_active_sessions(&self, user_id: &str, min_spending_limit: &str) -> Result<Vec<Value>> {
        Ok(vec![
            json!({"user_id": user_id, "spending_limit": "1000", "min": min_spending_limit}),
            json!({"user_id": user_id, "spending_limit": "5000", "min": min_spending_limit}),
        ])
    }

    fn is_biometric_enabled(&self, user_id: &str) -> bool {
        self.biometric.lock().unwrap().get(user_id).copied().unwrap_or(false)
    }

    fn add_device_qr_code(&self, user_id: &str) -> Result<Vec<u8>> {
        if user_id == "no-device" {
            return Err(EngineError::new("DEVICE_NOT_SETUP", "device is not set up").with_internal_id("e_qr_1").into());
        }
        Ok(b"\x89PNG\r\n".to_vec())
    }

    fn setup_device(&self, user_id: &str, token_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("setup_device", user_id, json!({"token_id": token_id}), callback)
    }

    fn activate_user(
        &self,
        passphrase: Passphrase,
        expires_after_secs: u64,
        spending_limit: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()> {
        let detail = json!({"expiry": expires_after_secs, "spending_limit": spending_limit, "secret_len": passphrase.secret().len()});
        self.record("activate_user", passphrase.user_id(), detail, callback)
    }

    fn add_session(
        &self,
        user_id: &str,
        spending_limit: &str,
        expires_after_secs: u64,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()> {
        self.record("add_session", user_id, json!({"expiry": expires_after_secs, "spending_limit": spending_limit}), callback)
    }

    fn execute_transaction(&self, request: TransactionRequest, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        let detail = json!({
            "addresses": request.token_holder_addresses,
            "amounts": request.amounts,
            "rule": request.rule_name,
            "meta": request.meta,
            "options": request.options,
        });
        self.record("execute_transaction", &request.user_id, detail, callback)
    }

    fn get_device_mnemonics(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("get_device_mnemonics", user_id, Value::Null, callback)
    }

    fn authorize_current_device_with_mnemonics(
        &self,
        user_id: &str,
        mnemonics: Mnemonics,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()> {
        let words = String::from_utf8_lossy(mnemonics.as_bytes()).split_whitespace().count();
        self.record("authorize_current_device_with_mnemonics", user_id, json!({"words": words}), callback)
    }

    fn perform_qr_action(&self, user_id: &str, payload: Value, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("perform_qr_action", user_id, payload, callback)
    }

    fn reset_pin(&self, user_id: &str, current: Passphrase, new: Passphrase, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        let detail = json!({"changed": current.secret() != new.secret()});
        self.record("reset_pin", user_id, detail, callback)
    }

    fn revoke_device(&self, user_id: &str, device_address: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("revoke_device", user_id, json!({"address": device_address}), callback)
    }

    fn initiate_device_recovery(
        &self,
        user_id: &str,
        _passphrase: Passphrase,
        device_address: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()> {
        self.record("initiate_device_recovery", user_id, json!({"address": device_address}), callback)
    }

    fn abort_device_recovery(&self, user_id: &str, _passphrase: Passphrase, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("abort_device_recovery", user_id, Value::Null, callback)
    }

    fn update_biometric_preference(&self, user_id: &str, enabled: bool, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("update_biometric_preference", user_id, json!({"enabled": enabled}), callback)
    }

    fn logout_all_sessions(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("logout_all_sessions", user_id, Value::Null, callback)
    }
}

impl InteractiveEngine for ScriptedEngine {
    fn activate_user(
        &self,
        user_id: &str,
        expires_after_secs: u64,
        spending_limit: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()> {
        self.record("ui_activate_user", user_id, json!({"expiry": expires_after_secs, "spending_limit": spending_limit}), callback)
    }

    fn add_session(
        &self,
        user_id: &str,
        expires_after_secs: u64,
        spending_limit: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()> {
        self.record("ui_add_session", user_id, json!({"expiry": expires_after_secs, "spending_limit": spending_limit}), callback)
    }

    fn reset_pin(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_reset_pin", user_id, Value::Null, callback)
    }

    fn revoke_device(&self, user_id: &str, device_address: Option<&str>, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_revoke_device", user_id, json!({"address": device_address}), callback)
    }

    fn initiate_device_recovery(
        &self,
        user_id: &str,
        device_address: Option<&str>,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()> {
        self.record("ui_initiate_device_recovery", user_id, json!({"address": device_address}), callback)
    }

    fn abort_device_recovery(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_abort_device_recovery", user_id, Value::Null, callback)
    }

    fn update_biometric_preference(&self, user_id: &str, enabled: bool, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_update_biometric_preference", user_id, json!({"enabled": enabled}), callback)
    }

    fn get_device_mnemonics(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_get_device_mnemonics", user_id, Value::Null, callback)
    }

    fn authorize_current_device_with_mnemonics(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_authorize_current_device_with_mnemonics", user_id, Value::Null, callback)
    }

    fn show_device_qr(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_show_device_qr", user_id, Value::Null, callback)
    }

    fn authorize_device_with_qr(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_authorize_device_with_qr", user_id, Value::Null, callback)
    }

    fn execute_transaction_via_qr(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()> {
        self.record("ui_execute_transaction_via_qr", user_id, Value::Null, callback)
    }
}

/// Sink that keeps every envelope it is given
#[derive(Default)]
pub struct Recorder(Mutex<Vec<Envelope>>);

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.0.lock().unwrap().clone()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.0.lock().unwrap().iter().map(Envelope::stage).collect()
    }

    pub fn only(&self) -> Envelope {
        let all = self.envelopes();
        assert_eq!(all.len(), 1, "expected exactly one envelope, got {:?}", all);
        all[0].clone()
    }
}

impl EventSink for Recorder {
    fn deliver(&self, envelope: &Envelope) {
        self.0.lock().unwrap().push(envelope.clone());
    }
}

pub fn as_sink<T: EventSink + 'static>(sink: &Arc<T>) -> Arc<dyn EventSink> {
    sink.clone()
}
