//! Entry surface: one method per engine capability.
//!
//! Workflow methods take host primitives plus the caller's correlation id,
//! validate them, and either dispatch into the engine or interrupt with a
//! site-specific error. They return as soon as the engine accepted the
//! call; every outcome arrives on the host sink as an [`Envelope`].
//!
//! | Method | Kind | Local checks |
//! |--------|------|--------------|
//! | `setup_device` | `SETUP_DEVICE` | user id |
//! | `activate_user` | `ACTIVATE_USER` | passphrase, expiry |
//! | `add_session` | `ADD_SESSION` | user id, expiry |
//! | `execute_transaction` | `EXECUTE_TRANSACTION` | user id, address list, amount list, meta, options |
//! | `get_device_mnemonics` | `GET_DEVICE_MNEMONICS` | user id |
//! | `authorize_current_device_with_mnemonics` | `AUTHORIZE_DEVICE_WITH_MNEMONICS` | user id, mnemonics |
//! | `perform_qr_action` | `PERFORM_QR_ACTION` | user id, JSON payload |
//! | `reset_pin` | `RESET_PIN` | both passphrases |
//! | `revoke_device` | `REVOKE_DEVICE` | user id |
//! | `initiate_device_recovery` | `INITIATE_DEVICE_RECOVERY` | passphrase |
//! | `abort_device_recovery` | `ABORT_DEVICE_RECOVERY` | passphrase |
//! | `update_biometric_preference` | `UPDATE_BIOMETRIC_PREFERENCE` | user id |
//! | `logout_all_sessions` | `LOGOUT_ALL_SESSIONS` | user id |
//!
//! Lookups (`get_user`, `get_token`, ...) answer synchronously.
//! Interactive workflows live on [`InteractiveBridge`].
//!
//! [`Envelope`]: crate::callback::Envelope

mod args;
mod interactive;
mod launch;

pub use interactive::InteractiveBridge;

use crate::callback::DirectCallback;
use crate::config::BridgeConfig;
use crate::core::sites::sdk;
use crate::core::value::{decode, encode, HostValue};
use crate::core::{OperationContext, OperationKind};
use crate::engine::{InteractiveEngine, TransactionRequest, WalletEngine};
use crate::errors::{BridgeError, ErrorPayload};
use crate::registry::CorrelationRegistry;
use crate::sink::EventSink;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use launch::{guarded, launch, Dispatcher};
use serde_json::Value;
use std::sync::Arc;

const WAIT_FOR_FINALIZATION: &str = "wait_for_finalization";

pub struct Bridge {
    engine: Arc<dyn WalletEngine>,
    host: Arc<dyn EventSink>,
    registry: Arc<CorrelationRegistry>,
    config: BridgeConfig,
}

impl Bridge {
    /// Bridge on the process-wide registry, initializing it if needed
    pub fn new(engine: Arc<dyn WalletEngine>, host: Arc<dyn EventSink>) -> Self {
        Self::with_registry(engine, host, CorrelationRegistry::init_global())
    }

    pub fn with_registry(
        engine: Arc<dyn WalletEngine>,
        host: Arc<dyn EventSink>,
        registry: Arc<CorrelationRegistry>,
    ) -> Self {
        Self { engine, host, registry, config: BridgeConfig::default() }
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Global registry, config applied, engine initialized when a base url
    /// is configured.
    pub fn from_config(
        config: BridgeConfig,
        engine: Arc<dyn WalletEngine>,
        host: Arc<dyn EventSink>,
    ) -> Result<Self, ErrorPayload> {
        let bridge = Self::new(engine, host).with_config(config);
        if let Some(base_url) = bridge.config.base_url.clone() {
            let engine_config = bridge.config.engine_config.clone();
            guarded(sdk::INITIALIZE, || bridge.engine.initialize(&base_url, engine_config))?;
        }
        tracing::info!(app = %bridge.config.app, initialized = bridge.config.base_url.is_some(), "bridge ready");
        Ok(bridge)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    /// Interactive surface sharing this bridge's host sink and registry
    pub fn interactive(&self, engine: Arc<dyn InteractiveEngine>) -> InteractiveBridge {
        InteractiveBridge::new(engine, self.host.clone(), self.registry.clone())
    }

    // Subscriptions (pass-through to the registry)

    pub fn subscribe(&self, correlation_id: &str, sink: Arc<dyn EventSink>) {
        self.registry.subscribe(correlation_id, sink);
    }

    pub fn unsubscribe(&self, correlation_id: &str, sink: &Arc<dyn EventSink>) -> bool {
        self.registry.unsubscribe(correlation_id, sink)
    }

    // Initialization and lookups

    pub fn initialize(&self, base_url: &str, config: &HostValue) -> Result<(), ErrorPayload> {
        guarded(sdk::INITIALIZE, || {
            let config = decode(config).map_err(BridgeError::codec(sdk::INITIALIZE))?;
            self.engine.initialize(base_url, config)
        })
    }

    /// `Ok(None)` when the engine has no such user
    pub fn get_user(&self, user_id: &str) -> Result<Option<HostValue>, ErrorPayload> {
        guarded(sdk::GET_USER, || encode_record(self.engine.get_user(user_id)?, sdk::GET_USER))
    }

    pub fn get_token(&self, token_id: &str) -> Result<Option<HostValue>, ErrorPayload> {
        guarded(sdk::GET_TOKEN, || encode_record(self.engine.get_token(token_id)?, sdk::GET_TOKEN))
    }

    pub fn get_current_device(&self, user_id: &str) -> Result<Option<HostValue>, ErrorPayload> {
        guarded(sdk::GET_CURRENT_DEVICE, || {
            encode_record(self.engine.get_current_device(user_id)?, sdk::GET_CURRENT_DEVICE)
        })
    }

    /// Sessions able to spend at least `min_spending_limit` (config default when `None`)
    pub fn get_active_sessions(&self, user_id: &str, min_spending_limit: Option<&str>) -> Result<HostValue, ErrorPayload> {
        let limit = min_spending_limit.unwrap_or(&self.config.min_spending_limit);
        guarded(sdk::GET_ACTIVE_SESSIONS, || {
            let sessions = self.engine.get_active_sessions(user_id, limit)?;
            let list = sessions
                .iter()
                .map(encode)
                .collect::<Result<Vec<_>, _>>()
                .map_err(BridgeError::codec(sdk::GET_ACTIVE_SESSIONS))?;
            Ok(HostValue::List(list))
        })
    }

    pub fn is_biometric_enabled(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        guarded(sdk::IS_BIOMETRIC_ENABLED, || Ok(self.engine.is_biometric_enabled(user_id))).unwrap_or(false)
    }

    /// Base64 (standard alphabet) PNG
    pub fn get_add_device_qr_code(&self, user_id: &str) -> Result<String, ErrorPayload> {
        guarded(sdk::GET_ADD_DEVICE_QR_CODE, || Ok(STANDARD.encode(self.engine.add_device_qr_code(user_id)?)))
    }

    // Workflows

    fn run(
        &self,
        kind: OperationKind,
        origin: &'static str,
        correlation_id: &str,
        body: impl FnOnce(&Dispatcher<DirectCallback>) -> anyhow::Result<()>,
    ) {
        let callback = DirectCallback::new(correlation_id, OperationContext::new(kind), origin, self.host.clone());
        launch(callback, origin, body);
    }

    pub fn setup_device(&self, user_id: &str, token_id: &str, correlation_id: &str) {
        self.run(OperationKind::SetupDevice, sdk::SETUP_DEVICE, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            d.dispatch(|cb| self.engine.setup_device(user_id, token_id, cb))
        });
    }

    pub fn activate_user(
        &self,
        user_id: &str,
        pin: &str,
        salt: &str,
        expires_after_secs: &str,
        spending_limit: &str,
        correlation_id: &str,
    ) {
        self.run(OperationKind::ActivateUser, sdk::ACTIVATE_USER, correlation_id, |d| {
            let passphrase = args::passphrase(user_id, pin, salt, sdk::ACTIVATE_USER_PASSPHRASE)?;
            let expiry = args::parse_expiry(expires_after_secs, sdk::ACTIVATE_USER_EXPIRY)?;
            d.dispatch(|cb| self.engine.activate_user(passphrase, expiry, spending_limit, cb))
        });
    }

    pub fn add_session(&self, user_id: &str, expires_after_secs: &str, spending_limit: &str, correlation_id: &str) {
        self.run(OperationKind::AddSession, sdk::ADD_SESSION, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            let expiry = args::parse_expiry(expires_after_secs, sdk::ADD_SESSION_EXPIRY)?;
            d.dispatch(|cb| self.engine.add_session(user_id, spending_limit, expiry, cb))
        });
    }

    /// `addresses` and `amounts` are JSON arrays; `meta` and `options` host
    /// maps (or null).
    #[allow(clippy::too_many_arguments)]
    pub fn execute_transaction(
        &self,
        user_id: &str,
        addresses: &str,
        amounts: &str,
        rule_name: &str,
        meta: &HostValue,
        options: &HostValue,
        correlation_id: &str,
    ) {
        self.run(OperationKind::ExecuteTransaction, sdk::EXECUTE_TRANSACTION, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            let token_holder_addresses = args::parse_address_list(addresses, sdk::EXECUTE_TRANSACTION_ADDRESSES)?;
            let amounts = args::parse_amount_list(amounts, sdk::EXECUTE_TRANSACTION_AMOUNTS)?;
            let meta = args::parse_map(meta, sdk::EXECUTE_TRANSACTION_META)?;
            let mut options = args::parse_map(options, sdk::EXECUTE_TRANSACTION_OPTIONS)?;
            options
                .entry(WAIT_FOR_FINALIZATION)
                .or_insert(Value::Bool(self.config.wait_for_finalization));
            let request = TransactionRequest {
                user_id: user_id.to_string(),
                token_holder_addresses,
                amounts,
                rule_name: rule_name.to_string(),
                meta,
                options,
            };
            d.dispatch(|cb| self.engine.execute_transaction(request, cb))
        });
    }

    pub fn get_device_mnemonics(&self, user_id: &str, correlation_id: &str) {
        self.run(OperationKind::GetDeviceMnemonics, sdk::GET_DEVICE_MNEMONICS, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            d.dispatch(|cb| self.engine.get_device_mnemonics(user_id, cb))
        });
    }

    pub fn authorize_current_device_with_mnemonics(&self, user_id: &str, mnemonics: &str, correlation_id: &str) {
        self.run(OperationKind::AuthorizeDeviceWithMnemonics, sdk::AUTHORIZE_WITH_MNEMONICS, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            let mnemonics = args::mnemonics(mnemonics, sdk::AUTHORIZE_WITH_MNEMONICS_PHRASE)?;
            d.dispatch(|cb| self.engine.authorize_current_device_with_mnemonics(user_id, mnemonics, cb))
        });
    }

    pub fn perform_qr_action(&self, user_id: &str, qr_data: &str, correlation_id: &str) {
        self.run(OperationKind::PerformQrAction, sdk::PERFORM_QR_ACTION, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            let payload = args::parse_qr_payload(qr_data, sdk::PERFORM_QR_ACTION_PAYLOAD)?;
            d.dispatch(|cb| self.engine.perform_qr_action(user_id, payload, cb))
        });
    }

    pub fn reset_pin(&self, user_id: &str, salt: &str, current_pin: &str, new_pin: &str, correlation_id: &str) {
        self.run(OperationKind::ResetPin, sdk::RESET_PIN, correlation_id, |d| {
            let current = args::passphrase(user_id, current_pin, salt, sdk::RESET_PIN_CURRENT)?;
            let new = args::passphrase(user_id, new_pin, salt, sdk::RESET_PIN_NEW)?;
            d.dispatch(|cb| self.engine.reset_pin(user_id, current, new, cb))
        });
    }

    pub fn revoke_device(&self, user_id: &str, device_address: &str, correlation_id: &str) {
        self.run(OperationKind::RevokeDevice, sdk::REVOKE_DEVICE, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            d.dispatch(|cb| self.engine.revoke_device(user_id, device_address, cb))
        });
    }

    pub fn initiate_device_recovery(
        &self,
        user_id: &str,
        pin: &str,
        salt: &str,
        device_address: &str,
        correlation_id: &str,
    ) {
        self.run(OperationKind::InitiateDeviceRecovery, sdk::INITIATE_DEVICE_RECOVERY, correlation_id, |d| {
            let passphrase = args::passphrase(user_id, pin, salt, sdk::INITIATE_DEVICE_RECOVERY_PASSPHRASE)?;
            d.dispatch(|cb| self.engine.initiate_device_recovery(user_id, passphrase, device_address, cb))
        });
    }

    pub fn abort_device_recovery(&self, user_id: &str, pin: &str, salt: &str, correlation_id: &str) {
        self.run(OperationKind::AbortDeviceRecovery, sdk::ABORT_DEVICE_RECOVERY, correlation_id, |d| {
            let passphrase = args::passphrase(user_id, pin, salt, sdk::ABORT_DEVICE_RECOVERY_PASSPHRASE)?;
            d.dispatch(|cb| self.engine.abort_device_recovery(user_id, passphrase, cb))
        });
    }

    pub fn update_biometric_preference(&self, user_id: &str, enabled: bool, correlation_id: &str) {
        self.run(OperationKind::UpdateBiometricPreference, sdk::UPDATE_BIOMETRIC_PREFERENCE, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            d.dispatch(|cb| self.engine.update_biometric_preference(user_id, enabled, cb))
        });
    }

    pub fn logout_all_sessions(&self, user_id: &str, correlation_id: &str) {
        self.run(OperationKind::LogoutAllSessions, sdk::LOGOUT_ALL_SESSIONS, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, sdk::USER_ID)?;
            d.dispatch(|cb| self.engine.logout_all_sessions(user_id, cb))
        });
    }
}

fn encode_record(record: Option<Value>, site: &'static str) -> anyhow::Result<Option<HostValue>> {
    match record {
        None => Ok(None),
        Some(doc) => Ok(Some(encode(&doc).map_err(BridgeError::codec(site))?)),
    }
}
