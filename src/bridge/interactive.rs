//! Interactive workflows: the engine drives its own screens, and every
//! event is published to registry subscribers of the correlation id as
//! well as to the host sink.
//!
//! Subscribe before calling: there is no replay. The id's registry entry
//! is opened at dispatch, so an event that arrives before the method
//! returns still finds it.

use super::args;
use super::launch::{launch, Dispatcher};
use crate::callback::{FanOutCallback, WorkflowCallback};
use crate::core::sites::ui;
use crate::core::{OperationContext, OperationKind};
use crate::engine::InteractiveEngine;
use crate::registry::CorrelationRegistry;
use crate::sink::EventSink;
use std::sync::Arc;

pub struct InteractiveBridge {
    engine: Arc<dyn InteractiveEngine>,
    host: Arc<dyn EventSink>,
    registry: Arc<CorrelationRegistry>,
}

impl InteractiveBridge {
    pub fn new(engine: Arc<dyn InteractiveEngine>, host: Arc<dyn EventSink>, registry: Arc<CorrelationRegistry>) -> Self {
        Self { engine, host, registry }
    }

    pub fn subscribe(&self, correlation_id: &str, sink: Arc<dyn EventSink>) {
        self.registry.subscribe(correlation_id, sink);
    }

    pub fn unsubscribe(&self, correlation_id: &str, sink: &Arc<dyn EventSink>) -> bool {
        self.registry.unsubscribe(correlation_id, sink)
    }

    fn run(
        &self,
        kind: OperationKind,
        origin: &'static str,
        correlation_id: &str,
        body: impl FnOnce(&Dispatcher<FanOutCallback>) -> anyhow::Result<()>,
    ) {
        let callback = FanOutCallback::new(
            correlation_id,
            OperationContext::new(kind),
            origin,
            self.host.clone(),
            self.registry.clone(),
        );
        launch(callback, origin, body);
    }

    // Flows that only need a user id
    fn run_for_user(
        &self,
        kind: OperationKind,
        origin: &'static str,
        user_id: &str,
        correlation_id: &str,
        call: impl FnOnce(&dyn InteractiveEngine, &str, Arc<dyn WorkflowCallback>) -> anyhow::Result<()>,
    ) {
        self.run(kind, origin, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, ui::USER_ID)?;
            d.dispatch(|cb| call(&*self.engine, user_id, cb))
        });
    }

    pub fn activate_user(&self, user_id: &str, expires_after_secs: &str, spending_limit: &str, correlation_id: &str) {
        self.run(OperationKind::ActivateUser, ui::ACTIVATE_USER, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, ui::USER_ID)?;
            let expiry = args::parse_expiry(expires_after_secs, ui::ACTIVATE_USER_EXPIRY)?;
            d.dispatch(|cb| self.engine.activate_user(user_id, expiry, spending_limit, cb))
        });
    }

    pub fn add_session(&self, user_id: &str, expires_after_secs: &str, spending_limit: &str, correlation_id: &str) {
        self.run(OperationKind::AddSession, ui::ADD_SESSION, correlation_id, |d| {
            let user_id = args::require_user_id(user_id, ui::USER_ID)?;
            let expiry = args::parse_expiry(expires_after_secs, ui::ADD_SESSION_EXPIRY)?;
            d.dispatch(|cb| self.engine.add_session(user_id, expiry, spending_limit, cb))
        });
    }

    pub fn reset_pin(&self, user_id: &str, correlation_id: &str) {
        self.run_for_user(OperationKind::ResetPin, ui::RESET_PIN, user_id, correlation_id, |e, u, cb| {
            e.reset_pin(u, cb)
        });
    }

    /// Without an address the engine lets the user pick the device
    pub fn revoke_device(&self, user_id: &str, device_address: Option<&str>, correlation_id: &str) {
        self.run_for_user(OperationKind::RevokeDevice, ui::REVOKE_DEVICE, user_id, correlation_id, |e, u, cb| {
            e.revoke_device(u, device_address, cb)
        });
    }

    pub fn initiate_device_recovery(&self, user_id: &str, device_address: Option<&str>, correlation_id: &str) {
        self.run_for_user(
            OperationKind::InitiateDeviceRecovery,
            ui::INITIATE_DEVICE_RECOVERY,
            user_id,
            correlation_id,
            |e, u, cb| e.initiate_device_recovery(u, device_address, cb),
        );
    }

    pub fn abort_device_recovery(&self, user_id: &str, correlation_id: &str) {
        self.run_for_user(
            OperationKind::AbortDeviceRecovery,
            ui::ABORT_DEVICE_RECOVERY,
            user_id,
            correlation_id,
            |e, u, cb| e.abort_device_recovery(u, cb),
        );
    }

    pub fn update_biometric_preference(&self, user_id: &str, enabled: bool, correlation_id: &str) {
        self.run_for_user(
            OperationKind::UpdateBiometricPreference,
            ui::UPDATE_BIOMETRIC_PREFERENCE,
            user_id,
            correlation_id,
            |e, u, cb| e.update_biometric_preference(u, enabled, cb),
        );
    }

    pub fn get_device_mnemonics(&self, user_id: &str, correlation_id: &str) {
        self.run_for_user(
            OperationKind::GetDeviceMnemonics,
            ui::GET_DEVICE_MNEMONICS,
            user_id,
            correlation_id,
            |e, u, cb| e.get_device_mnemonics(u, cb),
        );
    }

    pub fn authorize_current_device_with_mnemonics(&self, user_id: &str, correlation_id: &str) {
        self.run_for_user(
            OperationKind::AuthorizeDeviceWithMnemonics,
            ui::AUTHORIZE_WITH_MNEMONICS,
            user_id,
            correlation_id,
            |e, u, cb| e.authorize_current_device_with_mnemonics(u, cb),
        );
    }

    /// Shows this device's QR for another device to scan
    pub fn get_add_device_qr_code(&self, user_id: &str, correlation_id: &str) {
        self.run_for_user(OperationKind::ShowDeviceQr, ui::SHOW_DEVICE_QR, user_id, correlation_id, |e, u, cb| {
            e.show_device_qr(u, cb)
        });
    }

    pub fn scan_qr_code_to_authorize_device(&self, user_id: &str, correlation_id: &str) {
        self.run_for_user(
            OperationKind::AuthorizeDeviceWithQr,
            ui::AUTHORIZE_WITH_QR,
            user_id,
            correlation_id,
            |e, u, cb| e.authorize_device_with_qr(u, cb),
        );
    }

    pub fn scan_qr_code_to_execute_transaction(&self, user_id: &str, correlation_id: &str) {
        self.run_for_user(
            OperationKind::ExecuteTransactionViaQr,
            ui::EXECUTE_TRANSACTION_VIA_QR,
            user_id,
            correlation_id,
            |e, u, cb| e.execute_transaction_via_qr(u, cb),
        );
    }
}
