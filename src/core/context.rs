//! Operation context - which workflow an event belongs to

use serde::{Deserialize, Serialize};

/// Workflow classes the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    SetupDevice,
    ActivateUser,
    AddSession,
    ExecuteTransaction,
    GetDeviceMnemonics,
    AuthorizeDeviceWithMnemonics,
    PerformQrAction,
    ResetPin,
    RevokeDevice,
    InitiateDeviceRecovery,
    AbortDeviceRecovery,
    UpdateBiometricPreference,
    LogoutAllSessions,
    ShowDeviceQr,
    AuthorizeDeviceWithQr,
    ExecuteTransactionViaQr,
}

impl OperationKind {
    pub const ALL: [OperationKind; 16] = [
        OperationKind::SetupDevice,
        OperationKind::ActivateUser,
        OperationKind::AddSession,
        OperationKind::ExecuteTransaction,
        OperationKind::GetDeviceMnemonics,
        OperationKind::AuthorizeDeviceWithMnemonics,
        OperationKind::PerformQrAction,
        OperationKind::ResetPin,
        OperationKind::RevokeDevice,
        OperationKind::InitiateDeviceRecovery,
        OperationKind::AbortDeviceRecovery,
        OperationKind::UpdateBiometricPreference,
        OperationKind::LogoutAllSessions,
        OperationKind::ShowDeviceQr,
        OperationKind::AuthorizeDeviceWithQr,
        OperationKind::ExecuteTransactionViaQr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::SetupDevice => "SETUP_DEVICE",
            OperationKind::ActivateUser => "ACTIVATE_USER",
            OperationKind::AddSession => "ADD_SESSION",
            OperationKind::ExecuteTransaction => "EXECUTE_TRANSACTION",
            OperationKind::GetDeviceMnemonics => "GET_DEVICE_MNEMONICS",
            OperationKind::AuthorizeDeviceWithMnemonics => "AUTHORIZE_DEVICE_WITH_MNEMONICS",
            OperationKind::PerformQrAction => "PERFORM_QR_ACTION",
            OperationKind::ResetPin => "RESET_PIN",
            OperationKind::RevokeDevice => "REVOKE_DEVICE",
            OperationKind::InitiateDeviceRecovery => "INITIATE_DEVICE_RECOVERY",
            OperationKind::AbortDeviceRecovery => "ABORT_DEVICE_RECOVERY",
            OperationKind::UpdateBiometricPreference => "UPDATE_BIOMETRIC_PREFERENCE",
            OperationKind::LogoutAllSessions => "LOGOUT_ALL_SESSIONS",
            OperationKind::ShowDeviceQr => "SHOW_DEVICE_QR",
            OperationKind::AuthorizeDeviceWithQr => "AUTHORIZE_DEVICE_WITH_QR",
            OperationKind::ExecuteTransactionViaQr => "EXECUTE_TRANSACTION_VIA_QR",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.iter().copied().find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attached to every event of one operation. Fixed once the operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationContext {
    kind: OperationKind,
}

impl OperationContext {
    pub fn new(kind: OperationKind) -> Self { Self { kind } }
    pub fn kind(&self) -> OperationKind { self.kind }
}

impl From<OperationKind> for OperationContext {
    fn from(kind: OperationKind) -> Self { Self::new(kind) }
}
