//! Scripted camera permission.
//!
//! Stands in for the platform privacy prompt: the current status is fixed up
//! front, and an undetermined status resolves to a pre-recorded answer the
//! first time access is requested.

use camera_capture_core::AuthorizationStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedPermissions {
    status: AuthorizationStatus,
    answer: bool,
    prompts: usize,
}

impl ScriptedPermissions {
    pub fn authorized() -> Self {
        Self::with_status(AuthorizationStatus::Authorized)
    }

    pub fn denied() -> Self {
        Self::with_status(AuthorizationStatus::Denied)
    }

    pub fn restricted() -> Self {
        Self::with_status(AuthorizationStatus::Restricted)
    }

    /// Not asked yet; the prompt will be answered with `grant`.
    pub fn undetermined(grant: bool) -> Self {
        Self {
            status: AuthorizationStatus::NotDetermined,
            answer: grant,
            prompts: 0,
        }
    }

    fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            status,
            answer: false,
            prompts: 0,
        }
    }

    pub fn status(&self) -> AuthorizationStatus {
        self.status
    }

    /// Show the prompt. Only an undetermined status changes; the user's answer
    /// sticks for later calls.
    pub fn request(&mut self) -> bool {
        self.prompts += 1;
        if self.status == AuthorizationStatus::NotDetermined {
            self.status = if self.answer {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
            log::info!("Camera permission prompt answered: {:?}", self.status);
        }
        self.status == AuthorizationStatus::Authorized
    }

    /// How many times the prompt was shown.
    pub fn prompts(&self) -> usize {
        self.prompts
    }
}

impl Default for ScriptedPermissions {
    fn default() -> Self {
        Self::authorized()
    }
}
