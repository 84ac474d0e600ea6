// Email-based authentication: existence check, find-or-create login, and
// the state of the login screen itself.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::json;
use validator::ValidateEmail;

use crate::app::api::{ApiClient, ApiError};
use crate::app::events::Command;
use crate::app::models::{ApiResponse, CheckUserData, UserResponse};
use crate::app::session::SessionStore;

pub struct AuthService {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    // Ask the server whether an account exists for this email.
    pub async fn check_user_exists(
        &self,
        email: &str,
    ) -> Result<ApiResponse<CheckUserData>, ApiError> {
        let encoded = utf8_percent_encode(email, NON_ALPHANUMERIC);
        let response: ApiResponse<CheckUserData> =
            self.api.get(&format!("/users/check/{encoded}")).await?;

        if let Some(data) = &response.data {
            tracing::debug!(
                exists = data.exists,
                user_id = ?data.user.as_ref().map(|user| &user.id),
                "existence check answered"
            );
        }

        Ok(response)
    }

    // Find-or-create login. Idempotent: an existing email always resolves to
    // the same account. The session is persisted here on success, so every
    // later request carries the new identity.
    pub async fn login(&self, email: &str) -> Result<ApiResponse<UserResponse>, ApiError> {
        let response: ApiResponse<UserResponse> = self
            .api
            .post("/users/find-or-create", &json!({ "email": email }))
            .await?;

        if response.success {
            if let Some(data) = &response.data {
                if let Some(message) = &data.message {
                    tracing::debug!(%message, "login resolved");
                }
                let mut user = data.user.clone();
                // Some deployments issue the token beside the user record
                if user.token.is_empty() {
                    user.token = data.token.clone();
                }
                self.session.set_current_user(user);
            }
        }

        Ok(response)
    }
}

// Login flow states. Checking and Submitting are suspension points waiting
// on a network completion; Confirming waits on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPhase {
    Idle,
    Checking,
    Confirming,
    Submitting,
}

// State of the login screen: the email field plus the flow phase.
pub struct LoginScreen {
    pub email: String,
    pub phase: LoginPhase,
    pub error: Option<String>,
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self {
            email: String::new(),
            phase: LoginPhase::Idle,
            error: None,
        }
    }
}

impl LoginScreen {
    pub fn input(&mut self, to_insert: char) {
        if self.phase == LoginPhase::Idle {
            self.email.push(to_insert);
            self.error = None;
        }
    }

    pub fn delete_char(&mut self) {
        if self.phase == LoginPhase::Idle {
            self.email.pop();
        }
    }

    // Submit the form. The email must be present and syntactically valid
    // before any network call is attempted.
    pub fn submit(&mut self) -> Option<Command> {
        if self.phase != LoginPhase::Idle {
            return None;
        }

        let email = self.email.trim().to_string();
        if !email.validate_email() {
            self.error = Some("Enter a valid email address".to_string());
            return None;
        }

        self.error = None;
        self.phase = LoginPhase::Checking;
        Some(Command::CheckUser { email })
    }

    // The user agreed to auto-create the account.
    pub fn accept_confirmation(&mut self) -> Option<Command> {
        if self.phase != LoginPhase::Confirming {
            return None;
        }
        self.phase = LoginPhase::Submitting;
        Some(Command::Login {
            email: self.email.trim().to_string(),
        })
    }

    // Declining is a silent cancel: back to the form, no notification.
    pub fn decline_confirmation(&mut self) {
        if self.phase == LoginPhase::Confirming {
            self.phase = LoginPhase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_email_never_reaches_the_network() {
        let mut screen = LoginScreen::default();
        screen.email = "not-an-email".into();

        assert!(screen.submit().is_none());
        assert_eq!(screen.phase, LoginPhase::Idle);
        assert!(screen.error.is_some());
    }

    #[test]
    fn empty_email_is_rejected() {
        let mut screen = LoginScreen::default();
        assert!(screen.submit().is_none());
        assert!(screen.error.is_some());
    }

    #[test]
    fn valid_email_starts_the_existence_check() {
        let mut screen = LoginScreen::default();
        screen.email = " user@example.com ".into();

        let command = screen.submit();
        assert_eq!(
            command,
            Some(Command::CheckUser {
                email: "user@example.com".into()
            })
        );
        assert_eq!(screen.phase, LoginPhase::Checking);
        assert!(screen.error.is_none());
    }

    #[test]
    fn resubmit_while_checking_is_ignored() {
        let mut screen = LoginScreen::default();
        screen.email = "user@example.com".into();
        screen.submit();

        assert!(screen.submit().is_none());
        assert_eq!(screen.phase, LoginPhase::Checking);
    }

    #[test]
    fn declining_the_confirmation_cancels_silently() {
        let mut screen = LoginScreen::default();
        screen.email = "notfound@x.com".into();
        screen.phase = LoginPhase::Confirming;

        screen.decline_confirmation();
        assert_eq!(screen.phase, LoginPhase::Idle);
        assert!(screen.error.is_none());
    }

    #[test]
    fn accepting_the_confirmation_issues_the_login() {
        let mut screen = LoginScreen::default();
        screen.email = "notfound@x.com".into();
        screen.phase = LoginPhase::Confirming;

        let command = screen.accept_confirmation();
        assert_eq!(
            command,
            Some(Command::Login {
                email: "notfound@x.com".into()
            })
        );
        assert_eq!(screen.phase, LoginPhase::Submitting);
    }

    #[test]
    fn typing_is_blocked_while_busy() {
        let mut screen = LoginScreen::default();
        screen.email = "user@example.com".into();
        screen.submit();

        screen.input('x');
        assert_eq!(screen.email, "user@example.com");
    }
}
