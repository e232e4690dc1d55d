use serde::Serialize;
use tracing::{debug, info};

use crate::api::{decode, ensure_success, BackendClient};
use crate::errors::ClientError;
use crate::gateway::ApiRequest;
use crate::models::profile::OnboardingStatus;
use crate::models::user::{
    Credentials, CurrentUser, EmailToken, NewAccount, PasswordResetConfirm, PasswordResetRequest,
    SessionStatus,
};

const LOGIN_PATH: &str = "/auth/jwt/create/";
const LOGOUT_PATH: &str = "/auth/logout/";
const CURRENT_USER_PATH: &str = "/auth/users/me/";
const SIGNUP_PATH: &str = "/auth/users/";
const ACTIVATION_PATH: &str = "/auth/users/activation/";
const RESET_PASSWORD_PATH: &str = "/auth/users/reset_password/";
const RESET_PASSWORD_CONFIRM_PATH: &str = "/auth/users/reset_password_confirm/";
pub(crate) const ONBOARDING_PATH: &str = "/profiles/profile/onboarding/";

impl BackendClient {
    /// Obtains session cookies. Sent once: a rejected login must not
    /// trigger a session refresh.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = ApiRequest::post().json(&credentials)?;
        let response = self.gateway().send_once(LOGIN_PATH, &request).await?;
        ensure_success(response)?;
        info!("Logged in as {email}");
        Ok(())
    }

    /// Clears the session cookies. HTTP errors are ignored; only transport
    /// failures are reported.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .gateway()
            .send_once(LOGOUT_PATH, &ApiRequest::post())
            .await?;
        debug!("Logout returned {}", response.status);
        Ok(())
    }

    /// Registers an account. The backend emails an activation link; the
    /// account cannot log in until it is activated.
    pub async fn signup(&self, account: &NewAccount) -> Result<(), ClientError> {
        self.post_once(SIGNUP_PATH, account).await?;
        info!("Created account {}", account.email);
        Ok(())
    }

    /// Activates an account with the `uid` and `token` from its email link.
    pub async fn activate(&self, link: &EmailToken) -> Result<(), ClientError> {
        self.post_once(ACTIVATION_PATH, link).await
    }

    /// Asks the backend to email a password reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ClientError> {
        let body = PasswordResetRequest {
            email: email.to_string(),
        };
        self.post_once(RESET_PASSWORD_PATH, &body).await
    }

    /// Sets a new password with the `uid` and `token` from a reset link.
    pub async fn confirm_password_reset(
        &self,
        link: EmailToken,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let body = PasswordResetConfirm {
            link,
            new_password: new_password.to_string(),
            re_new_password: new_password.to_string(),
        };
        self.post_once(RESET_PASSWORD_CONFIRM_PATH, &body).await
    }

    /// Account flows run without a session, so a 401 is never refreshed.
    async fn post_once<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        let request = ApiRequest::post().json(body)?;
        let response = self.gateway().send_once(path, &request).await?;
        debug!("{path} returned {}", response.status);
        ensure_success(response)?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        self.get_json(CURRENT_USER_PATH).await
    }

    /// Resolves where the user belongs: logged out, onboarding, or ready.
    /// Any failure to load the current user counts as logged out; a failed
    /// onboarding lookup does not block a signed-in user.
    pub async fn session_status(&self) -> SessionStatus {
        let user = match self.current_user().await {
            Ok(user) => user,
            Err(e) => {
                debug!("No active session: {e}");
                return SessionStatus::LoggedOut;
            }
        };

        let onboarding = self
            .gateway()
            .fetch(ONBOARDING_PATH, &ApiRequest::get())
            .await
            .map_err(ClientError::from)
            .and_then(decode::<OnboardingStatus>);

        match onboarding {
            Ok(status) if status.needs_onboarding => SessionStatus::NeedsOnboarding(user),
            Ok(_) => SessionStatus::Ready(user),
            Err(e) => {
                debug!("Onboarding status unavailable: {e}");
                SessionStatus::Ready(user)
            }
        }
    }
}
