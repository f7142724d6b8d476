use std::sync::Arc;

use auth::PasswordHasher;

use crate::domain::session::errors::AuthError;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserRepository;

/// Verifies an email/password pair against stored credentials.
///
/// Unknown email, wrong password and inactive account all produce `None`,
/// so callers cannot use login to probe which accounts exist.
pub struct Authenticator<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
    password_hasher: PasswordHasher,
}

impl<UR> Authenticator<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>) -> Self {
        Self {
            users,
            password_hasher: PasswordHasher::new(),
        }
    }

    /// Return the user if the credentials match an active account.
    ///
    /// # Errors
    /// * `Repository` - User lookup failed
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };

        if !self.password_hasher.verify(password, &user.password_hash) {
            return Ok(None);
        }

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login attempt for inactive user");
            return Ok(None);
        }

        Ok(Some(user))
    }
}
