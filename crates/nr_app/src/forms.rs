//! Input checks that run before any request leaves the device.

use nr_auth::Session;
use nr_core::{Error, Result, User};

pub const MIN_PASSWORD_LEN: usize = 6;

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn invalid(message: &str) -> Error {
    Error::Validation(message.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<()> {
        if blank(&self.email) || self.password.is_empty() {
            return Err(invalid("Please fill in all fields"));
        }
        Ok(())
    }

    pub async fn submit(&self, session: &Session) -> Result<User> {
        self.validate()?;
        session.login(&self.email, &self.password).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<()> {
        if blank(&self.name)
            || blank(&self.email)
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(invalid("Please fill in all fields"));
        }
        if self.password != self.confirm_password {
            return Err(invalid("Password confirmation does not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid("Password must be at least 6 characters"));
        }
        Ok(())
    }

    pub async fn submit(&self, session: &Session) -> Result<User> {
        self.validate()?;
        session
            .register(&self.email, &self.password, &self.name)
            .await
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeForm {
    pub fn validate(&self) -> Result<()> {
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(invalid("Please fill in all fields"));
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid("New password must be at least 6 characters"));
        }
        if self.new_password != self.confirm_password {
            return Err(invalid("New passwords do not match"));
        }
        if self.new_password == self.current_password {
            return Err(invalid("New password must differ from the current one"));
        }
        Ok(())
    }

    pub async fn submit(&self, session: &Session) -> Result<()> {
        self.validate()?;
        session
            .change_password(&self.current_password, &self.new_password)
            .await
    }
}
