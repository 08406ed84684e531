//! Registration input validation

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::{models::NewUser, repositories::UserRepository};

/// Reason a registration was refused
///
/// The display text of every variant except [`RegistrationError::Storage`] is
/// shown to the visitor as is.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Such a user already exists")]
    LoginTaken,

    #[error("A user with this e-mail already exists")]
    EmailTaken,

    #[error("Login must consist of 5-25 latin letters, digits and the symbols ! and ?")]
    InvalidLogin,

    #[error("You entered an invalid e-mail format")]
    InvalidEmail,

    #[error("Password must consist of 5-36 latin letters, digits and the symbols ! and ?")]
    InvalidPassword,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Validate login format
pub fn validate_login(login: &str) -> Result<(), RegistrationError> {
    static LOGIN_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = LOGIN_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z!?\d]{5,25}$").expect("Failed to compile login regex"));

    if !regex.is_match(login) {
        return Err(RegistrationError::InvalidLogin);
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), RegistrationError> {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[-\w\.]+@([-\w]+\.)+[-\w]{2,4}$").expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(RegistrationError::InvalidEmail);
    }

    Ok(())
}

/// Validate password format
pub fn validate_password(password: &str) -> Result<(), RegistrationError> {
    static PASSWORD_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PASSWORD_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z!?\d]{5,36}$").expect("Failed to compile password regex")
    });

    if !regex.is_match(password) {
        return Err(RegistrationError::InvalidPassword);
    }

    Ok(())
}

/// Check a registration form against the store and the format rules
///
/// Rules run in a fixed order and the first failure wins: taken login, taken
/// email, login format, email format, password format.
pub async fn check_new_user(
    users: &UserRepository,
    new_user: &NewUser,
) -> Result<(), RegistrationError> {
    if users.find_by_login(&new_user.login).await?.is_some() {
        return Err(RegistrationError::LoginTaken);
    }

    if users.find_by_email(&new_user.email).await?.is_some() {
        return Err(RegistrationError::EmailTaken);
    }

    validate_login(&new_user.login)?;
    validate_email(&new_user.email)?;
    validate_password(&new_user.password)?;

    Ok(())
}
