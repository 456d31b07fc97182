//! # Forms
//!
//! Declarative field validation for everything a user can submit.
//! Each input type deserializes straight from a request body and validates
//! into a typed value or a `DomainError::Validation` carrying per-field messages.

use domains::{DomainError, FormErrors, Group, GroupId, ImageUpload, MediaStorage, Result};
use serde::Deserialize;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const USERNAME_TOO_LONG: &str = "Ensure this value has at most 150 characters.";
pub const USERNAME_INVALID: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Post create/edit submission. `group` is the raw `<select>` value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<ImageUpload>,
}

impl PostInput {
    /// `groups` are the allowed choices for the `group` field.
    pub fn validate(self, groups: &[Group], media: &dyn MediaStorage) -> Result<ValidPost> {
        let mut errors = FormErrors::new();

        let text = self.text.trim().to_string();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = match self.group.trim() {
            "" => None,
            raw => {
                let chosen = raw
                    .parse::<GroupId>()
                    .ok()
                    .filter(|id| groups.iter().any(|group| group.id == *id));
                if chosen.is_none() {
                    errors.add("group", INVALID_CHOICE);
                }
                chosen
            }
        };

        // Browsers submit an untouched file input as a nameless empty part.
        let image = self.image.filter(|upload| {
            !upload.bytes.is_empty() || upload.file_name.as_deref().is_some_and(|n| !n.is_empty())
        });
        if let Some(upload) = &image {
            if let Err(message) = check_image(upload, media) {
                errors.add("image", message);
            }
        }

        errors.into_result()?;
        Ok(ValidPost {
            text,
            group_id,
            image,
        })
    }
}

fn check_image(upload: &ImageUpload, media: &dyn MediaStorage) -> std::result::Result<(), &'static str> {
    if upload.bytes.is_empty() {
        return Err(EMPTY_FILE);
    }

    let declared_image = match upload.content_type.as_deref() {
        Some(declared) => declared
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false),
        None => true,
    };
    if !declared_image || media.probe(&upload.bytes).is_none() {
        return Err(INVALID_IMAGE);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: String,
}

impl CommentInput {
    pub fn validate(self) -> Result<String> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(DomainError::invalid("text", REQUIRED));
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupInput {
    /// Returns the username and the password to hash.
    pub fn validate(self) -> Result<(String, String)> {
        let mut errors = FormErrors::new();
        let username = self.username.trim().to_string();

        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_CHARS {
            errors.add("username", USERNAME_TOO_LONG);
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add("username", USERNAME_INVALID);
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_CHARS {
            errors.add("password1", PASSWORD_TOO_SHORT);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }

        errors.into_result()?;
        Ok((username, self.password1))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginInput {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FormErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()
    }
}
