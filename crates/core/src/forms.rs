//! Submitted form data, validation and redisplay.
//!
//! Forms validate with `validator`; failures are gathered into
//! [`FormErrors`] keyed by field name and returned inside a [`BoundForm`]
//! so the page can be rendered again with the submitted values.

use std::borrow::Cow;
use std::collections::BTreeMap;

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Error for a missing or blank required field.
pub const REQUIRED: &str = "This field is required.";

/// Error for a group reference that does not exist.
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Error for an upload that is not a readable image.
pub const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an \
                                 image or a corrupted image.";

fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed(REQUIRED)));
    }
    Ok(())
}

/// Field name to error messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map_or_else(|| err.code.to_string(), ToString::to_string);
                form_errors.add(&field, message);
            }
        }
        form_errors
    }
}

/// A form together with its submitted values and validation errors.
#[derive(Debug, Clone, Serialize)]
pub struct BoundForm<F> {
    /// Values to redisplay.
    pub data: F,
    /// Per-field errors, empty for a fresh form.
    pub errors: FormErrors,
    /// Per-field help texts.
    pub help_texts: BTreeMap<&'static str, &'static str>,
}

impl<F> BoundForm<F> {
    /// Whether the form carries no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// File name as sent by the client.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Detect the image format, requiring the data to decode.
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        let format = image::guess_format(&self.data).ok()?;
        if !matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
        ) {
            return None;
        }
        image::load_from_memory_with_format(&self.data, format).ok()?;
        Some(format)
    }
}

/// Post creation and editing form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct PostForm {
    /// Post body.
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub text: String,

    /// Group ID. `None` when the field was not submitted, empty for no group.
    #[serde(default)]
    pub group: Option<String>,

    /// Uploaded image, if a file was sent.
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

impl PostForm {
    /// Help text for `text`.
    pub const TEXT_HELP: &'static str = "Text of the new post";
    /// Help text for `group`.
    pub const GROUP_HELP: &'static str = "Group the post will belong to";

    /// The selected group ID, treating an empty value as no group.
    #[must_use]
    pub fn group_id(&self) -> Option<&str> {
        self.group.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }

    /// Run field validation that needs no database access.
    #[must_use]
    pub fn clean(&self) -> FormErrors {
        let mut errors = self
            .validate()
            .map_or_else(FormErrors::from, |()| FormErrors::new());

        if let Some(image) = &self.image {
            if image.format().is_none() {
                errors.add("image", INVALID_IMAGE);
            }
        }

        errors
    }

    /// Bind the form for rendering.
    #[must_use]
    pub fn bind(self, errors: FormErrors) -> BoundForm<Self> {
        BoundForm {
            data: self,
            errors,
            help_texts: BTreeMap::from([
                ("text", Self::TEXT_HELP),
                ("group", Self::GROUP_HELP),
            ]),
        }
    }
}

/// Comment form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    /// Comment body.
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub text: String,
}

impl CommentForm {
    /// Help text for `text`.
    pub const TEXT_HELP: &'static str = "Text of the comment";

    /// Run field validation.
    #[must_use]
    pub fn clean(&self) -> FormErrors {
        self.validate()
            .map_or_else(FormErrors::from, |()| FormErrors::new())
    }

    /// Bind the form for rendering.
    #[must_use]
    pub fn bind(self, errors: FormErrors) -> BoundForm<Self> {
        BoundForm {
            data: self,
            errors,
            help_texts: BTreeMap::from([("text", Self::TEXT_HELP)]),
        }
    }
}
