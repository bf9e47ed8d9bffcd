//! Diagnostics produced while classifying a storage notification.
//!
//! Classification never fails: every problem with the input is folded into an
//! [`EventKind::Ignored`](crate::EventKind::Ignored) event that carries one of
//! these values so the host can log why nothing happened.
//!
//! | Diagnostic | Cause |
//! |------------|-------|
//! | [`MalformedNotification`](ClassifyError::MalformedNotification) | No object name, or the payload could not be decoded at all |
//! | [`UnsupportedContentType`](ClassifyError::UnsupportedContentType) | The object exists but is not an `image/*` type |
use thiserror::Error;

/// Why a notification was classified as [`Ignored`](crate::EventKind::Ignored).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassifyError {
    /// The notification has no identifying object name, or could not be
    /// decoded into an object resource.
    ///
    /// Storage systems emit nameless notifications while a function is being
    /// deployed; these are expected and harmless.
    #[error("malformed notification: {0}")]
    MalformedNotification(String),

    /// The object exists but its content type is not an image type.
    ///
    /// `None` means the notification carried no content type at all.
    #[error("unsupported content type: {}", .0.as_deref().unwrap_or("<none>"))]
    UnsupportedContentType(Option<String>),
}

impl ClassifyError {
    /// Returns true when the diagnostic indicates broken input rather than a
    /// legitimately uninteresting object.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ClassifyError::MalformedNotification(_))
    }
}
