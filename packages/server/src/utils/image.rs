use std::path::Path;

use common::storage::MediaKind;

use crate::error::AppError;

/// Check an uploaded file's name and declared content type against the
/// image types accepted for `kind`. Returns the lowercase extension.
///
/// Both must match: the extension must be in the allow-list and the MIME
/// type must be `image/*` with a subtype naming one of the allowed formats.
/// When the client sent no content type, it is guessed from the file name.
pub fn image_extension(
    kind: MediaKind,
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, AppError> {
    let allowed = kind.allowed_extensions();
    let rejected = || {
        AppError::Validation(format!(
            "Only images are allowed ({})",
            allowed.join(", ")
        ))
    };

    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| allowed.contains(&ext.as_str()))
        .ok_or_else(rejected)?;

    let mime = match content_type {
        Some(ct) => ct.parse::<mime_guess::mime::Mime>().ok(),
        None => mime_guess::from_ext(&ext).first(),
    }
    .ok_or_else(rejected)?;

    let subtype = mime.subtype().as_str().to_ascii_lowercase();
    if mime.type_() != mime_guess::mime::IMAGE || !allowed.iter().any(|a| subtype.contains(a)) {
        return Err(rejected());
    }

    Ok(ext)
}
