//! Validation helpers for DTOs.

use validator::ValidationError;

/// Largest accepted payment proof once decoded (5 MiB).
const MAX_PAYMENT_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Validates a ten digit phone number, optionally prefixed with `+91`.
///
/// ```ignore
/// validate_phone("9876543210")     // Ok
/// validate_phone("+91 9876543210") // Ok
/// validate_phone("12345")          // Err
/// ```
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix("+91").unwrap_or(&compact);

    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must have exactly 10 digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a payment proof given as an image data URL or raw base64.
pub fn validate_payment_image(image: &str) -> Result<(), ValidationError> {
    let payload = match image.strip_prefix("data:") {
        Some(rest) => {
            let Some((header, payload)) = rest.split_once(',') else {
                return Err(image_error("payment_image_format", "Malformed data URL"));
            };
            if !header.starts_with("image/") || !header.ends_with(";base64") {
                return Err(image_error(
                    "payment_image_format",
                    "Payment proof must be a base64 encoded image",
                ));
            }
            payload
        }
        None => image,
    };

    if payload.is_empty()
        || !payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
    {
        return Err(image_error(
            "payment_image_format",
            "Payment proof is not valid base64",
        ));
    }

    if payload.len() / 4 * 3 > MAX_PAYMENT_IMAGE_BYTES {
        return Err(image_error(
            "payment_image_size",
            "Payment proof must not exceed 5 MiB",
        ));
    }

    Ok(())
}

fn image_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
