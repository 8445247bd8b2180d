use std::time::SystemTime;

use stratus_core::cross_log;

use super::{GetUrlInput, GetUrlOutput, Storage, MAX_URL_EXPIRY};
use crate::errors::{StorageError, ValidationError};

impl Storage {
    /// A direct URL for an object, valid for `options.expires_in`.
    ///
    /// The object is not checked for existence.
    ///
    /// # Errors
    /// - [`StorageError::Validation`] for invalid input, including an expiry of zero
    ///   or longer than seven days.
    /// - Whatever the provider reports when it cannot build the URL.
    pub fn get_url(&self, input: GetUrlInput) -> Result<GetUrlOutput, StorageError> {
        let expires_in = input.options.expires_in;
        if expires_in.is_zero() || expires_in > MAX_URL_EXPIRY {
            return Err(ValidationError::InvalidUrlExpiry {
                seconds: expires_in.as_secs(),
            }
            .into());
        }

        let location = self.config.resolve(
            &input.key,
            input.options.access_level,
            input.options.target_identity_id.as_deref(),
        )?;
        let url = self
            .provider
            .object_url(&location.bucket, &location.key, expires_in)?;
        cross_log!(debug, "Issued URL for {}", location.key);

        Ok(GetUrlOutput {
            url,
            expires_at: SystemTime::now() + expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::{AccessLevel, StorageConfig},
        provider::InMemoryProvider,
    };

    fn storage() -> Storage {
        Storage::new(
            InMemoryProvider::new(),
            StorageConfig::new("photos").identity_id("me"),
        )
    }

    #[test]
    fn links_to_the_prefixed_key() {
        let before = SystemTime::now();
        let output = storage()
            .get_url(
                GetUrlInput::new("cat.jpg")
                    .access_level(AccessLevel::Protected)
                    .target_identity_id("them")
                    .expires_in(Duration::from_secs(60)),
            )
            .unwrap();

        assert_eq!(
            output.url.as_str(),
            "memory://objects/photos/protected/them/cat.jpg?expires=60"
        );
        assert!(output.expires_at >= before + Duration::from_secs(60));
    }

    #[test]
    fn expiry_must_be_within_bounds() {
        for expires_in in [Duration::ZERO, MAX_URL_EXPIRY + Duration::from_secs(1)] {
            let err = storage()
                .get_url(GetUrlInput::new("cat.jpg").expires_in(expires_in))
                .unwrap_err();
            assert!(matches!(
                err,
                StorageError::Validation(ValidationError::InvalidUrlExpiry { .. })
            ));
        }
        assert!(storage()
            .get_url(GetUrlInput::new("cat.jpg").expires_in(MAX_URL_EXPIRY))
            .is_ok());
    }
}
