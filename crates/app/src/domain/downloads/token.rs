//! Download token signing.

use hmac::digest::InvalidLength;
use jiff::Timestamp;

use crate::{
    domain::downloads::records::Entitlement,
    secrets::{Secret, hmac_sha256_hex, signatures_match},
};

/// Signs `{product}:{order}:{user}:{expiry}` with a server secret.
#[derive(Debug)]
pub struct DownloadSigner {
    secret: Secret,
}

impl DownloadSigner {
    #[must_use]
    pub fn new(secret: Secret) -> Self {
        Self { secret }
    }

    fn message(entitlement: &Entitlement, expires: i64) -> String {
        format!(
            "{}:{}:{}:{expires}",
            entitlement.product, entitlement.order, entitlement.user
        )
    }

    pub fn sign(
        &self,
        entitlement: &Entitlement,
        expires: i64,
    ) -> Result<String, InvalidLength> {
        hmac_sha256_hex(
            self.secret.as_bytes(),
            Self::message(entitlement, expires).as_bytes(),
        )
    }

    /// A token at or past its expiry never verifies.
    pub fn verify(
        &self,
        entitlement: &Entitlement,
        token: &str,
        expires: i64,
        now: Timestamp,
    ) -> bool {
        if expires <= now.as_second() {
            return false;
        }

        self.sign(entitlement, expires)
            .is_ok_and(|expected| signatures_match(&expected, token))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{
        domain::{catalog::records::DigitalProductUuid, orders::OrderUuid},
        identity::UserUuid,
    };

    use super::*;

    fn entitlement() -> Entitlement {
        Entitlement {
            user: UserUuid::new(),
            product: DigitalProductUuid::new(),
            order: OrderUuid::new(),
        }
    }

    fn signer() -> DownloadSigner {
        DownloadSigner::new(Secret::new("download-secret"))
    }

    #[test]
    fn fresh_token_verifies() -> Result<(), InvalidLength> {
        let entitlement = entitlement();
        let now = Timestamp::now();
        let expires = now.as_second() + 60;
        let token = signer().sign(&entitlement, expires)?;

        assert!(signer().verify(&entitlement, &token, expires, now));

        Ok(())
    }

    #[test]
    fn token_is_bound_to_every_field() -> Result<(), InvalidLength> {
        let entitlement = entitlement();
        let now = Timestamp::now();
        let expires = now.as_second() + 60;
        let token = signer().sign(&entitlement, expires)?;

        let other_user = Entitlement {
            user: UserUuid::new(),
            ..entitlement
        };
        let other_order = Entitlement {
            order: OrderUuid::new(),
            ..entitlement
        };

        assert!(!signer().verify(&other_user, &token, expires, now));
        assert!(!signer().verify(&other_order, &token, expires, now));
        assert!(!signer().verify(&entitlement, &token, expires + 1, now));
        assert!(
            !DownloadSigner::new(Secret::new("other-secret"))
                .verify(&entitlement, &token, expires, now)
        );

        Ok(())
    }

    proptest! {
        #[test]
        fn expired_token_never_verifies(age in 0_i64..1_000_000) {
            let entitlement = entitlement();
            let now = Timestamp::now();
            let expires = now.as_second() - age;
            let token = signer().sign(&entitlement, expires);

            prop_assert!(token.is_ok());

            let token = token.unwrap_or_default();

            prop_assert!(!signer().verify(&entitlement, &token, expires, now));
        }
    }
}
