//! RSA implementation of the `KeyGenerator` port.

use anyhow::{Context, Result};
use rand_core::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use ssh_key::public::{KeyData, RsaPublicKey};
use ssh_key::{HashAlg, PublicKey};

use crate::application::ports::KeyGenerator;
use crate::domain::KeyPair;
use crate::domain::config::MIN_KEY_BITS;
use crate::domain::keys::validate_public_key;

/// Generates RSA session keys of a fixed modulus size.
#[derive(Debug, Clone, Copy)]
pub struct RsaKeyGenerator {
    bits: usize,
}

impl RsaKeyGenerator {
    #[must_use]
    pub fn new(bits: usize) -> Self {
        Self { bits }
    }
}

fn generate_blocking(bits: usize, marker: &str) -> Result<KeyPair> {
    anyhow::ensure!(
        bits >= MIN_KEY_BITS,
        "RSA session keys need at least {MIN_KEY_BITS} bits, got {bits}"
    );
    let private = RsaPrivateKey::new(&mut OsRng, bits).context("generating RSA key")?;
    let pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .context("encoding private key as PKCS#8")?;

    let public = RsaPublicKey::try_from(private.to_public_key())
        .context("converting public key")?;
    let public = PublicKey::new(KeyData::Rsa(public), marker);
    let line = public.to_openssh().context("encoding public key")?;
    validate_public_key(&line)?;

    Ok(KeyPair {
        public_key: line,
        private_key: pem.as_str().to_owned(),
        marker: marker.to_string(),
        fingerprint: public.fingerprint(HashAlg::Sha256).to_string(),
    })
}

impl KeyGenerator for RsaKeyGenerator {
    async fn generate(&self, marker: &str) -> Result<KeyPair> {
        let bits = self.bits;
        let marker = marker.to_string();
        let started = std::time::Instant::now();
        // Prime search is CPU-bound and can take seconds at 4096 bits.
        let pair = tokio::task::spawn_blocking(move || generate_blocking(bits, &marker))
            .await
            .context("spawn_blocking for key generation")??;
        tracing::debug!(
            bits,
            elapsed_ms = started.elapsed().as_millis(),
            "generated session key"
        );
        Ok(pair)
    }
}
