use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use anyhow::Context;
use rand::rngs::OsRng;
use tokio::task;
use tracing::{error, warn};

use crate::config::HashCost;

/// Salted Argon2id hashing with tunable cost.
///
/// The `*_async` variants run on the blocking pool; request handlers use
/// those so a hash never stalls an async worker.
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
    // Digest of a throwaway password, verified against when a login email is
    // unknown so both failure paths cost one verification.
    decoy: String,
}

impl Hasher {
    pub fn new(cost: HashCost) -> anyhow::Result<Self> {
        let params = Params::new(cost.m_cost, cost.t_cost, cost.p_cost, None).map_err(|e| {
            error!(error = %e, "argon2 params rejected");
            anyhow::anyhow!(e.to_string())
        })?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy = hash_with(&argon2, "decoy-password-never-matches")?;
        Ok(Self { argon2, decoy })
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        hash_with(&self.argon2, plain)
    }

    /// Never errors: a digest that does not parse simply does not match.
    pub fn verify(&self, plain: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password digest is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burns one verification against the decoy digest.
    pub fn verify_decoy(&self, plain: &str) -> bool {
        self.verify(plain, &self.decoy)
    }

    pub async fn hash_async(&self, plain: &str) -> anyhow::Result<String> {
        let hasher = self.clone();
        let plain = plain.to_owned();
        task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .context("password hashing task failed")?
    }

    pub async fn verify_async(&self, plain: &str, digest: &str) -> bool {
        let hasher = self.clone();
        let (plain, digest) = (plain.to_owned(), digest.to_owned());
        task::spawn_blocking(move || hasher.verify(&plain, &digest))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "password verification task failed");
                false
            })
    }

    pub async fn verify_decoy_async(&self, plain: &str) -> bool {
        self.verify_async(plain, &self.decoy).await
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> Hasher {
    Hasher::new(HashCost {
        m_cost: 256,
        t_cost: 1,
        p_cost: 1,
    })
    .expect("cheap params are valid")
}
