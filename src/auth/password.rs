use tracing::error;

/// bcrypt work factor for stored hashes.
pub const BCRYPT_COST: u32 = 12;

pub async fn hash_password(plain: &str) -> anyhow::Result<String> {
    hash_password_with_cost(plain, BCRYPT_COST).await
}

/// bcrypt is CPU-bound, so it runs on the blocking pool.
pub async fn hash_password_with_cost(plain: &str, cost: u32) -> anyhow::Result<String> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(plain, cost).map_err(|e| {
            error!(error = %e, "bcrypt hash error");
            anyhow::anyhow!(e.to_string())
        })
    })
    .await?
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub async fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let plain = plain.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::verify(plain, &hash).map_err(|e| {
            error!(error = %e, "bcrypt parse hash error");
            anyhow::anyhow!(e.to_string())
        })
    })
    .await?
}
