use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use jrnl_crypto::SigningKey;

/// Read a signing key stored as a hex secret.
pub fn load_keypair(path: &Path) -> anyhow::Result<SigningKey> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read keypair {}", path.display()))?;
    SigningKey::from_hex(raw.trim())
        .with_context(|| format!("{} does not hold a hex signing key", path.display()))
}

pub fn write_keypair(path: &Path, key: &SigningKey, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(path, format!("{}\n", key.to_hex()))
        .with_context(|| format!("failed to write keypair {}", path.display()))
}
