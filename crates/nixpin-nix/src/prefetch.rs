//! Putting sources into the Nix store and replacing hashes Nix refuses.

use tracing::{debug, info};

use nixpin_core::candidate::{ArtifactHash, Candidate};
use nixpin_util::errors::{NixpinError, NixpinResult};
use nixpin_util::process::CommandBuilder;

/// Hash algorithms the generated expressions must not use.
const BLACKLISTED_ALGORITHMS: [&str; 1] = ["md5"];

/// Whether a candidate's hash is missing or uses a refused algorithm.
pub fn needs_rehash(candidate: &Candidate) -> bool {
    match &candidate.hash {
        Some(hash) => BLACKLISTED_ALGORITHMS.contains(&hash.algorithm.as_str()),
        None => true,
    }
}

/// Download a source into the Nix store, verifying against `hash` when
/// one is known. Returns the store path.
pub async fn prefetch(url: &str, hash: Option<&ArtifactHash>) -> NixpinResult<String> {
    let mut cmd = CommandBuilder::new("nix-prefetch-url").arg("--print-path");
    if let Some(hash) = hash {
        cmd = cmd
            .args(["--type", hash.algorithm.as_str()])
            .arg(url)
            .arg(hash.digest.as_str());
    } else {
        cmd = cmd.arg(url);
    }

    let stdout = cmd.check_output().await?;
    let stdout = String::from_utf8_lossy(&stdout);
    // First line is the hash, second the store path.
    let path = stdout.lines().nth(1).ok_or_else(|| NixpinError::Generic {
        message: format!("nix-prefetch-url printed no store path for {url}"),
    })?;
    Ok(path.trim().to_string())
}

/// Compute the sha512 of a store path.
pub async fn sha512_of(store_path: &str) -> NixpinResult<ArtifactHash> {
    let stdout = CommandBuilder::new("nix-hash")
        .args(["--flat", "--base32", "--type", "sha512"])
        .arg(store_path)
        .check_output()
        .await?;
    let stdout = String::from_utf8_lossy(&stdout);
    let digest = stdout.lines().next().ok_or_else(|| NixpinError::Generic {
        message: format!("nix-hash printed nothing for {store_path}"),
    })?;
    Ok(ArtifactHash {
        algorithm: "sha512".to_string(),
        digest: digest.trim().to_string(),
    })
}

/// Make sure a candidate carries a hash the generated expression can
/// use, prefetching and re-hashing when it does not.
pub async fn ensure_supported_hash(candidate: &mut Candidate) -> NixpinResult<()> {
    if !needs_rehash(candidate) {
        return Ok(());
    }

    let old = candidate
        .hash
        .as_ref()
        .map(ArtifactHash::to_string)
        .unwrap_or_else(|| "none".to_string());
    info!("{candidate}: hash {old} not usable, prefetching to re-hash");

    let path = prefetch(&candidate.url, candidate.hash.as_ref()).await?;
    let new = sha512_of(&path).await?;
    debug!("{candidate}: {old} -> {new}, stored at {path}");
    candidate.hash = Some(new);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nixpin_core::specifier::SpecifierSet;
    use nixpin_core::version::PyVersion;

    fn candidate(hash: Option<ArtifactHash>) -> Candidate {
        Candidate {
            name: "pkga".to_string(),
            version: PyVersion::parse("1.0").unwrap(),
            url: "https://files.example/pkga-1.0.tar.gz".to_string(),
            hash,
            requires_python: SpecifierSet::any(),
        }
    }

    #[test]
    fn md5_and_missing_hashes_need_rehash() {
        assert!(needs_rehash(&candidate(None)));
        assert!(needs_rehash(&candidate(Some(ArtifactHash {
            algorithm: "md5".to_string(),
            digest: "aa".to_string(),
        }))));
        assert!(!needs_rehash(&candidate(Some(ArtifactHash {
            algorithm: "sha256".to_string(),
            digest: "aa".to_string(),
        }))));
    }
}
