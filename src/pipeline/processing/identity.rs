use sha2::{Digest, Sha256};

use crate::domain::{RawJobRecord, Source};

/// Number of hex characters kept from a content fingerprint
const FINGERPRINT_LEN: usize = 16;

/// Derive the cross-source `job_id` for a raw record.
///
/// Records with a native id key on `<source>:<id>`. Without one, a SHA-256
/// fingerprint of title, company and location stands in. A record with
/// neither a native id nor a title has no usable identity.
pub fn derive_job_id(source: Source, record: &RawJobRecord) -> Option<String> {
    if let Some(native) = super::present(record.source_job_id.as_deref()) {
        return Some(format!("{}:{}", source.slug(), native));
    }

    let title = super::present(record.title.as_deref())?;
    let mut hasher = Sha256::new();
    for part in [
        Some(title),
        super::present(record.company.as_deref()),
        super::present(record.location.as_deref()),
    ] {
        hasher.update(part.unwrap_or_default().to_lowercase().as_bytes());
        hasher.update(b"\x1f");
    }
    let digest = hex::encode(hasher.finalize());
    Some(format!("{}:fp:{}", source.slug(), &digest[..FINGERPRINT_LEN]))
}
