use std::sync::Arc;

use rustls::RootCertStore;

use crate::app::TrustError;

/// System roots plus any extra PEM certificates the caller trusts.
///
/// Mutable only while being built; [`TrustSet::freeze`] hands out the
/// shared read-only store used by every handshake.
#[derive(Debug, Clone)]
pub struct TrustSet {
    roots: RootCertStore,
    appended: usize,
}

impl TrustSet {
    pub fn empty() -> Self {
        Self {
            roots: RootCertStore::empty(),
            appended: 0,
        }
    }

    /// Start from the platform's root store, or an empty one if it cannot
    /// be read.
    pub fn system() -> Self {
        let mut set = Self::empty();
        let loaded = rustls_native_certs::load_native_certs();

        for e in &loaded.errors {
            tracing::warn!("Failed to load system root certificates: {}", e);
        }

        let (added, ignored) = set.roots.add_parsable_certificates(loaded.certs);
        if ignored > 0 {
            tracing::debug!("Ignored {} unparsable system root certificates", ignored);
        }
        if added == 0 {
            tracing::warn!("No system root certificates available; starting from an empty trust set");
        } else {
            tracing::debug!("Loaded {} system root certificates", added);
        }

        set
    }

    /// Append every certificate in a PEM blob.
    ///
    /// `index` only labels the error. A blob with no certificate in it is
    /// rejected, as is one whose base64 or DER is broken.
    pub fn append_pem(&mut self, index: usize, pem: &[u8]) -> Result<usize, TrustError> {
        let append_error = |reason: String| TrustError::CertificateAppend { index, reason };

        let mut reader = pem;
        let certs = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| append_error(e.to_string()))?;

        if certs.is_empty() {
            return Err(append_error("no certificate found in PEM data".into()));
        }

        let count = certs.len();
        for cert in certs {
            self.roots
                .add(cert)
                .map_err(|e| append_error(e.to_string()))?;
        }

        self.appended += count;
        Ok(count)
    }

    /// Number of trust anchors, system and appended.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of anchors added through [`TrustSet::append_pem`].
    pub fn appended(&self) -> usize {
        self.appended
    }

    pub fn freeze(self) -> Arc<RootCertStore> {
        Arc::new(self.roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CA_PEM: &[u8] = include_bytes!("../../tests/fixtures/ca.pem");
    const SELF_SIGNED_PEM: &[u8] = include_bytes!("../../tests/fixtures/self_signed.pem");

    #[test]
    fn test_append_valid_pem() {
        let mut set = TrustSet::empty();
        assert!(set.is_empty());

        assert_eq!(set.append_pem(0, CA_PEM).unwrap(), 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.appended(), 1);
    }

    #[test]
    fn test_append_bundle_with_several_certs() {
        let mut bundle = CA_PEM.to_vec();
        bundle.extend_from_slice(SELF_SIGNED_PEM);

        let mut set = TrustSet::empty();
        assert_eq!(set.append_pem(0, &bundle).unwrap(), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_append_garbage_fails() {
        let mut set = TrustSet::empty();
        let err = set.append_pem(3, b"definitely not a certificate").unwrap_err();
        assert!(matches!(err, TrustError::CertificateAppend { index: 3, .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_append_bad_der_fails() {
        let pem = b"-----BEGIN CERTIFICATE-----\nAAECAwQFBgcICQ==\n-----END CERTIFICATE-----\n";
        let mut set = TrustSet::empty();
        let err = set.append_pem(0, pem).unwrap_err();
        assert!(matches!(err, TrustError::CertificateAppend { index: 0, .. }));
    }

    #[test]
    fn test_private_key_only_fails() {
        let key = include_bytes!("../../tests/fixtures/device.key");
        let mut set = TrustSet::empty();
        assert!(set.append_pem(0, key).is_err());
    }
}
