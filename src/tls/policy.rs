use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, OtherError, RootCertStore, SignatureScheme};

use crate::app::TrustError;

/// Server certificate check against an extended trust set.
///
/// Replaces rustls' built-in verifier so that system roots and
/// caller-supplied certificates are trusted together. The chain check runs
/// in three steps, each with its own error:
///
/// 1. the peer must present at least one certificate ([`TrustError::NoCertificate`]);
/// 2. the leaf must parse ([`TrustError::CertificateParse`]);
/// 3. the leaf must chain to a trust anchor, through the presented
///    intermediates, be within its validity period and allow server
///    authentication ([`TrustError::CertificateVerification`]).
///
/// Handshake signatures are still checked with the provider's algorithms.
#[derive(Debug)]
pub struct TrustPolicy {
    roots: Arc<RootCertStore>,
    provider: Arc<CryptoProvider>,
    verify_hostname: bool,
}

impl TrustPolicy {
    pub fn new(roots: Arc<RootCertStore>, provider: Arc<CryptoProvider>) -> Self {
        Self {
            roots,
            provider,
            verify_hostname: false,
        }
    }

    /// Also require the leaf to name the host being connected to.
    pub fn with_hostname_check(mut self, enabled: bool) -> Self {
        self.verify_hostname = enabled;
        self
    }

    pub fn verifies_hostname(&self) -> bool {
        self.verify_hostname
    }

    /// Run the three-step check on a presented chain, leaf first.
    pub fn verify_chain(&self, chain: &[CertificateDer<'_>], now: UnixTime) -> Result<(), TrustError> {
        self.check(chain, None, now)
    }

    fn check(
        &self,
        chain: &[CertificateDer<'_>],
        server_name: Option<&ServerName<'_>>,
        now: UnixTime,
    ) -> Result<(), TrustError> {
        let (leaf, intermediates) = chain.split_first().ok_or(TrustError::NoCertificate)?;

        let cert = webpki::EndEntityCert::try_from(leaf).map_err(TrustError::CertificateParse)?;

        cert.verify_for_usage(
            self.provider.signature_verification_algorithms.all,
            &self.roots.roots,
            intermediates,
            now,
            webpki::KeyUsage::server_auth(),
            None,
            None,
        )
        .map_err(TrustError::CertificateVerification)?;

        if let Some(name) = server_name {
            cert.verify_is_valid_for_subject_name(name)
                .map_err(TrustError::CertificateVerification)?;
        }

        Ok(())
    }
}

impl ServerCertVerifier for TrustPolicy {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let chain: Vec<CertificateDer<'_>> = std::iter::once(end_entity)
            .chain(intermediates)
            .map(|c| CertificateDer::from(c.as_ref()))
            .collect();

        let name = self.verify_hostname.then_some(server_name);

        match self.check(&chain, name, now) {
            Ok(()) => {
                tracing::debug!("Accepted certificate for {:?}", server_name);
                Ok(ServerCertVerified::assertion())
            }
            Err(e) => {
                tracing::warn!("Rejected certificate for {:?}: {}", server_name, e);
                Err(rustls::Error::InvalidCertificate(CertificateError::Other(
                    OtherError(Arc::new(e)),
                )))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Find the [`TrustError`] behind a failed request, if certificate
/// checking is what failed.
///
/// `io::Error` skips its own payload in `source()`, and the TLS stack may
/// nest one inside another, so payloads are searched through
/// [`std::io::Error::get_ref`] as well as the source chain.
pub fn find_trust_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a TrustError> {
    if let Some(trust) = err.downcast_ref::<TrustError>() {
        return Some(trust);
    }
    if let Some(tls) = err.downcast_ref::<rustls::Error>() {
        return trust_error_in_rustls(tls);
    }
    if let Some(payload) = err.downcast_ref::<std::io::Error>().and_then(|io| io.get_ref()) {
        if let Some(found) = find_trust_error(payload) {
            return Some(found);
        }
    }

    err.source().and_then(find_trust_error)
}

fn trust_error_in_rustls(err: &rustls::Error) -> Option<&TrustError> {
    match err {
        rustls::Error::InvalidCertificate(CertificateError::Other(other)) => {
            other.0.downcast_ref::<TrustError>()
        }
        _ => None,
    }
}
