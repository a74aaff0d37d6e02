use crate::{config::DatabaseConfig, error::Error, log::STORE};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{aws_lc_rs, verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use rustls_platform_verifier::ConfigVerifierExt;
use std::sync::Arc;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::debug;

///
/// TLS connector for the document database.
///
/// Certificates are checked against the system roots unless
/// `database.with_tls_verification` is off.
///
pub fn connector(config: &DatabaseConfig) -> Result<MakeRustlsConnect, Error> {
    let tls_config = if config.with_tls_verification {
        ClientConfig::with_platform_verifier()
    } else {
        debug!(target: STORE, msg = "Database certificate verification disabled");
        unverified()?
    };

    Ok(MakeRustlsConnect::new(tls_config))
}

fn unverified() -> Result<ClientConfig, Error> {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let verifier = AcceptAnyCertificate {
        provider: provider.clone(),
    };

    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    Ok(tls_config)
}

///
/// Accepts any server certificate but still checks handshake signatures,
/// for databases with self-signed certificates in development
///
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_config_offers_provider_schemes() {
        let verifier = AcceptAnyCertificate {
            provider: Arc::new(aws_lc_rs::default_provider()),
        };
        let schemes = verifier.supported_verify_schemes();

        assert!(schemes.contains(&SignatureScheme::ECDSA_NISTP256_SHA256));
        assert!(schemes.contains(&SignatureScheme::RSA_PSS_SHA256));
    }

    #[test]
    fn connector_without_verification() {
        let config = DatabaseConfig {
            with_tls: true,
            with_tls_verification: false,
            ..Default::default()
        };
        assert!(connector(&config).is_ok());
    }
}
