//! Connection options and TLS policy.
//!
//! Options are applied to a driver during `connect`. Instead of inspecting
//! driver types, an option acts through the [`SupportsTls`] capability: a
//! driver that terminates TLS exposes its [`TlsConfig`] and declares a
//! [`TlsScope`] saying which flags are meaningful for its protocol.
//! Drivers without TLS never receive the option.
//!
//! Application is idempotent and order-independent: every option only
//! ever sets flags, so applying `[SkipTlsVerify, SkipTlsVerify]` is the same
//! as applying it once.

/// Per-connection TLS settings owned by a driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Accept any server certificate.
    pub skip_verify: bool,

    /// Do not encrypt the transport at all.
    pub insecure: bool,
}

/// What a protocol's TLS relaxation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsScope {
    /// Only certificate trust can be relaxed (JSON-RPC over HTTPS).
    CertificateTrust,

    /// The protocol distinguishes transport encryption from certificate
    /// trust (gNMI, RESTCONF), so relaxation sets both flags.
    TransportAndTrust,
}

/// Capability implemented by drivers that own a TLS configuration.
pub trait SupportsTls {
    /// Which flags relaxation applies to.
    fn tls_scope(&self) -> TlsScope;

    /// Mutable access to the driver's TLS settings.
    fn tls_config_mut(&mut self) -> &mut TlsConfig;
}

/// A connect-time behavioural override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOption {
    /// Relax TLS verification.
    SkipTlsVerify,
}

impl ConnectOption {
    /// Apply this option to a TLS-capable driver.
    pub fn apply(&self, driver: &mut dyn SupportsTls) {
        match self {
            ConnectOption::SkipTlsVerify => {
                let scope = driver.tls_scope();
                let config = driver.tls_config_mut();
                config.skip_verify = true;
                if scope == TlsScope::TransportAndTrust {
                    config.insecure = true;
                }
            }
        }
    }
}

/// Apply every option in order.
pub fn apply_options(driver: &mut dyn SupportsTls, options: &[ConnectOption]) {
    for option in options {
        option.apply(driver);
    }
}

/// Options derived from a device record's `skip_tls` flag.
pub fn options_for(skip_tls: bool) -> Vec<ConnectOption> {
    if skip_tls {
        vec![ConnectOption::SkipTlsVerify]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDriver {
        scope: TlsScope,
        tls: TlsConfig,
    }

    impl SupportsTls for FakeDriver {
        fn tls_scope(&self) -> TlsScope {
            self.scope
        }

        fn tls_config_mut(&mut self) -> &mut TlsConfig {
            &mut self.tls
        }
    }

    #[test]
    fn test_trust_scope_only_skips_verification() {
        let mut driver = FakeDriver {
            scope: TlsScope::CertificateTrust,
            tls: TlsConfig::default(),
        };
        apply_options(&mut driver, &[ConnectOption::SkipTlsVerify]);
        assert!(driver.tls.skip_verify);
        assert!(!driver.tls.insecure);
    }

    #[test]
    fn test_transport_scope_sets_both_flags() {
        let mut driver = FakeDriver {
            scope: TlsScope::TransportAndTrust,
            tls: TlsConfig::default(),
        };
        apply_options(&mut driver, &[ConnectOption::SkipTlsVerify]);
        assert_eq!(
            driver.tls,
            TlsConfig {
                skip_verify: true,
                insecure: true
            }
        );
    }

    #[test]
    fn test_application_is_idempotent() {
        let mut once = FakeDriver {
            scope: TlsScope::TransportAndTrust,
            tls: TlsConfig::default(),
        };
        let mut twice = FakeDriver {
            scope: TlsScope::TransportAndTrust,
            tls: TlsConfig::default(),
        };
        apply_options(&mut once, &[ConnectOption::SkipTlsVerify]);
        apply_options(
            &mut twice,
            &[ConnectOption::SkipTlsVerify, ConnectOption::SkipTlsVerify],
        );
        assert_eq!(once.tls, twice.tls);
    }

    #[test]
    fn test_options_for_record_flag() {
        assert!(options_for(false).is_empty());
        assert_eq!(options_for(true), vec![ConnectOption::SkipTlsVerify]);
    }
}
