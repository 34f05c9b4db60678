//! Trust store loading.

use log::{debug, warn};
use rustls::RootCertStore;

/// Builds the root store used for chain validation.
///
/// With `bundled`, the compiled-in Mozilla roots from `webpki-roots` are
/// used. Otherwise the platform store is loaded through
/// `rustls-native-certs`; unreadable or rejected certificates are skipped
/// and an unavailable store yields an empty one rather than an error.
pub fn init_root_store(bundled: bool) -> RootCertStore {
    let mut roots = RootCertStore::empty();

    if bundled {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        debug!("Loaded {} bundled root certificates", roots.len());
        return roots;
    }

    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!("Problem loading platform root certificates: {err}");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    if ignored > 0 {
        debug!("Ignored {ignored} unparsable platform root certificates");
    }
    if added == 0 {
        warn!("No platform root certificates available; every chain will be untrusted");
    } else {
        debug!("Loaded {added} platform root certificates");
    }
    roots
}
