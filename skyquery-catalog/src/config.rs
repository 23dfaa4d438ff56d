//! Endpoint and transport settings.
//!
//! [`ClientConfig::default`] points at the public STScI services. Every URL
//! can be overridden, which is how tests aim the client at a mock server and
//! how a mirror would be used.

use std::time::Duration;

/// MAST catalog API root (Pan-STARRS tables live under `/panstarrs`).
pub const DEFAULT_CATALOGS_URL: &str = "https://catalogs.mast.stsci.edu/api/v0.1/panstarrs";
/// MAST portal service endpoint used for name resolution and service requests.
pub const DEFAULT_INVOKE_URL: &str = "https://mast.stsci.edu/api/v0/invoke";
/// PS1 image listing service.
pub const DEFAULT_PS1_FILENAMES_URL: &str = "https://ps1images.stsci.edu/cgi-bin/ps1filenames.py";
/// PS1 cutout service.
pub const DEFAULT_PS1_FITSCUT_URL: &str = "https://ps1images.stsci.edu/cgi-bin/fitscut.cgi";
/// Hubble Legacy Archive source list service.
pub const DEFAULT_HLA_CATALOG_URL: &str = "http://hla.stsci.edu/HLA/Catalogs/HLAcat.aspx";

/// Settings shared by every request an [`ArchiveClient`](crate::ArchiveClient) makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub catalogs_url: String,
    pub invoke_url: String,
    pub ps1_filenames_url: String,
    pub ps1_fitscut_url: String,
    pub hla_catalog_url: String,
    pub user_agent: String,
    /// Whole-request timeout. `None` (the default) waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            catalogs_url: DEFAULT_CATALOGS_URL.to_string(),
            invoke_url: DEFAULT_INVOKE_URL.to_string(),
            ps1_filenames_url: DEFAULT_PS1_FILENAMES_URL.to_string(),
            ps1_fitscut_url: DEFAULT_PS1_FITSCUT_URL.to_string(),
            hla_catalog_url: DEFAULT_HLA_CATALOG_URL.to_string(),
            user_agent: format!("skyquery/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Route every service to `base`, as `<base>/panstarrs`, `<base>/invoke`,
    /// `<base>/ps1filenames.py`, `<base>/fitscut.cgi` and `<base>/HLAcat.aspx`.
    ///
    /// Used to point the whole client at a single mock server or proxy.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            catalogs_url: format!("{}/panstarrs", base),
            invoke_url: format!("{}/invoke", base),
            ps1_filenames_url: format!("{}/ps1filenames.py", base),
            ps1_fitscut_url: format!("{}/fitscut.cgi", base),
            hla_catalog_url: format!("{}/HLAcat.aspx", base),
            ..Self::default()
        }
    }

    pub fn catalogs_url(mut self, url: impl Into<String>) -> Self {
        self.catalogs_url = url.into();
        self
    }

    pub fn invoke_url(mut self, url: impl Into<String>) -> Self {
        self.invoke_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
