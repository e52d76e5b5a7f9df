use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use ndarray::Array2;
use tracing::warn;

use crate::config::{AlignConfig, AlignMethod};
use crate::error::{CallistoError, Result};

/// Backend entry point: `(reference, source, config) -> aligned source`.
pub type BackendFn = fn(&Array2<f32>, &Array2<f32>, &AlignConfig) -> Result<Array2<f32>>;

/// One alignment method and, when it was compiled in, its implementation.
#[derive(Clone, Copy)]
pub struct Backend {
    pub method: AlignMethod,
    /// Cargo feature providing the implementation.
    pub dependency: &'static str,
    invoke: Option<BackendFn>,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("method", &self.method)
            .field("dependency", &self.dependency)
            .field("available", &self.is_available())
            .finish()
    }
}

impl Backend {
    pub fn available(method: AlignMethod, dependency: &'static str, invoke: BackendFn) -> Self {
        Self {
            method,
            dependency,
            invoke: Some(invoke),
        }
    }

    pub fn unavailable(method: AlignMethod, dependency: &'static str) -> Self {
        Self {
            method,
            dependency,
            invoke: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.invoke.is_some()
    }

    pub fn invoke(
        &self,
        reference: &Array2<f32>,
        source: &Array2<f32>,
        config: &AlignConfig,
    ) -> Result<Array2<f32>> {
        match self.invoke {
            Some(run) => run(reference, source, config),
            None => Err(CallistoError::FeatureUnavailable {
                method: self.method.name(),
                dependency: self.dependency,
            }),
        }
    }
}

/// Method name → backend capability table.
#[derive(Clone, Debug, Default)]
pub struct BackendRegistry {
    backends: HashMap<AlignMethod, Backend>,
}

impl BackendRegistry {
    /// Registry without any backend. Every lookup fails with
    /// `FeatureUnavailable` until backends are registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry from the backends compiled into this crate.
    pub fn detect() -> Self {
        let mut registry = Self::empty();

        #[cfg(feature = "astroalign")]
        registry.register(Backend::available(
            AlignMethod::Astroalign,
            "astroalign",
            super::feature_match::align_features,
        ));
        #[cfg(not(feature = "astroalign"))]
        registry.register(Backend::unavailable(AlignMethod::Astroalign, "astroalign"));

        #[cfg(feature = "skimage")]
        registry.register(Backend::available(
            AlignMethod::Skimage,
            "skimage",
            super::cross_correlation::align_cross_correlation,
        ));
        #[cfg(not(feature = "skimage"))]
        registry.register(Backend::unavailable(AlignMethod::Skimage, "skimage"));

        #[cfg(feature = "chi2")]
        registry.register(Backend::available(
            AlignMethod::Chi2,
            "chi2",
            super::chi2::align_chi2,
        ));
        #[cfg(not(feature = "chi2"))]
        registry.register(Backend::unavailable(AlignMethod::Chi2, "chi2"));

        #[cfg(feature = "imreg")]
        registry.register(Backend::available(
            AlignMethod::Imreg,
            "imreg",
            super::log_polar::align_log_polar,
        ));
        #[cfg(not(feature = "imreg"))]
        registry.register(Backend::unavailable(AlignMethod::Imreg, "imreg"));

        for backend in registry.iter().filter(|b| !b.is_available()) {
            warn!(
                method = %backend.method,
                dependency = backend.dependency,
                "alignment method disabled: feature not compiled in"
            );
        }
        registry
    }

    /// Process-wide registry, detected on first use.
    pub fn global() -> &'static BackendRegistry {
        static REGISTRY: OnceLock<BackendRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::detect)
    }

    /// Insert or replace the backend for `backend.method`.
    pub fn register(&mut self, backend: Backend) {
        self.backends.insert(backend.method, backend);
    }

    pub fn with(mut self, backend: Backend) -> Self {
        self.register(backend);
        self
    }

    /// Backend for `method`; an unregistered method is reported as
    /// unavailable under its own name.
    pub fn get(&self, method: AlignMethod) -> Backend {
        self.backends
            .get(&method)
            .copied()
            .unwrap_or_else(|| Backend::unavailable(method, method.name()))
    }

    /// Backends in `AlignMethod` order.
    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        AlignMethod::ALL
            .iter()
            .filter_map(|method| self.backends.get(method))
    }
}
