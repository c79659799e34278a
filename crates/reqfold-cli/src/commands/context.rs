//! Configuration and collaborators shared by the command handlers.

use std::path::Path;
use std::time::Duration;

use miette::Result;

use reqfold_core::config::ResolverConfig;
use reqfold_index::artifact_cache::WheelCache;
use reqfold_index::download::build_client;
use reqfold_index::json_api::JsonApi;
use reqfold_index::repository::PackageIndex;
use reqfold_index::simple::SimpleIndex;
use reqfold_index::source::SourceResolver;
use reqfold_resolver::cache::DependencyCache;
use reqfold_resolver::session::Session;
use reqfold_util::errors::ReqfoldError;

/// Network-backed lookup services. Absent when running offline.
struct Services {
    index: SimpleIndex,
    json: Option<JsonApi>,
    wheels: WheelCache,
    source: SourceResolver,
}

pub struct Context {
    pub config: ResolverConfig,
    cache: DependencyCache,
    services: Option<Services>,
}

impl Context {
    pub fn load(config_path: Option<&Path>, index_url: Option<&str>, offline: bool) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => ResolverConfig::load_from(path)?,
            None => ResolverConfig::load()?,
        };
        if let Some(url) = index_url {
            config.index.url = url.to_string();
        }

        let cache = DependencyCache::load(&config.depcache_path());
        let services = if offline {
            tracing::debug!("Offline: only the dependency cache will answer");
            None
        } else {
            Some(Self::connect(&config)?)
        };
        Ok(Self {
            config,
            cache,
            services,
        })
    }

    fn connect(config: &ResolverConfig) -> Result<Services> {
        let client = build_client(Duration::from_secs(config.resolver.timeout_secs))?;
        let index = PackageIndex::from_config(&config.index);
        let wheels = WheelCache::new(&config.wheel_cache_dir());
        let json = config
            .resolver
            .use_json_api
            .then(|| JsonApi::new(index.clone(), client.clone()));
        let source = SourceResolver::new(
            SimpleIndex::new(index.clone(), client.clone()),
            wheels.clone(),
            config.resolver.python.clone(),
        )
        .with_prereleases(config.resolver.allow_prereleases);
        Ok(Services {
            index: SimpleIndex::new(index, client),
            json,
            wheels,
            source,
        })
    }

    /// A resolution session over the dependency cache and every available
    /// collaborator.
    pub fn session(&mut self, allow_prereleases: bool) -> Session<'_> {
        let allow = allow_prereleases || self.config.resolver.allow_prereleases;
        let mut session = Session::new(&mut self.cache).allow_prereleases(allow);
        if let Some(services) = &self.services {
            session = session
                .with_index(&services.index)
                .with_artifacts(&services.wheels)
                .with_full_resolver(&services.source);
            if let Some(json) = &services.json {
                session = session.with_metadata(json);
            }
        }
        session
    }

    /// The package index, or an error when running offline.
    pub fn index(&self) -> Result<&SimpleIndex> {
        match &self.services {
            Some(services) => Ok(&services.index),
            None => Err(ReqfoldError::Network {
                message: "the package index is not available in offline mode".to_string(),
            }
            .into()),
        }
    }
}
