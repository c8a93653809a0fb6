//! Name-keyed registry of build services shared by every CI provider

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use compact_str::CompactString;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::permissions::{Authorization, Permissions};

/// CI providers a build service can front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildServiceProvider {
    Jenkins,
    Travis,
    Concourse,
    Gcb,
    Wercker,
    GitlabCi,
}

impl fmt::Display for BuildServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildServiceProvider::Jenkins => "jenkins",
            BuildServiceProvider::Travis => "travis",
            BuildServiceProvider::Concourse => "concourse",
            BuildServiceProvider::Gcb => "gcb",
            BuildServiceProvider::Wercker => "wercker",
            BuildServiceProvider::GitlabCi => "gitlab-ci",
        })
    }
}

/// Contract every registered build service fulfils
pub trait BuildService: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn provider(&self) -> BuildServiceProvider;
    fn permissions(&self) -> &Permissions;
}

/// Mutable registry used while the process starts up.
///
/// Each provider integration merges its services in; [`build`](Self::build)
/// freezes the result.
#[derive(Debug, Default)]
pub struct BuildServicesBuilder {
    services: HashMap<CompactString, Arc<dyn BuildService>>,
}

impl BuildServicesBuilder {
    /// Merge `services` into the registry. A name that is already present is
    /// replaced by the new service.
    pub fn add_services<S, I>(&mut self, services: I) -> &mut Self
    where
        S: BuildService + 'static,
        I: IntoIterator<Item = (CompactString, Arc<S>)>,
    {
        for (name, service) in services {
            let service: Arc<dyn BuildService> = service;
            let provider = service.provider();
            if let Some(previous) = self.services.insert(name.clone(), service) {
                warn!(
                    name = %name,
                    replaced = %previous.provider(),
                    by = %provider,
                    "Build service name registered twice; keeping the latest"
                );
            } else {
                debug!(name = %name, provider = %provider, "Registered build service");
            }
        }
        self
    }

    pub fn build(self) -> BuildServices {
        BuildServices { services: self.services }
    }
}

/// Frozen registry consulted to route build operations to a provider
#[derive(Debug, Default)]
pub struct BuildServices {
    services: HashMap<CompactString, Arc<dyn BuildService>>,
}

impl BuildServices {
    pub fn builder() -> BuildServicesBuilder {
        BuildServicesBuilder::default()
    }

    pub fn get_service(&self, name: &str) -> Option<&Arc<dyn BuildService>> {
        self.services.get(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// All service names, sorted
    pub fn service_names(&self) -> Vec<&str> {
        self.services.keys().map(CompactString::as_str).sorted().collect()
    }

    /// Names of the services backed by `provider`, sorted
    pub fn service_names_for(&self, provider: BuildServiceProvider) -> Vec<&str> {
        self.services
            .iter()
            .filter(|(_, service)| service.provider() == provider)
            .map(|(name, _)| name.as_str())
            .sorted()
            .collect()
    }

    /// Services ordered by name
    pub fn all_services(&self) -> Vec<&Arc<dyn BuildService>> {
        self.services
            .iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, service)| service)
            .collect()
    }

    /// Names of the services a user holding `user_roles` may access, sorted
    pub fn authorized_service_names<R: AsRef<str>>(
        &self,
        user_roles: &[R],
        authorization: Authorization,
    ) -> Vec<&str> {
        self.services
            .iter()
            .filter(|(_, service)| service.permissions().is_authorized(user_roles, authorization))
            .map(|(name, _)| name.as_str())
            .sorted()
            .collect()
    }
}

/// Handle to the current registry. Readers get a snapshot; a reload replaces
/// the whole registry at once and never edits it in place.
#[derive(Debug)]
pub struct SharedBuildServices {
    current: RwLock<Arc<BuildServices>>,
}

impl SharedBuildServices {
    pub fn new(services: BuildServices) -> Self {
        Self { current: RwLock::new(Arc::new(services)) }
    }

    pub fn load(&self) -> Arc<BuildServices> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Publish `services`, returning the registry it replaced
    pub fn swap(&self, services: BuildServices) -> Arc<BuildServices> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(services))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionsBuilder;

    #[derive(Debug)]
    struct FakeService {
        name: CompactString,
        provider: BuildServiceProvider,
        permissions: Permissions,
    }

    impl BuildService for FakeService {
        fn name(&self) -> &str {
            &self.name
        }

        fn provider(&self) -> BuildServiceProvider {
            self.provider
        }

        fn permissions(&self) -> &Permissions {
            &self.permissions
        }
    }

    fn fake(name: &str, provider: BuildServiceProvider) -> (CompactString, Arc<FakeService>) {
        let service = FakeService {
            name: name.into(),
            provider,
            permissions: Permissions::default(),
        };
        (name.into(), Arc::new(service))
    }

    #[test]
    fn test_merge_keeps_existing_services() {
        let mut builder = BuildServices::builder();
        builder.add_services([fake("jenkins-a", BuildServiceProvider::Jenkins)]);
        builder.add_services([
            fake("gitlab-b", BuildServiceProvider::GitlabCi),
            fake("gitlab-a", BuildServiceProvider::GitlabCi),
        ]);
        let services = builder.build();

        assert_eq!(services.len(), 3);
        assert_eq!(services.service_names(), ["gitlab-a", "gitlab-b", "jenkins-a"]);
        assert_eq!(
            services.service_names_for(BuildServiceProvider::GitlabCi),
            ["gitlab-a", "gitlab-b"]
        );
        assert_eq!(services.get_service("jenkins-a").unwrap().name(), "jenkins-a");
        assert!(services.get_service("missing").is_none());
    }

    #[test]
    fn test_duplicate_name_keeps_latest() {
        let mut builder = BuildServices::builder();
        builder
            .add_services([fake("ci", BuildServiceProvider::Jenkins)])
            .add_services([fake("ci", BuildServiceProvider::GitlabCi)]);
        let services = builder.build();

        assert_eq!(services.len(), 1);
        assert_eq!(
            services.get_service("ci").unwrap().provider(),
            BuildServiceProvider::GitlabCi
        );
    }

    #[test]
    fn test_authorized_service_names() {
        let restricted = FakeService {
            name: "secure".into(),
            provider: BuildServiceProvider::GitlabCi,
            permissions: PermissionsBuilder::new()
                .add(Authorization::Read, ["ops"])
                .build(),
        };

        let mut builder = BuildServices::builder();
        builder.add_services([fake("open", BuildServiceProvider::Travis)]);
        builder.add_services([("secure".into(), Arc::new(restricted))]);
        let services = builder.build();

        assert_eq!(services.authorized_service_names(&["dev"], Authorization::Read), ["open"]);
        assert_eq!(
            services.authorized_service_names(&["ops"], Authorization::Read),
            ["open", "secure"]
        );
        assert_eq!(
            services
                .all_services()
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>(),
            ["open", "secure"]
        );
    }

    #[test]
    fn test_shared_registry_swaps_whole() {
        let mut builder = BuildServices::builder();
        builder.add_services([fake("old", BuildServiceProvider::Jenkins)]);
        let shared = SharedBuildServices::new(builder.build());

        let snapshot = shared.load();

        let mut builder = BuildServices::builder();
        builder.add_services([fake("new", BuildServiceProvider::GitlabCi)]);
        let previous = shared.swap(builder.build());

        assert_eq!(previous.service_names(), ["old"]);
        assert_eq!(snapshot.service_names(), ["old"]);
        assert_eq!(shared.load().service_names(), ["new"]);
    }
}
