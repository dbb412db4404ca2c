use dashmap::DashMap;
use roost_api::deploy::{Deploy, Deployer};

/// In-memory deployment table keyed by address-less path.
#[derive(Debug, Default)]
pub struct LocalDeployer {
    deployments: DashMap<String, Deploy>,
}

impl LocalDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the deployment for `deploy.path()`.
    pub fn deploy(&self, deploy: Deploy) {
        self.deployments.insert(deploy.path().to_string(), deploy);
    }

    pub fn undeploy(&self, path: &str) -> Option<Deploy> {
        self.deployments.remove(path).map(|(_, d)| d)
    }
}

impl Deployer for LocalDeployer {
    fn lookup(&self, path: &str) -> Option<Deploy> {
        self.deployments.get(path).map(|d| d.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_path() {
        let deployer = LocalDeployer::new();
        deployer.deploy(Deploy::new("/user/worker").with_mailbox("custom"));

        let found = deployer.lookup("/user/worker").unwrap();
        assert_eq!(found.mailbox(), Some("custom"));
        assert!(deployer.lookup("/user/other").is_none());

        deployer.undeploy("/user/worker");
        assert!(deployer.lookup("/user/worker").is_none());
    }
}
